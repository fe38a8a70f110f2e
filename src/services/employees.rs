use super::validators::{validate_non_negative_decimal, validate_not_blank};
use super::{clean, contains_ci, Page};
use crate::{
    entities::{appointment, distribution_route, employee, production_labor},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateEmployeeInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub hourly_rate: Option<Decimal>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateEmployeeInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub hourly_rate: Option<Decimal>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct EmployeeService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl EmployeeService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub(crate) async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        employee_id: Uuid,
    ) -> Result<employee::Model, ServiceError> {
        employee::Entity::find_by_id(employee_id)
            .filter(employee::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create_employee(
        &self,
        business_id: Uuid,
        input: CreateEmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
        input.validate()?;

        let employee_id = Uuid::new_v4();
        let employee = employee::ActiveModel {
            id: Set(employee_id),
            business_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            email: Set(clean(input.email)),
            phone: Set(clean(input.phone)),
            position: Set(clean(input.position)),
            hourly_rate: Set(input.hourly_rate),
            hire_date: Set(input.hire_date),
            is_active: Set(input.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::EmployeeCreated {
                business_id,
                employee_id,
            })
            .await;

        info!("Created employee: {}", employee_id);
        Ok(employee)
    }

    #[instrument(skip(self))]
    pub async fn get_employee(
        &self,
        business_id: Uuid,
        employee_id: Uuid,
    ) -> Result<employee::Model, ServiceError> {
        Self::find_in_business(&*self.db, business_id, employee_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_employees(
        &self,
        business_id: Uuid,
        filter: &EmployeeFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<employee::Model>, ServiceError> {
        let mut query =
            employee::Entity::find().filter(employee::Column::BusinessId.eq(business_id));
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(contains_ci(employee::Column::Name, search));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(employee::Column::IsActive.eq(is_active));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(employee::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_employee(
        &self,
        business_id: Uuid,
        employee_id: Uuid,
        input: UpdateEmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_in_business(&*self.db, business_id, employee_id).await?;

        let mut active: employee::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(clean(Some(email)));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(clean(Some(phone)));
        }
        if let Some(position) = input.position {
            active.position = Set(clean(Some(position)));
        }
        if let Some(rate) = input.hourly_rate {
            active.hourly_rate = Set(Some(rate));
        }
        if let Some(hire_date) = input.hire_date {
            active.hire_date = Set(Some(hire_date));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let employee = active.update(&*self.db).await?;
        info!("Updated employee: {}", employee_id);
        Ok(employee)
    }

    /// Employees with logged labor, appointments or driven routes must be
    /// deactivated rather than deleted
    #[instrument(skip(self))]
    pub async fn delete_employee(
        &self,
        business_id: Uuid,
        employee_id: Uuid,
    ) -> Result<(), ServiceError> {
        Self::find_in_business(&*self.db, business_id, employee_id).await?;

        let labor = production_labor::Entity::find()
            .filter(production_labor::Column::EmployeeId.eq(employee_id))
            .count(&*self.db)
            .await?;
        let appointments = appointment::Entity::find()
            .filter(appointment::Column::EmployeeId.eq(employee_id))
            .count(&*self.db)
            .await?;
        let routes = distribution_route::Entity::find()
            .filter(distribution_route::Column::DriverId.eq(employee_id))
            .count(&*self.db)
            .await?;
        if labor + appointments + routes > 0 {
            return Err(ServiceError::Conflict(
                "Employee has labor, appointment or route history; deactivate instead".to_string(),
            ));
        }

        employee::Entity::delete_by_id(employee_id)
            .exec(&*self.db)
            .await?;
        info!("Deleted employee: {}", employee_id);
        Ok(())
    }
}
