use super::validators::validate_not_blank;
use super::{clean, contains_ci, Page};
use crate::{
    entities::{appointment, customer, debt, sale},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    sea_query::Condition, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    /// Matches name, email or phone
    pub search: Option<String>,
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub(crate) async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        customer_id: Uuid,
    ) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .filter(customer::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create_customer(
        &self,
        business_id: Uuid,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let customer_id = Uuid::new_v4();
        let customer = customer::ActiveModel {
            id: Set(customer_id),
            business_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            email: Set(clean(input.email)),
            phone: Set(clean(input.phone)),
            address: Set(clean(input.address)),
            notes: Set(clean(input.notes)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::CustomerCreated {
                business_id,
                customer_id,
            })
            .await;

        info!("Created customer: {}", customer_id);
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
    ) -> Result<customer::Model, ServiceError> {
        Self::find_in_business(&*self.db, business_id, customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        business_id: Uuid,
        filter: &CustomerFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<customer::Model>, ServiceError> {
        let mut query =
            customer::Entity::find().filter(customer::Column::BusinessId.eq(business_id));
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(customer::Column::Name, search))
                    .add(contains_ci(customer::Column::Email, search))
                    .add(contains_ci(customer::Column::Phone, search)),
            );
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(customer::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_in_business(&*self.db, business_id, customer_id).await?;

        let mut active: customer::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(clean(Some(email)));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(clean(Some(phone)));
        }
        if let Some(address) = input.address {
            active.address = Set(clean(Some(address)));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(clean(Some(notes)));
        }

        let customer = active.update(&*self.db).await?;
        info!("Updated customer: {}", customer_id);
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(), ServiceError> {
        Self::find_in_business(&*self.db, business_id, customer_id).await?;

        let sales = sale::Entity::find()
            .filter(sale::Column::CustomerId.eq(customer_id))
            .count(&*self.db)
            .await?;
        let debts = debt::Entity::find()
            .filter(debt::Column::CustomerId.eq(customer_id))
            .count(&*self.db)
            .await?;
        let appointments = appointment::Entity::find()
            .filter(appointment::Column::CustomerId.eq(customer_id))
            .count(&*self.db)
            .await?;
        if sales + debts + appointments > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer is referenced by {} sales, {} debts and {} appointments",
                sales, debts, appointments
            )));
        }

        customer::Entity::delete_by_id(customer_id)
            .exec(&*self.db)
            .await?;
        info!("Deleted customer: {}", customer_id);
        Ok(())
    }
}
