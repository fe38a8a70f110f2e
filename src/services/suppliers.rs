use super::validators::validate_not_blank;
use super::{clean, contains_ci, Page};
use crate::{
    entities::{debt, expenditure, supplier},
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
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 200))]
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplierFilter {
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub(crate) async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(supplier_id)
            .filter(supplier::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create_supplier(
        &self,
        business_id: Uuid,
        input: CreateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;

        let supplier_id = Uuid::new_v4();
        let supplier = supplier::ActiveModel {
            id: Set(supplier_id),
            business_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            contact_name: Set(clean(input.contact_name)),
            email: Set(clean(input.email)),
            phone: Set(clean(input.phone)),
            address: Set(clean(input.address)),
            notes: Set(clean(input.notes)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::SupplierCreated {
                business_id,
                supplier_id,
            })
            .await;

        info!("Created supplier: {}", supplier_id);
        Ok(supplier)
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(
        &self,
        business_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<supplier::Model, ServiceError> {
        Self::find_in_business(&*self.db, business_id, supplier_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        business_id: Uuid,
        filter: &SupplierFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<supplier::Model>, ServiceError> {
        let mut query =
            supplier::Entity::find().filter(supplier::Column::BusinessId.eq(business_id));
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(supplier::Column::Name, search))
                    .add(contains_ci(supplier::Column::ContactName, search))
                    .add(contains_ci(supplier::Column::Email, search)),
            );
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(supplier::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        business_id: Uuid,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_in_business(&*self.db, business_id, supplier_id).await?;

        let mut active: supplier::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(contact_name) = input.contact_name {
            active.contact_name = Set(clean(Some(contact_name)));
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

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_supplier(
        &self,
        business_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<(), ServiceError> {
        Self::find_in_business(&*self.db, business_id, supplier_id).await?;

        let expenditures = expenditure::Entity::find()
            .filter(expenditure::Column::SupplierId.eq(supplier_id))
            .count(&*self.db)
            .await?;
        let debts = debt::Entity::find()
            .filter(debt::Column::SupplierId.eq(supplier_id))
            .count(&*self.db)
            .await?;
        if expenditures + debts > 0 {
            return Err(ServiceError::Conflict(format!(
                "Supplier is referenced by {} expenditures and {} debts",
                expenditures, debts
            )));
        }

        supplier::Entity::delete_by_id(supplier_id)
            .exec(&*self.db)
            .await?;
        info!("Deleted supplier: {}", supplier_id);
        Ok(())
    }
}
