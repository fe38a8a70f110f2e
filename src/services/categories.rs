use super::validators::validate_not_blank;
use super::{clean, equals_ci, Page};
use crate::{
    entities::{category, product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Category with the number of products filed under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: category::Model,
    pub product_count: u64,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Fails with `NotFound` unless the category exists inside the business
    pub(crate) async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        category_id: Uuid,
    ) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .filter(category::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    async fn ensure_unique_name(
        &self,
        business_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = category::Entity::find()
            .filter(category::Column::BusinessId.eq(business_id))
            .filter(equals_ci(category::Column::Name, name));
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "A category named '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn create_category(
        &self,
        business_id: Uuid,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        self.ensure_unique_name(business_id, &input.name, None)
            .await?;

        let category_id = Uuid::new_v4();
        let category = category::ActiveModel {
            id: Set(category_id),
            business_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            description: Set(clean(input.description)),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated {
                business_id,
                category_id,
            })
            .await;

        info!("Created category: {}", category_id);
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn get_category(
        &self,
        business_id: Uuid,
        category_id: Uuid,
    ) -> Result<CategoryWithCount, ServiceError> {
        let category = Self::find_in_business(&*self.db, business_id, category_id).await?;
        let product_count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .count(&*self.db)
            .await?;
        Ok(CategoryWithCount {
            category,
            product_count,
        })
    }

    /// Categories of a business in name order
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        business_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Page<category::Model>, ServiceError> {
        let query = category::Entity::find().filter(category::Column::BusinessId.eq(business_id));
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(category::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        business_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_in_business(&*self.db, business_id, category_id).await?;

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            self.ensure_unique_name(business_id, &name, Some(category_id))
                .await?;
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(clean(Some(description)));
        }

        let category = active.update(&*self.db).await?;
        info!("Updated category: {}", category_id);
        Ok(category)
    }

    /// Deletes the category; its products stay but lose the category link.
    /// Returns how many products were detached.
    #[instrument(skip(self))]
    pub async fn delete_category(
        &self,
        business_id: Uuid,
        category_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let txn = self.db.begin().await?;
        Self::find_in_business(&txn, business_id, category_id).await?;

        let detached = product::Entity::update_many()
            .col_expr(
                product::Column::CategoryId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(product::Column::BusinessId.eq(business_id))
            .filter(product::Column::CategoryId.eq(category_id))
            .exec(&txn)
            .await?;

        category::Entity::delete_by_id(category_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted {
                business_id,
                category_id,
            })
            .await;

        info!(
            "Deleted category {} and detached {} products",
            category_id, detached.rows_affected
        );
        Ok(detached.rows_affected)
    }
}
