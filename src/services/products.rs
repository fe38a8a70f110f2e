use super::categories::CategoryService;
use super::validators::{validate_non_negative_decimal, validate_not_blank};
use super::{clean, contains_ci, Page};
use crate::{
    entities::{
        delivery, product, production, production_output, production_resource, sale_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Condition, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Input for creating a product
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateProductInput {
    #[validate(
        length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"),
        custom = "validate_not_blank"
    )]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub price: Decimal,
    #[validate(custom = "validate_non_negative_decimal")]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub stock_quantity: Option<Decimal>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub reorder_level: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Input for updating a product. Stock is changed through `adjust_stock` only.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    /// Detach from the current category
    #[serde(default)]
    pub clear_category: bool,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub reorder_level: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AdjustStockInput {
    /// Signed change applied to the current stock
    pub delta: Decimal,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub reason: String,
}

/// Filters for listing products
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Matches name or SKU, case-insensitively
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Applies a signed stock change in a single conditional UPDATE so concurrent
/// writers cannot drive stock below zero. Returns the product after the change.
pub(crate) async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    product_id: Uuid,
    delta: Decimal,
) -> Result<product::Model, ServiceError> {
    let mut update = product::Entity::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).add(delta),
        )
        .col_expr(
            product::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::BusinessId.eq(business_id));
    if delta < Decimal::ZERO {
        update = update.filter(product::Column::StockQuantity.gte(-delta));
    }
    let result = update.exec(conn).await?;

    let product = product::Entity::find_by_id(product_id)
        .filter(product::Column::BusinessId.eq(business_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

    if result.rows_affected == 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "{} has {} {} in stock, {} requested",
            product.name,
            product.stock_quantity,
            product.unit,
            -delta
        )));
    }
    Ok(product)
}

/// Service for managing products and their stock
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub(crate) async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .filter(product::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    async fn ensure_unique_sku(
        &self,
        business_id: Uuid,
        sku: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = product::Entity::find()
            .filter(product::Column::BusinessId.eq(business_id))
            .filter(product::Column::Sku.eq(sku));
        if let Some(id) = except {
            query = query.filter(product::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "SKU '{}' is already in use",
                sku
            )));
        }
        Ok(())
    }

    /// Create a new product
    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        business_id: Uuid,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        if let Some(category_id) = input.category_id {
            CategoryService::find_in_business(&*self.db, business_id, category_id).await?;
        }
        let sku = clean(input.sku);
        if let Some(sku) = &sku {
            self.ensure_unique_sku(business_id, sku, None).await?;
        }

        let product_id = Uuid::new_v4();
        let product = product::ActiveModel {
            id: Set(product_id),
            business_id: Set(business_id),
            category_id: Set(input.category_id),
            name: Set(input.name.trim().to_string()),
            sku: Set(sku),
            description: Set(clean(input.description)),
            unit: Set(clean(input.unit).unwrap_or_else(|| "unit".to_string())),
            price: Set(input.price),
            cost_price: Set(input.cost_price.unwrap_or(Decimal::ZERO)),
            stock_quantity: Set(input.stock_quantity.unwrap_or(Decimal::ZERO)),
            reorder_level: Set(input.reorder_level.unwrap_or(Decimal::ZERO)),
            is_active: Set(input.is_active.unwrap_or(true)),
            ..Default::default()
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated {
                business_id,
                product_id,
            })
            .await;

        info!("Created product: {}", product_id);
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        Self::find_in_business(&*self.db, business_id, product_id).await
    }

    /// List products with filters, in name order
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        business_id: Uuid,
        filter: &ProductFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<product::Model>, ServiceError> {
        let mut query = product::Entity::find().filter(product::Column::BusinessId.eq(business_id));

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(product::Column::Name, search))
                    .add(contains_ci(product::Column::Sku, search)),
            );
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(product::Column::IsActive.eq(is_active));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(product::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    /// Update product fields; `None` leaves a field untouched
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_in_business(&*self.db, business_id, product_id).await?;

        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(sku) = clean(input.sku) {
            self.ensure_unique_sku(business_id, &sku, Some(product_id))
                .await?;
            active.sku = Set(Some(sku));
        }
        if let Some(description) = input.description {
            active.description = Set(clean(Some(description)));
        }
        if input.clear_category {
            active.category_id = Set(None);
        } else if let Some(category_id) = input.category_id {
            CategoryService::find_in_business(&*self.db, business_id, category_id).await?;
            active.category_id = Set(Some(category_id));
        }
        if let Some(unit) = clean(input.unit) {
            active.unit = Set(unit);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(cost_price) = input.cost_price {
            active.cost_price = Set(cost_price);
        }
        if let Some(reorder_level) = input.reorder_level {
            active.reorder_level = Set(reorder_level);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let product = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated {
                business_id,
                product_id,
            })
            .await;

        info!("Updated product: {}", product_id);
        Ok(product)
    }

    /// Deletes a product nobody references. Products with history must be
    /// deactivated instead.
    #[instrument(skip(self))]
    pub async fn delete_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        Self::find_in_business(&txn, business_id, product_id).await?;

        let sold = sale_item::Entity::find()
            .filter(sale_item::Column::ProductId.eq(product_id))
            .count(&txn)
            .await?;
        let consumed = production_resource::Entity::find()
            .filter(production_resource::Column::ProductId.eq(product_id))
            .count(&txn)
            .await?;
        let produced = production_output::Entity::find()
            .filter(production_output::Column::ProductId.eq(product_id))
            .count(&txn)
            .await?;
        let delivered = delivery::Entity::find()
            .filter(delivery::Column::ProductId.eq(product_id))
            .count(&txn)
            .await?;
        let batches = production::Entity::find()
            .filter(production::Column::ProductId.eq(product_id))
            .count(&txn)
            .await?;

        if sold + consumed + produced + delivered + batches > 0 {
            return Err(ServiceError::Conflict(
                "Product has sales, production or delivery history; deactivate it instead"
                    .to_string(),
            ));
        }

        product::Entity::delete_by_id(product_id).exec(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted {
                business_id,
                product_id,
            })
            .await;

        info!("Deleted product: {}", product_id);
        Ok(())
    }

    /// Applies a manual stock correction (count, spoilage, restock)
    #[instrument(skip(self, input))]
    pub async fn adjust_stock(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        input: AdjustStockInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if input.delta.is_zero() {
            return Err(ServiceError::ValidationError(
                "Stock adjustment must not be zero".to_string(),
            ));
        }

        let product = apply_stock_delta(&*self.db, business_id, product_id, input.delta).await?;
        emit_stock_events(&self.event_sender, &product, input.delta, input.reason.trim()).await;

        info!(
            "Adjusted stock of {} by {} to {}",
            product_id, input.delta, product.stock_quantity
        );
        Ok(product)
    }

    /// Active products at or below their reorder level, lowest stock first
    #[instrument(skip(self))]
    pub async fn low_stock(&self, business_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::BusinessId.eq(business_id))
            .filter(product::Column::IsActive.eq(true))
            .filter(
                Expr::col(product::Column::StockQuantity)
                    .lte(Expr::col(product::Column::ReorderLevel)),
            )
            .order_by_asc(product::Column::StockQuantity)
            .all(&*self.db)
            .await?;
        Ok(products)
    }
}

/// Emits `StockAdjusted`, plus `LowStock` when a decrease left the product at
/// or below its reorder level
pub(crate) async fn emit_stock_events(
    event_sender: &EventSender,
    product: &product::Model,
    delta: Decimal,
    reason: &str,
) {
    event_sender
        .send_or_log(Event::StockAdjusted {
            business_id: product.business_id,
            product_id: product.id,
            old_quantity: product.stock_quantity - delta,
            new_quantity: product.stock_quantity,
            reason: reason.to_string(),
        })
        .await;
    if delta < Decimal::ZERO && product.is_low_stock() {
        event_sender
            .send_or_log(Event::LowStock {
                business_id: product.business_id,
                product_id: product.id,
                quantity: product.stock_quantity,
                reorder_level: product.reorder_level,
            })
            .await;
    }
}
