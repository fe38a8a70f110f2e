use super::customers::CustomerService;
use super::products::{apply_stock_delta, emit_stock_events, ProductService};
use super::validators::{validate_non_negative_decimal, validate_positive_decimal};
use super::{clean, generate_reference, Page};
use crate::{
    entities::{
        debt::{self, DebtDirection, DebtStatus},
        debt_payment, product,
        sale::{self, PaymentMethod, PaymentStatus, SaleStatus},
        sale_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SaleItemInput {
    pub product_id: Uuid,
    #[validate(custom = "validate_positive_decimal")]
    pub quantity: Decimal,
    /// Defaults to the product's current price
    #[validate(custom = "validate_non_negative_decimal")]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateSaleInput {
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, message = "A sale needs at least one item"))]
    pub items: Vec<SaleItemInput>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub discount: Option<Decimal>,
    /// Defaults to the sale total
    #[validate(custom = "validate_non_negative_decimal")]
    pub amount_paid: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    /// Defaults to now
    pub sold_at: Option<DateTime<Utc>>,
    /// Due date of the receivable opened for an unpaid balance
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
    pub status: Option<SaleStatus>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub items: Vec<sale_item::Model>,
    /// Receivable opened for the unpaid balance
    pub debt: Option<debt::Model>,
}

/// `[from 00:00, to+1 00:00)` in UTC
pub(crate) fn date_range_bounds(
    from: NaiveDate,
    to: NaiveDate,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = to
        .checked_add_days(Days::new(1))
        .unwrap_or(to)
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, end)
}

#[derive(Clone)]
pub struct SalesService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl SalesService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        sale_id: Uuid,
    ) -> Result<sale::Model, ServiceError> {
        sale::Entity::find_by_id(sale_id)
            .filter(sale::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", sale_id)))
    }

    async fn load_detail<C: ConnectionTrait>(
        conn: &C,
        sale: sale::Model,
    ) -> Result<SaleDetail, ServiceError> {
        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale.id))
            .order_by_asc(sale_item::Column::ProductName)
            .all(conn)
            .await?;
        let debt = debt::Entity::find()
            .filter(debt::Column::SaleId.eq(sale.id))
            .one(conn)
            .await?;
        Ok(SaleDetail { sale, items, debt })
    }

    /// Records a sale: prices the items, takes them out of stock and, when a
    /// known customer leaves a balance, opens a receivable. One transaction.
    #[instrument(skip(self, input))]
    pub async fn create_sale(
        &self,
        business_id: Uuid,
        input: CreateSaleInput,
    ) -> Result<SaleDetail, ServiceError> {
        input.validate()?;
        for item in &input.items {
            item.validate()?;
        }

        let customer = match input.customer_id {
            Some(customer_id) => {
                Some(CustomerService::find_in_business(&*self.db, business_id, customer_id).await?)
            }
            None => None,
        };

        let sale_id = Uuid::new_v4();
        let sold_at = input.sold_at.unwrap_or_else(Utc::now);
        let sold_at = sold_at.with_nanosecond(0).unwrap_or(sold_at);

        let txn = self.db.begin().await?;
        let mut lines = Vec::with_capacity(input.items.len());
        let mut destocked: Vec<(product::Model, Decimal)> = Vec::new();
        let mut subtotal = Decimal::ZERO;
        for item in &input.items {
            let product =
                ProductService::find_in_business(&txn, business_id, item.product_id).await?;
            if !product.is_active {
                return Err(ServiceError::InvalidOperation(format!(
                    "{} is not available for sale",
                    product.name
                )));
            }
            let unit_price = item.unit_price.unwrap_or(product.price);
            let after = apply_stock_delta(&txn, business_id, product.id, -item.quantity).await?;
            lines.push(sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                product_id: Set(product.id),
                product_name: Set(product.name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(unit_price),
                unit_cost: Set(product.cost_price),
                line_total: Set(item.quantity * unit_price),
            });
            subtotal += item.quantity * unit_price;
            destocked.push((after, item.quantity));
        }

        let discount = input.discount.unwrap_or(Decimal::ZERO);
        if discount > subtotal {
            return Err(ServiceError::ValidationError(format!(
                "Discount {} exceeds the subtotal {}",
                discount, subtotal
            )));
        }
        let total = subtotal - discount;
        let amount_paid = input.amount_paid.unwrap_or(total);
        if amount_paid > total {
            return Err(ServiceError::ValidationError(format!(
                "amount_paid {} exceeds the total {}",
                amount_paid, total
            )));
        }

        let sale = sale::ActiveModel {
            id: Set(sale_id),
            business_id: Set(business_id),
            customer_id: Set(input.customer_id),
            sale_number: Set(generate_reference("SAL", sold_at.date_naive())),
            subtotal: Set(subtotal),
            discount: Set(discount),
            total: Set(total),
            amount_paid: Set(amount_paid),
            payment_method: Set(input.payment_method.unwrap_or(PaymentMethod::Cash)),
            payment_status: Set(PaymentStatus::derive(total, amount_paid)),
            status: Set(SaleStatus::Completed),
            sold_at: Set(sold_at),
            notes: Set(clean(input.notes)),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            items.push(line.insert(&txn).await?);
        }

        let debt = match customer {
            Some(customer) if amount_paid < total => Some(
                debt::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    business_id: Set(business_id),
                    direction: Set(DebtDirection::Receivable),
                    customer_id: Set(Some(customer.id)),
                    supplier_id: Set(None),
                    sale_id: Set(Some(sale_id)),
                    counterparty_name: Set(customer.name),
                    description: Set(Some(format!("Balance of sale {}", sale.sale_number))),
                    amount: Set(total - amount_paid),
                    amount_paid: Set(Decimal::ZERO),
                    due_date: Set(input.due_date),
                    status: Set(DebtStatus::Outstanding),
                    ..Default::default()
                }
                .insert(&txn)
                .await?,
            ),
            _ => None,
        };
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::SaleRecorded {
                business_id,
                sale_id,
                total,
            })
            .await;
        for (product, quantity) in &destocked {
            emit_stock_events(&self.event_sender, product, -*quantity, "sale").await;
        }
        if let Some(debt) = &debt {
            self.event_sender
                .send_or_log(Event::DebtCreated {
                    business_id,
                    debt_id: debt.id,
                })
                .await;
        }

        info!("Recorded sale {} totalling {}", sale.sale_number, total);
        Ok(SaleDetail { sale, items, debt })
    }

    #[instrument(skip(self))]
    pub async fn get_sale(
        &self,
        business_id: Uuid,
        sale_id: Uuid,
    ) -> Result<SaleDetail, ServiceError> {
        let sale = Self::find_in_business(&*self.db, business_id, sale_id).await?;
        Self::load_detail(&*self.db, sale).await
    }

    /// Newest first; the date range applies to `sold_at` (UTC days, inclusive)
    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        business_id: Uuid,
        filter: &SaleFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<sale::Model>, ServiceError> {
        let mut query = sale::Entity::find().filter(sale::Column::BusinessId.eq(business_id));
        if let Some(from) = filter.from {
            query = query.filter(sale::Column::SoldAt.gte(date_range_bounds(from, from).0));
        }
        if let Some(to) = filter.to {
            query = query.filter(sale::Column::SoldAt.lt(date_range_bounds(to, to).1));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(sale::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(sale::Column::Status.eq(status));
        }
        if let Some(method) = filter.payment_method {
            query = query.filter(sale::Column::PaymentMethod.eq(method));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(sale::Column::SoldAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    /// Reverses a sale: items go back into stock, the unpaid receivable is
    /// removed, and the sale drops out of reports. Refused once the customer
    /// has paid anything against the receivable.
    #[instrument(skip(self))]
    pub async fn void_sale(
        &self,
        business_id: Uuid,
        sale_id: Uuid,
    ) -> Result<SaleDetail, ServiceError> {
        let txn = self.db.begin().await?;
        let sale = Self::find_in_business(&txn, business_id, sale_id).await?;
        if sale.status == SaleStatus::Voided {
            return Err(ServiceError::InvalidStatus(format!(
                "Sale {} is already voided",
                sale.sale_number
            )));
        }

        if let Some(debt) = debt::Entity::find()
            .filter(debt::Column::SaleId.eq(sale_id))
            .one(&txn)
            .await?
        {
            let payments = debt_payment::Entity::find()
                .filter(debt_payment::Column::DebtId.eq(debt.id))
                .count(&txn)
                .await?;
            if payments > 0 {
                warn!(%sale_id, "Void refused: receivable has payments");
                return Err(ServiceError::Conflict(format!(
                    "Sale {} has payments recorded against its balance",
                    sale.sale_number
                )));
            }
            debt::Entity::delete_by_id(debt.id).exec(&txn).await?;
        }

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .all(&txn)
            .await?;
        let mut restocked = Vec::with_capacity(items.len());
        for item in &items {
            let product =
                apply_stock_delta(&txn, business_id, item.product_id, item.quantity).await?;
            restocked.push((product, item.quantity));
        }

        let mut active: sale::ActiveModel = sale.into();
        active.status = Set(SaleStatus::Voided);
        let sale = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::SaleVoided {
                business_id,
                sale_id,
            })
            .await;
        for (product, quantity) in &restocked {
            emit_stock_events(&self.event_sender, product, *quantity, "sale voided").await;
        }

        info!("Voided sale {}", sale.sale_number);
        Ok(SaleDetail {
            sale,
            items,
            debt: None,
        })
    }
}
