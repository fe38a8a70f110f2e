use super::validators::{check_business_hours, validate_currency, validate_not_blank};
use super::{clean, Page};
use crate::{
    entities::{
        appointment, business, category, customer, debt, debt_payment, delivery,
        distribution_client, distribution_route, employee, expenditure, funding_source, product,
        production, production_labor, production_output, production_resource, production_stage,
        sale, sale_item, supplier,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Days, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

fn default_opening_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_closing_time() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Input for creating a business
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateBusinessInput {
    #[validate(
        length(min = 1, max = 120, message = "Name must be between 1 and 120 characters"),
        custom = "validate_not_blank"
    )]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 50))]
    pub business_type: Option<String>,
    #[validate(custom = "validate_currency")]
    pub currency: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
}

/// Input for updating a business
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateBusinessInput {
    #[validate(
        length(min = 1, max = 120, message = "Name must be between 1 and 120 characters"),
        custom = "validate_not_blank"
    )]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 50))]
    pub business_type: Option<String>,
    #[validate(custom = "validate_currency")]
    pub currency: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
}

/// Rows removed per table by [`BusinessService::delete_business`], in deletion order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionSummary {
    pub business_id: Uuid,
    pub tables: Vec<TableCount>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableCount {
    pub table: String,
    pub deleted: u64,
}

impl DeletionSummary {
    fn record(&mut self, table: &str, deleted: u64) {
        self.total += deleted;
        self.tables.push(TableCount {
            table: table.to_string(),
            deleted,
        });
    }

    pub fn deleted(&self, table: &str) -> u64 {
        self.tables
            .iter()
            .find(|t| t.table == table)
            .map_or(0, |t| t.deleted)
    }
}

/// Headline numbers for the business home screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub business_id: Uuid,
    pub currency: String,
    pub products: u64,
    pub low_stock_products: u64,
    pub customers: u64,
    pub suppliers: u64,
    pub employees: u64,
    pub active_productions: u64,
    pub pending_deliveries: u64,
    pub receivables_outstanding: Decimal,
    pub payables_outstanding: Decimal,
    pub funding_remaining: Decimal,
    pub sales_today: Decimal,
    pub sales_today_count: u64,
}

/// Service for managing businesses (tenants)
#[derive(Clone)]
pub struct BusinessService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_currency: String,
}

impl BusinessService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_currency,
        }
    }

    /// Loads the business and checks the caller owns it.
    /// Missing businesses are `NotFound`; someone else's are `Forbidden`.
    #[instrument(skip(self))]
    pub async fn authorize(
        &self,
        owner_id: &str,
        business_id: Uuid,
    ) -> Result<business::Model, ServiceError> {
        let business = business::Entity::find_by_id(business_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Business {} not found", business_id)))?;

        if business.owner_id != owner_id {
            warn!(%business_id, "Business access denied");
            return Err(ServiceError::Forbidden(
                "You do not have access to this business".to_string(),
            ));
        }

        Ok(business)
    }

    /// Create a new business owned by the caller
    #[instrument(skip(self, input))]
    pub async fn create_business(
        &self,
        owner_id: &str,
        input: CreateBusinessInput,
    ) -> Result<business::Model, ServiceError> {
        input.validate()?;

        let opening_time = input.opening_time.unwrap_or_else(default_opening_time);
        let closing_time = input.closing_time.unwrap_or_else(default_closing_time);
        check_business_hours(opening_time, closing_time).map_err(ServiceError::ValidationError)?;

        let business_id = Uuid::new_v4();
        let business = business::ActiveModel {
            id: Set(business_id),
            owner_id: Set(owner_id.to_string()),
            name: Set(input.name.trim().to_string()),
            description: Set(clean(input.description)),
            business_type: Set(clean(input.business_type)),
            currency: Set(input
                .currency
                .unwrap_or_else(|| self.default_currency.clone())),
            email: Set(clean(input.email)),
            phone: Set(clean(input.phone)),
            address: Set(clean(input.address)),
            opening_time: Set(opening_time),
            closing_time: Set(closing_time),
            ..Default::default()
        };

        let business = business.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BusinessCreated(business_id))
            .await;

        info!("Created business: {}", business_id);
        Ok(business)
    }

    /// Businesses owned by the caller, newest first
    #[instrument(skip(self))]
    pub async fn list_businesses(
        &self,
        owner_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Page<business::Model>, ServiceError> {
        let query = business::Entity::find().filter(business::Column::OwnerId.eq(owner_id));
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(business::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_business(
        &self,
        owner_id: &str,
        business_id: Uuid,
        input: UpdateBusinessInput,
    ) -> Result<business::Model, ServiceError> {
        input.validate()?;
        let existing = self.authorize(owner_id, business_id).await?;

        let opening = input.opening_time.unwrap_or(existing.opening_time);
        let closing = input.closing_time.unwrap_or(existing.closing_time);
        check_business_hours(opening, closing).map_err(ServiceError::ValidationError)?;

        let mut active: business::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(clean(Some(description)));
        }
        if let Some(business_type) = input.business_type {
            active.business_type = Set(clean(Some(business_type)));
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
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
        active.opening_time = Set(opening);
        active.closing_time = Set(closing);

        let business = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BusinessUpdated(business_id))
            .await;

        info!("Updated business: {}", business_id);
        Ok(business)
    }

    /// Removes the business and everything that belongs to it in one transaction,
    /// children before parents so foreign keys hold at every step.
    #[instrument(skip(self))]
    pub async fn delete_business(
        &self,
        owner_id: &str,
        business_id: Uuid,
    ) -> Result<DeletionSummary, ServiceError> {
        self.authorize(owner_id, business_id).await?;

        let txn = self.db.begin().await?;
        let mut summary = DeletionSummary {
            business_id,
            ..Default::default()
        };

        let debts_of_business = Query::select()
            .column(debt::Column::Id)
            .from(debt::Entity)
            .and_where(Expr::col(debt::Column::BusinessId).eq(business_id))
            .to_owned();
        let sales_of_business = Query::select()
            .column(sale::Column::Id)
            .from(sale::Entity)
            .and_where(Expr::col(sale::Column::BusinessId).eq(business_id))
            .to_owned();
        let productions_of_business = Query::select()
            .column(production::Column::Id)
            .from(production::Entity)
            .and_where(Expr::col(production::Column::BusinessId).eq(business_id))
            .to_owned();

        let res = debt_payment::Entity::delete_many()
            .filter(debt_payment::Column::DebtId.in_subquery(debts_of_business))
            .exec(&txn)
            .await?;
        summary.record("debt_payments", res.rows_affected);

        let res = debt::Entity::delete_many()
            .filter(debt::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("debts", res.rows_affected);

        let res = sale_item::Entity::delete_many()
            .filter(sale_item::Column::SaleId.in_subquery(sales_of_business))
            .exec(&txn)
            .await?;
        summary.record("sale_items", res.rows_affected);

        let res = sale::Entity::delete_many()
            .filter(sale::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("sales", res.rows_affected);

        let res = expenditure::Entity::delete_many()
            .filter(expenditure::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("expenditures", res.rows_affected);

        let res = funding_source::Entity::delete_many()
            .filter(funding_source::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("funding_sources", res.rows_affected);

        let res = delivery::Entity::delete_many()
            .filter(delivery::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("deliveries", res.rows_affected);

        let res = distribution_route::Entity::delete_many()
            .filter(distribution_route::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("distribution_routes", res.rows_affected);

        let res = distribution_client::Entity::delete_many()
            .filter(distribution_client::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("distribution_clients", res.rows_affected);

        let res = production_output::Entity::delete_many()
            .filter(
                production_output::Column::ProductionId.in_subquery(productions_of_business.clone()),
            )
            .exec(&txn)
            .await?;
        summary.record("production_outputs", res.rows_affected);

        let res = production_labor::Entity::delete_many()
            .filter(
                production_labor::Column::ProductionId.in_subquery(productions_of_business.clone()),
            )
            .exec(&txn)
            .await?;
        summary.record("production_labor", res.rows_affected);

        let res = production_resource::Entity::delete_many()
            .filter(
                production_resource::Column::ProductionId
                    .in_subquery(productions_of_business.clone()),
            )
            .exec(&txn)
            .await?;
        summary.record("production_resources", res.rows_affected);

        let res = production_stage::Entity::delete_many()
            .filter(production_stage::Column::ProductionId.in_subquery(productions_of_business))
            .exec(&txn)
            .await?;
        summary.record("production_stages", res.rows_affected);

        let res = production::Entity::delete_many()
            .filter(production::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("productions", res.rows_affected);

        let res = appointment::Entity::delete_many()
            .filter(appointment::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("appointments", res.rows_affected);

        let res = product::Entity::delete_many()
            .filter(product::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("products", res.rows_affected);

        let res = category::Entity::delete_many()
            .filter(category::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("categories", res.rows_affected);

        let res = employee::Entity::delete_many()
            .filter(employee::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("employees", res.rows_affected);

        let res = supplier::Entity::delete_many()
            .filter(supplier::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("suppliers", res.rows_affected);

        let res = customer::Entity::delete_many()
            .filter(customer::Column::BusinessId.eq(business_id))
            .exec(&txn)
            .await?;
        summary.record("customers", res.rows_affected);

        let res = business::Entity::delete_by_id(business_id).exec(&txn).await?;
        summary.record("businesses", res.rows_affected);

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BusinessDeleted {
                business_id,
                rows_removed: summary.total,
            })
            .await;

        info!(
            "Deleted business {} and {} rows in total",
            business_id, summary.total
        );
        Ok(summary)
    }

    /// Counts and money totals for one business
    #[instrument(skip(self))]
    pub async fn dashboard(&self, business: &business::Model) -> Result<Dashboard, ServiceError> {
        let db = &*self.db;
        let business_id = business.id;

        let products = product::Entity::find()
            .filter(product::Column::BusinessId.eq(business_id))
            .count(db)
            .await?;
        let low_stock_products = product::Entity::find()
            .filter(product::Column::BusinessId.eq(business_id))
            .filter(product::Column::IsActive.eq(true))
            .filter(
                Expr::col(product::Column::StockQuantity)
                    .lte(Expr::col(product::Column::ReorderLevel)),
            )
            .count(db)
            .await?;
        let customers = customer::Entity::find()
            .filter(customer::Column::BusinessId.eq(business_id))
            .count(db)
            .await?;
        let suppliers = supplier::Entity::find()
            .filter(supplier::Column::BusinessId.eq(business_id))
            .count(db)
            .await?;
        let employees = employee::Entity::find()
            .filter(employee::Column::BusinessId.eq(business_id))
            .filter(employee::Column::IsActive.eq(true))
            .count(db)
            .await?;
        let active_productions = production::Entity::find()
            .filter(production::Column::BusinessId.eq(business_id))
            .filter(production::Column::Status.is_in([
                production::ProductionStatus::Planned,
                production::ProductionStatus::InProgress,
            ]))
            .count(db)
            .await?;
        let pending_deliveries = delivery::Entity::find()
            .filter(delivery::Column::BusinessId.eq(business_id))
            .filter(delivery::Column::Status.is_in([
                delivery::DeliveryStatus::Scheduled,
                delivery::DeliveryStatus::InTransit,
            ]))
            .count(db)
            .await?;

        let open_debts = debt::Entity::find()
            .filter(debt::Column::BusinessId.eq(business_id))
            .filter(debt::Column::Status.is_in([
                debt::DebtStatus::Outstanding,
                debt::DebtStatus::PartiallyPaid,
            ]))
            .all(db)
            .await?;
        let (receivables_outstanding, payables_outstanding) =
            open_debts
                .iter()
                .fold((Decimal::ZERO, Decimal::ZERO), |(r, p), d| match d.direction {
                    debt::DebtDirection::Receivable => (r + d.balance(), p),
                    debt::DebtDirection::Payable => (r, p + d.balance()),
                });

        let funded: Decimal = funding_source::Entity::find()
            .filter(funding_source::Column::BusinessId.eq(business_id))
            .all(db)
            .await?
            .iter()
            .map(|f| f.amount)
            .sum();
        let drawn: Decimal = expenditure::Entity::find()
            .filter(expenditure::Column::BusinessId.eq(business_id))
            .filter(expenditure::Column::FundingSourceId.is_not_null())
            .all(db)
            .await?
            .iter()
            .map(|e| e.amount)
            .sum();

        let today = Utc::now().date_naive();
        let start = today.and_time(NaiveTime::MIN).and_utc();
        let end = today
            .checked_add_days(Days::new(1))
            .unwrap_or(today)
            .and_time(NaiveTime::MIN)
            .and_utc();
        let todays_sales = sale::Entity::find()
            .filter(sale::Column::BusinessId.eq(business_id))
            .filter(sale::Column::Status.eq(sale::SaleStatus::Completed))
            .filter(sale::Column::SoldAt.gte(start))
            .filter(sale::Column::SoldAt.lt(end))
            .all(db)
            .await?;

        Ok(Dashboard {
            business_id,
            currency: business.currency.clone(),
            products,
            low_stock_products,
            customers,
            suppliers,
            employees,
            active_productions,
            pending_deliveries,
            receivables_outstanding,
            payables_outstanding,
            funding_remaining: funded - drawn,
            sales_today: todays_sales.iter().map(|s| s.total).sum(),
            sales_today_count: todays_sales.len() as u64,
        })
    }
}
