//! Read-only aggregates over sales and expenditures. Voided sales never count.

use super::finance::expenditures::{totals_by_category, CategoryTotal};
use super::sales::date_range_bounds;
use crate::{
    entities::{
        expenditure,
        sale::{self, PaymentMethod, SaleStatus},
        sale_item,
    },
    errors::ServiceError,
};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Condition, ConditionalStatement, Query},
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Select,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::instrument;
use uuid::Uuid;

/// Longest range a single report may cover, in days
pub const MAX_REPORT_DAYS: i64 = 366;
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportRange {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.from > self.to {
            return Err(ServiceError::ValidationError(
                "from must not be after to".to_string(),
            ));
        }
        let days = (self.to - self.from).num_days() + 1;
        if days > MAX_REPORT_DAYS {
            return Err(ServiceError::ValidationError(format!(
                "Report range covers {} days; the limit is {}",
                days, MAX_REPORT_DAYS
            )));
        }
        Ok(())
    }

    /// Every day from `from` to `to`, inclusive
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.from;
        while day <= self.to {
            days.push(day);
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub transactions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodTotal {
    pub payment_method: PaymentMethod,
    pub total: Decimal,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub transaction_count: u64,
    pub gross_revenue: Decimal,
    pub discounts: Decimal,
    pub net_revenue: Decimal,
    pub cost_of_goods: Decimal,
    pub gross_profit: Decimal,
    pub average_sale: Decimal,
    pub items_sold: Decimal,
    pub daily: Vec<DailyRevenue>,
    pub top_products: Vec<ProductRevenue>,
    pub by_payment_method: Vec<PaymentMethodTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: Decimal,
    pub cost_of_goods: Decimal,
    pub gross_profit: Decimal,
    pub expenditures: Vec<CategoryTotal>,
    pub total_expenditures: Decimal,
    pub net_profit: Decimal,
}

/// Builds the sales report from completed sales and their items
pub fn summarize_sales(
    range: ReportRange,
    sales: &[sale::Model],
    items: &[sale_item::Model],
    top_limit: usize,
) -> SalesReport {
    let gross_revenue: Decimal = sales.iter().map(|s| s.subtotal).sum();
    let discounts: Decimal = sales.iter().map(|s| s.discount).sum();
    let net_revenue: Decimal = sales.iter().map(|s| s.total).sum();
    let cost_of_goods: Decimal = items.iter().map(|i| i.line_cost()).sum();
    let items_sold: Decimal = items.iter().map(|i| i.quantity).sum();
    let transaction_count = sales.len() as u64;
    let average_sale = if transaction_count > 0 {
        (net_revenue / Decimal::from(transaction_count)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let mut per_day: BTreeMap<NaiveDate, (Decimal, u64)> = range
        .days()
        .into_iter()
        .map(|d| (d, (Decimal::ZERO, 0)))
        .collect();
    for s in sales {
        if let Some(entry) = per_day.get_mut(&s.sold_at.date_naive()) {
            entry.0 += s.total;
            entry.1 += 1;
        }
    }
    let daily = per_day
        .into_iter()
        .map(|(date, (revenue, transactions))| DailyRevenue {
            date,
            revenue,
            transactions,
        })
        .collect();

    let mut per_product: HashMap<Uuid, ProductRevenue> = HashMap::new();
    for item in items {
        let entry = per_product
            .entry(item.product_id)
            .or_insert_with(|| ProductRevenue {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: Decimal::ZERO,
                revenue: Decimal::ZERO,
            });
        entry.quantity += item.quantity;
        entry.revenue += item.line_total;
    }
    let mut top_products: Vec<ProductRevenue> = per_product.into_values().collect();
    top_products.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    top_products.truncate(top_limit);

    let mut per_method: HashMap<PaymentMethod, (Decimal, u64)> = HashMap::new();
    for s in sales {
        let entry = per_method.entry(s.payment_method).or_default();
        entry.0 += s.total;
        entry.1 += 1;
    }
    let mut by_payment_method: Vec<PaymentMethodTotal> = per_method
        .into_iter()
        .map(|(payment_method, (total, count))| PaymentMethodTotal {
            payment_method,
            total,
            count,
        })
        .collect();
    by_payment_method.sort_by(|a, b| b.total.cmp(&a.total));

    SalesReport {
        from: range.from,
        to: range.to,
        transaction_count,
        gross_revenue,
        discounts,
        net_revenue,
        cost_of_goods,
        gross_profit: net_revenue - cost_of_goods,
        average_sale,
        items_sold,
        daily,
        top_products,
        by_payment_method,
    }
}

fn completed_in_range(business_id: Uuid, range: ReportRange) -> Condition {
    let (start, end) = date_range_bounds(range.from, range.to);
    Condition::all()
        .add(sale::Column::BusinessId.eq(business_id))
        .add(sale::Column::Status.eq(SaleStatus::Completed))
        .add(sale::Column::SoldAt.gte(start))
        .add(sale::Column::SoldAt.lt(end))
}

/// Items of the sales matching `sales`. Matched by subquery so the statement
/// size does not grow with the number of sales.
fn items_of_sales(sales: Condition) -> Select<sale_item::Entity> {
    let sale_ids = Query::select()
        .column(sale::Column::Id)
        .from(sale::Entity)
        .cond_where(sales)
        .to_owned();
    sale_item::Entity::find().filter(sale_item::Column::SaleId.in_subquery(sale_ids))
}

#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn completed_sales(
        &self,
        business_id: Uuid,
        range: ReportRange,
    ) -> Result<(Vec<sale::Model>, Vec<sale_item::Model>), ServiceError> {
        let in_range = completed_in_range(business_id, range);
        let sales = sale::Entity::find()
            .filter(in_range.clone())
            .all(&*self.db)
            .await?;
        if sales.is_empty() {
            return Ok((sales, Vec::new()));
        }
        let items = items_of_sales(in_range).all(&*self.db).await?;
        Ok((sales, items))
    }

    #[instrument(skip(self))]
    pub async fn sales_report(
        &self,
        business_id: Uuid,
        range: ReportRange,
        top_limit: Option<usize>,
    ) -> Result<SalesReport, ServiceError> {
        range.validate()?;
        let (sales, items) = self.completed_sales(business_id, range).await?;
        Ok(summarize_sales(
            range,
            &sales,
            &items,
            top_limit.unwrap_or(DEFAULT_TOP_PRODUCTS).clamp(1, 50),
        ))
    }

    #[instrument(skip(self))]
    pub async fn profit_and_loss(
        &self,
        business_id: Uuid,
        range: ReportRange,
    ) -> Result<ProfitAndLoss, ServiceError> {
        range.validate()?;
        let (sales, items) = self.completed_sales(business_id, range).await?;
        let expenditures = expenditure::Entity::find()
            .filter(expenditure::Column::BusinessId.eq(business_id))
            .filter(expenditure::Column::ExpenseDate.gte(range.from))
            .filter(expenditure::Column::ExpenseDate.lte(range.to))
            .all(&*self.db)
            .await?;

        let revenue: Decimal = sales.iter().map(|s| s.total).sum();
        let cost_of_goods: Decimal = items.iter().map(|i| i.line_cost()).sum();
        let gross_profit = revenue - cost_of_goods;
        let total_expenditures: Decimal = expenditures.iter().map(|e| e.amount).sum();

        Ok(ProfitAndLoss {
            from: range.from,
            to: range.to,
            revenue,
            cost_of_goods,
            gross_profit,
            expenditures: totals_by_category(&expenditures),
            total_expenditures,
            net_profit: gross_profit - total_expenditures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sale::PaymentStatus;
    use chrono::{NaiveTime, Utc};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sale_on(
        date: NaiveDate,
        subtotal: Decimal,
        discount: Decimal,
        method: PaymentMethod,
    ) -> sale::Model {
        sale::Model {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            customer_id: None,
            sale_number: "SAL-1".into(),
            subtotal,
            discount,
            total: subtotal - discount,
            amount_paid: subtotal - discount,
            payment_method: method,
            payment_status: PaymentStatus::Paid,
            status: SaleStatus::Completed,
            sold_at: date.and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap()).and_utc(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn item(
        sale: &sale::Model,
        product: Uuid,
        name: &str,
        qty: Decimal,
        price: Decimal,
        cost: Decimal,
    ) -> sale_item::Model {
        sale_item::Model {
            id: Uuid::new_v4(),
            sale_id: sale.id,
            product_id: product,
            product_name: name.into(),
            quantity: qty,
            unit_price: price,
            unit_cost: cost,
            line_total: qty * price,
        }
    }

    #[test]
    fn range_limits() {
        let range = |from, to| ReportRange { from, to };
        assert!(range(d(2025, 1, 2), d(2025, 1, 1)).validate().is_err());
        assert!(range(d(2024, 1, 1), d(2024, 12, 31)).validate().is_ok());
        assert!(range(d(2024, 1, 1), d(2025, 1, 1)).validate().is_err());
    }

    #[test]
    fn report_zero_fills_days_and_ranks_products() {
        let bread = Uuid::new_v4();
        let milk = Uuid::new_v4();
        let s1 = sale_on(d(2025, 3, 1), dec!(30), dec!(0), PaymentMethod::Cash);
        let s2 = sale_on(d(2025, 3, 3), dec!(20), dec!(5), PaymentMethod::MobileMoney);
        let items = vec![
            item(&s1, bread, "Bread", dec!(10), dec!(2), dec!(1)),
            item(&s1, milk, "Milk", dec!(5), dec!(2), dec!(1.5)),
            item(&s2, milk, "Milk", dec!(10), dec!(2), dec!(1.5)),
        ];
        let range = ReportRange {
            from: d(2025, 3, 1),
            to: d(2025, 3, 4),
        };
        let report = summarize_sales(range, &[s1, s2], &items, 5);

        assert_eq!(report.transaction_count, 2);
        assert_eq!(report.gross_revenue, dec!(50));
        assert_eq!(report.discounts, dec!(5));
        assert_eq!(report.net_revenue, dec!(45));
        assert_eq!(report.cost_of_goods, dec!(32.5));
        assert_eq!(report.gross_profit, dec!(12.5));
        assert_eq!(report.average_sale, dec!(22.5));
        assert_eq!(report.items_sold, dec!(25));

        assert_eq!(report.daily.len(), 4);
        assert_eq!(report.daily[0].revenue, dec!(30));
        assert_eq!(report.daily[1].revenue, dec!(0));
        assert_eq!(report.daily[2].revenue, dec!(15));
        assert_eq!(report.daily[3].transactions, 0);

        assert_eq!(report.top_products[0].product_name, "Milk");
        assert_eq!(report.top_products[0].revenue, dec!(30));
        assert_eq!(report.top_products[1].product_name, "Bread");
        assert_eq!(report.by_payment_method[0].payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn empty_range_reports_zeroes() {
        let range = ReportRange {
            from: d(2025, 1, 1),
            to: d(2025, 1, 1),
        };
        let report = summarize_sales(range, &[], &[], 5);
        assert_eq!(report.transaction_count, 0);
        assert_eq!(report.average_sale, Decimal::ZERO);
        assert_eq!(report.daily.len(), 1);
        assert!(report.top_products.is_empty());
    }

    #[test]
    fn item_lookup_binds_the_range_not_each_sale() {
        use sea_orm::{DbBackend, QueryTrait};

        let range = ReportRange {
            from: d(2024, 1, 1),
            to: d(2024, 12, 31),
        };
        let stmt = items_of_sales(completed_in_range(Uuid::new_v4(), range))
            .build(DbBackend::Sqlite);
        assert!(stmt.sql.contains("IN (SELECT"));
        assert_eq!(stmt.values.map(|v| v.0.len()), Some(4));
    }
}
