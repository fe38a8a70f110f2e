use super::funding::{find_source, spent_from};
use crate::services::suppliers::SupplierService;
use crate::services::validators::{validate_not_blank, validate_positive_decimal};
use crate::services::{clean, Page};
use crate::{
    entities::{expenditure, funding_source},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateExpenditureInput {
    pub funding_source_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    /// rent, salaries, inventory, utilities, transport, other, ...
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub category: String,
    #[validate(length(min = 1, max = 500), custom = "validate_not_blank")]
    pub description: String,
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Decimal,
    /// Defaults to today
    pub expense_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateExpenditureInput {
    pub funding_source_id: Option<Uuid>,
    /// Stop drawing from any funding source
    #[serde(default)]
    pub clear_funding_source: bool,
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 500), custom = "validate_not_blank")]
    pub description: Option<String>,
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Option<Decimal>,
    pub expense_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenditureFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
    pub funding_source_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSourceTotal {
    /// `None` groups expenditures paid without a funding source
    pub funding_source_id: Option<Uuid>,
    pub name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenditureSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total: Decimal,
    pub count: u64,
    pub by_category: Vec<CategoryTotal>,
    pub by_funding_source: Vec<FundingSourceTotal>,
}

fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Totals per category, largest first, ties by name
pub(crate) fn totals_by_category(expenditures: &[expenditure::Model]) -> Vec<CategoryTotal> {
    let mut grouped: BTreeMap<&str, (Decimal, u64)> = BTreeMap::new();
    for e in expenditures {
        let entry = grouped.entry(e.category.as_str()).or_default();
        entry.0 += e.amount;
        entry.1 += 1;
    }
    let mut totals: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    totals
}

/// Checks `amount` fits in what the source has left, not counting `excluding`
async fn ensure_funds<C: ConnectionTrait>(
    conn: &C,
    source: &funding_source::Model,
    amount: Decimal,
    excluding: Option<Uuid>,
) -> Result<(), ServiceError> {
    let remaining = source.amount - spent_from(conn, source.id, excluding).await?;
    if amount > remaining {
        return Err(ServiceError::InsufficientFunds(format!(
            "{} has {} remaining, {} requested",
            source.name, remaining, amount
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ExpenditureService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ExpenditureService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        expenditure_id: Uuid,
    ) -> Result<expenditure::Model, ServiceError> {
        expenditure::Entity::find_by_id(expenditure_id)
            .filter(expenditure::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Expenditure {} not found", expenditure_id))
            })
    }

    /// Records an expense. Drawing more than a funding source has left fails
    /// with `InsufficientFunds`.
    #[instrument(skip(self, input))]
    pub async fn create_expenditure(
        &self,
        business_id: Uuid,
        input: CreateExpenditureInput,
    ) -> Result<expenditure::Model, ServiceError> {
        input.validate()?;
        if let Some(supplier_id) = input.supplier_id {
            SupplierService::find_in_business(&*self.db, business_id, supplier_id).await?;
        }

        let txn = self.db.begin().await?;
        if let Some(source_id) = input.funding_source_id {
            let source = find_source(&txn, business_id, source_id).await?;
            ensure_funds(&txn, &source, input.amount, None).await?;
        }

        let expenditure = expenditure::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            funding_source_id: Set(input.funding_source_id),
            supplier_id: Set(input.supplier_id),
            category: Set(normalize_category(&input.category)),
            description: Set(input.description.trim().to_string()),
            amount: Set(input.amount),
            expense_date: Set(input
                .expense_date
                .unwrap_or_else(|| Utc::now().date_naive())),
            payment_method: Set(clean(input.payment_method)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ExpenditureRecorded {
                business_id,
                expenditure_id: expenditure.id,
                amount: expenditure.amount,
            })
            .await;

        info!("Recorded expenditure: {}", expenditure.id);
        Ok(expenditure)
    }

    #[instrument(skip(self))]
    pub async fn get_expenditure(
        &self,
        business_id: Uuid,
        expenditure_id: Uuid,
    ) -> Result<expenditure::Model, ServiceError> {
        Self::find_in_business(&*self.db, business_id, expenditure_id).await
    }

    /// Newest first; both date bounds inclusive
    #[instrument(skip(self))]
    pub async fn list_expenditures(
        &self,
        business_id: Uuid,
        filter: &ExpenditureFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<expenditure::Model>, ServiceError> {
        let mut query =
            expenditure::Entity::find().filter(expenditure::Column::BusinessId.eq(business_id));
        if let Some(from) = filter.from {
            query = query.filter(expenditure::Column::ExpenseDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expenditure::Column::ExpenseDate.lte(to));
        }
        if let Some(category) = filter.category.as_deref() {
            query = query.filter(expenditure::Column::Category.eq(normalize_category(category)));
        }
        if let Some(source_id) = filter.funding_source_id {
            query = query.filter(expenditure::Column::FundingSourceId.eq(source_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(expenditure::Column::SupplierId.eq(supplier_id));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(expenditure::Column::ExpenseDate)
            .order_by_desc(expenditure::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    /// Re-checks funds against the target source, counting only the change
    #[instrument(skip(self, input))]
    pub async fn update_expenditure(
        &self,
        business_id: Uuid,
        expenditure_id: Uuid,
        input: UpdateExpenditureInput,
    ) -> Result<expenditure::Model, ServiceError> {
        input.validate()?;
        if let Some(supplier_id) = input.supplier_id {
            SupplierService::find_in_business(&*self.db, business_id, supplier_id).await?;
        }

        let txn = self.db.begin().await?;
        let existing = Self::find_in_business(&txn, business_id, expenditure_id).await?;

        let amount = input.amount.unwrap_or(existing.amount);
        let source_id = if input.clear_funding_source {
            None
        } else {
            input.funding_source_id.or(existing.funding_source_id)
        };
        if let Some(source_id) = source_id {
            let source = find_source(&txn, business_id, source_id).await?;
            ensure_funds(&txn, &source, amount, Some(expenditure_id)).await?;
        }

        let mut active: expenditure::ActiveModel = existing.into();
        active.amount = Set(amount);
        active.funding_source_id = Set(source_id);
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(Some(supplier_id));
        }
        if let Some(category) = input.category {
            active.category = Set(normalize_category(&category));
        }
        if let Some(description) = input.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(expense_date) = input.expense_date {
            active.expense_date = Set(expense_date);
        }
        if let Some(payment_method) = input.payment_method {
            active.payment_method = Set(clean(Some(payment_method)));
        }
        let expenditure = active.update(&txn).await?;
        txn.commit().await?;

        info!("Updated expenditure: {}", expenditure_id);
        Ok(expenditure)
    }

    #[instrument(skip(self))]
    pub async fn delete_expenditure(
        &self,
        business_id: Uuid,
        expenditure_id: Uuid,
    ) -> Result<(), ServiceError> {
        Self::find_in_business(&*self.db, business_id, expenditure_id).await?;
        expenditure::Entity::delete_by_id(expenditure_id)
            .exec(&*self.db)
            .await?;
        info!("Deleted expenditure: {}", expenditure_id);
        Ok(())
    }

    /// Totals by category and by funding source for `from..=to`
    #[instrument(skip(self))]
    pub async fn expenditure_summary(
        &self,
        business_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ExpenditureSummary, ServiceError> {
        if from > to {
            return Err(ServiceError::ValidationError(
                "from must not be after to".to_string(),
            ));
        }
        let expenditures = expenditure::Entity::find()
            .filter(expenditure::Column::BusinessId.eq(business_id))
            .filter(expenditure::Column::ExpenseDate.gte(from))
            .filter(expenditure::Column::ExpenseDate.lte(to))
            .all(&*self.db)
            .await?;

        let names: HashMap<Uuid, String> = funding_source::Entity::find()
            .filter(funding_source::Column::BusinessId.eq(business_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let mut per_source: HashMap<Option<Uuid>, Decimal> = HashMap::new();
        for e in &expenditures {
            *per_source.entry(e.funding_source_id).or_default() += e.amount;
        }
        let mut by_funding_source: Vec<FundingSourceTotal> = per_source
            .into_iter()
            .map(|(funding_source_id, total)| FundingSourceTotal {
                name: funding_source_id
                    .and_then(|id| names.get(&id).cloned())
                    .unwrap_or_else(|| "Unfunded".to_string()),
                funding_source_id,
                total,
            })
            .collect();
        by_funding_source.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

        Ok(ExpenditureSummary {
            from,
            to,
            total: expenditures.iter().map(|e| e.amount).sum(),
            count: expenditures.len() as u64,
            by_category: totals_by_category(&expenditures),
            by_funding_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn expense(category: &str, amount: Decimal) -> expenditure::Model {
        expenditure::Model {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            funding_source_id: None,
            supplier_id: None,
            category: category.into(),
            description: "x".into(),
            amount,
            expense_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            payment_method: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn category_totals_sorted_by_amount() {
        let totals = totals_by_category(&[
            expense("rent", dec!(500)),
            expense("transport", dec!(20)),
            expense("transport", dec!(30)),
            expense("utilities", dec!(50)),
        ]);
        assert_eq!(totals[0].category, "rent");
        assert_eq!(totals[1].category, "transport");
        assert_eq!(totals[1].total, dec!(50));
        assert_eq!(totals[1].count, 2);
        assert_eq!(totals[2].category, "utilities");
    }

    #[test]
    fn categories_are_normalized() {
        assert_eq!(normalize_category("  Rent "), "rent");
    }
}
