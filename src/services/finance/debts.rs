use crate::services::customers::CustomerService;
use crate::services::suppliers::SupplierService;
use crate::services::validators::validate_positive_decimal;
use crate::services::{clean, Page};
use crate::{
    entities::{
        debt::{self, DebtDirection, DebtStatus},
        debt_payment,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateDebtInput {
    pub direction: DebtDirection,
    /// Receivables only
    pub customer_id: Option<Uuid>,
    /// Payables only
    pub supplier_id: Option<Uuid>,
    /// Defaults to the customer's or supplier's name
    #[validate(length(min = 1, max = 200))]
    pub counterparty_name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RecordPaymentInput {
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Decimal,
    /// Defaults to today
    pub paid_on: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebtFilter {
    pub direction: Option<DebtDirection>,
    pub status: Option<DebtStatus>,
    /// Open debts past their due date
    pub overdue: Option<bool>,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtDetail {
    #[serde(flatten)]
    pub debt: debt::Model,
    pub balance: Decimal,
    pub payments: Vec<debt_payment::Model>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub receivable_outstanding: Decimal,
    pub receivable_count: u64,
    pub payable_outstanding: Decimal,
    pub payable_count: u64,
    pub overdue_count: u64,
    pub overdue_amount: Decimal,
}

impl DebtSummary {
    pub fn compute(debts: &[debt::Model], today: NaiveDate) -> Self {
        let mut summary = Self::default();
        for debt in debts.iter().filter(|d| d.status.is_open()) {
            match debt.direction {
                DebtDirection::Receivable => {
                    summary.receivable_outstanding += debt.balance();
                    summary.receivable_count += 1;
                }
                DebtDirection::Payable => {
                    summary.payable_outstanding += debt.balance();
                    summary.payable_count += 1;
                }
            }
            if debt.is_overdue(today) {
                summary.overdue_count += 1;
                summary.overdue_amount += debt.balance();
            }
        }
        summary
    }
}

#[derive(Clone)]
pub struct DebtService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DebtService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        debt_id: Uuid,
    ) -> Result<debt::Model, ServiceError> {
        debt::Entity::find_by_id(debt_id)
            .filter(debt::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Debt {} not found", debt_id)))
    }

    /// Opens a receivable or payable
    #[instrument(skip(self, input))]
    pub async fn create_debt(
        &self,
        business_id: Uuid,
        input: CreateDebtInput,
    ) -> Result<debt::Model, ServiceError> {
        input.validate()?;

        let linked_name = match input.direction {
            DebtDirection::Receivable => {
                if input.supplier_id.is_some() {
                    return Err(ServiceError::ValidationError(
                        "A receivable is owed by a customer, not a supplier".to_string(),
                    ));
                }
                match input.customer_id {
                    Some(id) => Some(
                        CustomerService::find_in_business(&*self.db, business_id, id)
                            .await?
                            .name,
                    ),
                    None => None,
                }
            }
            DebtDirection::Payable => {
                if input.customer_id.is_some() {
                    return Err(ServiceError::ValidationError(
                        "A payable is owed to a supplier or lender, not a customer".to_string(),
                    ));
                }
                match input.supplier_id {
                    Some(id) => Some(
                        SupplierService::find_in_business(&*self.db, business_id, id)
                            .await?
                            .name,
                    ),
                    None => None,
                }
            }
        };
        let counterparty_name = clean(input.counterparty_name)
            .or(linked_name)
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "counterparty_name is required without a customer or supplier".to_string(),
                )
            })?;

        let debt = debt::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            direction: Set(input.direction),
            customer_id: Set(input.customer_id),
            supplier_id: Set(input.supplier_id),
            sale_id: Set(None),
            counterparty_name: Set(counterparty_name),
            description: Set(clean(input.description)),
            amount: Set(input.amount),
            amount_paid: Set(Decimal::ZERO),
            due_date: Set(input.due_date),
            status: Set(DebtStatus::Outstanding),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::DebtCreated {
                business_id,
                debt_id: debt.id,
            })
            .await;

        info!("Created {} debt {}", debt.direction.to_value(), debt.id);
        Ok(debt)
    }

    #[instrument(skip(self))]
    pub async fn get_debt(
        &self,
        business_id: Uuid,
        debt_id: Uuid,
    ) -> Result<DebtDetail, ServiceError> {
        let debt = Self::find_in_business(&*self.db, business_id, debt_id).await?;
        let payments = debt_payment::Entity::find()
            .filter(debt_payment::Column::DebtId.eq(debt_id))
            .order_by_asc(debt_payment::Column::PaidOn)
            .order_by_asc(debt_payment::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(DebtDetail {
            balance: debt.balance(),
            debt,
            payments,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_debts(
        &self,
        business_id: Uuid,
        filter: &DebtFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<debt::Model>, ServiceError> {
        let mut query = debt::Entity::find().filter(debt::Column::BusinessId.eq(business_id));
        if let Some(direction) = filter.direction {
            query = query.filter(debt::Column::Direction.eq(direction));
        }
        if let Some(status) = filter.status {
            query = query.filter(debt::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(debt::Column::CustomerId.eq(customer_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(debt::Column::SupplierId.eq(supplier_id));
        }
        if filter.overdue == Some(true) {
            query = query
                .filter(
                    debt::Column::Status
                        .is_in([DebtStatus::Outstanding, DebtStatus::PartiallyPaid]),
                )
                .filter(debt::Column::DueDate.lt(Utc::now().date_naive()));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(debt::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    /// Applies a payment no larger than the outstanding balance. The balance
    /// check and the increment are one conditional UPDATE, so concurrent
    /// payments cannot overpay a debt.
    #[instrument(skip(self, input))]
    pub async fn record_payment(
        &self,
        business_id: Uuid,
        debt_id: Uuid,
        input: RecordPaymentInput,
    ) -> Result<DebtDetail, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;
        Self::find_in_business(&txn, business_id, debt_id).await?;

        let applied = debt::Entity::update_many()
            .col_expr(
                debt::Column::AmountPaid,
                Expr::col(debt::Column::AmountPaid).add(input.amount),
            )
            .col_expr(debt::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(debt::Column::Id.eq(debt_id))
            .filter(debt::Column::BusinessId.eq(business_id))
            .filter(
                debt::Column::Status.is_in([DebtStatus::Outstanding, DebtStatus::PartiallyPaid]),
            )
            .filter(
                Expr::col(debt::Column::AmountPaid)
                    .lte(Expr::col(debt::Column::Amount).sub(input.amount)),
            )
            .exec(&txn)
            .await?;

        let debt = Self::find_in_business(&txn, business_id, debt_id).await?;
        if applied.rows_affected == 0 {
            if !debt.status.is_open() {
                return Err(ServiceError::InvalidStatus(format!(
                    "Debt is {} and accepts no payments",
                    debt.status.to_value()
                )));
            }
            return Err(ServiceError::ValidationError(format!(
                "Payment {} exceeds the outstanding balance {}",
                input.amount,
                debt.balance()
            )));
        }

        debt_payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            debt_id: Set(debt_id),
            amount: Set(input.amount),
            paid_on: Set(input.paid_on.unwrap_or_else(|| Utc::now().date_naive())),
            note: Set(clean(input.note)),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let status = DebtStatus::from_amounts(debt.amount, debt.amount_paid);
        if status != debt.status {
            let mut active: debt::ActiveModel = debt.into();
            active.status = Set(status);
            active.update(&txn).await?;
        }
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::DebtPaymentRecorded {
                debt_id,
                amount: input.amount,
                settled: status == DebtStatus::Paid,
            })
            .await;

        info!("Recorded payment of {} on debt {}", input.amount, debt_id);
        self.get_debt(business_id, debt_id).await
    }

    /// Gives up on the remaining balance of an open debt
    #[instrument(skip(self))]
    pub async fn write_off(
        &self,
        business_id: Uuid,
        debt_id: Uuid,
    ) -> Result<debt::Model, ServiceError> {
        let debt = Self::find_in_business(&*self.db, business_id, debt_id).await?;
        if !debt.status.is_open() {
            return Err(ServiceError::InvalidStatus(format!(
                "Only open debts can be written off (status is {})",
                debt.status.to_value()
            )));
        }
        let mut active: debt::ActiveModel = debt.into();
        active.status = Set(DebtStatus::WrittenOff);
        let debt = active.update(&*self.db).await?;
        info!("Wrote off debt {}", debt_id);
        Ok(debt)
    }

    /// Debts with recorded payments are kept for the audit trail
    #[instrument(skip(self))]
    pub async fn delete_debt(&self, business_id: Uuid, debt_id: Uuid) -> Result<(), ServiceError> {
        Self::find_in_business(&*self.db, business_id, debt_id).await?;
        let payments = debt_payment::Entity::find()
            .filter(debt_payment::Column::DebtId.eq(debt_id))
            .count(&*self.db)
            .await?;
        if payments > 0 {
            return Err(ServiceError::Conflict(format!(
                "Debt has {} payments and cannot be deleted",
                payments
            )));
        }
        debt::Entity::delete_by_id(debt_id).exec(&*self.db).await?;
        info!("Deleted debt {}", debt_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn debt_summary(&self, business_id: Uuid) -> Result<DebtSummary, ServiceError> {
        let debts = debt::Entity::find()
            .filter(debt::Column::BusinessId.eq(business_id))
            .filter(
                debt::Column::Status.is_in([DebtStatus::Outstanding, DebtStatus::PartiallyPaid]),
            )
            .all(&*self.db)
            .await?;
        Ok(DebtSummary::compute(&debts, Utc::now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn debt(
        direction: DebtDirection,
        amount: Decimal,
        paid: Decimal,
        due: Option<NaiveDate>,
    ) -> debt::Model {
        debt::Model {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            direction,
            customer_id: None,
            supplier_id: None,
            sale_id: None,
            counterparty_name: "Acme".into(),
            description: None,
            amount,
            amount_paid: paid,
            due_date: due,
            status: DebtStatus::from_amounts(amount, paid),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_splits_directions_and_counts_overdue() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let debts = vec![
            debt(DebtDirection::Receivable, dec!(100), dec!(40), Some(yesterday)),
            debt(DebtDirection::Receivable, dec!(50), dec!(0), None),
            debt(DebtDirection::Payable, dec!(200), dec!(0), Some(today)),
            debt(DebtDirection::Payable, dec!(10), dec!(10), Some(yesterday)),
        ];
        let summary = DebtSummary::compute(&debts, today);
        assert_eq!(summary.receivable_outstanding, dec!(110));
        assert_eq!(summary.receivable_count, 2);
        assert_eq!(summary.payable_outstanding, dec!(200));
        assert_eq!(summary.payable_count, 1);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.overdue_amount, dec!(60));
    }
}
