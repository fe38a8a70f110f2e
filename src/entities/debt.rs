use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DebtDirection {
    /// Owed to the business
    #[sea_orm(string_value = "receivable")]
    Receivable,
    /// Owed by the business
    #[sea_orm(string_value = "payable")]
    Payable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    #[sea_orm(string_value = "outstanding")]
    Outstanding,
    #[sea_orm(string_value = "partially_paid")]
    PartiallyPaid,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "written_off")]
    WrittenOff,
}

impl DebtStatus {
    pub fn from_amounts(amount: Decimal, amount_paid: Decimal) -> Self {
        if amount_paid >= amount {
            DebtStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            DebtStatus::PartiallyPaid
        } else {
            DebtStatus::Outstanding
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, DebtStatus::Outstanding | DebtStatus::PartiallyPaid)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub direction: DebtDirection,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    /// Sale whose unpaid balance opened this receivable
    pub sale_id: Option<Uuid>,
    pub counterparty_name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub amount_paid: Decimal,
    pub due_date: Option<NaiveDate>,
    pub status: DebtStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn balance(&self) -> Decimal {
        (self.amount - self.amount_paid).max(Decimal::ZERO)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.map_or(false, |due| due < today)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::business::Entity",
        from = "Column::BusinessId",
        to = "super::business::Column::Id"
    )]
    Business,
    #[sea_orm(has_many = "super::debt_payment::Entity")]
    Payments,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl Related<super::debt_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_tracks_payments() {
        assert_eq!(DebtStatus::from_amounts(dec!(100), dec!(0)), DebtStatus::Outstanding);
        assert_eq!(DebtStatus::from_amounts(dec!(100), dec!(40)), DebtStatus::PartiallyPaid);
        assert_eq!(DebtStatus::from_amounts(dec!(100), dec!(100)), DebtStatus::Paid);
    }
}
