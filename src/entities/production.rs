use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    #[sea_orm(string_value = "planned")]
    Planned,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ProductionStatus {
    /// planned -> in_progress -> completed; planned or in_progress -> cancelled
    pub fn can_transition_to(self, next: ProductionStatus) -> bool {
        use ProductionStatus::*;
        matches!(
            (self, next),
            (Planned, InProgress)
                | (InProgress, Completed)
                | (Planned, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    /// Completed and cancelled batches accept no new children
    pub fn is_closed(self) -> bool {
        matches!(self, ProductionStatus::Completed | ProductionStatus::Cancelled)
    }
}

/// A production batch
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    /// Product being made; outputs default to it
    pub product_id: Option<Uuid>,
    pub batch_number: String,
    pub name: String,
    pub status: ProductionStatus,
    pub planned_quantity: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::business::Entity",
        from = "Column::BusinessId",
        to = "super::business::Column::Id"
    )]
    Business,
    #[sea_orm(has_many = "super::production_stage::Entity")]
    Stages,
    #[sea_orm(has_many = "super::production_resource::Entity")]
    Resources,
    #[sea_orm(has_many = "super::production_labor::Entity")]
    Labor,
    #[sea_orm(has_many = "super::production_output::Entity")]
    Outputs,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl Related<super::production_stage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stages.def()
    }
}

impl Related<super::production_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resources.def()
    }
}

impl Related<super::production_labor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Labor.def()
    }
}

impl Related<super::production_output::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Outputs.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert {
            if self.status.is_not_set() {
                self.status = Set(ProductionStatus::Planned);
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::ProductionStatus::*;

    #[test]
    fn batches_move_forward_only() {
        assert!(Planned.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Planned.can_transition_to(Cancelled));
        assert!(!Planned.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Planned));
    }
}
