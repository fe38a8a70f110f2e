use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl DeliveryStatus {
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Scheduled, InTransit)
                | (InTransit, Delivered)
                | (Scheduled, Cancelled)
                | (InTransit, Cancelled)
                | (Scheduled, Failed)
                | (InTransit, Failed)
        )
    }

    pub fn is_pending(self) -> bool {
        matches!(self, DeliveryStatus::Scheduled | DeliveryStatus::InTransit)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deliveries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub client_id: Uuid,
    pub route_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub status: DeliveryStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn value(&self) -> Decimal {
        self.quantity * self.unit_price
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
    #[sea_orm(
        belongs_to = "super::distribution_client::Entity",
        from = "Column::ClientId",
        to = "super::distribution_client::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::distribution_route::Entity",
        from = "Column::RouteId",
        to = "super::distribution_route::Column::Id"
    )]
    Route,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl Related<super::distribution_client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::distribution_route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
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
                self.status = Set(DeliveryStatus::Scheduled);
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
    use super::DeliveryStatus::*;

    #[test]
    fn terminal_delivery_states_are_final() {
        for terminal in [Delivered, Cancelled, Failed] {
            for next in [Scheduled, InTransit, Delivered, Cancelled, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
        assert!(Scheduled.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(Delivered));
        assert!(!Scheduled.can_transition_to(Delivered));
        assert!(!InTransit.can_transition_to(Scheduled));
    }
}
