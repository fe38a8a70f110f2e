use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub business_id: Uuid,
    pub category_id: Option<Uuid>,

    pub name: String,

    /// Unique per business when present
    pub sku: Option<String>,

    pub description: Option<String>,

    /// Unit of measure (unit, kg, litre, ...)
    pub unit: String,

    /// Selling price
    pub price: Decimal,

    /// Cost price (used for margin calculations)
    pub cost_price: Decimal,

    pub stock_quantity: Decimal,

    /// Stock at or below this level counts as low stock
    pub reorder_level: Decimal,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_low_stock(&self) -> bool {
        self.is_active && self.stock_quantity <= self.reorder_level
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
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItems,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
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
            if self.is_active.is_not_set() {
                self.is_active = Set(true);
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
    use super::*;
    use rust_decimal_macros::dec;

    fn product(stock: Decimal, reorder: Decimal, active: bool) -> Model {
        Model {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            category_id: None,
            name: "Flour".into(),
            sku: None,
            description: None,
            unit: "kg".into(),
            price: dec!(2),
            cost_price: dec!(1),
            stock_quantity: stock,
            reorder_level: reorder,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_inclusive_of_reorder_level() {
        assert!(product(dec!(5), dec!(5), true).is_low_stock());
        assert!(!product(dec!(5.5), dec!(5), true).is_low_stock());
        assert!(!product(dec!(0), dec!(5), false).is_low_stock());
    }
}
