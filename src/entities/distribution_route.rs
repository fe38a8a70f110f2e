use chrono::{DateTime, Utc, Weekday};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "distribution_routes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Comma separated weekday codes (`mon,wed,fri`); empty means any day
    pub delivery_days: String,
    pub driver_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn weekdays(&self) -> Vec<Weekday> {
        parse_delivery_days(&self.delivery_days).unwrap_or_default()
    }

    pub fn runs_on(&self, day: Weekday) -> bool {
        let days = self.weekdays();
        days.is_empty() || days.contains(&day)
    }
}

pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// Parses `mon,wed` style lists. Returns the first unknown code on failure.
pub fn parse_delivery_days(raw: &str) -> Result<Vec<Weekday>, String> {
    let mut days = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let day = match code.to_ascii_lowercase().as_str() {
            "mon" => Weekday::Mon,
            "tue" => Weekday::Tue,
            "wed" => Weekday::Wed,
            "thu" => Weekday::Thu,
            "fri" => Weekday::Fri,
            "sat" => Weekday::Sat,
            "sun" => Weekday::Sun,
            _ => return Err(code.to_string()),
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }
    days.sort_by_key(|d| d.num_days_from_monday());
    Ok(days)
}

/// Canonical storage form of a weekday set
pub fn format_delivery_days(days: &[Weekday]) -> String {
    let mut sorted = days.to_vec();
    sorted.sort_by_key(|d| d.num_days_from_monday());
    sorted.dedup();
    sorted
        .into_iter()
        .map(weekday_code)
        .collect::<Vec<_>>()
        .join(",")
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
        belongs_to = "super::employee::Entity",
        from = "Column::DriverId",
        to = "super::employee::Column::Id"
    )]
    Driver,
    #[sea_orm(has_many = "super::delivery::Entity")]
    Deliveries,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl Related<super::delivery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deliveries.def()
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

    #[test]
    fn delivery_days_round_trip_in_canonical_order() {
        let days = parse_delivery_days("fri, Mon,wed,mon").unwrap();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert_eq!(format_delivery_days(&days), "mon,wed,fri");
    }

    #[test]
    fn unknown_day_code_is_reported() {
        assert_eq!(parse_delivery_days("mon,funday"), Err("funday".to_string()));
    }

    #[test]
    fn empty_delivery_days_means_every_day() {
        assert_eq!(parse_delivery_days("").unwrap(), Vec::<Weekday>::new());
    }
}
