use crate::services::validators::{validate_not_blank, validate_positive_decimal};
use crate::services::{clean, Page};
use crate::{
    entities::{
        expenditure,
        funding_source::{self, FundingSourceType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateFundingSourceInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    pub source_type: FundingSourceType,
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Decimal,
    pub received_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateFundingSourceInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    pub source_type: Option<FundingSourceType>,
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Option<Decimal>,
    pub received_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Funding source with what has been drawn from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSourceView {
    #[serde(flatten)]
    pub source: funding_source::Model,
    pub spent: Decimal,
    pub remaining: Decimal,
}

impl FundingSourceView {
    fn new(source: funding_source::Model, spent: Decimal) -> Self {
        let remaining = source.amount - spent;
        Self {
            source,
            spent,
            remaining,
        }
    }
}

/// Total drawn from a funding source, optionally ignoring one expenditure
pub(crate) async fn spent_from<C: ConnectionTrait>(
    conn: &C,
    funding_source_id: Uuid,
    excluding: Option<Uuid>,
) -> Result<Decimal, ServiceError> {
    let mut query = expenditure::Entity::find()
        .filter(expenditure::Column::FundingSourceId.eq(funding_source_id));
    if let Some(id) = excluding {
        query = query.filter(expenditure::Column::Id.ne(id));
    }
    Ok(query.all(conn).await?.iter().map(|e| e.amount).sum())
}

pub(crate) async fn find_source<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    funding_source_id: Uuid,
) -> Result<funding_source::Model, ServiceError> {
    funding_source::Entity::find_by_id(funding_source_id)
        .filter(funding_source::Column::BusinessId.eq(business_id))
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Funding source {} not found", funding_source_id))
        })
}

#[derive(Clone)]
pub struct FundingService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl FundingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_funding_source(
        &self,
        business_id: Uuid,
        input: CreateFundingSourceInput,
    ) -> Result<FundingSourceView, ServiceError> {
        input.validate()?;

        let source = funding_source::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            source_type: Set(input.source_type),
            amount: Set(input.amount),
            received_on: Set(input.received_on),
            notes: Set(clean(input.notes)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::FundingRecorded {
                business_id,
                funding_source_id: source.id,
                amount: source.amount,
            })
            .await;

        info!("Recorded funding source: {}", source.id);
        Ok(FundingSourceView::new(source, Decimal::ZERO))
    }

    #[instrument(skip(self))]
    pub async fn get_funding_source(
        &self,
        business_id: Uuid,
        funding_source_id: Uuid,
    ) -> Result<FundingSourceView, ServiceError> {
        let source = find_source(&*self.db, business_id, funding_source_id).await?;
        let spent = spent_from(&*self.db, funding_source_id, None).await?;
        Ok(FundingSourceView::new(source, spent))
    }

    #[instrument(skip(self))]
    pub async fn list_funding_sources(
        &self,
        business_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Page<FundingSourceView>, ServiceError> {
        let query = funding_source::Entity::find()
            .filter(funding_source::Column::BusinessId.eq(business_id));
        let total = query.clone().count(&*self.db).await?;
        let sources = query
            .order_by_desc(funding_source::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        let ids: Vec<Uuid> = sources.iter().map(|s| s.id).collect();
        let mut spent: HashMap<Uuid, Decimal> = HashMap::new();
        if !ids.is_empty() {
            for e in expenditure::Entity::find()
                .filter(expenditure::Column::FundingSourceId.is_in(ids))
                .all(&*self.db)
                .await?
            {
                if let Some(source_id) = e.funding_source_id {
                    *spent.entry(source_id).or_default() += e.amount;
                }
            }
        }

        let items = sources
            .into_iter()
            .map(|s| {
                let drawn = spent.get(&s.id).copied().unwrap_or_default();
                FundingSourceView::new(s, drawn)
            })
            .collect();
        Ok(Page::new(items, total))
    }

    /// The amount may not drop below what has already been spent
    #[instrument(skip(self, input))]
    pub async fn update_funding_source(
        &self,
        business_id: Uuid,
        funding_source_id: Uuid,
        input: UpdateFundingSourceInput,
    ) -> Result<FundingSourceView, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;
        let existing = find_source(&txn, business_id, funding_source_id).await?;
        let spent = spent_from(&txn, funding_source_id, None).await?;

        let mut active: funding_source::ActiveModel = existing.into();
        if let Some(amount) = input.amount {
            if amount < spent {
                return Err(ServiceError::ValidationError(format!(
                    "Amount {} is below the {} already spent from this source",
                    amount, spent
                )));
            }
            active.amount = Set(amount);
        }
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(source_type) = input.source_type {
            active.source_type = Set(source_type);
        }
        if let Some(received_on) = input.received_on {
            active.received_on = Set(Some(received_on));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(clean(Some(notes)));
        }
        let source = active.update(&txn).await?;
        txn.commit().await?;

        info!("Updated funding source: {}", funding_source_id);
        Ok(FundingSourceView::new(source, spent))
    }

    #[instrument(skip(self))]
    pub async fn delete_funding_source(
        &self,
        business_id: Uuid,
        funding_source_id: Uuid,
    ) -> Result<(), ServiceError> {
        find_source(&*self.db, business_id, funding_source_id).await?;
        let drawn = expenditure::Entity::find()
            .filter(expenditure::Column::FundingSourceId.eq(funding_source_id))
            .count(&*self.db)
            .await?;
        if drawn > 0 {
            return Err(ServiceError::Conflict(format!(
                "Funding source has {} expenditures drawn from it",
                drawn
            )));
        }
        funding_source::Entity::delete_by_id(funding_source_id)
            .exec(&*self.db)
            .await?;
        info!("Deleted funding source: {}", funding_source_id);
        Ok(())
    }
}
