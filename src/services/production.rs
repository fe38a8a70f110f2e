use super::employees::EmployeeService;
use super::products::{apply_stock_delta, emit_stock_events, ProductService};
use super::validators::{
    validate_non_negative_decimal, validate_not_blank, validate_positive_decimal,
};
use super::{clean, generate_reference, Page};
use crate::{
    entities::{
        product,
        production::{self, ProductionStatus},
        production_labor, production_output, production_resource,
        production_stage::{self, StageStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateProductionInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub batch_number: Option<String>,
    pub product_id: Option<Uuid>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub planned_quantity: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Stage names in execution order
    #[serde(default)]
    pub stages: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateProductionInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    pub product_id: Option<Uuid>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub planned_quantity: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub status: Option<ProductionStatus>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddStageInput {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateStageStatusInput {
    pub status: StageStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddResourceInput {
    /// Defaults to the linked product's name
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub product_id: Option<Uuid>,
    #[validate(custom = "validate_positive_decimal")]
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    /// Defaults to the linked product's cost price
    #[validate(custom = "validate_non_negative_decimal")]
    pub unit_cost: Option<Decimal>,
    /// Take `quantity` out of the linked product's stock
    #[serde(default)]
    pub consume_stock: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddLaborInput {
    pub employee_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub description: String,
    #[validate(custom = "validate_positive_decimal")]
    pub hours: Decimal,
    /// Defaults to the employee's hourly rate
    #[validate(custom = "validate_non_negative_decimal")]
    pub hourly_rate: Option<Decimal>,
    pub work_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RecordOutputInput {
    /// Defaults to the product the batch makes
    pub product_id: Option<Uuid>,
    #[validate(custom = "validate_positive_decimal")]
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductionFilter {
    pub status: Option<ProductionStatus>,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub material_cost: Decimal,
    pub labor_cost: Decimal,
    pub total_cost: Decimal,
    pub output_quantity: Decimal,
    /// `None` until something has been produced
    pub cost_per_unit: Option<Decimal>,
}

impl CostSummary {
    pub fn compute(
        resources: &[production_resource::Model],
        labor: &[production_labor::Model],
        outputs: &[production_output::Model],
    ) -> Self {
        let material_cost: Decimal = resources.iter().map(|r| r.cost()).sum();
        let labor_cost: Decimal = labor.iter().map(|l| l.cost()).sum();
        let output_quantity: Decimal = outputs.iter().map(|o| o.quantity).sum();
        let total_cost = material_cost + labor_cost;
        let cost_per_unit = if output_quantity > Decimal::ZERO {
            Some((total_cost / output_quantity).round_dp(4))
        } else {
            None
        };
        Self {
            material_cost,
            labor_cost,
            total_cost,
            output_quantity,
            cost_per_unit,
        }
    }
}

/// A batch with everything recorded against it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionDetail {
    #[serde(flatten)]
    pub production: production::Model,
    pub stages: Vec<production_stage::Model>,
    pub resources: Vec<production_resource::Model>,
    pub labor: Vec<production_labor::Model>,
    pub outputs: Vec<production_output::Model>,
    pub costs: CostSummary,
}

/// Service for production batches and their stages, inputs and outputs
#[derive(Clone)]
pub struct ProductionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        production_id: Uuid,
    ) -> Result<production::Model, ServiceError> {
        production::Entity::find_by_id(production_id)
            .filter(production::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production {} not found", production_id))
            })
    }

    /// Loads a batch that still accepts stages, resources, labor and outputs
    async fn find_open<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        production_id: Uuid,
    ) -> Result<production::Model, ServiceError> {
        let production = Self::find_in_business(conn, business_id, production_id).await?;
        if production.status.is_closed() {
            return Err(ServiceError::InvalidOperation(format!(
                "Production {} is {} and cannot be changed",
                production.batch_number,
                production.status.to_value()
            )));
        }
        Ok(production)
    }

    async fn stages_of<C: ConnectionTrait>(
        conn: &C,
        production_id: Uuid,
    ) -> Result<Vec<production_stage::Model>, ServiceError> {
        Ok(production_stage::Entity::find()
            .filter(production_stage::Column::ProductionId.eq(production_id))
            .order_by_asc(production_stage::Column::Sequence)
            .all(conn)
            .await?)
    }

    /// Validates and applies a batch status change inside `txn`
    async fn transition(
        txn: &DatabaseTransaction,
        production: production::Model,
        next: ProductionStatus,
    ) -> Result<production::Model, ServiceError> {
        let current = production.status;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move production from {} to {}",
                current.to_value(),
                next.to_value()
            )));
        }

        let today = Utc::now().date_naive();
        let mut active: production::ActiveModel = production.clone().into();
        match next {
            ProductionStatus::InProgress if production.start_date.is_none() => {
                active.start_date = Set(Some(today));
            }
            ProductionStatus::Completed => {
                let open_stages = Self::stages_of(txn, production.id)
                    .await?
                    .into_iter()
                    .filter(|s| s.status != StageStatus::Completed)
                    .count();
                if open_stages > 0 {
                    return Err(ServiceError::InvalidOperation(format!(
                        "{} stage(s) are not completed yet",
                        open_stages
                    )));
                }
                active.end_date = Set(Some(today));
            }
            _ => {}
        }
        active.status = Set(next);
        Ok(active.update(txn).await?)
    }

    async fn announce_transition(
        &self,
        production_id: Uuid,
        from: ProductionStatus,
        to: ProductionStatus,
    ) {
        if from != to {
            self.event_sender
                .send_or_log(Event::ProductionStatusChanged {
                    production_id,
                    old_status: from.to_value(),
                    new_status: to.to_value(),
                })
                .await;
        }
    }

    /// Creates a planned batch with its initial stages
    #[instrument(skip(self, input))]
    pub async fn create_production(
        &self,
        business_id: Uuid,
        input: CreateProductionInput,
    ) -> Result<ProductionDetail, ServiceError> {
        input.validate()?;
        if input.stages.iter().any(|s| s.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "Stage names must not be blank".to_string(),
            ));
        }
        if let Some(product_id) = input.product_id {
            ProductService::find_in_business(&*self.db, business_id, product_id).await?;
        }

        let batch_number = match clean(input.batch_number) {
            Some(number) => {
                let taken = production::Entity::find()
                    .filter(production::Column::BusinessId.eq(business_id))
                    .filter(production::Column::BatchNumber.eq(number.as_str()))
                    .count(&*self.db)
                    .await?;
                if taken > 0 {
                    return Err(ServiceError::Conflict(format!(
                        "Batch number {} is already in use",
                        number
                    )));
                }
                number
            }
            None => generate_reference("PRD", Utc::now().date_naive()),
        };

        let production_id = Uuid::new_v4();
        let txn = self.db.begin().await?;
        let production = production::ActiveModel {
            id: Set(production_id),
            business_id: Set(business_id),
            product_id: Set(input.product_id),
            batch_number: Set(batch_number),
            name: Set(input.name.trim().to_string()),
            status: Set(ProductionStatus::Planned),
            planned_quantity: Set(input.planned_quantity.unwrap_or(Decimal::ZERO)),
            start_date: Set(input.start_date),
            end_date: Set(None),
            notes: Set(clean(input.notes)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let now = Utc::now();
        let mut stages = Vec::with_capacity(input.stages.len());
        for (index, name) in input.stages.iter().enumerate() {
            let stage = production_stage::ActiveModel {
                id: Set(Uuid::new_v4()),
                production_id: Set(production_id),
                name: Set(name.trim().to_string()),
                sequence: Set(index as i32 + 1),
                status: Set(StageStatus::Pending),
                started_at: Set(None),
                completed_at: Set(None),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            stages.push(stage);
        }
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductionCreated {
                business_id,
                production_id,
            })
            .await;

        info!(
            "Created production {} with {} stages",
            production.batch_number,
            stages.len()
        );
        Ok(ProductionDetail {
            production,
            stages,
            resources: Vec::new(),
            labor: Vec::new(),
            outputs: Vec::new(),
            costs: CostSummary::compute(&[], &[], &[]),
        })
    }

    /// The batch with all children and its cost summary
    #[instrument(skip(self))]
    pub async fn get_production(
        &self,
        business_id: Uuid,
        production_id: Uuid,
    ) -> Result<ProductionDetail, ServiceError> {
        let db = &*self.db;
        let production = Self::find_in_business(db, business_id, production_id).await?;
        let stages = Self::stages_of(db, production_id).await?;
        let resources = production_resource::Entity::find()
            .filter(production_resource::Column::ProductionId.eq(production_id))
            .order_by_asc(production_resource::Column::CreatedAt)
            .all(db)
            .await?;
        let labor = production_labor::Entity::find()
            .filter(production_labor::Column::ProductionId.eq(production_id))
            .order_by_asc(production_labor::Column::CreatedAt)
            .all(db)
            .await?;
        let outputs = production_output::Entity::find()
            .filter(production_output::Column::ProductionId.eq(production_id))
            .order_by_asc(production_output::Column::RecordedAt)
            .all(db)
            .await?;

        let costs = CostSummary::compute(&resources, &labor, &outputs);
        Ok(ProductionDetail {
            production,
            stages,
            resources,
            labor,
            outputs,
            costs,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_productions(
        &self,
        business_id: Uuid,
        filter: &ProductionFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<production::Model>, ServiceError> {
        let mut query =
            production::Entity::find().filter(production::Column::BusinessId.eq(business_id));
        if let Some(status) = filter.status {
            query = query.filter(production::Column::Status.eq(status));
        }
        if let Some(product_id) = filter.product_id {
            query = query.filter(production::Column::ProductId.eq(product_id));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(production::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    /// Updates batch fields; a status change goes through the same rules as
    /// `complete_production` and `cancel_production`
    #[instrument(skip(self, input))]
    pub async fn update_production(
        &self,
        business_id: Uuid,
        production_id: Uuid,
        input: UpdateProductionInput,
    ) -> Result<production::Model, ServiceError> {
        input.validate()?;
        if let Some(product_id) = input.product_id {
            ProductService::find_in_business(&*self.db, business_id, product_id).await?;
        }

        let txn = self.db.begin().await?;
        let existing = Self::find_in_business(&txn, business_id, production_id).await?;
        let old_status = existing.status;

        let mut active: production::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(product_id) = input.product_id {
            active.product_id = Set(Some(product_id));
        }
        if let Some(quantity) = input.planned_quantity {
            active.planned_quantity = Set(quantity);
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(Some(start_date));
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(Some(end_date));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(clean(Some(notes)));
        }
        let mut production = active.update(&txn).await?;

        if let Some(next) = input.status.filter(|s| *s != old_status) {
            production = Self::transition(&txn, production, next).await?;
        }
        if let (Some(start), Some(end)) = (production.start_date, production.end_date) {
            if end < start {
                return Err(ServiceError::ValidationError(
                    "end_date must not be before start_date".to_string(),
                ));
            }
        }
        txn.commit().await?;

        self.announce_transition(production_id, old_status, production.status)
            .await;
        info!("Updated production: {}", production_id);
        Ok(production)
    }

    /// Appends a stage after the current last one
    #[instrument(skip(self, input))]
    pub async fn add_stage(
        &self,
        business_id: Uuid,
        production_id: Uuid,
        input: AddStageInput,
    ) -> Result<production_stage::Model, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;
        Self::find_open(&txn, business_id, production_id).await?;

        let next_sequence = Self::stages_of(&txn, production_id)
            .await?
            .last()
            .map_or(1, |s| s.sequence + 1);
        let stage = production_stage::ActiveModel {
            id: Set(Uuid::new_v4()),
            production_id: Set(production_id),
            name: Set(input.name.trim().to_string()),
            sequence: Set(next_sequence),
            status: Set(StageStatus::Pending),
            started_at: Set(None),
            completed_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        Ok(stage)
    }

    /// Moves a stage forward. Starting any stage of a planned batch puts the
    /// batch in progress.
    #[instrument(skip(self))]
    pub async fn update_stage_status(
        &self,
        business_id: Uuid,
        production_id: Uuid,
        stage_id: Uuid,
        status: StageStatus,
    ) -> Result<production_stage::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let production = Self::find_open(&txn, business_id, production_id).await?;
        let stage = production_stage::Entity::find_by_id(stage_id)
            .filter(production_stage::Column::ProductionId.eq(production_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stage {} not found", stage_id)))?;

        if stage.status == status {
            return Ok(stage);
        }
        if !stage.status.can_transition_to(status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move stage from {} to {}",
                stage.status.to_value(),
                status.to_value()
            )));
        }

        let now = Utc::now();
        let started_at = stage.started_at;
        let mut active: production_stage::ActiveModel = stage.into();
        if started_at.is_none() {
            active.started_at = Set(Some(now));
        }
        if status == StageStatus::Completed {
            active.completed_at = Set(Some(now));
        }
        active.status = Set(status);
        let stage = active.update(&txn).await?;

        let old_status = production.status;
        let batch_started = if old_status == ProductionStatus::Planned {
            Self::transition(&txn, production, ProductionStatus::InProgress).await?;
            true
        } else {
            false
        };
        txn.commit().await?;

        if batch_started {
            self.announce_transition(production_id, old_status, ProductionStatus::InProgress)
                .await;
        }
        Ok(stage)
    }

    /// Records a material input, optionally drawing it from stock
    #[instrument(skip(self, input))]
    pub async fn add_resource(
        &self,
        business_id: Uuid,
        production_id: Uuid,
        input: AddResourceInput,
    ) -> Result<production_resource::Model, ServiceError> {
        input.validate()?;
        if input.consume_stock && input.product_id.is_none() {
            return Err(ServiceError::ValidationError(
                "consume_stock requires a product_id".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        Self::find_open(&txn, business_id, production_id).await?;

        let linked: Option<product::Model> = match input.product_id {
            Some(product_id) => {
                Some(ProductService::find_in_business(&txn, business_id, product_id).await?)
            }
            None => None,
        };
        let name = clean(input.name)
            .or_else(|| linked.as_ref().map(|p| p.name.clone()))
            .ok_or_else(|| {
                ServiceError::ValidationError("A resource needs a name or a product".to_string())
            })?;
        let unit = clean(input.unit)
            .or_else(|| linked.as_ref().map(|p| p.unit.clone()))
            .unwrap_or_else(|| "unit".to_string());
        let unit_cost = input
            .unit_cost
            .or_else(|| linked.as_ref().map(|p| p.cost_price))
            .unwrap_or(Decimal::ZERO);

        let consumed = match (&linked, input.consume_stock) {
            (Some(product), true) => {
                Some(apply_stock_delta(&txn, business_id, product.id, -input.quantity).await?)
            }
            _ => None,
        };

        let resource = production_resource::ActiveModel {
            id: Set(Uuid::new_v4()),
            production_id: Set(production_id),
            product_id: Set(input.product_id),
            name: Set(name),
            quantity: Set(input.quantity),
            unit: Set(unit),
            unit_cost: Set(unit_cost),
            stock_consumed: Set(consumed.is_some()),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        if let Some(product) = consumed {
            emit_stock_events(
                &self.event_sender,
                &product,
                -input.quantity,
                "production input",
            )
            .await;
        }
        Ok(resource)
    }

    /// Logs labor hours; the rate falls back to the employee's hourly rate
    #[instrument(skip(self, input))]
    pub async fn add_labor(
        &self,
        business_id: Uuid,
        production_id: Uuid,
        input: AddLaborInput,
    ) -> Result<production_labor::Model, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;
        Self::find_open(&txn, business_id, production_id).await?;

        let employee_rate = match input.employee_id {
            Some(employee_id) => {
                EmployeeService::find_in_business(&txn, business_id, employee_id)
                    .await?
                    .hourly_rate
            }
            None => None,
        };
        let hourly_rate = input
            .hourly_rate
            .or(employee_rate)
            .unwrap_or(Decimal::ZERO);

        let labor = production_labor::ActiveModel {
            id: Set(Uuid::new_v4()),
            production_id: Set(production_id),
            employee_id: Set(input.employee_id),
            description: Set(input.description.trim().to_string()),
            hours: Set(input.hours),
            hourly_rate: Set(hourly_rate),
            work_date: Set(input.work_date),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        Ok(labor)
    }

    /// Records finished goods and adds them to the product's stock
    #[instrument(skip(self, input))]
    pub async fn record_output(
        &self,
        business_id: Uuid,
        production_id: Uuid,
        input: RecordOutputInput,
    ) -> Result<production_output::Model, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;
        let production = Self::find_open(&txn, business_id, production_id).await?;

        let product_id = input.product_id.or(production.product_id);
        let restocked = match product_id {
            Some(product_id) => {
                Some(apply_stock_delta(&txn, business_id, product_id, input.quantity).await?)
            }
            None => None,
        };
        let unit = clean(input.unit)
            .or_else(|| restocked.as_ref().map(|p| p.unit.clone()))
            .unwrap_or_else(|| "unit".to_string());

        let output = production_output::ActiveModel {
            id: Set(Uuid::new_v4()),
            production_id: Set(production_id),
            product_id: Set(product_id),
            quantity: Set(input.quantity),
            unit: Set(unit),
            notes: Set(clean(input.notes)),
            recorded_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductionOutputRecorded {
                production_id,
                product_id,
                quantity: input.quantity,
            })
            .await;
        if let Some(product) = restocked {
            emit_stock_events(&self.event_sender, &product, input.quantity, "production output")
                .await;
        }
        Ok(output)
    }

    /// Marks an in-progress batch completed once every stage is done
    #[instrument(skip(self))]
    pub async fn complete_production(
        &self,
        business_id: Uuid,
        production_id: Uuid,
    ) -> Result<production::Model, ServiceError> {
        self.close(business_id, production_id, ProductionStatus::Completed)
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_production(
        &self,
        business_id: Uuid,
        production_id: Uuid,
    ) -> Result<production::Model, ServiceError> {
        self.close(business_id, production_id, ProductionStatus::Cancelled)
            .await
    }

    async fn close(
        &self,
        business_id: Uuid,
        production_id: Uuid,
        next: ProductionStatus,
    ) -> Result<production::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = Self::find_in_business(&txn, business_id, production_id).await?;
        let old_status = existing.status;
        let production = Self::transition(&txn, existing, next).await?;
        txn.commit().await?;

        self.announce_transition(production_id, old_status, next)
            .await;
        info!(
            "Production {} is now {}",
            production.batch_number,
            next.to_value()
        );
        Ok(production)
    }

    /// Deletes a batch and its children. Material drawn from stock goes back;
    /// output already added to stock stays there.
    #[instrument(skip(self))]
    pub async fn delete_production(
        &self,
        business_id: Uuid,
        production_id: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        Self::find_in_business(&txn, business_id, production_id).await?;

        let consumed = production_resource::Entity::find()
            .filter(production_resource::Column::ProductionId.eq(production_id))
            .filter(production_resource::Column::StockConsumed.eq(true))
            .all(&txn)
            .await?;
        let mut returned = Vec::new();
        for resource in consumed {
            if let Some(product_id) = resource.product_id {
                let product =
                    apply_stock_delta(&txn, business_id, product_id, resource.quantity).await?;
                returned.push((product, resource.quantity));
            }
        }

        production_output::Entity::delete_many()
            .filter(production_output::Column::ProductionId.eq(production_id))
            .exec(&txn)
            .await?;
        production_labor::Entity::delete_many()
            .filter(production_labor::Column::ProductionId.eq(production_id))
            .exec(&txn)
            .await?;
        production_resource::Entity::delete_many()
            .filter(production_resource::Column::ProductionId.eq(production_id))
            .exec(&txn)
            .await?;
        production_stage::Entity::delete_many()
            .filter(production_stage::Column::ProductionId.eq(production_id))
            .exec(&txn)
            .await?;
        production::Entity::delete_by_id(production_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        for (product, quantity) in &returned {
            emit_stock_events(&self.event_sender, product, *quantity, "production deleted").await;
        }
        info!("Deleted production: {}", production_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn resource(quantity: Decimal, unit_cost: Decimal) -> production_resource::Model {
        production_resource::Model {
            id: Uuid::new_v4(),
            production_id: Uuid::nil(),
            product_id: None,
            name: "Flour".into(),
            quantity,
            unit: "kg".into(),
            unit_cost,
            stock_consumed: false,
            created_at: Utc::now(),
        }
    }

    fn labor(hours: Decimal, rate: Decimal) -> production_labor::Model {
        production_labor::Model {
            id: Uuid::new_v4(),
            production_id: Uuid::nil(),
            employee_id: None,
            description: "Baking".into(),
            hours,
            hourly_rate: rate,
            work_date: None,
            created_at: Utc::now(),
        }
    }

    fn output(quantity: Decimal) -> production_output::Model {
        production_output::Model {
            id: Uuid::new_v4(),
            production_id: Uuid::nil(),
            product_id: None,
            quantity,
            unit: "loaf".into(),
            notes: None,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn cost_summary_adds_material_and_labor() {
        let costs = CostSummary::compute(
            &[resource(dec!(10), dec!(1.5)), resource(dec!(2), dec!(4))],
            &[labor(dec!(3), dec!(10))],
            &[output(dec!(40))],
        );
        assert_eq!(costs.material_cost, dec!(23));
        assert_eq!(costs.labor_cost, dec!(30));
        assert_eq!(costs.total_cost, dec!(53));
        assert_eq!(costs.output_quantity, dec!(40));
        assert_eq!(costs.cost_per_unit, Some(dec!(1.325)));
    }

    #[test]
    fn cost_per_unit_is_absent_without_output() {
        let costs = CostSummary::compute(&[resource(dec!(1), dec!(1))], &[], &[]);
        assert_eq!(costs.cost_per_unit, None);
        assert_eq!(costs.total_cost, dec!(1));
    }
}
