use super::employees::EmployeeService;
use super::products::{apply_stock_delta, emit_stock_events, ProductService};
use super::scheduling::{generate_recurring_dates, Frequency};
use super::validators::{
    validate_non_negative_decimal, validate_not_blank, validate_positive_decimal,
};
use super::{clean, contains_ci, Page};
use crate::{
    entities::{
        delivery::{self, DeliveryStatus},
        distribution_client::{self, ClientType},
        distribution_route::{self, format_delivery_days, parse_delivery_days},
        product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateClientInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    pub client_type: ClientType,
    #[validate(length(max = 200))]
    pub contact_name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateClientInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    pub client_type: Option<ClientType>,
    #[validate(length(max = 200))]
    pub contact_name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientFilter {
    pub search: Option<String>,
    pub client_type: Option<ClientType>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateRouteInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    pub description: Option<String>,
    /// Weekday codes such as `["mon", "thu"]`; empty means every day
    #[serde(default)]
    pub delivery_days: Vec<String>,
    pub driver_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateRouteInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    pub delivery_days: Option<Vec<String>>,
    pub driver_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateDeliveryInput {
    pub client_id: Uuid,
    pub route_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    #[validate(custom = "validate_positive_decimal")]
    pub quantity: Decimal,
    /// Defaults to the product's price
    #[validate(custom = "validate_non_negative_decimal")]
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ScheduleRecurringDeliveriesInput {
    pub client_id: Uuid,
    pub route_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    #[validate(custom = "validate_positive_decimal")]
    pub quantity: Decimal,
    #[validate(custom = "validate_non_negative_decimal")]
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateDeliveryStatusInput {
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub route_id: Option<Uuid>,
    pub status: Option<DeliveryStatus>,
}

/// One drop on a route manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStop {
    pub delivery: delivery::Model,
    pub client_name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteManifest {
    pub route: distribution_route::Model,
    pub date: NaiveDate,
    pub runs_today: bool,
    pub stops: Vec<ManifestStop>,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
}

fn normalize_days(codes: &[String]) -> Result<String, ServiceError> {
    let days = parse_delivery_days(&codes.join(",")).map_err(|bad| {
        ServiceError::ValidationError(format!(
            "Unknown delivery day '{}'; use mon, tue, wed, thu, fri, sat or sun",
            bad
        ))
    })?;
    Ok(format_delivery_days(&days))
}

/// Clients, routes and the deliveries that connect them
#[derive(Clone)]
pub struct DistributionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DistributionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find_client<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        client_id: Uuid,
    ) -> Result<distribution_client::Model, ServiceError> {
        distribution_client::Entity::find_by_id(client_id)
            .filter(distribution_client::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Client {} not found", client_id)))
    }

    async fn find_route<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        route_id: Uuid,
    ) -> Result<distribution_route::Model, ServiceError> {
        distribution_route::Entity::find_by_id(route_id)
            .filter(distribution_route::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Route {} not found", route_id)))
    }

    async fn find_delivery<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        delivery_id: Uuid,
    ) -> Result<delivery::Model, ServiceError> {
        delivery::Entity::find_by_id(delivery_id)
            .filter(delivery::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Delivery {} not found", delivery_id)))
    }

    // Clients

    #[instrument(skip(self, input))]
    pub async fn create_client(
        &self,
        business_id: Uuid,
        input: CreateClientInput,
    ) -> Result<distribution_client::Model, ServiceError> {
        input.validate()?;
        let client = distribution_client::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            client_type: Set(input.client_type),
            contact_name: Set(clean(input.contact_name)),
            phone: Set(clean(input.phone)),
            email: Set(clean(input.email)),
            address: Set(clean(input.address)),
            notes: Set(clean(input.notes)),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!("Created distribution client: {}", client.id);
        Ok(client)
    }

    #[instrument(skip(self))]
    pub async fn get_client(
        &self,
        business_id: Uuid,
        client_id: Uuid,
    ) -> Result<distribution_client::Model, ServiceError> {
        Self::find_client(&*self.db, business_id, client_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        business_id: Uuid,
        filter: &ClientFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<distribution_client::Model>, ServiceError> {
        let mut query = distribution_client::Entity::find()
            .filter(distribution_client::Column::BusinessId.eq(business_id));
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(contains_ci(distribution_client::Column::Name, search));
        }
        if let Some(client_type) = filter.client_type {
            query = query.filter(distribution_client::Column::ClientType.eq(client_type));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(distribution_client::Column::IsActive.eq(is_active));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(distribution_client::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_client(
        &self,
        business_id: Uuid,
        client_id: Uuid,
        input: UpdateClientInput,
    ) -> Result<distribution_client::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_client(&*self.db, business_id, client_id).await?;

        let mut active: distribution_client::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(client_type) = input.client_type {
            active.client_type = Set(client_type);
        }
        if let Some(contact_name) = input.contact_name {
            active.contact_name = Set(clean(Some(contact_name)));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(clean(Some(phone)));
        }
        if let Some(email) = input.email {
            active.email = Set(clean(Some(email)));
        }
        if let Some(address) = input.address {
            active.address = Set(clean(Some(address)));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(clean(Some(notes)));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_client(
        &self,
        business_id: Uuid,
        client_id: Uuid,
    ) -> Result<(), ServiceError> {
        Self::find_client(&*self.db, business_id, client_id).await?;
        let deliveries = delivery::Entity::find()
            .filter(delivery::Column::ClientId.eq(client_id))
            .count(&*self.db)
            .await?;
        if deliveries > 0 {
            return Err(ServiceError::Conflict(format!(
                "Client has {} deliveries; deactivate it instead",
                deliveries
            )));
        }
        distribution_client::Entity::delete_by_id(client_id)
            .exec(&*self.db)
            .await?;
        info!("Deleted distribution client: {}", client_id);
        Ok(())
    }

    // Routes

    #[instrument(skip(self, input))]
    pub async fn create_route(
        &self,
        business_id: Uuid,
        input: CreateRouteInput,
    ) -> Result<distribution_route::Model, ServiceError> {
        input.validate()?;
        let delivery_days = normalize_days(&input.delivery_days)?;
        if let Some(driver_id) = input.driver_id {
            EmployeeService::find_in_business(&*self.db, business_id, driver_id).await?;
        }

        let route = distribution_route::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            description: Set(clean(input.description)),
            delivery_days: Set(delivery_days),
            driver_id: Set(input.driver_id),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!("Created route: {}", route.id);
        Ok(route)
    }

    #[instrument(skip(self))]
    pub async fn get_route(
        &self,
        business_id: Uuid,
        route_id: Uuid,
    ) -> Result<distribution_route::Model, ServiceError> {
        Self::find_route(&*self.db, business_id, route_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_routes(
        &self,
        business_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Page<distribution_route::Model>, ServiceError> {
        let query = distribution_route::Entity::find()
            .filter(distribution_route::Column::BusinessId.eq(business_id));
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(distribution_route::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_route(
        &self,
        business_id: Uuid,
        route_id: Uuid,
        input: UpdateRouteInput,
    ) -> Result<distribution_route::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_route(&*self.db, business_id, route_id).await?;

        let mut active: distribution_route::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(clean(Some(description)));
        }
        if let Some(days) = input.delivery_days {
            active.delivery_days = Set(normalize_days(&days)?);
        }
        if let Some(driver_id) = input.driver_id {
            EmployeeService::find_in_business(&*self.db, business_id, driver_id).await?;
            active.driver_id = Set(Some(driver_id));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_route(
        &self,
        business_id: Uuid,
        route_id: Uuid,
    ) -> Result<(), ServiceError> {
        Self::find_route(&*self.db, business_id, route_id).await?;
        let deliveries = delivery::Entity::find()
            .filter(delivery::Column::RouteId.eq(route_id))
            .count(&*self.db)
            .await?;
        if deliveries > 0 {
            return Err(ServiceError::Conflict(format!(
                "Route has {} deliveries; deactivate it instead",
                deliveries
            )));
        }
        distribution_route::Entity::delete_by_id(route_id)
            .exec(&*self.db)
            .await?;
        info!("Deleted route: {}", route_id);
        Ok(())
    }

    // Deliveries

    /// Resolves and checks the client, route and product shared by single and
    /// recurring delivery creation. Returns the route and the unit price.
    async fn prepare_delivery(
        &self,
        business_id: Uuid,
        client_id: Uuid,
        route_id: Option<Uuid>,
        product_id: Option<Uuid>,
        unit_price: Option<Decimal>,
    ) -> Result<(Option<distribution_route::Model>, Decimal), ServiceError> {
        let client = Self::find_client(&*self.db, business_id, client_id).await?;
        if !client.is_active {
            return Err(ServiceError::InvalidOperation(format!(
                "Client {} is inactive",
                client.name
            )));
        }
        let route = match route_id {
            Some(route_id) => {
                let route = Self::find_route(&*self.db, business_id, route_id).await?;
                if !route.is_active {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Route {} is inactive",
                        route.name
                    )));
                }
                Some(route)
            }
            None => None,
        };
        let product: Option<product::Model> = match product_id {
            Some(product_id) => {
                Some(ProductService::find_in_business(&*self.db, business_id, product_id).await?)
            }
            None => None,
        };
        let unit_price = unit_price
            .or_else(|| product.as_ref().map(|p| p.price))
            .unwrap_or(Decimal::ZERO);
        Ok((route, unit_price))
    }

    #[instrument(skip(self, input))]
    pub async fn create_delivery(
        &self,
        business_id: Uuid,
        input: CreateDeliveryInput,
    ) -> Result<delivery::Model, ServiceError> {
        input.validate()?;
        let (_, unit_price) = self
            .prepare_delivery(
                business_id,
                input.client_id,
                input.route_id,
                input.product_id,
                input.unit_price,
            )
            .await?;

        let delivery = delivery::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            client_id: Set(input.client_id),
            route_id: Set(input.route_id),
            product_id: Set(input.product_id),
            scheduled_date: Set(input.scheduled_date),
            quantity: Set(input.quantity),
            unit_price: Set(unit_price),
            status: Set(DeliveryStatus::Scheduled),
            delivered_at: Set(None),
            notes: Set(clean(input.notes)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::DeliveryScheduled {
                business_id,
                delivery_id: delivery.id,
            })
            .await;

        info!("Scheduled delivery: {}", delivery.id);
        Ok(delivery)
    }

    /// Expands a schedule into individual deliveries. Dates on weekdays the
    /// route does not run are skipped.
    #[instrument(skip(self, input))]
    pub async fn schedule_recurring_deliveries(
        &self,
        business_id: Uuid,
        input: ScheduleRecurringDeliveriesInput,
    ) -> Result<Vec<delivery::Model>, ServiceError> {
        input.validate()?;
        if input.end_date < input.start_date {
            return Err(ServiceError::ValidationError(
                "end_date must not be before start_date".to_string(),
            ));
        }
        let (route, unit_price) = self
            .prepare_delivery(
                business_id,
                input.client_id,
                input.route_id,
                input.product_id,
                input.unit_price,
            )
            .await?;

        let dates: Vec<NaiveDate> =
            generate_recurring_dates(input.start_date, input.end_date, input.frequency)
                .into_iter()
                .filter(|date| route.as_ref().map_or(true, |r| r.runs_on(date.weekday())))
                .collect();
        if dates.is_empty() {
            return Err(ServiceError::ValidationError(
                "No dates in range fall on the route's delivery days".to_string(),
            ));
        }

        let notes = clean(input.notes);
        let txn = self.db.begin().await?;
        let mut deliveries = Vec::with_capacity(dates.len());
        for date in dates {
            let delivery = delivery::ActiveModel {
                id: Set(Uuid::new_v4()),
                business_id: Set(business_id),
                client_id: Set(input.client_id),
                route_id: Set(input.route_id),
                product_id: Set(input.product_id),
                scheduled_date: Set(date),
                quantity: Set(input.quantity),
                unit_price: Set(unit_price),
                status: Set(DeliveryStatus::Scheduled),
                delivered_at: Set(None),
                notes: Set(notes.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            deliveries.push(delivery);
        }
        txn.commit().await?;

        for delivery in &deliveries {
            self.event_sender
                .send_or_log(Event::DeliveryScheduled {
                    business_id,
                    delivery_id: delivery.id,
                })
                .await;
        }
        info!(
            "Scheduled {} recurring deliveries for client {}",
            deliveries.len(),
            input.client_id
        );
        Ok(deliveries)
    }

    #[instrument(skip(self))]
    pub async fn get_delivery(
        &self,
        business_id: Uuid,
        delivery_id: Uuid,
    ) -> Result<delivery::Model, ServiceError> {
        Self::find_delivery(&*self.db, business_id, delivery_id).await
    }

    /// Deliveries by scheduled date, both bounds inclusive
    #[instrument(skip(self))]
    pub async fn list_deliveries(
        &self,
        business_id: Uuid,
        filter: &DeliveryFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<delivery::Model>, ServiceError> {
        let mut query =
            delivery::Entity::find().filter(delivery::Column::BusinessId.eq(business_id));
        if let Some(from) = filter.from {
            query = query.filter(delivery::Column::ScheduledDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(delivery::Column::ScheduledDate.lte(to));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(delivery::Column::ClientId.eq(client_id));
        }
        if let Some(route_id) = filter.route_id {
            query = query.filter(delivery::Column::RouteId.eq(route_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(delivery::Column::Status.eq(status));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(delivery::Column::ScheduledDate)
            .order_by_asc(delivery::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    /// Applies a status transition. Delivering takes the quantity out of the
    /// linked product's stock in the same transaction.
    #[instrument(skip(self))]
    pub async fn update_delivery_status(
        &self,
        business_id: Uuid,
        delivery_id: Uuid,
        status: DeliveryStatus,
    ) -> Result<delivery::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = Self::find_delivery(&txn, business_id, delivery_id).await?;
        let old_status = existing.status;
        if !old_status.can_transition_to(status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move delivery from {} to {}",
                old_status.to_value(),
                status.to_value()
            )));
        }

        let destocked = match (status, existing.product_id) {
            (DeliveryStatus::Delivered, Some(product_id)) => {
                Some(apply_stock_delta(&txn, business_id, product_id, -existing.quantity).await?)
            }
            _ => None,
        };

        let quantity = existing.quantity;
        let mut active: delivery::ActiveModel = existing.into();
        active.status = Set(status);
        if status == DeliveryStatus::Delivered {
            active.delivered_at = Set(Some(Utc::now()));
        }
        let delivery = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::DeliveryStatusChanged {
                delivery_id,
                old_status: old_status.to_value(),
                new_status: status.to_value(),
            })
            .await;
        if let Some(product) = destocked {
            emit_stock_events(&self.event_sender, &product, -quantity, "delivery").await;
        }
        Ok(delivery)
    }

    /// Only deliveries that never left (scheduled or cancelled) can be removed
    #[instrument(skip(self))]
    pub async fn delete_delivery(
        &self,
        business_id: Uuid,
        delivery_id: Uuid,
    ) -> Result<(), ServiceError> {
        let delivery = Self::find_delivery(&*self.db, business_id, delivery_id).await?;
        if !matches!(
            delivery.status,
            DeliveryStatus::Scheduled | DeliveryStatus::Cancelled
        ) {
            return Err(ServiceError::InvalidOperation(format!(
                "A {} delivery cannot be deleted",
                delivery.status.to_value()
            )));
        }
        delivery::Entity::delete_by_id(delivery_id)
            .exec(&*self.db)
            .await?;
        info!("Deleted delivery: {}", delivery_id);
        Ok(())
    }

    /// Everything a driver needs for one route on one day
    #[instrument(skip(self))]
    pub async fn route_manifest(
        &self,
        business_id: Uuid,
        route_id: Uuid,
        date: NaiveDate,
    ) -> Result<RouteManifest, ServiceError> {
        let route = Self::find_route(&*self.db, business_id, route_id).await?;
        let deliveries = delivery::Entity::find()
            .filter(delivery::Column::BusinessId.eq(business_id))
            .filter(delivery::Column::RouteId.eq(route_id))
            .filter(delivery::Column::ScheduledDate.eq(date))
            .filter(
                delivery::Column::Status.is_not_in([
                    DeliveryStatus::Cancelled,
                    DeliveryStatus::Failed,
                ]),
            )
            .order_by_asc(delivery::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let client_ids: Vec<Uuid> = deliveries.iter().map(|d| d.client_id).collect();
        let clients: HashMap<Uuid, distribution_client::Model> = if client_ids.is_empty() {
            HashMap::new()
        } else {
            distribution_client::Entity::find()
                .filter(distribution_client::Column::Id.is_in(client_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let total_quantity = deliveries.iter().map(|d| d.quantity).sum();
        let total_value = deliveries.iter().map(|d| d.value()).sum();
        let stops = deliveries
            .into_iter()
            .map(|delivery| {
                let client = clients.get(&delivery.client_id);
                ManifestStop {
                    client_name: client.map(|c| c.name.clone()).unwrap_or_default(),
                    contact_name: client.and_then(|c| c.contact_name.clone()),
                    phone: client.and_then(|c| c.phone.clone()),
                    address: client.and_then(|c| c.address.clone()),
                    delivery,
                }
            })
            .collect();

        Ok(RouteManifest {
            runs_today: route.runs_on(date.weekday()),
            route,
            date,
            stops,
            total_quantity,
            total_value,
        })
    }
}
