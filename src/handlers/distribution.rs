use super::common::{
    authorized_business, created_response, map_service_error, no_content_response,
    paginated_response, success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::distribution::{
        ClientFilter, CreateClientInput, CreateDeliveryInput, CreateRouteInput, DeliveryFilter,
        ScheduleRecurringDeliveriesInput, UpdateClientInput, UpdateDeliveryStatusInput,
        UpdateRouteInput,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ManifestQuery {
    /// Defaults to today (UTC)
    pub date: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/businesses/:business_id/distribution/clients",
            get(list_clients).post(create_client),
        )
        .route(
            "/businesses/:business_id/distribution/clients/:client_id",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route(
            "/businesses/:business_id/distribution/routes",
            get(list_routes).post(create_route),
        )
        .route(
            "/businesses/:business_id/distribution/routes/:route_id",
            get(get_route).put(update_route).delete(delete_route),
        )
        .route(
            "/businesses/:business_id/distribution/routes/:route_id/manifest",
            get(route_manifest),
        )
        .route(
            "/businesses/:business_id/distribution/deliveries",
            get(list_deliveries).post(create_delivery),
        )
        .route(
            "/businesses/:business_id/distribution/deliveries/recurring",
            post(schedule_recurring_deliveries),
        )
        .route(
            "/businesses/:business_id/distribution/deliveries/:delivery_id",
            get(get_delivery).delete(delete_delivery),
        )
        .route(
            "/businesses/:business_id/distribution/deliveries/:delivery_id/status",
            patch(update_delivery_status),
        )
}

// Clients

async fn create_client(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateClientInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let client = state
        .services
        .distribution
        .create_client(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(client))
}

async fn list_clients(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<ClientFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .distribution
        .list_clients(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_client(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, client_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let client = state
        .services
        .distribution
        .get_client(business_id, client_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(client))
}

async fn update_client(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, client_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateClientInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let client = state
        .services
        .distribution
        .update_client(business_id, client_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(client))
}

async fn delete_client(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, client_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .distribution
        .delete_client(business_id, client_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Routes

async fn create_route(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateRouteInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let route = state
        .services
        .distribution
        .create_route(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(route))
}

async fn list_routes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .distribution
        .list_routes(business_id, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_route(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, route_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let route = state
        .services
        .distribution
        .get_route(business_id, route_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(route))
}

async fn update_route(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, route_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateRouteInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let route = state
        .services
        .distribution
        .update_route(business_id, route_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(route))
}

async fn delete_route(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, route_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .distribution
        .delete_route(business_id, route_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Stops on a route for one day, with client contact details
async fn route_manifest(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, route_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ManifestQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let manifest = state
        .services
        .distribution
        .route_manifest(business_id, route_id, date)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(manifest))
}

// Deliveries

async fn create_delivery(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateDeliveryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let delivery = state
        .services
        .distribution
        .create_delivery(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(delivery))
}

async fn schedule_recurring_deliveries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<ScheduleRecurringDeliveriesInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let deliveries = state
        .services
        .distribution
        .schedule_recurring_deliveries(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(deliveries))
}

async fn list_deliveries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<DeliveryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .distribution
        .list_deliveries(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_delivery(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, delivery_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let delivery = state
        .services
        .distribution
        .get_delivery(business_id, delivery_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(delivery))
}

async fn update_delivery_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, delivery_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDeliveryStatusInput>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let delivery = state
        .services
        .distribution
        .update_delivery_status(business_id, delivery_id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(delivery))
}

async fn delete_delivery(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, delivery_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .distribution
        .delete_delivery(business_id, delivery_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
