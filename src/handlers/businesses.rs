use super::common::{
    authorized_business, created_response, map_service_error, paginated_response,
    success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::businesses::{CreateBusinessInput, UpdateBusinessInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/businesses", get(list_businesses).post(create_business))
        .route(
            "/businesses/:business_id",
            get(get_business)
                .put(update_business)
                .delete(delete_business),
        )
        .route("/businesses/:business_id/dashboard", get(get_dashboard))
}

/// Create a business owned by the caller
async fn create_business(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBusinessInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let business = state
        .services
        .businesses
        .create_business(&user.user_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(business))
}

/// List the caller's businesses, newest first
async fn list_businesses(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let window = params.resolve(&state.config);
    let page = state
        .services
        .businesses
        .list_businesses(&user.user_id, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_business(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let business = authorized_business(&state, &user, business_id).await?;
    Ok(success_response(business))
}

async fn update_business(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<UpdateBusinessInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let business = state
        .services
        .businesses
        .update_business(&user.user_id, business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(business))
}

/// Delete a business and everything it owns; responds with per-table counts
async fn delete_business(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .businesses
        .delete_business(&user.user_id, business_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

async fn get_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let business = authorized_business(&state, &user, business_id).await?;
    let dashboard = state
        .services
        .businesses
        .dashboard(&business)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(dashboard))
}
