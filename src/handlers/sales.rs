use super::common::{
    authorized_business, created_response, map_service_error, paginated_response,
    success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::sales::{CreateSaleInput, SaleFilter},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/businesses/:business_id/sales",
            get(list_sales).post(create_sale),
        )
        .route("/businesses/:business_id/sales/:sale_id", get(get_sale))
        .route(
            "/businesses/:business_id/sales/:sale_id/void",
            post(void_sale),
        )
}

/// Record a sale; stock is decremented and any unpaid balance becomes a receivable
async fn create_sale(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateSaleInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let sale = state
        .services
        .sales
        .create_sale(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(sale))
}

async fn list_sales(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .sales
        .list_sales(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_sale(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, sale_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let sale = state
        .services
        .sales
        .get_sale(business_id, sale_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(sale))
}

async fn void_sale(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, sale_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let sale = state
        .services
        .sales
        .void_sale(business_id, sale_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(sale))
}
