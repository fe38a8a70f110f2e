use super::common::{
    authorized_business, created_response, map_service_error, no_content_response,
    paginated_response, success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::products::{AdjustStockInput, CreateProductInput, ProductFilter, UpdateProductInput},
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
            "/businesses/:business_id/products",
            get(list_products).post(create_product),
        )
        .route(
            "/businesses/:business_id/products/low-stock",
            get(low_stock_products),
        )
        .route(
            "/businesses/:business_id/products/:product_id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route(
            "/businesses/:business_id/products/:product_id/stock",
            post(adjust_stock),
        )
}

async fn create_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let product = state
        .services
        .products
        .create_product(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(product))
}

/// List products, optionally filtered by `search`, `category_id` and `is_active`
async fn list_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .products
        .list_products(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let product = state
        .services
        .products
        .get_product(business_id, product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

async fn update_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let product = state
        .services
        .products
        .update_product(business_id, product_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .products
        .delete_product(business_id, product_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Apply a signed stock change
async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AdjustStockInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let product = state
        .services
        .products
        .adjust_stock(business_id, product_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

async fn low_stock_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let products = state
        .services
        .products
        .low_stock(business_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}
