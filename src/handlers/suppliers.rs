use super::common::{
    authorized_business, created_response, map_service_error, no_content_response,
    paginated_response, success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::suppliers::{CreateSupplierInput, SupplierFilter, UpdateSupplierInput},
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
        .route(
            "/businesses/:business_id/suppliers",
            get(list_suppliers).post(create_supplier),
        )
        .route(
            "/businesses/:business_id/suppliers/:supplier_id",
            get(get_supplier)
                .put(update_supplier)
                .delete(delete_supplier),
        )
}

async fn create_supplier(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateSupplierInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let supplier = state
        .services
        .suppliers
        .create_supplier(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(supplier))
}

async fn list_suppliers(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<SupplierFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .suppliers
        .list_suppliers(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_supplier(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, supplier_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let supplier = state
        .services
        .suppliers
        .get_supplier(business_id, supplier_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

async fn update_supplier(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, supplier_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateSupplierInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let supplier = state
        .services
        .suppliers
        .update_supplier(business_id, supplier_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

async fn delete_supplier(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, supplier_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .suppliers
        .delete_supplier(business_id, supplier_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
