use super::common::{
    authorized_business, created_response, map_service_error, no_content_response,
    paginated_response, success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::customers::{CreateCustomerInput, CustomerFilter, UpdateCustomerInput},
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
            "/businesses/:business_id/customers",
            get(list_customers).post(create_customer),
        )
        .route(
            "/businesses/:business_id/customers/:customer_id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
}

async fn create_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateCustomerInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let customer = state
        .services
        .customers
        .create_customer(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(customer))
}

/// Search matches name, email or phone
async fn list_customers(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .customers
        .list_customers(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, customer_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let customer = state
        .services
        .customers
        .get_customer(business_id, customer_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(customer))
}

async fn update_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, customer_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCustomerInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let customer = state
        .services
        .customers
        .update_customer(business_id, customer_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(customer))
}

/// Refused while sales, debts or appointments reference the customer
async fn delete_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, customer_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .customers
        .delete_customer(business_id, customer_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
