use super::common::{
    authorized_business, created_response, map_service_error, no_content_response,
    paginated_response, success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::employees::{CreateEmployeeInput, EmployeeFilter, UpdateEmployeeInput},
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
            "/businesses/:business_id/employees",
            get(list_employees).post(create_employee),
        )
        .route(
            "/businesses/:business_id/employees/:employee_id",
            get(get_employee)
                .put(update_employee)
                .delete(delete_employee),
        )
}

async fn create_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateEmployeeInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let employee = state
        .services
        .employees
        .create_employee(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(employee))
}

/// Filter by `search` and `is_active`
async fn list_employees(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<EmployeeFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .employees
        .list_employees(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, employee_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let employee = state
        .services
        .employees
        .get_employee(business_id, employee_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(employee))
}

async fn update_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, employee_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateEmployeeInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let employee = state
        .services
        .employees
        .update_employee(business_id, employee_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(employee))
}

/// Employees with labor, appointments or routes should be deactivated instead
async fn delete_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, employee_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .employees
        .delete_employee(business_id, employee_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
