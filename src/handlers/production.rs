use super::common::{
    authorized_business, created_response, map_service_error, no_content_response,
    paginated_response, success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::production::{
        AddLaborInput, AddResourceInput, AddStageInput, CreateProductionInput, ProductionFilter,
        RecordOutputInput, UpdateProductionInput, UpdateStageStatusInput,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/businesses/:business_id/productions",
            get(list_productions).post(create_production),
        )
        .route(
            "/businesses/:business_id/productions/:production_id",
            get(get_production)
                .put(update_production)
                .delete(delete_production),
        )
        .route(
            "/businesses/:business_id/productions/:production_id/stages",
            post(add_stage),
        )
        .route(
            "/businesses/:business_id/productions/:production_id/stages/:stage_id",
            patch(update_stage_status),
        )
        .route(
            "/businesses/:business_id/productions/:production_id/resources",
            post(add_resource),
        )
        .route(
            "/businesses/:business_id/productions/:production_id/labor",
            post(add_labor),
        )
        .route(
            "/businesses/:business_id/productions/:production_id/outputs",
            post(record_output),
        )
        .route(
            "/businesses/:business_id/productions/:production_id/complete",
            post(complete_production),
        )
        .route(
            "/businesses/:business_id/productions/:production_id/cancel",
            post(cancel_production),
        )
}

async fn create_production(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateProductionInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let detail = state
        .services
        .production
        .create_production(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(detail))
}

async fn list_productions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<ProductionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .production
        .list_productions(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

/// Batch with stages, resources, labor, outputs and the cost summary
async fn get_production(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let detail = state
        .services
        .production
        .get_production(business_id, production_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

async fn update_production(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateProductionInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let production = state
        .services
        .production
        .update_production(business_id, production_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(production))
}

async fn delete_production(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .production
        .delete_production(business_id, production_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

async fn add_stage(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddStageInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let stage = state
        .services
        .production
        .add_stage(business_id, production_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(stage))
}

async fn update_stage_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id, stage_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<UpdateStageStatusInput>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let stage = state
        .services
        .production
        .update_stage_status(business_id, production_id, stage_id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(stage))
}

/// Record a material; `consume_stock` draws it from the linked product
async fn add_resource(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddResourceInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let resource = state
        .services
        .production
        .add_resource(business_id, production_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(resource))
}

async fn add_labor(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddLaborInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let labor = state
        .services
        .production
        .add_labor(business_id, production_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(labor))
}

async fn record_output(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RecordOutputInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let output = state
        .services
        .production
        .record_output(business_id, production_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(output))
}

async fn complete_production(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let production = state
        .services
        .production
        .complete_production(business_id, production_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(production))
}

async fn cancel_production(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, production_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let production = state
        .services
        .production
        .cancel_production(business_id, production_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(production))
}
