use super::common::{
    authorized_business, created_response, map_service_error, no_content_response,
    paginated_response, success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::{
        finance::{
            debts::{CreateDebtInput, DebtFilter, RecordPaymentInput},
            expenditures::{CreateExpenditureInput, ExpenditureFilter, UpdateExpenditureInput},
            funding::{CreateFundingSourceInput, UpdateFundingSourceInput},
        },
        reports::ReportRange,
    },
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
            "/businesses/:business_id/funding-sources",
            get(list_funding_sources).post(create_funding_source),
        )
        .route(
            "/businesses/:business_id/funding-sources/:funding_source_id",
            get(get_funding_source)
                .put(update_funding_source)
                .delete(delete_funding_source),
        )
        .route(
            "/businesses/:business_id/expenditures",
            get(list_expenditures).post(create_expenditure),
        )
        .route(
            "/businesses/:business_id/expenditures/summary",
            get(expenditure_summary),
        )
        .route(
            "/businesses/:business_id/expenditures/:expenditure_id",
            get(get_expenditure)
                .put(update_expenditure)
                .delete(delete_expenditure),
        )
        .route(
            "/businesses/:business_id/debts",
            get(list_debts).post(create_debt),
        )
        .route("/businesses/:business_id/debts/summary", get(debt_summary))
        .route(
            "/businesses/:business_id/debts/:debt_id",
            get(get_debt).delete(delete_debt),
        )
        .route(
            "/businesses/:business_id/debts/:debt_id/payments",
            post(record_payment),
        )
        .route(
            "/businesses/:business_id/debts/:debt_id/write-off",
            post(write_off_debt),
        )
}

// Funding sources

async fn create_funding_source(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateFundingSourceInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let source = state
        .services
        .funding
        .create_funding_source(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(source))
}

/// Each source carries `spent` and `remaining`
async fn list_funding_sources(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .funding
        .list_funding_sources(business_id, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_funding_source(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, funding_source_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let source = state
        .services
        .funding
        .get_funding_source(business_id, funding_source_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(source))
}

async fn update_funding_source(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, funding_source_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateFundingSourceInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let source = state
        .services
        .funding
        .update_funding_source(business_id, funding_source_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(source))
}

async fn delete_funding_source(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, funding_source_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .funding
        .delete_funding_source(business_id, funding_source_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Expenditures

async fn create_expenditure(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateExpenditureInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let expenditure = state
        .services
        .expenditures
        .create_expenditure(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(expenditure))
}

async fn list_expenditures(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<ExpenditureFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .expenditures
        .list_expenditures(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_expenditure(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, expenditure_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let expenditure = state
        .services
        .expenditures
        .get_expenditure(business_id, expenditure_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(expenditure))
}

async fn update_expenditure(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, expenditure_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateExpenditureInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let expenditure = state
        .services
        .expenditures
        .update_expenditure(business_id, expenditure_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(expenditure))
}

async fn delete_expenditure(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, expenditure_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .expenditures
        .delete_expenditure(business_id, expenditure_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Totals by category and by funding source for `from..=to`
async fn expenditure_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(range): Query<ReportRange>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let summary = state
        .services
        .expenditures
        .expenditure_summary(business_id, range.from, range.to)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

// Debts

async fn create_debt(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateDebtInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let debt = state
        .services
        .debts
        .create_debt(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(debt))
}

/// Filter by `direction`, `status`, `overdue`, `customer_id` or `supplier_id`
async fn list_debts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<DebtFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .debts
        .list_debts(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_debt(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, debt_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let debt = state
        .services
        .debts
        .get_debt(business_id, debt_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(debt))
}

async fn delete_debt(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, debt_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    state
        .services
        .debts
        .delete_debt(business_id, debt_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

async fn record_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, debt_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RecordPaymentInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let debt = state
        .services
        .debts
        .record_payment(business_id, debt_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(debt))
}

async fn write_off_debt(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, debt_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let debt = state
        .services
        .debts
        .write_off(business_id, debt_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(debt))
}

async fn debt_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let summary = state
        .services
        .debts
        .debt_summary(business_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}
