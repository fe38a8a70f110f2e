use super::common::{authorized_business, map_service_error, success_response};
use crate::{
    auth::AuthenticatedUser, errors::ApiError, services::reports::ReportRange, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SalesReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Number of top products to include
    pub top: Option<usize>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/businesses/:business_id/reports/sales", get(sales_report))
        .route(
            "/businesses/:business_id/reports/profit-and-loss",
            get(profit_and_loss),
        )
}

async fn sales_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(query): Query<SalesReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let range = ReportRange {
        from: query.from,
        to: query.to,
    };

    let report = state
        .services
        .reports
        .sales_report(business_id, range, query.top)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

async fn profit_and_loss(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(range): Query<ReportRange>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let statement = state
        .services
        .reports
        .profit_and_loss(business_id, range)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(statement))
}
