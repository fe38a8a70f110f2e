use super::common::{
    authorized_business, created_response, map_service_error, paginated_response,
    success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    entities::appointment::AppointmentStatus,
    errors::ApiError,
    services::appointments::{
        AppointmentFilter, CreateAppointmentInput, CreateRecurringAppointmentsInput,
        RescheduleInput,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Ignore this appointment, e.g. when checking a reschedule
    pub exclude_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelQuery {
    /// Cancel every scheduled occurrence of the series
    #[serde(default)]
    pub whole_series: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentStatusInput {
    pub status: AppointmentStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/businesses/:business_id/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/businesses/:business_id/appointments/recurring",
            post(create_recurring_appointments),
        )
        .route(
            "/businesses/:business_id/appointments/availability",
            get(check_availability),
        )
        .route(
            "/businesses/:business_id/appointments/slots",
            get(time_slots),
        )
        .route(
            "/businesses/:business_id/appointments/:appointment_id",
            get(get_appointment),
        )
        .route(
            "/businesses/:business_id/appointments/:appointment_id/reschedule",
            post(reschedule_appointment),
        )
        .route(
            "/businesses/:business_id/appointments/:appointment_id/status",
            patch(update_appointment_status),
        )
        .route(
            "/businesses/:business_id/appointments/:appointment_id/cancel",
            post(cancel_appointment),
        )
}

/// Book an appointment inside business hours; overlapping bookings are rejected
async fn create_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateAppointmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let business = authorized_business(&state, &user, business_id).await?;

    let appointment = state
        .services
        .appointments
        .create_appointment(&business, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(appointment))
}

/// Book a whole series, or nothing if any occurrence conflicts
async fn create_recurring_appointments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateRecurringAppointmentsInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let business = authorized_business(&state, &user, business_id).await?;

    let booking = state
        .services
        .appointments
        .create_recurring_appointments(&business, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(booking))
}

async fn list_appointments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<AppointmentFilter>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .appointments
        .list_appointments(business_id, &filter, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, appointment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let appointment = state
        .services
        .appointments
        .get_appointment(business_id, appointment_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(appointment))
}

async fn reschedule_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RescheduleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let business = authorized_business(&state, &user, business_id).await?;

    let appointment = state
        .services
        .appointments
        .reschedule(&business, appointment_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(appointment))
}

async fn update_appointment_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateAppointmentStatusInput>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let appointment = state
        .services
        .appointments
        .update_status(business_id, appointment_id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(appointment))
}

/// Responds with every appointment that was cancelled
async fn cancel_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, appointment_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<CancelQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let cancelled = state
        .services
        .appointments
        .cancel(business_id, appointment_id, query.whole_series)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cancelled))
}

async fn check_availability(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let availability = state
        .services
        .appointments
        .check_availability(business_id, query.start, query.end, query.exclude_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(availability))
}

async fn time_slots(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let business = authorized_business(&state, &user, business_id).await?;

    let slots = state
        .services
        .appointments
        .time_slots(&business, query.date, query.duration_minutes)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(slots))
}
