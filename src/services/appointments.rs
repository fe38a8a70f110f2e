use super::customers::CustomerService;
use super::employees::EmployeeService;
use super::scheduling::{
    generate_recurring_dates, generate_time_slots, within_business_hours, Frequency, TimeSlot,
    MAX_RECURRING_DATES,
};
use super::validators::validate_not_blank;
use super::{clean, Page};
use crate::{
    entities::{
        appointment::{self, AppointmentStatus},
        business,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Timelike, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateAppointmentInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub title: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub customer_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// A series: the first occurrence plus how it repeats
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateRecurringAppointmentsInput {
    #[validate]
    #[serde(flatten)]
    pub appointment: CreateAppointmentInput,
    pub frequency: Frequency,
    /// Last date (inclusive) an occurrence may fall on
    pub until: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RescheduleInput {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub employee_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    pub conflicts: Vec<appointment::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringBooking {
    pub recurrence_id: Uuid,
    pub appointments: Vec<appointment::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub slots: Vec<TimeSlot>,
}

/// Stored instants are whole seconds so that text-encoded timestamps compare
/// in chronological order.
fn to_second(value: DateTime<Utc>) -> DateTime<Utc> {
    value.with_nanosecond(0).unwrap_or(value)
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = date
        .checked_add_days(Days::new(1))
        .unwrap_or(date)
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, end)
}

fn check_interval(
    business: &business::Model,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if end <= start {
        return Err(ServiceError::ValidationError(
            "end_time must be after start_time".to_string(),
        ));
    }
    if !within_business_hours(start, end, business.opening_time, business.closing_time) {
        return Err(ServiceError::ValidationError(format!(
            "Appointment must fall within business hours {}-{} UTC",
            business.opening_time.format("%H:%M"),
            business.closing_time.format("%H:%M")
        )));
    }
    Ok(())
}

/// Takes the business row's write lock for the rest of the transaction, so
/// bookings for one business are checked and written one at a time.
async fn lock_calendar<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
) -> Result<(), ServiceError> {
    let touched = business::Entity::update_many()
        .col_expr(
            business::Column::UpdatedAt,
            Expr::col(business::Column::UpdatedAt).into(),
        )
        .filter(business::Column::Id.eq(business_id))
        .exec(conn)
        .await?;
    if touched.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "Business {} not found",
            business_id
        )));
    }
    Ok(())
}

/// Non-cancelled appointments of the business overlapping `[start, end)`
async fn find_conflicts<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Result<Vec<appointment::Model>, ServiceError> {
    let mut query = appointment::Entity::find()
        .filter(appointment::Column::BusinessId.eq(business_id))
        .filter(appointment::Column::Status.ne(AppointmentStatus::Cancelled))
        .filter(appointment::Column::StartTime.lt(end))
        .filter(appointment::Column::EndTime.gt(start));
    if let Some(id) = exclude {
        query = query.filter(appointment::Column::Id.ne(id));
    }
    Ok(query
        .order_by_asc(appointment::Column::StartTime)
        .all(conn)
        .await?)
}

/// Service for booking appointments without double-booking
#[derive(Clone)]
pub struct AppointmentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_slot_minutes: u32,
}

impl AppointmentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_slot_minutes: u32,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_slot_minutes,
        }
    }

    async fn find_in_business<C: ConnectionTrait>(
        conn: &C,
        business_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<appointment::Model, ServiceError> {
        appointment::Entity::find_by_id(appointment_id)
            .filter(appointment::Column::BusinessId.eq(business_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Appointment {} not found", appointment_id))
            })
    }

    async fn check_participants(
        &self,
        business_id: Uuid,
        input: &CreateAppointmentInput,
    ) -> Result<(), ServiceError> {
        if let Some(customer_id) = input.customer_id {
            CustomerService::find_in_business(&*self.db, business_id, customer_id).await?;
        }
        if let Some(employee_id) = input.employee_id {
            EmployeeService::find_in_business(&*self.db, business_id, employee_id).await?;
        }
        Ok(())
    }

    fn new_row(
        business_id: Uuid,
        input: &CreateAppointmentInput,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        recurrence_id: Option<Uuid>,
    ) -> appointment::ActiveModel {
        appointment::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            customer_id: Set(input.customer_id),
            employee_id: Set(input.employee_id),
            title: Set(input.title.trim().to_string()),
            notes: Set(clean(input.notes.clone())),
            start_time: Set(start),
            end_time: Set(end),
            status: Set(AppointmentStatus::Scheduled),
            recurrence_id: Set(recurrence_id),
            ..Default::default()
        }
    }

    /// Books one appointment. The overlap check and the insert share a
    /// transaction.
    #[instrument(skip(self, business, input), fields(business_id = %business.id))]
    pub async fn create_appointment(
        &self,
        business: &business::Model,
        input: CreateAppointmentInput,
    ) -> Result<appointment::Model, ServiceError> {
        input.validate()?;
        let start = to_second(input.start_time);
        let end = to_second(input.end_time);
        check_interval(business, start, end)?;
        self.check_participants(business.id, &input).await?;

        let txn = self.db.begin().await?;
        lock_calendar(&txn, business.id).await?;
        let conflicts = find_conflicts(&txn, business.id, start, end, None).await?;
        if let Some(existing) = conflicts.first() {
            warn!(conflicting = %existing.id, "Appointment slot already taken");
            return Err(ServiceError::Conflict(format!(
                "Time slot overlaps appointment '{}' ({} - {})",
                existing.title, existing.start_time, existing.end_time
            )));
        }
        let appointment = Self::new_row(business.id, &input, start, end, None)
            .insert(&txn)
            .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AppointmentBooked {
                business_id: business.id,
                appointment_id: appointment.id,
                start_time: appointment.start_time,
            })
            .await;

        info!("Booked appointment: {}", appointment.id);
        Ok(appointment)
    }

    /// Books every occurrence of a series or none of them. A conflict on any
    /// date rejects the series and names the conflicting dates.
    #[instrument(skip(self, business, input), fields(business_id = %business.id))]
    pub async fn create_recurring_appointments(
        &self,
        business: &business::Model,
        input: CreateRecurringAppointmentsInput,
    ) -> Result<RecurringBooking, ServiceError> {
        input.validate()?;
        let base = &input.appointment;
        let first_start = to_second(base.start_time);
        let first_end = to_second(base.end_time);
        check_interval(business, first_start, first_end)?;
        self.check_participants(business.id, base).await?;

        let first_date = first_start.date_naive();
        let dates = generate_recurring_dates(first_date, input.until, input.frequency);
        if dates.is_empty() {
            return Err(ServiceError::ValidationError(
                "until must not be before the first occurrence".to_string(),
            ));
        }
        if dates.len() == MAX_RECURRING_DATES {
            info!("Recurring series truncated to {} occurrences", MAX_RECURRING_DATES);
        }

        let recurrence_id = Uuid::new_v4();
        let txn = self.db.begin().await?;
        lock_calendar(&txn, business.id).await?;
        let mut conflicting_dates = Vec::new();
        let mut rows = Vec::with_capacity(dates.len());
        for date in &dates {
            let shift = *date - first_date;
            let start = first_start + shift;
            let end = first_end + shift;
            if !find_conflicts(&txn, business.id, start, end, None)
                .await?
                .is_empty()
            {
                conflicting_dates.push(date.to_string());
                continue;
            }
            rows.push(Self::new_row(
                business.id,
                base,
                start,
                end,
                Some(recurrence_id),
            ));
        }

        if !conflicting_dates.is_empty() {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "Series conflicts with existing appointments on {}",
                conflicting_dates.join(", ")
            )));
        }

        let mut appointments = Vec::with_capacity(rows.len());
        for row in rows {
            appointments.push(row.insert(&txn).await?);
        }
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::RecurringAppointmentsBooked {
                business_id: business.id,
                recurrence_id,
                first_date,
                occurrences: appointments.len(),
            })
            .await;

        info!(
            "Booked {} recurring appointments in series {}",
            appointments.len(),
            recurrence_id
        );
        Ok(RecurringBooking {
            recurrence_id,
            appointments,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_appointment(
        &self,
        business_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<appointment::Model, ServiceError> {
        Self::find_in_business(&*self.db, business_id, appointment_id).await
    }

    /// Appointments in start order. `to` is inclusive.
    #[instrument(skip(self))]
    pub async fn list_appointments(
        &self,
        business_id: Uuid,
        filter: &AppointmentFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<appointment::Model>, ServiceError> {
        let mut query =
            appointment::Entity::find().filter(appointment::Column::BusinessId.eq(business_id));
        if let Some(from) = filter.from {
            query = query.filter(appointment::Column::StartTime.gte(day_bounds(from).0));
        }
        if let Some(to) = filter.to {
            query = query.filter(appointment::Column::StartTime.lt(day_bounds(to).1));
        }
        if let Some(status) = filter.status {
            query = query.filter(appointment::Column::Status.eq(status));
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(appointment::Column::EmployeeId.eq(employee_id));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(appointment::Column::CustomerId.eq(customer_id));
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(appointment::Column::StartTime)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(Page::new(items, total))
    }

    /// Moves a scheduled appointment, re-running the overlap check against
    /// everything except itself
    #[instrument(skip(self, business), fields(business_id = %business.id))]
    pub async fn reschedule(
        &self,
        business: &business::Model,
        appointment_id: Uuid,
        input: RescheduleInput,
    ) -> Result<appointment::Model, ServiceError> {
        let start = to_second(input.start_time);
        let end = to_second(input.end_time);
        check_interval(business, start, end)?;

        let txn = self.db.begin().await?;
        lock_calendar(&txn, business.id).await?;
        let existing = Self::find_in_business(&txn, business.id, appointment_id).await?;
        if existing.status != AppointmentStatus::Scheduled {
            return Err(ServiceError::InvalidStatus(format!(
                "Only scheduled appointments can be rescheduled (status is {:?})",
                existing.status
            )));
        }
        if let Some(other) = find_conflicts(&txn, business.id, start, end, Some(appointment_id))
            .await?
            .first()
        {
            return Err(ServiceError::Conflict(format!(
                "Time slot overlaps appointment '{}'",
                other.title
            )));
        }

        let mut active: appointment::ActiveModel = existing.into();
        active.start_time = Set(start);
        active.end_time = Set(end);
        let appointment = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AppointmentRescheduled {
                appointment_id,
                start_time: start,
            })
            .await;

        info!("Rescheduled appointment: {}", appointment_id);
        Ok(appointment)
    }

    /// Closes a scheduled appointment as completed, cancelled or no-show
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        business_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<appointment::Model, ServiceError> {
        let existing = Self::find_in_business(&*self.db, business_id, appointment_id).await?;
        if existing.status == status {
            return Ok(existing);
        }
        if existing.status != AppointmentStatus::Scheduled || status == AppointmentStatus::Scheduled
        {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot change appointment status from {:?} to {:?}",
                existing.status, status
            )));
        }

        let mut active: appointment::ActiveModel = existing.into();
        active.status = Set(status);
        let appointment = active.update(&*self.db).await?;

        if status == AppointmentStatus::Cancelled {
            self.event_sender
                .send_or_log(Event::AppointmentCancelled { appointment_id })
                .await;
        }
        info!("Appointment {} is now {:?}", appointment_id, status);
        Ok(appointment)
    }

    /// Cancels one appointment, or with `whole_series` every still-scheduled
    /// occurrence of its series. Returns the cancelled appointments.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        business_id: Uuid,
        appointment_id: Uuid,
        whole_series: bool,
    ) -> Result<Vec<appointment::Model>, ServiceError> {
        let existing = Self::find_in_business(&*self.db, business_id, appointment_id).await?;

        let targets = match existing.recurrence_id {
            Some(recurrence_id) if whole_series => {
                appointment::Entity::find()
                    .filter(appointment::Column::BusinessId.eq(business_id))
                    .filter(appointment::Column::RecurrenceId.eq(recurrence_id))
                    .filter(appointment::Column::Status.eq(AppointmentStatus::Scheduled))
                    .order_by_asc(appointment::Column::StartTime)
                    .all(&*self.db)
                    .await?
            }
            _ => {
                if existing.status != AppointmentStatus::Scheduled {
                    return Err(ServiceError::InvalidStatus(format!(
                        "Appointment is already {:?}",
                        existing.status
                    )));
                }
                vec![existing]
            }
        };

        let txn = self.db.begin().await?;
        let mut cancelled = Vec::with_capacity(targets.len());
        for target in targets {
            let mut active: appointment::ActiveModel = target.into();
            active.status = Set(AppointmentStatus::Cancelled);
            cancelled.push(active.update(&txn).await?);
        }
        txn.commit().await?;

        for appointment in &cancelled {
            self.event_sender
                .send_or_log(Event::AppointmentCancelled {
                    appointment_id: appointment.id,
                })
                .await;
        }
        info!("Cancelled {} appointments", cancelled.len());
        Ok(cancelled)
    }

    /// Whether `[start, end)` is free, ignoring `exclude_id`
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        business_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Availability, ServiceError> {
        if end <= start {
            return Err(ServiceError::ValidationError(
                "end must be after start".to_string(),
            ));
        }
        let conflicts = find_conflicts(
            &*self.db,
            business_id,
            to_second(start),
            to_second(end),
            exclude_id,
        )
        .await?;
        Ok(Availability {
            available: conflicts.is_empty(),
            conflicts,
        })
    }

    /// Business-hour slots for `date`, each marked free or taken
    #[instrument(skip(self, business), fields(business_id = %business.id))]
    pub async fn time_slots(
        &self,
        business: &business::Model,
        date: NaiveDate,
        duration_minutes: Option<u32>,
    ) -> Result<DaySlots, ServiceError> {
        let duration_minutes = duration_minutes.unwrap_or(self.default_slot_minutes);
        if !(5..=480).contains(&duration_minutes) {
            return Err(ServiceError::ValidationError(
                "duration_minutes must be between 5 and 480".to_string(),
            ));
        }

        let (day_start, day_end) = day_bounds(date);
        let booked: Vec<_> = find_conflicts(&*self.db, business.id, day_start, day_end, None)
            .await?
            .into_iter()
            .map(|a| (a.start_time, a.end_time))
            .collect();

        Ok(DaySlots {
            date,
            duration_minutes,
            slots: generate_time_slots(
                date,
                business.opening_time,
                business.closing_time,
                duration_minutes,
                &booked,
            ),
        })
    }
}
