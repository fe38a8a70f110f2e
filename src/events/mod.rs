use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain events published after a write commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    // Business events
    BusinessCreated(Uuid),
    BusinessUpdated(Uuid),
    BusinessDeleted {
        business_id: Uuid,
        rows_removed: u64,
    },

    // Catalog events
    CategoryCreated { business_id: Uuid, category_id: Uuid },
    CategoryDeleted { business_id: Uuid, category_id: Uuid },
    ProductCreated { business_id: Uuid, product_id: Uuid },
    ProductUpdated { business_id: Uuid, product_id: Uuid },
    ProductDeleted { business_id: Uuid, product_id: Uuid },
    StockAdjusted {
        business_id: Uuid,
        product_id: Uuid,
        old_quantity: Decimal,
        new_quantity: Decimal,
        reason: String,
    },
    LowStock {
        business_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        reorder_level: Decimal,
    },

    // Directory events
    CustomerCreated { business_id: Uuid, customer_id: Uuid },
    SupplierCreated { business_id: Uuid, supplier_id: Uuid },
    EmployeeCreated { business_id: Uuid, employee_id: Uuid },

    // Production events
    ProductionCreated { business_id: Uuid, production_id: Uuid },
    ProductionStatusChanged {
        production_id: Uuid,
        old_status: String,
        new_status: String,
    },
    ProductionOutputRecorded {
        production_id: Uuid,
        product_id: Option<Uuid>,
        quantity: Decimal,
    },

    // Distribution events
    DeliveryScheduled { business_id: Uuid, delivery_id: Uuid },
    DeliveryStatusChanged {
        delivery_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Finance events
    FundingRecorded {
        business_id: Uuid,
        funding_source_id: Uuid,
        amount: Decimal,
    },
    ExpenditureRecorded {
        business_id: Uuid,
        expenditure_id: Uuid,
        amount: Decimal,
    },
    DebtCreated { business_id: Uuid, debt_id: Uuid },
    DebtPaymentRecorded {
        debt_id: Uuid,
        amount: Decimal,
        settled: bool,
    },

    // Sales events
    SaleRecorded {
        business_id: Uuid,
        sale_id: Uuid,
        total: Decimal,
    },
    SaleVoided { business_id: Uuid, sale_id: Uuid },

    // Appointment events
    AppointmentBooked {
        business_id: Uuid,
        appointment_id: Uuid,
        start_time: DateTime<Utc>,
    },
    RecurringAppointmentsBooked {
        business_id: Uuid,
        recurrence_id: Uuid,
        first_date: NaiveDate,
        occurrences: usize,
    },
    AppointmentRescheduled {
        appointment_id: Uuid,
        start_time: DateTime<Utc>,
    },
    AppointmentCancelled { appointment_id: Uuid },
}

impl Event {
    /// Short stable name used for log fields and metric labels
    pub fn name(&self) -> &'static str {
        match self {
            Event::BusinessCreated(_) => "business_created",
            Event::BusinessUpdated(_) => "business_updated",
            Event::BusinessDeleted { .. } => "business_deleted",
            Event::CategoryCreated { .. } => "category_created",
            Event::CategoryDeleted { .. } => "category_deleted",
            Event::ProductCreated { .. } => "product_created",
            Event::ProductUpdated { .. } => "product_updated",
            Event::ProductDeleted { .. } => "product_deleted",
            Event::StockAdjusted { .. } => "stock_adjusted",
            Event::LowStock { .. } => "low_stock",
            Event::CustomerCreated { .. } => "customer_created",
            Event::SupplierCreated { .. } => "supplier_created",
            Event::EmployeeCreated { .. } => "employee_created",
            Event::ProductionCreated { .. } => "production_created",
            Event::ProductionStatusChanged { .. } => "production_status_changed",
            Event::ProductionOutputRecorded { .. } => "production_output_recorded",
            Event::DeliveryScheduled { .. } => "delivery_scheduled",
            Event::DeliveryStatusChanged { .. } => "delivery_status_changed",
            Event::FundingRecorded { .. } => "funding_recorded",
            Event::ExpenditureRecorded { .. } => "expenditure_recorded",
            Event::DebtCreated { .. } => "debt_created",
            Event::DebtPaymentRecorded { .. } => "debt_payment_recorded",
            Event::SaleRecorded { .. } => "sale_recorded",
            Event::SaleVoided { .. } => "sale_voided",
            Event::AppointmentBooked { .. } => "appointment_booked",
            Event::RecurringAppointmentsBooked { .. } => "recurring_appointments_booked",
            Event::AppointmentRescheduled { .. } => "appointment_rescheduled",
            Event::AppointmentCancelled { .. } => "appointment_cancelled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, waiting for channel capacity
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Publishes without blocking the request path. A full or closed channel
    /// drops the event with a warning; the write it describes has already committed.
    pub async fn send_or_log(&self, event: Event) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = event.name(), "Event channel full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                warn!(event = event.name(), "Event channel closed, dropping event");
            }
        }
    }
}

/// Creates a bounded channel and the sender handed to services
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event and counting it.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        crate::metrics::record_domain_event(event.name());

        match &event {
            Event::LowStock {
                business_id,
                product_id,
                quantity,
                reorder_level,
            } => {
                warn!(
                    %business_id,
                    %product_id,
                    %quantity,
                    %reorder_level,
                    "Product stock at or below reorder level"
                );
            }
            Event::BusinessDeleted {
                business_id,
                rows_removed,
            } => {
                info!(%business_id, rows_removed, "Business and dependent records removed");
            }
            Event::DebtPaymentRecorded {
                debt_id,
                amount,
                settled: true,
            } => {
                info!(%debt_id, %amount, "Debt settled");
            }
            other => {
                debug!(event = other.name(), "Received event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_delivers_when_capacity_available() {
        let (sender, mut rx) = channel(4);
        let id = Uuid::new_v4();
        sender.send_or_log(Event::BusinessCreated(id)).await;
        assert_eq!(rx.recv().await, Some(Event::BusinessCreated(id)));
    }

    #[tokio::test]
    async fn send_or_log_drops_instead_of_blocking_when_full() {
        let (sender, mut rx) = channel(1);
        sender.send_or_log(Event::BusinessCreated(Uuid::new_v4())).await;
        sender.send_or_log(Event::BusinessUpdated(Uuid::new_v4())).await;

        assert!(matches!(rx.recv().await, Some(Event::BusinessCreated(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_or_log_tolerates_closed_channel() {
        let (sender, rx) = channel(1);
        drop(rx);
        sender
            .send_or_log(Event::AppointmentCancelled {
                appointment_id: Uuid::new_v4(),
            })
            .await;
        assert!(sender.send(Event::BusinessCreated(Uuid::new_v4())).await.is_err());
    }

    #[test]
    fn event_names_are_snake_case() {
        let event = Event::SaleVoided {
            business_id: Uuid::nil(),
            sale_id: Uuid::nil(),
        };
        assert_eq!(event.name(), "sale_voided");
    }
}
