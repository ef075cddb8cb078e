use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::conflict::{detect_conflicts, BookingInterval, ConflictPair, EventInterval};
use crate::models::{Trip, TripStatus};
use crate::repository::{CheckoutCommit, TripStore};
use meridian_core::idempotency::IdempotencyStore;
use meridian_core::repository::{CalendarStore, NewCalendarEvent, PaymentMethodStore};

/// Where a user with no saved payment method is sent to add one.
const PAYMENT_SETUP_URL: &str = "/profile";

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub trip_id: Uuid,
    pub payment_method_id: Option<Uuid>,
    #[serde(default)]
    pub proceed_if_conflicts: bool,
    /// Required for agent-initiated checkout; duplicate human submits are
    /// instead prevented by the UI disabling the button.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSuccess {
    pub trip: Trip,
    /// True when the trip was found already CONFIRMED and nothing was
    /// written; retrying a committed checkout is a harmless no-op.
    pub already_confirmed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: trip does not belong to the acting user")]
    Forbidden,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Recoverable and user-actionable; carries the payment-setup redirect.
    #[error("No payment method on file")]
    NoPaymentMethod { redirect: String },

    /// Business outcome, not a system error: overlaps exist and the caller
    /// did not override. Carries the full pair list so the caller can
    /// re-invoke with `proceed_if_conflicts = true`.
    #[error("Schedule conflicts detected")]
    Conflict(Vec<ConflictPair>),

    #[error("Duplicate operation: idempotency key already used")]
    DuplicateOperation,

    /// Transactional/system failure; nothing committed, safe to retry.
    #[error("Checkout failed: {0}")]
    Failed(String),
}

/// Orchestrates checkout: idempotency guard, payment-method resolution,
/// conflict gate, atomic commit, then marking the key used.
pub struct CheckoutService {
    trips: Arc<dyn TripStore>,
    calendar: Arc<dyn CalendarStore>,
    payments: Arc<dyn PaymentMethodStore>,
    ledger: Arc<dyn IdempotencyStore>,
}

impl CheckoutService {
    pub fn new(
        trips: Arc<dyn TripStore>,
        calendar: Arc<dyn CalendarStore>,
        payments: Arc<dyn PaymentMethodStore>,
        ledger: Arc<dyn IdempotencyStore>,
    ) -> Self {
        Self {
            trips,
            calendar,
            payments,
            ledger,
        }
    }

    pub async fn checkout(
        &self,
        req: CheckoutRequest,
        acting_user_id: Uuid,
    ) -> Result<CheckoutSuccess, CheckoutError> {
        // 1. Resolve trip and verify ownership
        let trip = self
            .trips
            .get_trip(req.trip_id)
            .await
            .map_err(|e| CheckoutError::Failed(e.to_string()))?
            .ok_or_else(|| CheckoutError::NotFound(format!("trip {}", req.trip_id)))?;

        if trip.user_id != acting_user_id {
            return Err(CheckoutError::Forbidden);
        }

        if matches!(trip.status, TripStatus::Completed | TripStatus::Cancelled) {
            return Err(CheckoutError::InvalidState(format!(
                "cannot check out a {} trip",
                trip.status.as_str()
            )));
        }

        // 2. Idempotency guard: a used key short-circuits before anything
        //    else, including retries of an already-committed checkout
        let existing_record = match req.idempotency_key.as_deref() {
            Some(key) => {
                let record = self
                    .ledger
                    .find(key)
                    .await
                    .map_err(|e| CheckoutError::Failed(e.to_string()))?;
                if record.as_ref().is_some_and(|r| r.used) {
                    return Err(CheckoutError::DuplicateOperation);
                }
                record
            }
            None => None,
        };

        if trip.status == TripStatus::Confirmed {
            // A previous attempt committed but may have died before marking
            // its key; heal the record and report the no-op
            if let Some(key) = req.idempotency_key.as_deref() {
                if existing_record.is_some() {
                    if let Err(e) = self.ledger.mark_used(key).await {
                        tracing::warn!(key, error = %e, "Failed to mark idempotency key used");
                    }
                }
            }
            return Ok(CheckoutSuccess {
                trip,
                already_confirmed: true,
            });
        }

        // 3. Resolve payment method: explicit id must belong to the owner,
        //    otherwise fall back to the owner's first saved method
        let methods = self
            .payments
            .list_for_user(trip.user_id)
            .await
            .map_err(|e| CheckoutError::Failed(e.to_string()))?;

        let payment_method = match req.payment_method_id {
            Some(requested) => methods
                .iter()
                .find(|m| m.id == requested)
                .ok_or_else(|| {
                    CheckoutError::Validation(
                        "payment method does not belong to the trip owner".to_string(),
                    )
                })?
                .clone(),
            None => match methods.first() {
                Some(method) => method.clone(),
                None => {
                    return Err(CheckoutError::NoPaymentMethod {
                        redirect: PAYMENT_SETUP_URL.to_string(),
                    });
                }
            },
        };

        // First sight of the key; an existing-but-unused record means an
        // earlier attempt died before commit. Either way we proceed; the
        // transactional re-read below is the backstop that keeps the
        // operation from completing twice.
        if let Some(key) = req.idempotency_key.as_deref() {
            if existing_record.is_none() {
                self.ledger
                    .create(key, serde_json::json!({ "trip_id": req.trip_id }))
                    .await
                    .map_err(|e| CheckoutError::Failed(e.to_string()))?;
            }
        }

        // 4. Conflict gate: abort without mutating unless overridden
        let conflicts = self.conflicts_for(&trip).await?;
        if !conflicts.is_empty() && !req.proceed_if_conflicts {
            return Err(CheckoutError::Conflict(conflicts));
        }

        // 5. Atomic commit: trip + bookings + confirmation calendar event
        let event = trip.date_range().map(|(start, end)| NewCalendarEvent {
            user_id: trip.user_id,
            title: format!("Trip: {}", trip.name),
            start,
            end,
            is_all_day: true,
            description: Some(
                trip.description
                    .clone()
                    .unwrap_or_else(|| "Trip confirmed via Meridian".to_string()),
            ),
        });

        let commit = self
            .trips
            .finalize_checkout(trip.id, payment_method.id, event)
            .await
            .map_err(|e| CheckoutError::Failed(e.to_string()))?;

        // 6. Mark the key used only now that the commit is durable. A miss
        //    here leaves the operation retryable, which the no-op commit
        //    absorbs, so it is logged rather than surfaced.
        if let Some(key) = req.idempotency_key.as_deref() {
            if let Err(e) = self.ledger.mark_used(key).await {
                tracing::warn!(key, error = %e, "Failed to mark idempotency key used");
            }
        }

        let already_confirmed = matches!(commit, CheckoutCommit::AlreadyConfirmed { .. });
        let trip = commit.trip().clone();
        tracing::info!(trip_id = %trip.id, already_confirmed, "Checkout committed");

        Ok(CheckoutSuccess {
            trip,
            already_confirmed,
        })
    }

    /// Read-only conflict preview for UI pre-flight warnings.
    pub async fn preview_conflicts(
        &self,
        trip_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Vec<ConflictPair>, CheckoutError> {
        let trip = self
            .trips
            .get_trip(trip_id)
            .await
            .map_err(|e| CheckoutError::Failed(e.to_string()))?
            .ok_or_else(|| CheckoutError::NotFound(format!("trip {}", trip_id)))?;

        if trip.user_id != acting_user_id {
            return Err(CheckoutError::Forbidden);
        }

        self.conflicts_for(&trip).await
    }

    async fn conflicts_for(&self, trip: &Trip) -> Result<Vec<ConflictPair>, CheckoutError> {
        let events = self
            .calendar
            .list_events(trip.user_id)
            .await
            .map_err(|e| CheckoutError::Failed(e.to_string()))?;

        let booking_intervals: Vec<BookingInterval> =
            trip.bookings.iter().map(BookingInterval::from).collect();
        let event_intervals: Vec<EventInterval> = events.iter().map(EventInterval::from).collect();

        Ok(detect_conflicts(&booking_intervals, &event_intervals))
    }
}
