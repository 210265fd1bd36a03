use rusqlite::{Connection, ErrorCode, TransactionBehavior};

use crate::db::queries;
use crate::models::{
    AvailabilitySlot, Booking, BookingRequest, BookingStatus, PaymentStatus, Role, SlotStatus,
};

pub const DOUBLE_BOOKING_ERROR: &str = "Double booking detected: slot is no longer available.";

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("resource not found")]
    ResourceNotFound,
    #[error("slot not found")]
    SlotNotFound,
    #[error("booking not found")]
    BookingNotFound,
    #[error("final amount {given:.2} does not match price {expected:.2}")]
    AmountMismatch { given: f64, expected: f64 },
    #[error("cannot change a slot from {from} to {to}")]
    InvalidTransition { from: SlotStatus, to: SlotStatus },
    #[error("{}", DOUBLE_BOOKING_ERROR)]
    Conflict,
    #[error("not allowed to modify this booking")]
    Forbidden,
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Amounts are compared to the cent.
fn amounts_match(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.005
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Books one slot for `customer_id`.
///
/// Everything from the availability check to flipping the slot to `booked`
/// happens in a single immediate transaction, so two customers racing for
/// the same slot get one booking and one `Conflict`. Date and times are
/// taken from the stored slot, not from the request.
pub fn book_slot(
    conn: &mut Connection,
    request: &BookingRequest,
    customer_id: i64,
) -> Result<Booking, SchedulingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let resource =
        queries::get_resource(&tx, request.resource_id)?.ok_or(SchedulingError::ResourceNotFound)?;
    let slot = queries::get_slot(&tx, request.slot_id)?
        .filter(|s| s.resource_id == resource.id)
        .ok_or(SchedulingError::SlotNotFound)?;

    if !slot.is_selectable() {
        tracing::info!(slot_id = slot.id, status = %slot.status, "slot not available");
        return Err(SchedulingError::Conflict);
    }

    let clashes =
        queries::overlapping_bookings(&tx, resource.id, &slot.date, &slot.start_time, &slot.end_time)?;
    if !clashes.is_empty() {
        tracing::info!(slot_id = slot.id, clashes = clashes.len(), "slot overlaps a live booking");
        return Err(SchedulingError::Conflict);
    }

    let expected = resource.price.unwrap_or(0.0);
    if !amounts_match(request.final_amount, expected) {
        return Err(SchedulingError::AmountMismatch {
            given: request.final_amount,
            expected,
        });
    }

    let mut stored = request.clone();
    stored.date = slot.date;
    stored.start_time = slot.start_time;
    stored.end_time = slot.end_time;
    stored.payment_status = PaymentStatus::Unpaid;
    if stored.status == BookingStatus::Cancelled {
        stored.status = BookingStatus::Pending;
    }

    let booking_id = match queries::insert_booking(&tx, &stored, customer_id, expected) {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => return Err(SchedulingError::Conflict),
        Err(e) => return Err(e.into()),
    };
    queries::update_slot_status(&tx, slot.id, SlotStatus::Booked, None)?;

    let booking = queries::get_booking(&tx, booking_id)?.ok_or(SchedulingError::BookingNotFound)?;
    tx.commit()?;

    tracing::info!(booking_id, slot_id = slot.id, customer_id, "booking created");
    Ok(booking)
}

/// Cancels a booking and frees its slot.
///
/// Allowed for the customer who made it, the provider owning the resource,
/// and admins. Cancelling twice returns the cancelled booking unchanged.
pub fn cancel_booking(
    conn: &mut Connection,
    booking_id: i64,
    actor_id: i64,
    actor_role: Role,
) -> Result<Booking, SchedulingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = queries::get_booking(&tx, booking_id)?.ok_or(SchedulingError::BookingNotFound)?;

    let allowed = match actor_role {
        Role::Admin => true,
        Role::Customer => booking.customer_id == Some(actor_id),
        Role::Provider => queries::get_resource(&tx, booking.resource_id)?
            .is_some_and(|r| r.provider_id == actor_id),
    };
    if !allowed {
        return Err(SchedulingError::Forbidden);
    }

    if !booking.status.is_active() {
        return Ok(booking);
    }

    queries::update_booking_status(&tx, booking.id, BookingStatus::Cancelled)?;
    if let Some(slot) = queries::get_slot(&tx, booking.slot_id)? {
        if slot.status == SlotStatus::Booked {
            queries::update_slot_status(&tx, slot.id, SlotStatus::Available, None)?;
        }
    }

    let booking = queries::get_booking(&tx, booking_id)?.ok_or(SchedulingError::BookingNotFound)?;
    tx.commit()?;

    tracing::info!(booking_id, actor_id, "booking cancelled");
    Ok(booking)
}

/// Provider-side status change. Only `available` and `unavailable` can be
/// set by hand; `booked` is owned by the booking flow.
pub fn set_slot_status(
    conn: &Connection,
    slot: &AvailabilitySlot,
    next: SlotStatus,
    reason: Option<&str>,
) -> Result<AvailabilitySlot, SchedulingError> {
    let manual = slot.status != SlotStatus::Booked
        && next != SlotStatus::Booked
        && (slot.status == next || slot.status.can_transition_to(next));
    if !manual {
        return Err(SchedulingError::InvalidTransition {
            from: slot.status,
            to: next,
        });
    }

    let reason = match next {
        SlotStatus::Unavailable => reason,
        _ => None,
    };
    queries::update_slot_status(conn, slot.id, next, reason)?;
    queries::get_slot(conn, slot.id)?.ok_or(SchedulingError::SlotNotFound)
}
