//! Slot selection and pricing for a single resource.
//!
//! The selection is keyed by slot id and keeps insertion order, which is the
//! order requests are submitted in. The backend remains the authority on
//! whether a slot is still free; this module only refuses slots that the last
//! fetched state already shows as taken.

use crate::models::{
    AvailabilitySlot, BookingRequest, BookingStatus, CustomerDetails, PaymentStatus, Resource,
    SlotStatus,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SelectionError {
    #[error("slot {0} is {1} and cannot be selected")]
    NotSelectable(i64, SlotStatus),

    #[error("slot {slot_id} belongs to resource {actual}, not {expected}")]
    WrongResource {
        slot_id: i64,
        expected: i64,
        actual: i64,
    },

    #[error("select exactly one slot to book (selected {0})")]
    ExpectedSingleSlot(usize),

    #[error("no slots selected")]
    EmptySelection,

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct SlotSelection {
    resource_id: i64,
    slots: Vec<AvailabilitySlot>,
}

impl SlotSelection {
    pub fn new(resource_id: i64) -> Self {
        Self {
            resource_id,
            slots: Vec::new(),
        }
    }

    pub fn resource_id(&self) -> i64 {
        self.resource_id
    }

    /// Adds `slot` to the selection. Returns `Ok(false)` if it was already selected.
    pub fn select(&mut self, slot: &AvailabilitySlot) -> Result<bool, SelectionError> {
        if slot.resource_id != self.resource_id {
            return Err(SelectionError::WrongResource {
                slot_id: slot.id,
                expected: self.resource_id,
                actual: slot.resource_id,
            });
        }
        if !slot.is_selectable() {
            return Err(SelectionError::NotSelectable(slot.id, slot.status));
        }
        if self.contains(slot.id) {
            return Ok(false);
        }
        self.slots.push(slot.clone());
        Ok(true)
    }

    /// Removes the slot with `slot_id`. Returns `false` if it was not selected.
    pub fn deselect(&mut self, slot_id: i64) -> bool {
        let before = self.slots.len();
        self.slots.retain(|s| s.id != slot_id);
        self.slots.len() != before
    }

    /// Checkbox-style toggle: select when `checked`, deselect otherwise.
    pub fn toggle(&mut self, slot: &AvailabilitySlot, checked: bool) -> Result<(), SelectionError> {
        if checked {
            self.select(slot)?;
        } else {
            self.deselect(slot.id);
        }
        Ok(())
    }

    pub fn contains(&self, slot_id: i64) -> bool {
        self.slots.iter().any(|s| s.id == slot_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[AvailabilitySlot] {
        &self.slots
    }

    pub fn slot_ids(&self) -> Vec<i64> {
        self.slots.iter().map(|s| s.id).collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Reconciles the selection with freshly fetched slots.
    ///
    /// Selected slots that vanished or are no longer available are dropped;
    /// the rest are replaced by their fresh copies. Returns the dropped ids.
    pub fn retain_selectable(&mut self, fresh: &[AvailabilitySlot]) -> Vec<i64> {
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.slots.len());

        for selected in self.slots.drain(..) {
            match fresh.iter().find(|s| s.id == selected.id) {
                Some(current) if current.is_selectable() => kept.push(current.clone()),
                _ => dropped.push(selected.id),
            }
        }

        self.slots = kept;
        dropped
    }

    pub fn total(&self, unit_price: Option<f64>) -> f64 {
        compute_total(unit_price, self)
    }
}

/// `unit_price * |selection|`, or 0 when the price is unset or nothing is selected.
pub fn compute_total(unit_price: Option<f64>, selection: &SlotSelection) -> f64 {
    match unit_price {
        Some(price) if !selection.is_empty() => price * selection.len() as f64,
        _ => 0.0,
    }
}

/// Single-booking flow: exactly one slot must be selected.
pub fn build_booking_request(
    resource: &Resource,
    selection: &SlotSelection,
    customer: &CustomerDetails,
) -> Result<BookingRequest, SelectionError> {
    check_resource(resource, selection)?;
    check_customer(customer)?;

    match selection.slots() {
        [slot] => Ok(request_for(
            resource,
            slot,
            customer,
            compute_total(resource.price, selection),
        )),
        other => Err(SelectionError::ExpectedSingleSlot(other.len())),
    }
}

/// Multi-slot flow: one request per selected slot, in selection order, each
/// priced at one slot.
pub fn build_booking_requests(
    resource: &Resource,
    selection: &SlotSelection,
    customer: &CustomerDetails,
) -> Result<Vec<BookingRequest>, SelectionError> {
    check_resource(resource, selection)?;
    check_customer(customer)?;
    if selection.is_empty() {
        return Err(SelectionError::EmptySelection);
    }

    let unit = resource.price.unwrap_or(0.0);
    Ok(selection
        .slots()
        .iter()
        .map(|slot| request_for(resource, slot, customer, unit))
        .collect())
}

fn request_for(
    resource: &Resource,
    slot: &AvailabilitySlot,
    customer: &CustomerDetails,
    amount: f64,
) -> BookingRequest {
    BookingRequest {
        resource_id: resource.id,
        slot_id: slot.id,
        customer_name: customer.name.trim().to_string(),
        customer_email: customer.email.trim().to_string(),
        customer_phone: customer
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        final_amount: amount,
        date: slot.date,
        start_time: slot.start_time,
        end_time: slot.end_time,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
    }
}

fn check_resource(resource: &Resource, selection: &SlotSelection) -> Result<(), SelectionError> {
    if let Some(slot) = selection.slots().iter().find(|s| s.resource_id != resource.id) {
        return Err(SelectionError::WrongResource {
            slot_id: slot.id,
            expected: resource.id,
            actual: slot.resource_id,
        });
    }
    Ok(())
}

fn check_customer(customer: &CustomerDetails) -> Result<(), SelectionError> {
    if customer.name.trim().is_empty() {
        return Err(SelectionError::MissingField("customerName"));
    }
    if customer.email.trim().is_empty() {
        return Err(SelectionError::MissingField("customerEmail"));
    }
    Ok(())
}
