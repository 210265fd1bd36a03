use std::sync::Arc;

use crate::client::{BookingApi, ClientError, ErrorKind};
use crate::models::{AvailabilitySlot, Booking, BookingRequest, CustomerDetails, Resource};
use crate::selection::{build_booking_request, build_booking_requests, SlotSelection};

const DOUBLE_BOOKING_MESSAGE: &str =
    "Sorry, that time slot was just booked by someone else. Please pick a different time.";

/// Result of submitting a selection.
#[derive(Debug)]
pub struct BookingOutcome {
    /// Bookings the API accepted, in submission order.
    pub created: Vec<Booking>,
    /// Slot list fetched after submission. `None` if the re-fetch failed.
    pub slots: Option<Vec<AvailabilitySlot>>,
    /// Selected slot ids dropped because the fresh list shows them taken.
    pub dropped: Vec<i64>,
    /// First failure. Submission stops there; nothing is retried.
    pub error: Option<ClientError>,
}

impl BookingOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(ClientError::kind)
    }

    pub fn total_charged(&self) -> f64 {
        self.created.iter().map(|b| b.final_amount).sum()
    }
}

#[derive(Debug)]
pub struct CancelOutcome {
    pub cancelled: Booking,
    pub bookings: Vec<Booking>,
    pub slots: Vec<AvailabilitySlot>,
}

/// Posts bookings one at a time, then re-reads slot state.
pub struct BookingFlow {
    api: Arc<dyn BookingApi>,
}

impl BookingFlow {
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self { api }
    }

    /// Books the single selected slot.
    pub async fn submit_one(
        &self,
        resource: &Resource,
        selection: &mut SlotSelection,
        customer: &CustomerDetails,
    ) -> Result<BookingOutcome, ClientError> {
        let request = build_booking_request(resource, selection, customer)?;
        Ok(self.submit_requests(resource.id, selection, vec![request]).await)
    }

    /// Books every selected slot, one request per slot.
    ///
    /// Validation failures are returned as `Err` before any request is made.
    /// API failures end up in [`BookingOutcome::error`] alongside whatever
    /// was booked before the failure.
    pub async fn submit(
        &self,
        resource: &Resource,
        selection: &mut SlotSelection,
        customer: &CustomerDetails,
    ) -> Result<BookingOutcome, ClientError> {
        let requests = build_booking_requests(resource, selection, customer)?;
        Ok(self.submit_requests(resource.id, selection, requests).await)
    }

    async fn submit_requests(
        &self,
        resource_id: i64,
        selection: &mut SlotSelection,
        requests: Vec<BookingRequest>,
    ) -> BookingOutcome {
        let mut created = Vec::with_capacity(requests.len());
        let mut error = None;

        for request in &requests {
            match self.api.create_booking(request).await {
                Ok(booking) => {
                    selection.deselect(request.slot_id);
                    created.push(booking);
                }
                Err(e) => {
                    tracing::warn!(
                        resource_id,
                        slot_id = request.slot_id,
                        kind = %e.kind(),
                        error = %e,
                        "booking submission failed"
                    );
                    error = Some(e);
                    break;
                }
            }
        }

        let (slots, dropped) = match self.api.list_slots(resource_id).await {
            Ok(slots) => {
                let dropped = selection.retain_selectable(&slots);
                (Some(slots), dropped)
            }
            Err(e) => {
                tracing::warn!(resource_id, error = %e, "failed to refresh slots after booking");
                if error.is_none() {
                    error = Some(e);
                }
                (None, Vec::new())
            }
        };

        tracing::info!(
            resource_id,
            created = created.len(),
            requested = requests.len(),
            "booking submission finished"
        );

        BookingOutcome {
            created,
            slots,
            dropped,
            error,
        }
    }

    /// Cancels a booking, then re-reads the customer's bookings and the
    /// resource's slots.
    pub async fn cancel(
        &self,
        booking_id: i64,
        customer_id: i64,
        resource_id: i64,
    ) -> Result<CancelOutcome, ClientError> {
        let cancelled = self.api.cancel_booking(booking_id).await?;
        tracing::info!(booking_id, "booking cancelled");

        let bookings = self.api.customer_bookings(customer_id).await?;
        let slots = self.api.list_slots(resource_id).await?;

        Ok(CancelOutcome {
            cancelled,
            bookings,
            slots,
        })
    }
}

/// Message to show next to the booking form.
pub fn user_message(err: &ClientError) -> String {
    match err.kind() {
        ErrorKind::DoubleBooking => DOUBLE_BOOKING_MESSAGE.to_string(),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::models::{BookingStatus, PaymentStatus, SlotStatus};
    use crate::selection::SelectionError;

    /// In-memory API that rejects booked slots the way the server does.
    struct MockApi {
        slots: Mutex<Vec<AvailabilitySlot>>,
        bookings: Mutex<Vec<Booking>>,
        requests: Mutex<Vec<BookingRequest>>,
    }

    impl MockApi {
        fn new(slots: Vec<AvailabilitySlot>) -> Self {
            Self {
                slots: Mutex::new(slots),
                bookings: Mutex::new(vec![]),
                requests: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl BookingApi for MockApi {
        async fn list_slots(&self, resource_id: i64) -> Result<Vec<AvailabilitySlot>, ClientError> {
            Ok(self
                .slots
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.resource_id == resource_id)
                .cloned()
                .collect())
        }

        async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError> {
            self.requests.lock().unwrap().push(request.clone());
            let mut slots = self.slots.lock().unwrap();
            let slot = slots
                .iter_mut()
                .find(|s| s.id == request.slot_id)
                .ok_or_else(|| ClientError::from_response(404, r#"{"error":"slot not found"}"#))?;
            if slot.status != SlotStatus::Available {
                return Err(ClientError::from_response(
                    409,
                    r#"{"error":"Double booking detected: slot is no longer available."}"#,
                ));
            }
            slot.status = SlotStatus::Booked;

            let mut bookings = self.bookings.lock().unwrap();
            let booking = Booking {
                id: bookings.len() as i64 + 1,
                resource_id: request.resource_id,
                slot_id: request.slot_id,
                customer_id: Some(5),
                customer_name: request.customer_name.clone(),
                customer_email: request.customer_email.clone(),
                customer_phone: request.customer_phone.clone(),
                date: request.date,
                start_time: request.start_time,
                end_time: request.end_time,
                status: BookingStatus::Confirmed,
                payment_status: PaymentStatus::Unpaid,
                final_amount: request.final_amount,
                resource_name: None,
            };
            bookings.push(booking.clone());
            Ok(booking)
        }

        async fn cancel_booking(&self, booking_id: i64) -> Result<Booking, ClientError> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == booking_id)
                .ok_or_else(|| ClientError::from_response(404, r#"{"error":"booking not found"}"#))?;
            booking.status = BookingStatus::Cancelled;
            if let Some(slot) = self
                .slots
                .lock()
                .unwrap()
                .iter_mut()
                .find(|s| s.id == booking.slot_id)
            {
                slot.status = SlotStatus::Available;
            }
            Ok(booking.clone())
        }

        async fn customer_bookings(&self, customer_id: i64) -> Result<Vec<Booking>, ClientError> {
            Ok(self
                .bookings
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.customer_id == Some(customer_id) && b.status.is_active())
                .cloned()
                .collect())
        }
    }

    fn slot(id: i64, status: SlotStatus) -> AvailabilitySlot {
        AvailabilitySlot {
            id,
            resource_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            start_time: NaiveTime::from_hms_opt(8 + id as u32, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9 + id as u32, 0, 0).unwrap(),
            status,
            reason: None,
        }
    }

    fn resource() -> Resource {
        Resource {
            id: 1,
            provider_id: 2,
            name: "Physio".to_string(),
            description: String::new(),
            specialization: String::new(),
            category: None,
            status: "active".to_string(),
            price: Some(50.0),
            provider_name: None,
        }
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            customer_id: Some(5),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: Some("+15551110000".to_string()),
        }
    }

    fn select(ids: &[i64]) -> SlotSelection {
        let mut sel = SlotSelection::new(1);
        for id in ids {
            sel.select(&slot(*id, SlotStatus::Available)).unwrap();
        }
        sel
    }

    #[tokio::test]
    async fn test_multi_slot_submission_books_each_slot() {
        let api = Arc::new(MockApi::new(vec![
            slot(1, SlotStatus::Available),
            slot(2, SlotStatus::Available),
            slot(3, SlotStatus::Available),
        ]));
        let flow = BookingFlow::new(api.clone());
        let mut sel = select(&[1, 2, 3]);
        assert_eq!(sel.total(resource().price), 150.0);

        let outcome = flow.submit(&resource(), &mut sel, &customer()).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.created.len(), 3);
        assert_eq!(outcome.total_charged(), 150.0);
        assert!(sel.is_empty());
        let slots = outcome.slots.unwrap();
        assert!(slots.iter().all(|s| s.status == SlotStatus::Booked));
        let order: Vec<i64> = api.requests.lock().unwrap().iter().map(|r| r.slot_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stale_booked_slot_yields_double_booking() {
        // Another customer took slot 2 after this client fetched it
        let api = Arc::new(MockApi::new(vec![slot(2, SlotStatus::Booked)]));
        let flow = BookingFlow::new(api.clone());
        let mut sel = select(&[2]);

        let outcome = flow.submit_one(&resource(), &mut sel, &customer()).await.unwrap();

        assert_eq!(outcome.error_kind(), Some(ErrorKind::DoubleBooking));
        assert!(outcome.created.is_empty());
        let slots = outcome.slots.unwrap();
        assert_eq!(slots[0].status, SlotStatus::Booked);
        assert_eq!(outcome.dropped, vec![2]);
        assert!(sel.is_empty());
        assert_eq!(
            user_message(outcome.error.as_ref().unwrap()),
            DOUBLE_BOOKING_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_submission_stops_at_first_failure() {
        let api = Arc::new(MockApi::new(vec![
            slot(1, SlotStatus::Available),
            slot(2, SlotStatus::Booked),
            slot(3, SlotStatus::Available),
        ]));
        let flow = BookingFlow::new(api.clone());
        let mut sel = select(&[1, 2, 3]);

        let outcome = flow.submit(&resource(), &mut sel, &customer()).await.unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::DoubleBooking));
        assert_eq!(api.requests.lock().unwrap().len(), 2);
        // Slot 3 was never attempted and is still free, so it stays selected
        assert_eq!(sel.slot_ids(), vec![3]);
    }

    #[tokio::test]
    async fn test_validation_errors_make_no_requests() {
        let api = Arc::new(MockApi::new(vec![slot(1, SlotStatus::Available)]));
        let flow = BookingFlow::new(api.clone());
        let mut sel = select(&[1]);
        let mut c = customer();
        c.name.clear();

        let err = flow.submit(&resource(), &mut sel, &c).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            err,
            ClientError::Validation(SelectionError::MissingField("customerName"))
        ));
        assert!(api.requests.lock().unwrap().is_empty());

        let mut two = select(&[1, 2]);
        let err = flow.submit_one(&resource(), &mut two, &customer()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_cancel_removes_booking_and_frees_slot() {
        let api = Arc::new(MockApi::new(vec![slot(1, SlotStatus::Available)]));
        let flow = BookingFlow::new(api.clone());
        let mut sel = select(&[1]);
        let outcome = flow.submit_one(&resource(), &mut sel, &customer()).await.unwrap();
        let booking = &outcome.created[0];
        assert_eq!(booking.status, BookingStatus::Confirmed);

        let cancelled = flow.cancel(booking.id, 5, 1).await.unwrap();

        assert_eq!(cancelled.cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.bookings.iter().all(|b| b.id != booking.id));
        assert_eq!(cancelled.slots[0].status, SlotStatus::Available);
    }

    #[test]
    fn test_user_message_passes_other_errors_through() {
        let err = ClientError::from_response(400, r#"{"error":"customerEmail is required"}"#);
        assert_eq!(user_message(&err), "customerEmail is required");
    }
}
