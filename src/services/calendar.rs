use crate::models::Booking;

fn escape_text(s: &str) -> String {
    s.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Single-event iCalendar document for a booking. Times are floating
/// (no time zone), matching how slots are stored.
pub fn generate_ics(booking: &Booking) -> String {
    let dtstart = booking
        .date
        .and_time(booking.start_time)
        .format("%Y%m%dT%H%M%S")
        .to_string();
    let dtend = booking
        .date
        .and_time(booking.end_time)
        .format("%Y%m%dT%H%M%S")
        .to_string();
    let dtstamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let uid = format!("booking-{}@bookfast", booking.id);

    let summary = escape_text(&format!(
        "Appointment: {}",
        booking.resource_name.as_deref().unwrap_or("Booking")
    ));
    let description = escape_text(&format!(
        "Booked by {} ({}). Amount: {:.2}. Status: {}.",
        booking.customer_name,
        booking.customer_email,
        booking.final_amount,
        booking.status.as_str()
    ));

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Bookfast//Bookings//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentStatus};
    use chrono::{NaiveDate, NaiveTime};

    fn booking(resource_name: Option<&str>) -> Booking {
        Booking {
            id: 7,
            resource_id: 1,
            slot_id: 3,
            customer_id: Some(2),
            customer_name: "Alice".to_string(),
            customer_email: "alice@example.com".to_string(),
            customer_phone: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Unpaid,
            final_amount: 50.0,
            resource_name: resource_name.map(str::to_string),
        }
    }

    #[test]
    fn test_generate_ics() {
        let ics = generate_ics(&booking(Some("Physio, Room 2")));
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("DTSTART:20250315T140000"));
        assert!(ics.contains("DTEND:20250315T150000"));
        assert!(ics.contains("SUMMARY:Appointment: Physio\\, Room 2"));
        assert!(ics.contains("Amount: 50.00"));
        assert!(ics.contains("UID:booking-7@bookfast"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_line_breaks_in_names_are_escaped() {
        let mut b = booking(None);
        b.customer_name = "Alice\r\nX-INJECTED:1\rBob".to_string();
        let ics = generate_ics(&b);
        assert!(!ics.contains("Alice\r"));
        assert!(ics.contains("Alice\\nX-INJECTED:1\\nBob"));
        // Every CR in the document belongs to a CRLF line ending
        assert_eq!(ics.matches('\r').count(), ics.matches("\r\n").count());
    }

    #[test]
    fn test_generate_ics_without_resource_name() {
        let ics = generate_ics(&booking(None));
        assert!(ics.contains("SUMMARY:Appointment: Booking"));
    }
}
