use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::slot::hhmm;
use crate::models::{
    AvailabilitySlot, Booking, BookingRequest, BookingStatus, EarningsSummary, NewResource,
    NewReview, NewSlot, PaymentStatus, Resource, Review, Role, SlotStatus, User,
};

const DATE_FMT: &str = "%Y-%m-%d";

fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn fmt_time(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).with_context(|| format!("invalid stored date: {s}"))
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    hhmm::parse(s).map_err(anyhow::Error::msg)
}

fn now_str() -> String {
    Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ── Users ──

const USER_COLUMNS: &str = "id, name, email, phone, role";

fn parse_user_row(row: &Row) -> anyhow::Result<User> {
    let role: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        role: Role::parse(&role).with_context(|| format!("invalid stored role: {role}"))?,
    })
}

pub fn create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    phone: Option<&str>,
    role: Role,
    password_hash: &str,
) -> anyhow::Result<User> {
    conn.execute(
        "INSERT INTO users (name, email, phone, role, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, email, phone, role.as_str(), password_hash],
    )?;
    let id = conn.last_insert_rowid();
    get_user(conn, id)?.context("user vanished after insert")
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    let row = stmt
        .query_row(params![id], |row| Ok(parse_user_row(row)))
        .optional()?;
    row.transpose()
}

pub fn email_exists(conn: &Connection, email: &str) -> anyhow::Result<bool> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1 COLLATE NOCASE",
        params![email],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// The user and their stored password hash.
pub fn get_credentials(conn: &Connection, email: &str) -> anyhow::Result<Option<(User, String)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1 COLLATE NOCASE"
    ))?;
    let row = stmt
        .query_row(params![email], |row| {
            let hash: String = row.get(5)?;
            Ok(parse_user_row(row).map(|u| (u, hash)))
        })
        .optional()?;
    row.transpose()
}

// ── Resources ──

const RESOURCE_SELECT: &str = "SELECT r.id, r.provider_id, r.name, r.description, r.specialization, \
     r.category, r.status, r.price, u.name \
     FROM resources r LEFT JOIN users u ON u.id = r.provider_id";

fn parse_resource_row(row: &Row) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        provider_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        specialization: row.get(4)?,
        category: row.get(5)?,
        status: row.get(6)?,
        price: row.get(7)?,
        provider_name: row.get(8)?,
    })
}

pub fn create_resource(
    conn: &Connection,
    provider_id: i64,
    resource: &NewResource,
) -> anyhow::Result<Resource> {
    conn.execute(
        "INSERT INTO resources (provider_id, name, description, specialization, category, price)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            provider_id,
            resource.name.trim(),
            resource.description,
            resource.specialization,
            resource.category,
            resource.price,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_resource(conn, id)?.context("resource vanished after insert")
}

pub fn get_resource(conn: &Connection, id: i64) -> anyhow::Result<Option<Resource>> {
    let mut stmt = conn.prepare(&format!("{RESOURCE_SELECT} WHERE r.id = ?1"))?;
    Ok(stmt.query_row(params![id], parse_resource_row).optional()?)
}

pub fn list_resources(conn: &Connection) -> anyhow::Result<Vec<Resource>> {
    let mut stmt = conn.prepare(&format!("{RESOURCE_SELECT} ORDER BY r.id ASC"))?;
    let rows = stmt.query_map([], parse_resource_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// ── Availability slots ──

const SLOT_COLUMNS: &str = "id, resource_id, date, start_time, end_time, status, reason";

fn parse_slot_row(row: &Row) -> anyhow::Result<AvailabilitySlot> {
    let date: String = row.get(2)?;
    let start: String = row.get(3)?;
    let end: String = row.get(4)?;
    let status: String = row.get(5)?;
    Ok(AvailabilitySlot {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        date: parse_date(&date)?,
        start_time: parse_time(&start)?,
        end_time: parse_time(&end)?,
        status: SlotStatus::parse(&status)
            .with_context(|| format!("invalid stored slot status: {status}"))?,
        reason: row.get(6)?,
    })
}

pub fn create_slot(
    conn: &Connection,
    resource_id: i64,
    slot: &NewSlot,
) -> anyhow::Result<AvailabilitySlot> {
    let status = slot.status.unwrap_or(SlotStatus::Available);
    conn.execute(
        "INSERT INTO availability_slots (resource_id, date, start_time, end_time, status, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            resource_id,
            fmt_date(&slot.date),
            fmt_time(&slot.start_time),
            fmt_time(&slot.end_time),
            status.as_str(),
            slot.reason,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_slot(conn, id)?.context("slot vanished after insert")
}

pub fn get_slot(conn: &Connection, id: i64) -> anyhow::Result<Option<AvailabilitySlot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SLOT_COLUMNS} FROM availability_slots WHERE id = ?1"
    ))?;
    let row = stmt
        .query_row(params![id], |row| Ok(parse_slot_row(row)))
        .optional()?;
    row.transpose()
}

pub fn list_slots(conn: &Connection, resource_id: i64) -> anyhow::Result<Vec<AvailabilitySlot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SLOT_COLUMNS} FROM availability_slots WHERE resource_id = ?1
         ORDER BY date ASC, start_time ASC"
    ))?;
    let rows = stmt.query_map(params![resource_id], |row| Ok(parse_slot_row(row)))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row??);
    }
    Ok(slots)
}

/// Slots of `resource_id` on `date` whose window intersects `[start, end)`.
pub fn overlapping_slots(
    conn: &Connection,
    resource_id: i64,
    date: &NaiveDate,
    start: &NaiveTime,
    end: &NaiveTime,
) -> anyhow::Result<Vec<AvailabilitySlot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SLOT_COLUMNS} FROM availability_slots
         WHERE resource_id = ?1 AND date = ?2 AND start_time < ?4 AND end_time > ?3"
    ))?;
    let rows = stmt.query_map(
        params![resource_id, fmt_date(date), fmt_time(start), fmt_time(end)],
        |row| Ok(parse_slot_row(row)),
    )?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row??);
    }
    Ok(slots)
}

pub fn update_slot_status(
    conn: &Connection,
    id: i64,
    status: SlotStatus,
    reason: Option<&str>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE availability_slots SET status = ?1, reason = ?2 WHERE id = ?3",
        params![status.as_str(), reason, id],
    )?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_SELECT: &str = "SELECT b.id, b.resource_id, b.slot_id, b.customer_id, b.customer_name, \
     b.customer_email, b.customer_phone, b.date, b.start_time, b.end_time, b.status, \
     b.payment_status, b.final_amount, r.name \
     FROM bookings b LEFT JOIN resources r ON r.id = b.resource_id";

fn parse_booking_row(row: &Row) -> anyhow::Result<Booking> {
    let date: String = row.get(7)?;
    let start: String = row.get(8)?;
    let end: String = row.get(9)?;
    let status: String = row.get(10)?;
    let payment_status: String = row.get(11)?;
    Ok(Booking {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        slot_id: row.get(2)?,
        customer_id: row.get(3)?,
        customer_name: row.get(4)?,
        customer_email: row.get(5)?,
        customer_phone: row.get(6)?,
        date: parse_date(&date)?,
        start_time: parse_time(&start)?,
        end_time: parse_time(&end)?,
        status: BookingStatus::from_str(&status),
        payment_status: PaymentStatus::from_str(&payment_status),
        final_amount: row.get(12)?,
        resource_name: row.get(13)?,
    })
}

fn query_bookings(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn insert_booking(
    conn: &Connection,
    request: &BookingRequest,
    customer_id: i64,
    final_amount: f64,
) -> anyhow::Result<i64> {
    let now = now_str();
    conn.execute(
        "INSERT INTO bookings (resource_id, slot_id, customer_id, customer_name, customer_email,
            customer_phone, date, start_time, end_time, status, payment_status, final_amount,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
        params![
            request.resource_id,
            request.slot_id,
            customer_id,
            request.customer_name.trim(),
            request.customer_email.trim(),
            request.customer_phone,
            fmt_date(&request.date),
            fmt_time(&request.start_time),
            fmt_time(&request.end_time),
            request.status.as_str(),
            request.payment_status.as_str(),
            final_amount,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let mut bookings = query_bookings(conn, &format!("{BOOKING_SELECT} WHERE b.id = ?1"), params![id])?;
    Ok(bookings.pop())
}

/// Live (non-cancelled) bookings of a customer, soonest first.
pub fn bookings_for_customer(conn: &Connection, customer_id: i64) -> anyhow::Result<Vec<Booking>> {
    query_bookings(
        conn,
        &format!(
            "{BOOKING_SELECT} WHERE b.customer_id = ?1 AND b.status != 'cancelled'
             ORDER BY b.date ASC, b.start_time ASC"
        ),
        params![customer_id],
    )
}

/// Every booking on the provider's resources, including cancelled ones.
pub fn bookings_for_provider(conn: &Connection, provider_id: i64) -> anyhow::Result<Vec<Booking>> {
    query_bookings(
        conn,
        &format!(
            "{BOOKING_SELECT} WHERE r.provider_id = ?1 ORDER BY b.date ASC, b.start_time ASC"
        ),
        params![provider_id],
    )
}

/// Every booking in the system, newest slot first.
pub fn all_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    query_bookings(
        conn,
        &format!("{BOOKING_SELECT} ORDER BY b.date DESC, b.start_time DESC, b.id DESC"),
        params![],
    )
}

pub fn earnings_for_provider(conn: &Connection, provider_id: i64) -> anyhow::Result<EarningsSummary> {
    let mut stmt = conn.prepare(
        "SELECT b.status, b.payment_status, COUNT(*), COALESCE(SUM(b.final_amount), 0.0)
         FROM bookings b JOIN resources r ON r.id = b.resource_id
         WHERE r.provider_id = ?1
         GROUP BY b.status, b.payment_status",
    )?;
    let rows = stmt.query_map(params![provider_id], |row| {
        let status: String = row.get(0)?;
        let payment: String = row.get(1)?;
        let count: u32 = row.get(2)?;
        let amount: f64 = row.get(3)?;
        Ok((status, payment, count, amount))
    })?;

    let mut summary = EarningsSummary::default();
    for row in rows {
        let (status, payment, count, amount) = row?;
        summary.record(
            BookingStatus::from_str(&status),
            PaymentStatus::from_str(&payment),
            count,
            amount,
        );
    }
    Ok(summary)
}

/// Live bookings of `resource_id` on `date` intersecting `[start, end)`.
pub fn overlapping_bookings(
    conn: &Connection,
    resource_id: i64,
    date: &NaiveDate,
    start: &NaiveTime,
    end: &NaiveTime,
) -> anyhow::Result<Vec<Booking>> {
    query_bookings(
        conn,
        &format!(
            "{BOOKING_SELECT} WHERE b.resource_id = ?1 AND b.date = ?2
             AND b.start_time < ?4 AND b.end_time > ?3 AND b.status != 'cancelled'"
        ),
        params![resource_id, fmt_date(date), fmt_time(start), fmt_time(end)],
    )
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now_str(), id],
    )?;
    Ok(count > 0)
}

// ── Reviews ──

const REVIEW_COLUMNS: &str = "id, resource_id, customer_id, customer_name, rating, comment, date";

fn parse_review_row(row: &Row) -> anyhow::Result<Review> {
    let date: String = row.get(6)?;
    Ok(Review {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        customer_id: row.get(2)?,
        customer_name: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        date: parse_date(&date)?,
    })
}

pub fn create_review(
    conn: &Connection,
    resource_id: i64,
    customer: &User,
    review: &NewReview,
) -> anyhow::Result<Review> {
    let today = Utc::now().date_naive();
    conn.execute(
        "INSERT INTO reviews (resource_id, customer_id, customer_name, rating, comment, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            resource_id,
            customer.id,
            customer.name,
            review.rating,
            review.comment.trim(),
            fmt_date(&today),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_review(conn, id)?.context("review vanished after insert")
}

pub fn get_review(conn: &Connection, id: i64) -> anyhow::Result<Option<Review>> {
    let mut stmt = conn.prepare(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"))?;
    let row = stmt
        .query_row(params![id], |row| Ok(parse_review_row(row)))
        .optional()?;
    row.transpose()
}

pub fn list_reviews(conn: &Connection, resource_id: i64) -> anyhow::Result<Vec<Review>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE resource_id = ?1 ORDER BY date DESC, id DESC"
    ))?;
    let rows = stmt.query_map(params![resource_id], |row| Ok(parse_review_row(row)))?;

    let mut reviews = vec![];
    for row in rows {
        reviews.push(row??);
    }
    Ok(reviews)
}

pub fn update_review(
    conn: &Connection,
    id: i64,
    review: &NewReview,
) -> anyhow::Result<Option<Review>> {
    let count = conn.execute(
        "UPDATE reviews SET rating = ?1, comment = ?2 WHERE id = ?3",
        params![review.rating, review.comment.trim(), id],
    )?;
    if count == 0 {
        return Ok(None);
    }
    get_review(conn, id)
}

pub fn delete_review(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup() -> (Connection, User, Resource) {
        let conn = db::init_db(":memory:").unwrap();
        let provider =
            create_user(&conn, "Dr. Bo", "bo@example.com", None, Role::Provider, "x").unwrap();
        let resource = create_resource(
            &conn,
            provider.id,
            &NewResource {
                name: "Physio".to_string(),
                description: String::new(),
                specialization: "Sports".to_string(),
                category: Some("Health".to_string()),
                price: Some(40.0),
            },
        )
        .unwrap();
        (conn, provider, resource)
    }

    fn new_slot(date: &str, start: &str, end: &str) -> NewSlot {
        NewSlot {
            date: NaiveDate::parse_from_str(date, DATE_FMT).unwrap(),
            start_time: hhmm::parse(start).unwrap(),
            end_time: hhmm::parse(end).unwrap(),
            status: None,
            reason: None,
        }
    }

    #[test]
    fn test_users_and_credentials() {
        let (conn, provider, _) = setup();
        assert!(email_exists(&conn, "BO@example.com").unwrap());
        let (user, hash) = get_credentials(&conn, "bo@example.com").unwrap().unwrap();
        assert_eq!(user, provider);
        assert_eq!(hash, "x");
        assert!(get_credentials(&conn, "nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_resource_includes_provider_name() {
        let (conn, _, resource) = setup();
        assert_eq!(resource.provider_name.as_deref(), Some("Dr. Bo"));
        assert_eq!(resource.price, Some(40.0));
        assert_eq!(list_resources(&conn).unwrap().len(), 1);
        assert!(get_resource(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_slots_sorted_and_overlap_query() {
        let (conn, _, resource) = setup();
        create_slot(&conn, resource.id, &new_slot("2025-07-02", "09:00", "10:00")).unwrap();
        create_slot(&conn, resource.id, &new_slot("2025-07-01", "11:00", "12:00")).unwrap();
        create_slot(&conn, resource.id, &new_slot("2025-07-01", "09:00", "10:00")).unwrap();

        let slots = list_slots(&conn, resource.id).unwrap();
        let order: Vec<String> = slots.iter().map(|s| s.display()).collect();
        assert_eq!(slots.len(), 3);
        assert!(order[0].contains("Jul 1") && order[0].contains("09:00"));
        assert!(order[2].contains("Jul 2"));
        assert!(slots.iter().all(|s| s.status == SlotStatus::Available));

        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let hits = overlapping_slots(
            &conn,
            resource.id,
            &date,
            &hhmm::parse("09:30").unwrap(),
            &hhmm::parse("11:00").unwrap(),
        )
        .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_slot_status_update() {
        let (conn, _, resource) = setup();
        let slot = create_slot(&conn, resource.id, &new_slot("2025-07-01", "09:00", "10:00")).unwrap();
        assert!(update_slot_status(&conn, slot.id, SlotStatus::Unavailable, Some("holiday")).unwrap());
        let slot = get_slot(&conn, slot.id).unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Unavailable);
        assert_eq!(slot.reason.as_deref(), Some("holiday"));
        assert!(!update_slot_status(&conn, 999, SlotStatus::Available, None).unwrap());
    }

    #[test]
    fn test_one_live_booking_per_slot() {
        let (conn, _, resource) = setup();
        let customer =
            create_user(&conn, "Alice", "alice@example.com", None, Role::Customer, "x").unwrap();
        let slot = create_slot(&conn, resource.id, &new_slot("2025-07-01", "09:00", "10:00")).unwrap();
        let request = BookingRequest {
            resource_id: resource.id,
            slot_id: slot.id,
            customer_name: "Alice".to_string(),
            customer_email: "alice@example.com".to_string(),
            customer_phone: None,
            final_amount: 40.0,
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Unpaid,
        };

        let id = insert_booking(&conn, &request, customer.id, 40.0).unwrap();
        // The partial unique index rejects a second live booking
        assert!(insert_booking(&conn, &request, customer.id, 40.0).is_err());

        assert!(update_booking_status(&conn, id, BookingStatus::Cancelled).unwrap());
        assert!(bookings_for_customer(&conn, customer.id).unwrap().is_empty());
        // Once cancelled the slot can be booked again
        insert_booking(&conn, &request, customer.id, 40.0).unwrap();

        let booking = get_booking(&conn, id).unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.resource_name.as_deref(), Some("Physio"));
        assert_eq!(bookings_for_provider(&conn, resource.provider_id).unwrap().len(), 2);
    }

    #[test]
    fn test_reviews() {
        let (conn, _, resource) = setup();
        let customer =
            create_user(&conn, "Alice", "alice@example.com", None, Role::Customer, "x").unwrap();
        let review = create_review(
            &conn,
            resource.id,
            &customer,
            &NewReview {
                rating: 5,
                comment: " Great ".to_string(),
            },
        )
        .unwrap();
        assert_eq!(review.comment, "Great");
        assert_eq!(review.customer_name, "Alice");
        assert_eq!(list_reviews(&conn, resource.id).unwrap().len(), 1);

        let edited = update_review(
            &conn,
            review.id,
            &NewReview {
                rating: 3,
                comment: "Fine ".to_string(),
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(edited.rating, 3);
        assert_eq!(edited.comment, "Fine");
        assert_eq!(edited.customer_name, "Alice");
        assert_eq!(edited.date, review.date);

        assert!(delete_review(&conn, review.id).unwrap());
        assert!(!delete_review(&conn, review.id).unwrap());
        assert!(update_review(&conn, review.id, &NewReview { rating: 4, comment: String::new() })
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_earnings_and_all_bookings() {
        let (conn, provider, resource) = setup();
        let customer =
            create_user(&conn, "Alice", "alice@example.com", None, Role::Customer, "x").unwrap();
        let mut ids = vec![];
        for (start, end) in [("09:00", "10:00"), ("10:00", "11:00"), ("11:00", "12:00")] {
            let slot = create_slot(&conn, resource.id, &new_slot("2025-07-01", start, end)).unwrap();
            let request = BookingRequest {
                resource_id: resource.id,
                slot_id: slot.id,
                customer_name: "Alice".to_string(),
                customer_email: "alice@example.com".to_string(),
                customer_phone: None,
                final_amount: 40.0,
                date: slot.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                status: BookingStatus::Pending,
                payment_status: PaymentStatus::Unpaid,
            };
            ids.push(insert_booking(&conn, &request, customer.id, 40.0).unwrap());
        }
        conn.execute(
            "UPDATE bookings SET payment_status = 'paid', status = 'confirmed' WHERE id = ?1",
            params![ids[0]],
        )
        .unwrap();
        update_booking_status(&conn, ids[2], BookingStatus::Cancelled).unwrap();

        let summary = earnings_for_provider(&conn, provider.id).unwrap();
        assert_eq!(summary.total_bookings, 2);
        assert_eq!(summary.total_revenue, 80.0);
        assert_eq!(summary.paid_bookings, 1);
        assert_eq!(summary.paid_revenue, 40.0);
        assert_eq!(summary.unpaid_bookings, 1);
        assert_eq!(summary.cancelled_bookings, 1);
        assert_eq!(summary.average_booking_value, 40.0);

        // Another provider earns nothing
        assert_eq!(earnings_for_provider(&conn, customer.id).unwrap(), EarningsSummary::default());

        let all = all_bookings(&conn).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, ids[2]);
    }
}
