use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::slot::hhmm;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub resource_id: i64,
    pub slot_id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub final_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Unpaid,
        }
    }
}

/// Body of `POST /bookings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub resource_id: i64,
    pub slot_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub final_amount: f64,
    pub date: NaiveDate,
    #[serde(rename = "startTimeStr", with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(rename = "endTimeStr", with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

/// Contact details the customer books under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerDetails {
    pub customer_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&super::User> for CustomerDetails {
    fn from(user: &super::User) -> Self {
        Self {
            customer_id: Some(user.id),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// Booking totals across a provider's resources.
///
/// Revenue counts only live bookings and is split by payment status.
/// Cancelled bookings are counted but never earn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    pub total_bookings: u32,
    pub total_revenue: f64,
    pub paid_bookings: u32,
    pub paid_revenue: f64,
    pub unpaid_bookings: u32,
    pub unpaid_revenue: f64,
    pub pending_bookings: u32,
    pub confirmed_bookings: u32,
    pub cancelled_bookings: u32,
    pub average_booking_value: f64,
}

impl EarningsSummary {
    /// Folds `count` bookings sharing a status pair, worth `amount` together.
    pub fn record(&mut self, status: BookingStatus, payment: PaymentStatus, count: u32, amount: f64) {
        match status {
            BookingStatus::Cancelled => {
                self.cancelled_bookings += count;
                return;
            }
            BookingStatus::Pending => self.pending_bookings += count,
            BookingStatus::Confirmed => self.confirmed_bookings += count,
        }

        self.total_bookings += count;
        self.total_revenue += amount;
        match payment {
            PaymentStatus::Paid => {
                self.paid_bookings += count;
                self.paid_revenue += amount;
            }
            PaymentStatus::Unpaid => {
                self.unpaid_bookings += count;
                self.unpaid_revenue += amount;
            }
        }
        self.average_booking_value = self.total_revenue / self.total_bookings as f64;
    }
}
