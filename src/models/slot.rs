use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    Unavailable,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
            SlotStatus::Unavailable => "unavailable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(SlotStatus::Available),
            "booked" => Some(SlotStatus::Booked),
            "unavailable" => Some(SlotStatus::Unavailable),
            _ => None,
        }
    }

    /// Only `available` slots may be put into a new booking.
    pub fn is_selectable(&self) -> bool {
        matches!(self, SlotStatus::Available)
    }

    /// Transitions the backend accepts:
    /// available <-> booked (booking / cancellation) and
    /// available <-> unavailable (provider marks / unmarks).
    pub fn can_transition_to(&self, next: SlotStatus) -> bool {
        matches!(
            (self, next),
            (SlotStatus::Available, SlotStatus::Booked)
                | (SlotStatus::Booked, SlotStatus::Available)
                | (SlotStatus::Available, SlotStatus::Unavailable)
                | (SlotStatus::Unavailable, SlotStatus::Available)
        )
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub id: i64,
    pub resource_id: i64,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AvailabilitySlot {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    pub fn is_selectable(&self) -> bool {
        self.status.is_selectable()
    }

    pub fn overlaps(&self, other: &AvailabilitySlot) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }

    /// e.g. `Sunday, Oct 26, 2025: 09:00 - 10:00`
    pub fn display(&self) -> String {
        format!(
            "{}: {} - {}",
            self.date.format("%A, %b %-d, %Y"),
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// Payload for creating a slot on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlot {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: Option<SlotStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NewSlot {
    pub fn validate(&self) -> Result<(), String> {
        if self.end_time <= self.start_time {
            return Err(format!(
                "slot end {} must be after start {}",
                self.end_time.format("%H:%M"),
                self.start_time.format("%H:%M")
            ));
        }
        if self.status == Some(SlotStatus::Booked) {
            return Err("a new slot cannot start out booked".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStatusUpdate {
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `HH:MM` on the wire; `HH:MM:SS` is accepted when reading as long as the
/// seconds are zero, since storage keeps minute precision.
pub mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(s: &str) -> Result<NaiveTime, String> {
        let time = NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map_err(|_| format!("invalid time format: {s}"))?;
        if time.second() != 0 {
            return Err(format!("times must be whole minutes: {s}"));
        }
        Ok(time)
    }
}
