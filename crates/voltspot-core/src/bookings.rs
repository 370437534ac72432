//! Client-side projection of booking states onto the tabs of the bookings
//! view.
//!
//! The backend owns the booking state machine; this module only mirrors its
//! states so the client can group bookings without another round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stations::StationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Expired,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::InProgress => write!(f, "in_progress"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub station_id: StationId,
    pub status: BookingStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingTab {
    Upcoming,
    Active,
    Past,
    Cancelled,
}

impl Booking {
    /// Which tab this booking belongs on at `now`.
    ///
    /// Pending and confirmed bookings whose slot already ended are shown as
    /// past even if the backend has not yet expired them.
    #[must_use]
    pub fn tab(&self, now: DateTime<Utc>) -> BookingTab {
        match self.status {
            BookingStatus::InProgress => BookingTab::Active,
            BookingStatus::Completed | BookingStatus::Expired => BookingTab::Past,
            BookingStatus::Cancelled => BookingTab::Cancelled,
            BookingStatus::Pending | BookingStatus::Confirmed => {
                if self.end_time <= now {
                    BookingTab::Past
                } else {
                    BookingTab::Upcoming
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedBookings {
    pub upcoming: Vec<Booking>,
    pub active: Vec<Booking>,
    pub past: Vec<Booking>,
    pub cancelled: Vec<Booking>,
}

impl CategorizedBookings {
    #[must_use]
    pub fn tab(&self, tab: BookingTab) -> &[Booking] {
        match tab {
            BookingTab::Upcoming => &self.upcoming,
            BookingTab::Active => &self.active,
            BookingTab::Past => &self.past,
            BookingTab::Cancelled => &self.cancelled,
        }
    }
}

/// Split `bookings` into tabs.
///
/// Upcoming bookings are ordered soonest first; every other tab is ordered
/// most recent first.
#[must_use]
pub fn categorize_bookings(bookings: &[Booking], now: DateTime<Utc>) -> CategorizedBookings {
    let mut out = CategorizedBookings::default();
    for booking in bookings {
        let bucket = match booking.tab(now) {
            BookingTab::Upcoming => &mut out.upcoming,
            BookingTab::Active => &mut out.active,
            BookingTab::Past => &mut out.past,
            BookingTab::Cancelled => &mut out.cancelled,
        };
        bucket.push(booking.clone());
    }

    out.upcoming.sort_by_key(|b| b.start_time);
    for bucket in [&mut out.active, &mut out.past, &mut out.cancelled] {
        bucket.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    }
    out
}

#[cfg(test)]
#[path = "bookings_test.rs"]
mod tests;
