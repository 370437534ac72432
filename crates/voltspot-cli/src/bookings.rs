//! `bookings` command: groups an exported booking list into tabs.

use std::path::Path;

use voltspot_core::{categorize_bookings, Booking, BookingTab};

const TABS: [(BookingTab, &str); 4] = [
    (BookingTab::Upcoming, "upcoming"),
    (BookingTab::Active, "active"),
    (BookingTab::Past, "past"),
    (BookingTab::Cancelled, "cancelled"),
];

/// # Errors
///
/// Returns an error if `path` cannot be read or is not a JSON booking list.
pub(crate) fn run_bookings(path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let bookings: Vec<Booking> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a booking list: {e}", path.display()))?;

    let grouped = categorize_bookings(&bookings, chrono::Utc::now());
    for (tab, label) in TABS {
        let entries = grouped.tab(tab);
        println!("{label} ({})", entries.len());
        for booking in entries {
            println!(
                "  {} station {} [{}] {} -> {}",
                booking.id,
                booking.station_id,
                booking.status,
                booking.start_time.format("%Y-%m-%d %H:%M"),
                booking.end_time.format("%Y-%m-%d %H:%M"),
            );
        }
    }
    Ok(())
}
