//! Search command handlers for the CLI.
//!
//! Each handler builds a one-shot orchestrator over a [`StaticMap`], runs a
//! single search cycle, and prints the clustered result.

use chrono::{DateTime, Utc};
use voltspot_client::StationApiClient;
use voltspot_core::{AppConfig, LatLng, Station, StationId, TimeWindow};
use voltspot_search::{BookingFlow, SearchConfig, SearchError, SearchOrchestrator, SearchSnapshot};

use crate::map::StaticMap;

type CliOrchestrator = SearchOrchestrator<StationApiClient, StationApiClient, StaticMap>;

/// Map and filter options shared by every search command.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ViewArgs {
    /// Map zoom level.
    #[arg(long, default_value_t = 13.0)]
    pub(crate) zoom: f64,
    /// Viewport width in pixels.
    #[arg(long, default_value_t = 1024)]
    pub(crate) width: u32,
    /// Viewport height in pixels.
    #[arg(long, default_value_t = 768)]
    pub(crate) height: u32,
    /// Availability window start (RFC 3339). Requires `--end`.
    #[arg(long, requires = "end")]
    pub(crate) start: Option<DateTime<Utc>>,
    /// Availability window end (RFC 3339). Requires `--start`.
    #[arg(long, requires = "start")]
    pub(crate) end: Option<DateTime<Utc>>,
    /// Print a time and cost estimate for charging this many kWh.
    #[arg(long)]
    pub(crate) energy_kwh: Option<f64>,
    /// Select this station after the search and hand it to booking.
    #[arg(long)]
    pub(crate) book: Option<StationId>,
}

impl ViewArgs {
    fn time_window(&self) -> anyhow::Result<Option<TimeWindow>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start < end => Ok(Some(TimeWindow { start, end })),
            (Some(start), Some(end)) => {
                anyhow::bail!("--start ({start}) must be before --end ({end})")
            }
            _ => Ok(None),
        }
    }
}

/// Prints the booking hand-off instead of opening a booking screen.
struct ConsoleBooking;

impl BookingFlow for ConsoleBooking {
    fn start_booking(&self, station: Station) {
        println!(
            "booking started for station {} ({})",
            station.id,
            station.name.as_deref().unwrap_or("unnamed")
        );
    }
}

fn build_orchestrator(config: &AppConfig, view: &ViewArgs) -> anyhow::Result<CliOrchestrator> {
    let client = StationApiClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build station API client: {e}"))?;
    let map = StaticMap::new(view.zoom, view.width, view.height);
    let orchestrator = SearchOrchestrator::new(
        client.clone(),
        client,
        map,
        SearchConfig::from_app_config(config),
    );
    orchestrator.set_time_window(view.time_window()?);
    Ok(orchestrator)
}

/// Search around explicit coordinates.
///
/// # Errors
///
/// Returns an error if the coordinates are out of range, the client cannot
/// be built, or the fetch fails.
pub(crate) async fn run_nearby(
    config: &AppConfig,
    lat: f64,
    lng: f64,
    view: &ViewArgs,
) -> anyhow::Result<()> {
    let center = LatLng::new(lat, lng);
    if !center.is_valid() {
        anyhow::bail!("coordinates ({lat}, {lng}) are out of range");
    }

    let orchestrator = build_orchestrator(config, view)?;
    orchestrator.on_location_result(Ok(center));
    search_and_print(&orchestrator, view).await
}

/// Geocode `address` and search around the result.
///
/// # Errors
///
/// Returns an error if geocoding fails, the client cannot be built, or the
/// fetch fails.
pub(crate) async fn run_locate(
    config: &AppConfig,
    address: &str,
    view: &ViewArgs,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config, view)?;
    let Some(point) = orchestrator.on_address_search(address).await else {
        let reason = orchestrator
            .snapshot()
            .last_error
            .map_or_else(|| "unknown error".to_string(), |e| e.to_string());
        anyhow::bail!("{reason}");
    };
    println!("{address} -> ({:.5}, {:.5})", point.lat, point.lng);
    search_and_print(&orchestrator, view).await
}

async fn search_and_print(orchestrator: &CliOrchestrator, view: &ViewArgs) -> anyhow::Result<()> {
    match orchestrator.refresh_current().await {
        Ok(count) => tracing::info!(results = count, "search finished"),
        Err(SearchError::DegenerateViewport { radius_km, .. }) => {
            println!("viewport spans {radius_km} km; zoom in to search for stations");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    let snapshot = orchestrator.snapshot();
    print_snapshot(&snapshot, view.energy_kwh);

    if let Some(id) = view.book {
        if !orchestrator.select_station(id) {
            anyhow::bail!("station {id} is not in the current results");
        }
        orchestrator.book_selected(&ConsoleBooking);
    }
    Ok(())
}

fn print_snapshot(snapshot: &SearchSnapshot, energy_kwh: Option<f64>) {
    if snapshot.results.is_empty() {
        println!("no stations found in view");
        return;
    }

    println!(
        "{} stations: {} clusters, {} individual",
        snapshot.results.len(),
        snapshot.clusters.len(),
        snapshot.individuals.len()
    );
    for cluster in &snapshot.clusters {
        println!(
            "cluster {} ({} stations) at ({:.5}, {:.5})",
            cluster.id, cluster.count, cluster.latitude, cluster.longitude
        );
        for station in &cluster.stations {
            println!("    {}", describe_station(station, energy_kwh));
        }
    }
    for station in &snapshot.individuals {
        println!("  {}", describe_station(station, energy_kwh));
    }
}

pub(crate) fn describe_station(station: &Station, energy_kwh: Option<f64>) -> String {
    let mut line = format!(
        "[{}] {}",
        station.id,
        station.name.as_deref().unwrap_or("unnamed station")
    );
    if let Some(address) = &station.address {
        line.push_str(&format!(", {address}"));
    }
    if let Some(power) = station.power_kw {
        line.push_str(&format!(" | {power} kW"));
    }
    if let Some(price) = station.price_per_kwh {
        line.push_str(&format!(" | {price:.2}/kWh"));
    }
    if let Some(energy) = energy_kwh {
        let estimate = station.estimate(energy);
        if let Some(hours) = estimate.duration_hours {
            line.push_str(&format!(" | {energy} kWh in {:.0} min", hours * 60.0));
        }
        if let Some(cost) = estimate.cost {
            line.push_str(&format!(" for {cost:.2}"));
        }
    }
    line
}
