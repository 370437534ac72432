//! Nearby-station search engine: viewport geometry, result merging,
//! pixel-distance clustering, and the debounced orchestrator that ties them
//! to the fetch, geocode, and map collaborators.

pub mod bounds;
pub mod cluster;
pub mod collaborators;
pub mod config;
pub mod debounce;
pub mod error;
pub mod geo;
pub mod merge;
pub mod orchestrator;
pub mod projection;

pub use bounds::{bounds_filter, filter_to_bounds};
pub use cluster::{cluster_stations, Cluster, Clustering, DEFAULT_CLUSTER_THRESHOLD_PX};
pub use collaborators::{BookingFlow, Geocoder, LocationError, MapView, NearbyQuery, StationFetcher};
pub use config::SearchConfig;
pub use debounce::Debouncer;
pub use error::SearchError;
pub use geo::{haversine_km, pixel_distance, viewport_radius_km, visible_radius_km};
pub use merge::merge_results;
pub use orchestrator::{SearchOrchestrator, SearchSnapshot, SearchStatus};
pub use projection::{Projection, ScreenPoint, WebMercator};
