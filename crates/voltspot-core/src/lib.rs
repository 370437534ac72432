pub mod app_config;
pub mod bookings;
pub mod config;
pub mod geo;
pub mod stations;

pub use app_config::{AppConfig, Environment};
pub use bookings::{categorize_bookings, Booking, BookingStatus, BookingTab, CategorizedBookings};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{Bounds, LatLng, TimeWindow, Viewport};
pub use stations::{ChargeEstimate, Station, StationId};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
