//! HTTP implementation of the station-fetch and geocode collaborators.

pub mod client;
pub mod error;
pub mod types;

pub use client::StationApiClient;
pub use error::ClientError;
