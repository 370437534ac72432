//! HTTP client for the station backend.
//!
//! Wraps `reqwest` with bearer-token auth, typed response decoding, and the
//! request conventions the search engine relies on (truncated coordinates,
//! whole-kilometre radius, RFC 3339 time window). Failed requests are not
//! retried here; the next viewport event is the retry.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use voltspot_core::{AppConfig, LatLng, Station};
use voltspot_search::{Geocoder, NearbyQuery, StationFetcher};

use crate::error::ClientError;
use crate::types::{GeocodeResponse, NearbyResponse};

/// Client for the station backend REST API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct StationApiClient {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl std::fmt::Debug for StationApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

impl StationApiClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        api_token: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_token: api_token.map(str::to_owned),
        })
    }

    /// # Errors
    ///
    /// As [`StationApiClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api_base_url,
            config.api_token.as_deref(),
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Fetches stations within `query.radius_km` of the query point.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::HttpStatus`] on any non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not a station list.
    pub async fn nearby_stations(&self, query: &NearbyQuery) -> Result<Vec<Station>, ClientError> {
        let url = self.nearby_url(query)?;
        let response: NearbyResponse = self
            .get_json(url, &format!("nearby stations ({}, {})", query.latitude, query.longitude))
            .await?;
        Ok(response.into_stations())
    }

    /// Resolves a free-text address to coordinates.
    ///
    /// # Errors
    ///
    /// - [`ClientError::AddressNotFound`] when the backend answers 404.
    /// - Otherwise as [`StationApiClient::nearby_stations`].
    pub async fn geocode(&self, address: &str) -> Result<LatLng, ClientError> {
        let mut url = self.endpoint("geocode")?;
        url.query_pairs_mut().append_pair("address", address);

        match self.get_json::<GeocodeResponse>(url, &format!("geocode({address})")).await {
            Ok(found) => Ok(found.into()),
            Err(ClientError::HttpStatus { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Err(ClientError::AddressNotFound(address.to_owned()))
            }
            Err(err) => Err(err),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("joining '{path}': {e}")))
    }

    fn nearby_url(&self, query: &NearbyQuery) -> Result<Url, ClientError> {
        let mut url = self.endpoint("stations/nearby")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("lat", &query.latitude.to_string());
            pairs.append_pair("lng", &query.longitude.to_string());
            pairs.append_pair("radius", &query.radius_km.to_string());
            if let Some(window) = &query.time_window {
                let (start, end) = window.to_query_strings();
                pairs.append_pair("start", &start);
                pairs.append_pair("end", &end);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, ClientError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "backend returned non-success status");
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Deserialize {
            context: context.to_owned(),
            source,
        })
    }
}

impl StationFetcher for StationApiClient {
    type Error = ClientError;

    async fn fetch_nearby_stations(&self, query: &NearbyQuery) -> Result<Vec<Station>, ClientError> {
        self.nearby_stations(query).await
    }
}

impl Geocoder for StationApiClient {
    type Error = ClientError;

    async fn geocode_address(&self, address: &str) -> Result<LatLng, ClientError> {
        self.geocode(address).await
    }
}
