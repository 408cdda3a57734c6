//! # Live Departure Fetching
//!
//! This module fetches the departure board for one station from the Rail Data
//! Marketplace LDBWS `GetDepBoardWithDetails` endpoint and turns it into a
//! [`ServiceStore`]. It is the board's data acquisition collaborator: the paging
//! engine and renderer never call it, they only read the store it produces.
//!
//! ## Data Processing Pipeline
//! 1. **Fetch**: HTTP GET `{api_url}/{crs}` with the `x-apikey` header
//! 2. **Parse**: Deserialize `trainServices` with serde
//! 3. **Filter**: Keep services terminating at the configured destination CRS
//! 4. **Store**: First [`CAPACITY`] matches fill the store in departure order
//!
//! ## Error Handling
//!
//! - **Network failures**: transport errors and timeouts surface as `FetchError::Http`
//! - **Server errors**: non-2xx responses surface as `FetchError::Status`
//! - **Parse failures**: malformed JSON surfaces as `FetchError::Parse`
//!
//! The driver logs the error and keeps showing the previous board.

use crate::config::StationConfig;
use crate::{ServiceRecord, ServiceStore, CAPACITY};
use log::{debug, info};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching the departure board.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, timeout, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("unexpected status {0}")]
    Status(u16),

    /// Response body was not the expected JSON
    #[error("parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// No API key configured
    #[error("no API key configured")]
    MissingApiKey,
}

const USER_AGENT: &str = "DepartureBoard/0.1";

/// Request timeout; the board keeps ticking on the old data until this expires.
const TIMEOUT: Duration = Duration::from_secs(10);

/// Shown when the feed leaves a time out.
const UNKNOWN_TIME: &str = "??:??";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardResponse {
    train_services: Option<Vec<ApiService>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiService {
    std: Option<String>,
    etd: Option<String>,
    destination: Option<Vec<ApiLocation>>,
    is_cancelled: Option<bool>,
    subsequent_calling_points: Option<Vec<ApiCallingPoints>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLocation {
    location_name: Option<String>,
    crs: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCallingPoints {
    calling_point: Option<Vec<ApiLocation>>,
}

impl ApiService {
    fn terminus(&self) -> Option<&ApiLocation> {
        self.destination.as_ref().and_then(|d| d.first())
    }

    fn terminates_at(&self, crs: &str) -> bool {
        crs.is_empty()
            || self
                .terminus()
                .and_then(|d| d.crs.as_deref())
                .is_some_and(|c| c.eq_ignore_ascii_case(crs))
    }

    fn into_record(self) -> ServiceRecord {
        let destination = self
            .terminus()
            .and_then(|d| d.location_name.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        // Only the first list: later ones are joining/splitting portions
        let calling_points = self
            .subsequent_calling_points
            .and_then(|lists| lists.into_iter().next())
            .and_then(|list| list.calling_point)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|point| point.location_name)
            .collect();

        ServiceRecord {
            scheduled: self.std.unwrap_or_else(|| UNKNOWN_TIME.to_string()),
            estimated: self.etd.unwrap_or_else(|| UNKNOWN_TIME.to_string()),
            destination,
            calling_points,
            cancelled: self.is_cancelled.unwrap_or(false),
        }
    }
}

/// Parse a `GetDepBoardWithDetails` response into a store.
///
/// `destination_crs` limits the board to services terminating there; an
/// empty string keeps every service.
pub fn parse_board(json: &str, destination_crs: &str) -> Result<ServiceStore, FetchError> {
    let board: BoardResponse = serde_json::from_str(json)?;
    let records: Vec<ServiceRecord> = board
        .train_services
        .unwrap_or_default()
        .into_iter()
        .filter(|service| service.terminates_at(destination_crs))
        .take(CAPACITY)
        .map(ApiService::into_record)
        .collect();

    debug!("parsed {} services", records.len());
    Ok(ServiceStore::from_records(records))
}

/// Fetch the current board for the configured station.
///
/// # Example
/// ```no_run
/// use departure_board_lib::config::Config;
/// use departure_board_lib::services::fetch;
///
/// # async fn run() {
/// let config = Config::load();
/// match fetch(&config.station).await {
///     Ok(store) => println!("{} services", store.len()),
///     Err(err) => eprintln!("Failed to fetch departures: {}", err),
/// }
/// # }
/// ```
pub async fn fetch(station: &StationConfig) -> Result<ServiceStore, FetchError> {
    if station.api_key.is_empty() {
        return Err(FetchError::MissingApiKey);
    }

    let client = reqwest::Client::builder()
        .timeout(TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;
    let url = format!("{}/{}", station.api_url.trim_end_matches('/'), station.crs);

    let response = client
        .get(&url)
        .header("x-apikey", &station.api_key)
        .query(&[("numRows", "12"), ("timeOffset", "0"), ("timeWindow", "360")])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    let store = parse_board(&body, &station.destination_crs)?;
    info!("Fetched {} departures from {}", store.len(), station.crs);
    Ok(store)
}
