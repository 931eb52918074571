use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::predict::FetchError;
use crate::predict::provider::PassProvider;
use crate::predict::types::{Pass, PassQuery, SatelliteTarget};

pub const DEFAULT_PROVIDER_URL: &str = "https://api.n2yo.com/rest/v1/satellite";

/// Client for the N2YO `radiopasses` endpoint.
pub struct N2yoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl N2yoClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, norad_id: u32, query: &PassQuery, api_key: &str) -> String {
        format!(
            "{}/radiopasses/{}/{}/{}/{}/{}/{}/&apiKey={}",
            self.base_url,
            norad_id,
            query.station.latitude_deg,
            query.station.longitude_deg,
            query.station.altitude_m,
            query.days_ahead,
            query.min_elevation_deg,
            api_key
        )
    }
}

#[async_trait]
impl PassProvider for N2yoClient {
    async fn fetch_passes(
        &self,
        target: &SatelliteTarget,
        query: &PassQuery,
    ) -> Result<Vec<Pass>, FetchError> {
        log::info!(
            "Requesting passes for {}: {}",
            target.label(),
            self.url(target.id, query, "<redacted>")
        );

        // reqwest errors carry the url, which contains the api key
        let response = self
            .client
            .get(self.url(target.id, query, &self.api_key))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.without_url()))?;

        if !status.is_success() {
            return Err(FetchError::ResponseFormat(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        parse_passes(&body, target)
    }
}

#[derive(Debug, Deserialize)]
struct RadioPassesResponse {
    #[serde(default)]
    error: Option<String>,
    info: Option<ResponseInfo>,
    #[serde(default)]
    passes: Option<Vec<RawPass>>,
}

#[derive(Debug, Deserialize)]
struct ResponseInfo {
    satid: u32,
    satname: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPass {
    start_az: f64,
    start_az_compass: String,
    #[serde(rename = "startUTC")]
    start_utc: i64,
    max_el: f64,
    #[serde(rename = "maxUTC")]
    max_utc: i64,
    end_az: f64,
    end_az_compass: String,
    #[serde(rename = "endUTC")]
    end_utc: i64,
}

/// Parse a `radiopasses` response body into passes for `target`.
pub fn parse_passes(body: &str, target: &SatelliteTarget) -> Result<Vec<Pass>, FetchError> {
    let response: RadioPassesResponse = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        return Err(FetchError::ResponseFormat(format!("provider error: {}", error)));
    }

    let info = response
        .info
        .ok_or_else(|| FetchError::ResponseFormat("missing 'info'".into()))?;

    if info.satid != target.id {
        return Err(FetchError::ResponseFormat(format!(
            "response is for satellite {}, expected {}",
            info.satid, target.id
        )));
    }

    let satellite = target.name.clone().unwrap_or(info.satname);

    response
        .passes
        .unwrap_or_default()
        .into_iter()
        .map(|raw| {
            let aos = timestamp(raw.start_utc)?;
            let los = timestamp(raw.end_utc)?;
            let tca = timestamp(raw.max_utc)?;
            if los < aos {
                return Err(FetchError::ResponseFormat(format!(
                    "pass ends before it starts ({} < {})",
                    los, aos
                )));
            }
            Ok(Pass {
                satellite: satellite.clone(),
                norad_id: target.id,
                aos,
                los,
                tca,
                max_elevation_deg: raw.max_el,
                aos_azimuth_deg: raw.start_az,
                aos_compass: raw.start_az_compass,
                los_azimuth_deg: raw.end_az,
                los_compass: raw.end_az_compass,
                duration_seconds: (los - aos).num_seconds(),
            })
        })
        .collect()
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, FetchError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| FetchError::ResponseFormat(format!("invalid timestamp: {}", seconds)))
}
