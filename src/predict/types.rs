use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::predict::GroundStation;

/// A satellite to fetch passes for, as listed in the configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SatelliteTarget {
    /// NORAD catalog number.
    pub id: u32,
    /// Display name. Falls back to the provider's name when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Marker color for this satellite's rows.
    #[serde(default)]
    pub color: Option<crate::render::Rgb>,
}

impl SatelliteTarget {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.id))
    }
}

/// Parameters shared by every per-satellite request.
#[derive(Debug, Clone, Copy)]
pub struct PassQuery {
    pub station: GroundStation,
    pub days_ahead: u32,
    pub min_elevation_deg: f64,
}

/// A predicted satellite pass
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub satellite: String,
    pub norad_id: u32,
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    pub tca: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub aos_compass: String,
    pub los_azimuth_deg: f64,
    pub los_compass: String,
    pub duration_seconds: i64,
}

/// A satellite whose passes could not be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub satellite: String,
    pub norad_id: u32,
    pub reason: String,
}

/// Aggregated outcome of fetching every configured satellite.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub passes: Vec<Pass>,
    pub failures: Vec<FetchFailure>,
}
