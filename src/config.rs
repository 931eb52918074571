use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::predict::{GroundStation, PassOrder, PassQuery, SatelliteTarget, DEFAULT_PROVIDER_URL};
use crate::render::ColorScale;

/// Environment variable that overrides `api_key` from the file.
pub const API_KEY_ENV: &str = "N2YO_API_KEY";

/// Upper bound of the provider's prediction window.
pub const MAX_DAYS_AHEAD: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("missing API key (set 'api_key' or N2YO_API_KEY)")]
    MissingApiKey,
    #[error("invalid station coordinates: '{0}'")]
    InvalidCoordinates(String),
    #[error("no satellites configured")]
    NoSatellites,
    #[error("days_ahead must be between 1 and 10, got {0}")]
    DaysAhead(u32),
    #[error("min_elevation must be between 0 and 90, got {0}")]
    MinElevation(f64),
    #[error("colors.high {high} is darker than colors.low {low} in some channel")]
    ColorAnchor {
        low: String,
        high: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    #[serde(default)]
    pub api_key: Option<String>,
    pub satellites: Vec<SatelliteTarget>,
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
    #[serde(default = "default_min_elevation")]
    pub min_elevation: f64,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default)]
    pub order: PassOrder,
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
    #[serde(default = "default_provider_url")]
    pub provider_url: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub colors: ColorScale,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

fn default_days_ahead() -> u32 {
    2
}

fn default_min_elevation() -> f64 {
    10.0
}

fn default_output_path() -> PathBuf {
    PathBuf::from("satpasses.html")
}

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_provider_url() -> String {
    DEFAULT_PROVIDER_URL.to_string()
}

fn default_title() -> String {
    "Satellite Passes".to_string()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    /// Load and validate the file at `path`. A non-blank `api_key_override`
    /// (normally the value of [API_KEY_ENV]) replaces the file's key.
    pub fn from_file(path: &Path, api_key_override: Option<String>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content, api_key_override)
    }

    pub fn from_yaml(yaml: &str, api_key_override: Option<String>) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        if let Some(key) = api_key_override.filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(key);
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.api_key()?;
        self.station()?;

        if self.satellites.is_empty() {
            return Err(ConfigError::NoSatellites);
        }
        if !(1..=MAX_DAYS_AHEAD).contains(&self.days_ahead) {
            return Err(ConfigError::DaysAhead(self.days_ahead));
        }
        if !(0.0..=90.0).contains(&self.min_elevation) {
            return Err(ConfigError::MinElevation(self.min_elevation));
        }

        if !self.colors.low.is_dimmer_or_equal(&self.colors.high) {
            return Err(ConfigError::ColorAnchor {
                low: self.colors.low.to_string(),
                high: self.colors.high.to_string(),
            });
        }

        Ok(())
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn station(&self) -> Result<GroundStation, ConfigError> {
        GroundStation::from_coordinates(&self.station.coordinates, Some(self.station.altitude_m))
            .ok_or_else(|| ConfigError::InvalidCoordinates(self.station.coordinates.clone()))
    }

    pub fn query(&self) -> Result<PassQuery, ConfigError> {
        Ok(PassQuery {
            station: self.station()?,
            days_ahead: self.days_ahead,
            min_elevation_deg: self.min_elevation,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::render::Rgb;
    use std::io::Write;

    const FULL: &str = r##"
station:
  name: Home
  coordinates: "52.52, 13.405"
  altitude_m: 34
api_key: ABCD-1234
satellites:
  - id: 25544
    name: ISS
    color: "#ffd060"
  - id: 33591
days_ahead: 5
min_elevation: 20
output_path: /var/www/html/passes.html
timezone: Europe/Berlin
order: chronological
request_timeout: 30s
provider_url: http://localhost:8080/rest/v1/satellite
title: Passes over Berlin
colors:
  low: "#000000"
  high: "#ffffff"
log_file: /var/log/satpasses.log
"##;

    const MINIMAL: &str = r#"
station:
  coordinates: "41.702, -76.014"
api_key: key
satellites:
  - id: 25544
"#;

    #[test]
    fn parses_full_config() {
        let config = Config::from_yaml(FULL, None).unwrap();
        assert_eq!(config.station.name.as_deref(), Some("Home"));
        assert_eq!(config.api_key().unwrap(), "ABCD-1234");
        assert_eq!(config.satellites.len(), 2);
        assert_eq!(config.satellites[0].name.as_deref(), Some("ISS"));
        assert_eq!(config.satellites[0].color, Some(Rgb::new(0xff, 0xd0, 0x60)));
        assert_eq!(config.satellites[1].id, 33591);
        assert_eq!(config.satellites[1].name, None);
        assert_eq!(config.days_ahead, 5);
        assert_eq!(config.min_elevation, 20.0);
        assert_eq!(config.output_path, PathBuf::from("/var/www/html/passes.html"));
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.order, PassOrder::Chronological);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.title, "Passes over Berlin");
        assert_eq!(config.colors.low, Rgb::BLACK);
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/satpasses.log")));

        let query = config.query().unwrap();
        assert_eq!(query.station.latitude_deg, 52.52);
        assert_eq!(query.station.altitude_m, 34.0);
        assert_eq!(query.days_ahead, 5);
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_yaml(MINIMAL, None).unwrap();
        assert_eq!(config.days_ahead, 2);
        assert_eq!(config.min_elevation, 10.0);
        assert_eq!(config.output_path, PathBuf::from("satpasses.html"));
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.order, PassOrder::BySatellite);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.provider_url, DEFAULT_PROVIDER_URL);
        assert_eq!(config.colors, ColorScale::default());
        assert_eq!(config.station.altitude_m, 0.0);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn missing_api_key() {
        let yaml = MINIMAL.replace("api_key: key\n", "");
        assert!(matches!(
            Config::from_yaml(&yaml, None),
            Err(ConfigError::MissingApiKey)
        ));
        let yaml = MINIMAL.replace("api_key: key", "api_key: \"  \"");
        assert!(matches!(
            Config::from_yaml(&yaml, Some(String::new())),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn env_key_overrides_file() {
        let config = Config::from_yaml(MINIMAL, Some("from-env".into())).unwrap();
        assert_eq!(config.api_key().unwrap(), "from-env");

        let yaml = MINIMAL.replace("api_key: key\n", "");
        let config = Config::from_yaml(&yaml, Some("from-env".into())).unwrap();
        assert_eq!(config.api_key().unwrap(), "from-env");
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            MINIMAL.replace("41.702, -76.014", "north, west"),
            MINIMAL.replace("41.702, -76.014", "141.702, -76.014"),
            MINIMAL.replace("  - id: 25544\n", "").replace("satellites:", "satellites: []"),
            format!("{}days_ahead: 0\n", MINIMAL),
            format!("{}days_ahead: 11\n", MINIMAL),
            format!("{}min_elevation: 91\n", MINIMAL),
            format!("{}min_elevation: -1\n", MINIMAL),
            format!("{}colors:\n  low: \"#808080\"\n  high: \"#ff00ff\"\n", MINIMAL),
        ];
        for yaml in cases {
            assert!(Config::from_yaml(&yaml, None).is_err(), "accepted:\n{}", yaml);
        }
    }

    #[test]
    fn satellite_color_is_not_an_anchor() {
        let yaml = MINIMAL.replace("  - id: 25544", "  - id: 25544\n    color: \"#000000\"");
        let config = Config::from_yaml(&yaml, None).unwrap();
        assert_eq!(config.satellites[0].color, Some(Rgb::BLACK));
    }

    #[test]
    fn rejects_malformed_fields() {
        for yaml in [
            format!("{}timezone: Mars/Olympus\n", MINIMAL),
            format!("{}request_timeout: soon\n", MINIMAL),
            format!("{}order: random\n", MINIMAL),
            MINIMAL.replace("id: 25544", "id: ISS"),
            MINIMAL.replace("  - id: 25544", "  - id: 25544\n    color: yellow"),
            "station: [".to_string(),
        ] {
            assert!(
                matches!(Config::from_yaml(&yaml, None), Err(ConfigError::Yaml(_))),
                "accepted:\n{}",
                yaml
            );
        }
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = Config::from_file(file.path(), None).unwrap();
        assert_eq!(config.satellites[0].id, 25544);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            Config::from_file(&missing, None),
            Err(ConfigError::Io { .. })
        ));
    }
}
