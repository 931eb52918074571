use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::predict::{fetch_all, FetchFailure, PassProvider};
use crate::render::{colorize, render_page, write_atomic, PageContext, PassesPage, RenderError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Render(#[from] RenderError),
}

/// Result of a completed run.
#[derive(Debug)]
pub struct Summary {
    pub rows: usize,
    pub failures: Vec<FetchFailure>,
}

impl Summary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetch every configured satellite, render the page and write it to `output`.
///
/// `now` is only used for the "generated" stamp, so identical inputs give an
/// identical file. Satellites that fail are listed in the summary and on the
/// page; only configuration and write errors abort.
pub async fn generate(
    config: &Config,
    provider: &dyn PassProvider,
    output: &Path,
    now: DateTime<Utc>,
) -> Result<Summary, ReportError> {
    let query = config.query()?;
    log::info!(
        "Fetching {} days of passes above {}° for {} satellites ({} order)",
        query.days_ahead,
        query.min_elevation_deg,
        config.satellites.len(),
        config.order
    );

    let report = fetch_all(provider, &config.satellites, &query, config.order).await;
    let rows = colorize(report.passes, &config.satellites, &config.colors);

    let ctx = PageContext {
        title: &config.title,
        station_name: config.station.name.as_deref(),
        station: query.station,
        timezone: config.timezone,
        generated_at: now,
    };
    let html = render_page(&PassesPage::new(&ctx, &rows, &report.failures))?;
    write_atomic(output, &html)?;

    Ok(Summary {
        rows: rows.len(),
        failures: report.failures,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::predict::{FetchError, Pass, PassQuery, SatelliteTarget};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::fs;

    const CONFIG: &str = r#"
station:
  name: Backyard
  coordinates: "48.137, 11.575"
  altitude_m: 520
api_key: test
satellites:
  - id: 25544
    name: ISS
  - id: 43017
    name: AO-91
  - id: 33591
    name: NOAA 19
"#;

    /// ISS passes once, AO-91 is rejected, NOAA 19 has nothing.
    struct CannedProvider;

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 18, 30, 0).unwrap()
    }

    #[async_trait]
    impl PassProvider for CannedProvider {
        async fn fetch_passes(
            &self,
            target: &SatelliteTarget,
            _query: &PassQuery,
        ) -> Result<Vec<Pass>, FetchError> {
            match target.id {
                25544 => Ok(vec![Pass {
                    satellite: target.label(),
                    norad_id: target.id,
                    aos: t(),
                    los: t() + Duration::minutes(6),
                    tca: t() + Duration::minutes(3),
                    max_elevation_deg: 45.0,
                    aos_azimuth_deg: 250.0,
                    aos_compass: "WSW".into(),
                    los_azimuth_deg: 80.0,
                    los_compass: "E".into(),
                    duration_seconds: 360,
                }]),
                43017 => Err(FetchError::ResponseFormat(
                    "HTTP 403 Forbidden: Invalid API Key!".into(),
                )),
                _ => Ok(vec![]),
            }
        }
    }

    fn config() -> Config {
        Config::from_yaml(CONFIG, None).unwrap()
    }

    #[tokio::test]
    async fn writes_page_despite_failed_satellite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("passes.html");

        let summary = generate(&config(), &CannedProvider, &output, t() - Duration::hours(2))
            .await
            .unwrap();

        assert_eq!(summary.rows, 1);
        assert!(!summary.is_complete());
        assert_eq!(summary.failures[0].satellite, "AO-91");

        let html = fs::read_to_string(&output).unwrap();
        assert_eq!(html.matches("<tr class=\"pass\"").count(), 1);
        assert!(html.contains("<td>ISS</td>"));
        assert!(html.contains("2024-03-14 18:30:00"));
        assert!(html.contains("2024-03-14 18:36:00"));
        assert!(html.contains("<td>45°</td>"));
        assert!(html.contains("#808070"));
        assert!(html.contains("Backyard"));
        assert!(html.contains("AO-91 (NORAD 43017)"));
        assert!(!html.contains("NOAA 19"));
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.html");
        let second = dir.path().join("second.html");

        generate(&config(), &CannedProvider, &first, t()).await.unwrap();
        generate(&config(), &CannedProvider, &second, t()).await.unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[tokio::test]
    async fn unwritable_output_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("passes.html");

        let result = generate(&config(), &CannedProvider, &output, t()).await;

        assert!(matches!(result, Err(ReportError::Render(RenderError::Io(_)))));
        assert!(!output.exists());
    }
}
