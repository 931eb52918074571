use askama::Template;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::predict::{FetchFailure, GroundStation, Pass, SatelliteTarget};
use crate::render::color::{ColorScale, Rgb};
use crate::render::error::RenderError;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A pass with its elevation-derived colors.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRow {
    pub pass: Pass,
    pub background: Rgb,
    pub foreground: Rgb,
    /// Satellite color, drawn as a border and never mixed into the background.
    pub marker: Option<Rgb>,
}

/// Attach colors to passes. The background depends on elevation only, so
/// every satellite shares `scale`. Passes whose elevation cannot be mapped
/// are dropped.
pub fn colorize(
    passes: Vec<Pass>,
    targets: &[SatelliteTarget],
    scale: &ColorScale,
) -> Vec<RenderRow> {
    passes
        .into_iter()
        .filter_map(|pass| {
            let marker = targets
                .iter()
                .find(|t| t.id == pass.norad_id)
                .and_then(|t| t.color);
            match scale.map(pass.max_elevation_deg) {
                Ok(background) => Some(RenderRow {
                    foreground: background.foreground(),
                    background,
                    marker,
                    pass,
                }),
                Err(e) => {
                    log::warn!("Skipping {} pass at {}: {}", pass.satellite, pass.aos, e);
                    None
                }
            }
        })
        .collect()
}

/// Page-level values that are not per row.
pub struct PageContext<'a> {
    pub title: &'a str,
    pub station_name: Option<&'a str>,
    pub station: GroundStation,
    pub timezone: Tz,
    pub generated_at: DateTime<Utc>,
}

pub struct RowView {
    pub satellite: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub max_elevation: String,
    pub start_azimuth: String,
    pub end_azimuth: String,
    pub background: String,
    pub foreground: String,
    pub marker_style: String,
}

pub struct FailureView {
    pub satellite: String,
    pub norad_id: u32,
    pub reason: String,
}

#[derive(Template)]
#[template(path = "passes.html")]
pub struct PassesPage {
    pub title: String,
    pub station: String,
    pub generated: String,
    pub timezone: String,
    pub rows: Vec<RowView>,
    pub failures: Vec<FailureView>,
}

impl PassesPage {
    pub fn new(ctx: &PageContext<'_>, rows: &[RenderRow], failures: &[FetchFailure]) -> Self {
        let station = match ctx.station_name {
            Some(name) => format!("{} ({})", name, ctx.station),
            None => ctx.station.to_string(),
        };

        Self {
            title: ctx.title.to_string(),
            station,
            generated: format_time(ctx.generated_at, ctx.timezone),
            timezone: ctx.timezone.name().to_string(),
            rows: rows
                .iter()
                .map(|row| RowView {
                    satellite: row.pass.satellite.clone(),
                    start: format_time(row.pass.aos, ctx.timezone),
                    end: format_time(row.pass.los, ctx.timezone),
                    duration: format_duration(row.pass.duration_seconds),
                    max_elevation: format_degrees(row.pass.max_elevation_deg),
                    start_azimuth: format_azimuth(row.pass.aos_azimuth_deg, &row.pass.aos_compass),
                    end_azimuth: format_azimuth(row.pass.los_azimuth_deg, &row.pass.los_compass),
                    background: row.background.to_string(),
                    foreground: row.foreground.to_string(),
                    marker_style: row
                        .marker
                        .map(|c| format!("; border-left: 6px solid {}", c))
                        .unwrap_or_default(),
                })
                .collect(),
            failures: failures
                .iter()
                .map(|f| FailureView {
                    satellite: f.satellite.clone(),
                    norad_id: f.norad_id,
                    reason: f.reason.clone(),
                })
                .collect(),
        }
    }
}

pub fn render_page(page: &PassesPage) -> Result<String, RenderError> {
    Ok(page.render()?)
}

fn format_time(time: DateTime<Utc>, timezone: Tz) -> String {
    time.with_timezone(&timezone).format(TIME_FORMAT).to_string()
}

fn format_duration(seconds: i64) -> String {
    humantime::format_duration(std::time::Duration::from_secs(seconds.max(0) as u64)).to_string()
}

/// Two decimals at most, trailing zeros dropped: `45°`, `61.84°`.
fn format_degrees(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    format!("{}°", s)
}

fn format_azimuth(azimuth: f64, compass: &str) -> String {
    if compass.is_empty() {
        format_degrees(azimuth)
    } else {
        format!("{} {}", format_degrees(azimuth), compass)
    }
}
