use futures::future::join_all;
use serde::Deserialize;
use strum_macros::Display;

use crate::predict::provider::PassProvider;
use crate::predict::types::{FetchFailure, FetchReport, PassQuery, SatelliteTarget};

/// Row ordering of the aggregated passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PassOrder {
    /// Configured satellite order, then start time.
    #[default]
    BySatellite,
    /// Start time across all satellites.
    Chronological,
}

/// Fetch passes for every target.
///
/// Requests are issued concurrently but the result follows the order of
/// `targets`, never the completion order. A failing satellite is recorded in
/// [FetchReport::failures] and contributes no passes.
pub async fn fetch_all(
    provider: &dyn PassProvider,
    targets: &[SatelliteTarget],
    query: &PassQuery,
    order: PassOrder,
) -> FetchReport {
    let results = join_all(
        targets
            .iter()
            .map(|target| provider.fetch_passes(target, query)),
    )
    .await;

    let mut report = FetchReport::default();
    for (target, result) in targets.iter().zip(results) {
        match result {
            Ok(mut passes) => {
                passes.sort_by_key(|p| p.aos);
                log::info!("{} (NORAD {}): {} passes", target.label(), target.id, passes.len());
                report.passes.extend(passes);
            }
            Err(e) => {
                log::warn!("Failed to fetch passes for {}: {}", target.label(), e);
                report.failures.push(FetchFailure {
                    satellite: target.label(),
                    norad_id: target.id,
                    reason: e.to_string(),
                });
            }
        }
    }

    if order == PassOrder::Chronological {
        // stable: simultaneous passes keep satellite order
        report.passes.sort_by_key(|p| p.aos);
    }

    report
}
