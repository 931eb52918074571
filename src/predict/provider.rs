use async_trait::async_trait;

use crate::predict::FetchError;
use crate::predict::types::{Pass, PassQuery, SatelliteTarget};

/// Source of pass predictions for a single satellite.
#[async_trait]
pub trait PassProvider: Send + Sync {
    async fn fetch_passes(
        &self,
        target: &SatelliteTarget,
        query: &PassQuery,
    ) -> Result<Vec<Pass>, FetchError>;
}
