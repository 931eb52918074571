mod error;
mod fetcher;
mod ground_station;
mod n2yo;
mod provider;
mod types;

pub use error::FetchError;
pub use fetcher::{fetch_all, PassOrder};
pub use ground_station::GroundStation;
pub use n2yo::{N2yoClient, DEFAULT_PROVIDER_URL};
pub use provider::PassProvider;
pub use types::{FetchFailure, Pass, PassQuery, SatelliteTarget};
