// Library interface for swingview
// This allows integration tests to access internal modules

pub mod config;
pub mod errors;
pub mod preferences;
pub mod swings;
pub mod view;
pub mod writer;

// Re-export commonly used types
pub use config::FetcherConfig;
pub use errors::SwingError;
pub use preferences::{Club, ClubStore, StatsStore, SwingStatsSnapshot};
pub use swings::{Dataset, FetchOutcome, FetchState, SourceKind, SwingFetcher, SwingRecord};
