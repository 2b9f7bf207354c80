// Swing data: the canonical record, schema-tolerant normalization and the
// fallback-chained fetcher that feeds them.

pub mod fetcher;
pub mod normalize;
pub mod record;
pub mod source;

pub use fetcher::{Attempt, Dataset, FetchOutcome, FetchState, SwingFetcher};
pub use normalize::{normalize_record, normalize_records};
pub use record::{SwingRecord, SwingTimestamps};
pub use source::{AnalyzerClient, SourceKind};
