// Locally persisted user preferences: the selected club and the latest swing stats.
// Each preference is a PreferenceStore over a KeyValueStorage.

pub mod club;
pub mod stats;
pub mod storage;
pub mod store;

pub use club::Club;
pub use stats::SwingStatsSnapshot;
pub use storage::{FileBasedStorage, KeyValueStorage, MemoryStorage};
pub use store::{LoadState, Preference, PreferenceStore};

pub type ClubStore = PreferenceStore<Club>;
pub type StatsStore = PreferenceStore<SwingStatsSnapshot>;
