// Preference store: one in-memory value kept in sync with key-value storage

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use log::{debug, warn};

use super::storage::KeyValueStorage;
use crate::errors::SwingError;

/// A value that can live in a [`PreferenceStore`].
pub trait Preference: Clone + Send + Sync + 'static {
    /// Storage key the value is persisted under
    const KEY: &'static str;

    fn encode(&self) -> Result<String, SwingError>;

    fn decode(raw: &str) -> Result<Self, SwingError>;

    /// Whether the value may be held and persisted at all.
    fn is_valid(&self) -> bool {
        true
    }
}

/// What a store currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    /// The initial load from storage has not completed yet
    Loading,
    Absent,
    Present(T),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            LoadState::Present(v) => Some(v),
            _ => None,
        }
    }
}

enum PersistOp {
    Load,
    Save(String),
    Remove,
    Flush(Sender<()>),
}

/// Holds one preference value in memory and persists it in the background.
///
/// Reads never block and never fail: until the initial load completes, and
/// whenever storage is empty or unreadable, the store reads as absent. Writes
/// and clears update memory immediately; the storage side is applied by a
/// worker thread in issue order and any failure there is only logged.
pub struct PreferenceStore<T: Preference> {
    state: Arc<RwLock<LoadState<T>>>,
    ops: Sender<PersistOp>,
}

impl<T: Preference> Clone for PreferenceStore<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            ops: self.ops.clone(),
        }
    }
}

impl<T: Preference> PreferenceStore<T> {
    /// Create the store and trigger its one initial load.
    pub fn new(storage: impl KeyValueStorage) -> Self {
        let state = Arc::new(RwLock::new(LoadState::Loading));
        let (ops_tx, ops_rx) = mpsc::channel::<PersistOp>();

        let worker_state = Arc::clone(&state);
        thread::spawn(move || persist_loop(storage, worker_state, ops_rx));

        let store = Self { state, ops: ops_tx };
        store.submit(PersistOp::Load);
        store
    }

    /// Current value, or `None` when absent or still loading.
    pub fn read(&self) -> Option<T> {
        self.load_state().value().cloned()
    }

    pub fn load_state(&self) -> LoadState<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the value. Visible to readers on return; persisted later.
    /// An invalid value is dropped and the current one kept.
    pub fn write(&self, value: T) {
        if !value.is_valid() {
            warn!("Not storing invalid {}", T::KEY);
            return;
        }
        let encoded = value.encode();
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = LoadState::Present(value);

        match encoded {
            Ok(raw) => self.submit(PersistOp::Save(raw)),
            Err(e) => warn!("Not persisting {}: {}", T::KEY, e),
        }
    }

    /// Reset to absent and remove the persisted value.
    pub fn clear(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = LoadState::Absent;
        self.submit(PersistOp::Remove);
    }

    /// Block until the initial load and every write or clear issued so far
    /// have reached storage (successfully or not).
    pub fn flush(&self) {
        let (done_tx, done_rx) = mpsc::channel();
        self.submit(PersistOp::Flush(done_tx));
        if done_rx.recv().is_err() {
            warn!("Preference worker for {} is gone", T::KEY);
        }
    }

    fn submit(&self, op: PersistOp) {
        if self.ops.send(op).is_err() {
            warn!("Preference worker for {} is gone, dropping operation", T::KEY);
        }
    }
}

fn persist_loop<T: Preference, S: KeyValueStorage>(
    mut storage: S,
    state: Arc<RwLock<LoadState<T>>>,
    ops: Receiver<PersistOp>,
) {
    for op in &ops {
        match op {
            PersistOp::Load => {
                let loaded = load_value::<T, S>(&storage);
                let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
                // a write or clear issued before the load finished wins
                if guard.is_loading() {
                    *guard = match loaded {
                        Some(v) => LoadState::Present(v),
                        None => LoadState::Absent,
                    };
                } else {
                    debug!("Discarding stored {}: already set in memory", T::KEY);
                }
            }
            PersistOp::Save(raw) => {
                if let Err(e) = storage.set_item(T::KEY, &raw) {
                    warn!("Could not persist {}: {}", T::KEY, e);
                }
            }
            PersistOp::Remove => {
                if let Err(e) = storage.remove_item(T::KEY) {
                    warn!("Could not remove persisted {}: {}", T::KEY, e);
                }
            }
            PersistOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

fn load_value<T: Preference, S: KeyValueStorage>(storage: &S) -> Option<T> {
    let raw = match storage.get_item(T::KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read {}: {}", T::KEY, e);
            return None;
        }
    };

    if raw.trim().is_empty() {
        return None;
    }

    match T::decode(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring stored {}: {}", T::KEY, e);
            None
        }
    }
}
