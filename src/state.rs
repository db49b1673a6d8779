//! Shared job state for completed corpus passes.
//!
//! The pass driver is the only writer. Readers clone an `Arc` to the current
//! snapshot and keep a consistent view for as long as they hold it; a
//! snapshot is replaced wholesale (reset to empty at pass start, full result
//! installed at pass end), never edited in place.

use crate::pipeline::types::CorpusSnapshot;
use std::sync::{Arc, RwLock};

/// Handle to the most recent corpus snapshot.
pub struct JobState {
    current: RwLock<Arc<CorpusSnapshot>>,
}

impl JobState {
    /// Create a job state holding an empty snapshot.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(CorpusSnapshot::default())),
        }
    }

    /// Return the current snapshot.
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        self.current
            .read()
            .expect("job state lock poisoned")
            .clone()
    }

    /// Discard the current snapshot, installing an empty one.
    pub fn reset(&self) {
        self.install(CorpusSnapshot::default());
    }

    /// Replace the current snapshot wholesale.
    pub fn install(&self, snapshot: CorpusSnapshot) {
        *self.current.write().expect("job state lock poisoned") = Arc::new(snapshot);
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::new()
    }
}
