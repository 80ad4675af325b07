use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use crate::{Score, StoreError};

/// Key under which the best score is persisted.
pub const BEST_SCORE_KEY: &str = "pairflip:best-score";

/// Key-value persistence for score scalars.
pub trait ScoreStore {
    /// `Ok(None)` when nothing was stored under `key` yet.
    fn load(&self, key: &str) -> Result<Option<Score>, StoreError>;

    fn save(&mut self, key: &str, value: Score) -> Result<(), StoreError>;
}

impl<T: ScoreStore + ?Sized> ScoreStore for &mut T {
    fn load(&self, key: &str) -> Result<Option<Score>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: Score) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

/// In-memory store, lives as long as the value does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, Score>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: Score) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value);
        store
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Score>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn save(&mut self, key: &str, value: Score) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
