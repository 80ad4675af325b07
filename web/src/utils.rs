use gloo::storage::errors::StorageError;
use gloo::storage::{LocalStorage, Storage};
use pairflip_core::{Score, ScoreStore, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Binds a persisted type to its `localStorage` key.
pub(crate) trait StorageKey {
    const KEY: &'static str;
}

pub(crate) trait LocalOrDefault {
    fn local_or_default() -> Self;
}

impl<T> LocalOrDefault for Option<T>
where
    T: StorageKey + DeserializeOwned,
{
    fn local_or_default() -> Self {
        match LocalStorage::get(T::KEY) {
            Ok(value) => Some(value),
            Err(StorageError::KeyNotFound(_)) => None,
            Err(err) => {
                log::warn!("could not read {}: {}", T::KEY, err);
                None
            }
        }
    }
}

pub(crate) trait LocalSave {
    fn local_save(&self);
}

impl<T> LocalSave for Option<T>
where
    T: StorageKey + Serialize,
{
    fn local_save(&self) {
        match self {
            Some(value) => {
                if let Err(err) = LocalStorage::set(T::KEY, value) {
                    log::error!("could not save {}: {}", T::KEY, err);
                }
            }
            None => LocalStorage::delete(T::KEY),
        }
    }
}

/// Best-score persistence in the browser's `localStorage`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct LocalScoreStore;

impl ScoreStore for LocalScoreStore {
    fn load(&self, key: &str) -> Result<Option<Score>, StoreError> {
        match LocalStorage::get(key) {
            Ok(score) => Ok(Some(score)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(StorageError::SerdeError(_)) => Err(StoreError::Malformed),
            Err(_) => Err(StoreError::Unavailable),
        }
    }

    fn save(&mut self, key: &str, value: Score) -> Result<(), StoreError> {
        LocalStorage::set(key, value).map_err(|err| {
            log::debug!("localStorage write failed: {}", err);
            StoreError::Unavailable
        })
    }
}

/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes([
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
    ])
}

/// Three-digit display used by the score, moves and timer counters.
pub(crate) fn format_for_counter(num: u64) -> String {
    match num {
        0..1000 => format!("{:03}", num),
        1000.. => "999".to_string(),
    }
}
