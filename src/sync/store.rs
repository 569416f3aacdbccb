use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreError;

/// One field-level change, delivered asynchronously to every subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

struct StoreInner {
    values: BTreeMap<String, Value>,
    subscribers: Vec<Sender<StoreChange>>,
    path: Option<PathBuf>,
}

/// Key/value store shared by the page agent and the control panel.
///
/// Every write is per field: `set_many` applies its entries one at a time
/// and emits one change per field that actually changed. Readers reacting
/// to one change may see other fields still stale.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SharedStore {
    pub fn in_memory() -> Self {
        SharedStore {
            inner: Arc::new(Mutex::new(StoreInner {
                values: BTreeMap::new(),
                subscribers: Vec::new(),
                path: None,
            })),
        }
    }

    /// Open a store persisted as a JSON object at `path`, creating it on
    /// first write if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|source| StoreError::Json {
                    context: format!("loading {}", path.display()),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), fields = values.len(), "opened shared store");
        Ok(SharedStore {
            inner: Arc::new(Mutex::new(StoreInner {
                values,
                subscribers: Vec::new(),
                path: Some(path),
            })),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Json {
                    context: format!("decoding field '{}'", key),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub fn set(&self, key: &str, value: impl Serialize) -> Result<(), StoreError> {
        let value = to_value(key, value)?;
        self.set_many(vec![(key.to_string(), value)])
    }

    pub fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let mut changes = Vec::new();

        for (key, value) in entries {
            let old = inner.values.insert(key.clone(), value.clone());
            if old.as_ref() != Some(&value) {
                changes.push(StoreChange {
                    key,
                    old_value: old,
                    new_value: Some(value),
                });
            }
        }

        finish_write(&mut inner, changes)
    }

    pub fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let changes: Vec<StoreChange> = keys
            .iter()
            .filter_map(|key| {
                inner.values.remove(*key).map(|old| StoreChange {
                    key: key.to_string(),
                    old_value: Some(old),
                    new_value: None,
                })
            })
            .collect();

        finish_write(&mut inner, changes)
    }

    pub fn subscribe(&self) -> Result<StoreSubscription, StoreError> {
        let (tx, rx) = mpsc::channel();
        self.lock()?.subscribers.push(tx);
        Ok(StoreSubscription { rx })
    }

    pub fn snapshot(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        Ok(self.lock()?.values.clone())
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().ok().and_then(|inner| inner.path.clone())
    }
}

fn to_value(key: &str, value: impl Serialize) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Json {
        context: format!("encoding field '{}'", key),
        source,
    })
}

/// Persist, then notify. Subscribers hear about every change that reached
/// `values` even when the file write fails; the I/O error is returned after.
fn finish_write(inner: &mut StoreInner, changes: Vec<StoreChange>) -> Result<(), StoreError> {
    if changes.is_empty() {
        return Ok(());
    }

    let persisted = persist(inner);
    if let Err(e) = &persisted {
        warn!(error = %e, "store changed in memory but could not be persisted");
    }

    for change in changes {
        debug!(key = change.key.as_str(), "store field changed");
        // Dropped subscribers are pruned here
        inner
            .subscribers
            .retain(|tx| tx.send(change.clone()).is_ok());
    }
    persisted
}

fn persist(inner: &StoreInner) -> Result<(), StoreError> {
    let Some(path) = &inner.path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(&inner.values).map_err(|source| StoreError::Json {
        context: "persisting store".into(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Receiving end of store change notifications for one context.
pub struct StoreSubscription {
    rx: Receiver<StoreChange>,
}

impl StoreSubscription {
    /// All pending changes, oldest first.
    pub fn drain(&self) -> Vec<StoreChange> {
        self.rx.try_iter().collect()
    }

    /// Pending changes collapsed to the newest value per key.
    pub fn drain_latest(&self) -> BTreeMap<String, Option<Value>> {
        let mut latest = BTreeMap::new();
        for change in self.rx.try_iter() {
            latest.insert(change.key, change.new_value);
        }
        latest
    }
}

/// Decode a stored field, treating absent or malformed values as default.
pub fn decode_or_default<T: DeserializeOwned + Default>(key: &str, value: Option<Value>) -> T {
    match value {
        None | Some(Value::Null) => T::default(),
        Some(v) => serde_json::from_value(v).unwrap_or_else(|e| {
            warn!(key, error = %e, "ignoring malformed store field");
            T::default()
        }),
    }
}
