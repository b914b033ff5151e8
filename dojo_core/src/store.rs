use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use log::warn;
use serde_json::{Map, Value};

use crate::{DojoError, DojoResult};

pub const DEFAULT_OFFSET_KEY: &str = "rhythm-dojo.latency-offset-ms";

/// Keyed storage for the latency offset, the only state that outlives a session.
pub trait OffsetStore {
    fn get_offset(&self, key: &str) -> Option<f64>;

    fn set_offset(&mut self, key: &str, offset_ms: f64) -> DojoResult<()>;
}

/// Stored offset for `key`, or 0 when it is absent or unusable.
pub fn load_offset(store: &impl OffsetStore, key: &str) -> f64 {
    match store.get_offset(key) {
        Some(v) if v.is_finite() => v,
        Some(v) => {
            warn!("stored offset {key}={v} is not finite; using 0");
            0.0
        }
        None => 0.0,
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, f64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(key: &str, offset_ms: f64) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), offset_ms);
        Self { values }
    }
}

impl OffsetStore for MemoryStore {
    fn get_offset(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    fn set_offset(&mut self, key: &str, offset_ms: f64) -> DojoResult<()> {
        self.values.insert(key.to_string(), offset_ms);
        Ok(())
    }
}

/// JSON object of key to number on disk. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> DojoResult<Map<String, Value>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(DojoError::Store {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(map),
            other => {
                warn!("{}: expected a json object, found {other}; ignoring", self.path.display());
                Ok(Map::new())
            }
        }
    }
}

impl OffsetStore for JsonFileStore {
    fn get_offset(&self, key: &str) -> Option<f64> {
        match self.read_map() {
            Ok(map) => map.get(key).and_then(Value::as_f64),
            Err(e) => {
                warn!("could not read stored offset: {e}");
                None
            }
        }
    }

    fn set_offset(&mut self, key: &str, offset_ms: f64) -> DojoResult<()> {
        // A corrupt file is replaced rather than blocking the new calibration.
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!("replacing unreadable offset store: {e}");
            Map::new()
        });
        map.insert(key.to_string(), Value::from(offset_ms));
        let json = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, json).map_err(|source| DojoError::Store {
            path: self.path.clone(),
            source,
        })
    }
}
