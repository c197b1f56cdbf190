// Last-access timestamps of cached assets.
// A JSON-backed record store keyed by URL, one record per URL.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};
use crate::storage;

/// Name of the object store inside the timestamp database.
pub const STORE_NAME: &str = "timestamps";

/// Last access of one cached URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampRecord {
    pub url: String,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
}

impl TimestampRecord {
    pub fn accessed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.ts)
    }
}

/// Timestamp records persisted in `<db dir>/timestamps.json`.
#[derive(Debug)]
pub struct TimestampStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl TimestampStore {
    /// Open the store inside the database directory `db_dir`.
    pub fn open(db_dir: &Path) -> Self {
        Self {
            path: db_dir.join(format!("{}.json", STORE_NAME)),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, i64>> {
        Ok(storage::read_json(&self.path)?.unwrap_or_default())
    }

    fn update<T>(&self, f: impl FnOnce(&mut BTreeMap<String, i64>) -> T) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PanelError::Other("timestamp store lock poisoned".to_string()))?;
        let mut records = self.load()?;
        let result = f(&mut records);
        storage::write_json(&self.path, &records)?;
        Ok(result)
    }

    /// Insert or overwrite the record for `url`.
    pub fn put(&self, url: &str, at: DateTime<Utc>) -> Result<()> {
        self.update(|records| {
            records.insert(url.to_string(), at.timestamp_millis());
        })
    }

    pub fn get(&self, url: &str) -> Result<Option<TimestampRecord>> {
        Ok(self.load()?.get(url).map(|ts| TimestampRecord {
            url: url.to_string(),
            ts: *ts,
        }))
    }

    pub fn all(&self) -> Result<Vec<TimestampRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .map(|(url, ts)| TimestampRecord { url, ts })
            .collect())
    }

    /// Remove the record for `url`. Returns whether there was one.
    pub fn delete(&self, url: &str) -> Result<bool> {
        self.update(|records| records.remove(url).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_put_overwrites_single_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = TimestampStore::open(temp_dir.path());
        let url = "http://host/static/app.css";
        let first = Utc::now() - Duration::days(3);
        let second = Utc::now();

        store.put(url, first).unwrap();
        store.put(url, second).unwrap();

        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].ts, second.timestamp_millis());
        assert_eq!(
            store.get(url).unwrap().unwrap().accessed_at().unwrap().timestamp_millis(),
            second.timestamp_millis()
        );
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = TimestampStore::open(temp_dir.path());
        store.put("a", Utc::now()).unwrap();

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = TimestampStore::open(&temp_dir.path().join("sw-cache-meta"));
        assert!(store.all().unwrap().is_empty());
    }
}
