// Persistent asset cache storage.
// One directory per named cache, one metadata and one body file per cached URL.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::paths::sanitize_name;
use crate::storage;

use super::AssetResponse;

/// Metadata stored next to a cached body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    content_type: Option<String>,
    stored_at: DateTime<Utc>,
}

/// The set of named caches under one root directory.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all existing caches.
    pub fn keys(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Open (creating if needed) the cache called `name`.
    pub fn open(&self, name: &str) -> Result<AssetCache> {
        let dir = self.root.join(sanitize_name(name));
        fs::create_dir_all(&dir)?;
        Ok(AssetCache {
            name: name.to_string(),
            dir,
        })
    }

    /// Delete the cache called `name` with all entries.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.root.join(sanitize_name(name));
        if !dir.exists() {
            return Ok(false);
        }
        storage::delete_dir(&dir)?;
        Ok(true)
    }
}

/// A single named cache, keyed by request URL.
#[derive(Debug, Clone)]
pub struct AssetCache {
    name: String,
    dir: PathBuf,
}

impl AssetCache {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File stem for `url`: hex SHA-256 of the URL.
    fn key(url: &str) -> String {
        Sha256::digest(url.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    fn meta_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(url)))
    }

    fn body_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.body", Self::key(url)))
    }

    /// Look up the cached response for `url`.
    pub fn get(&self, url: &str) -> Result<Option<AssetResponse>> {
        let Some(meta) = storage::read_json::<EntryMeta>(&self.meta_path(url))? else {
            return Ok(None);
        };
        let Some(body) = storage::read_bytes(&self.body_path(url))? else {
            return Ok(None);
        };

        Ok(Some(AssetResponse {
            status: meta.status,
            content_type: meta.content_type,
            body,
        }))
    }

    /// Store `response` for `url`, replacing any previous entry.
    pub fn put(&self, url: &str, response: &AssetResponse) -> Result<()> {
        // Body first so a readable metadata file always has its body.
        storage::write_bytes(&self.body_path(url), &response.body)?;
        let meta = EntryMeta {
            url: url.to_string(),
            status: response.status,
            content_type: response.content_type.clone(),
            stored_at: Utc::now(),
        };
        storage::write_json(&self.meta_path(url), &meta)
    }

    /// Remove the entry for `url`. Returns whether there was one.
    pub fn delete(&self, url: &str) -> Result<bool> {
        let had_meta = storage::delete(&self.meta_path(url))?;
        let had_body = storage::delete(&self.body_path(url))?;
        Ok(had_meta || had_body)
    }

    /// URLs of all cached entries.
    pub fn urls(&self) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(meta) = storage::read_json::<EntryMeta>(&path)? {
                    urls.push(meta.url);
                }
            }
        }
        urls.sort();
        Ok(urls)
    }
}
