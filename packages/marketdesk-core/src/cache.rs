//! File-based data cache with TTL expiry.
//!
//! One JSON file per `(ticker, period, interval)` key. An entry is valid
//! while its age stays under the TTL; stale entries are simply ignored and
//! overwritten by the next fetch. Writes go through a temp file and a
//! rename so a concurrent reader never sees a partial entry.

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::Result;

/// Default time-to-live for cached market data.
pub const DEFAULT_TTL_MINUTES: i64 = 15;

/// Identity of a cache entry. Entries for different triples are
/// independent and never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey<'a> {
    pub ticker: &'a str,
    pub period: &'a str,
    pub interval: &'a str,
}

impl<'a> CacheKey<'a> {
    pub fn new(ticker: &'a str, period: &'a str, interval: &'a str) -> Self {
        Self {
            ticker,
            period,
            interval,
        }
    }

    /// File name for this key. Keys map to readable names instead of
    /// hashes so a cache directory can be inspected by hand.
    fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.json",
            sanitize(self.ticker),
            sanitize(self.period),
            sanitize(self.interval)
        )
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c.to_ascii_uppercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    fetched_at: DateTime<Utc>,
    data: T,
}

/// TTL file cache for provider payloads.
#[derive(Debug, Clone)]
pub struct DataCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DataCache {
    /// Create a cache in `dir` with the given TTL. A TTL of zero disables
    /// caching: every read misses, writes still land.
    pub fn new(dir: impl Into<PathBuf>, ttl_minutes: i64) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Cache at the default location with the default 15-minute TTL.
    pub fn with_defaults() -> Self {
        Self::new(Self::default_dir(), DEFAULT_TTL_MINUTES)
    }

    /// Default cache directory: `~/.marketdesk/cache`, overridable with
    /// `MARKETDESK_CACHE_DIR`.
    pub fn default_dir() -> PathBuf {
        if let Ok(path) = env::var("MARKETDESK_CACHE_DIR") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".marketdesk/cache"))
            .unwrap_or_else(|| PathBuf::from("cache"))
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Retrieve the payload for `key` if a fresh entry exists.
    ///
    /// Stale entries are left on disk for the next `put` to overwrite;
    /// corrupt entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        if self.ttl <= Duration::zero() {
            return None;
        }

        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("cache read failed for {}: {}", path.display(), err);
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("removing corrupt cache entry {}: {}", path.display(), err);
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        let age = Utc::now() - entry.fetched_at;
        if age >= self.ttl {
            log::debug!("cache stale for {} (age {}s)", path.display(), age.num_seconds());
            return None;
        }

        log::debug!("cache hit for {}", path.display());
        Some(entry.data)
    }

    /// Store a payload under `key`, stamped with the current time.
    ///
    /// The entry is written to a sibling temp file and renamed into place.
    pub fn put<T: Serialize>(&self, key: &CacheKey, data: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let entry = CacheEntry {
            fetched_at: Utc::now(),
            data,
        };
        let content = serde_json::to_string_pretty(&entry)?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Remove the entry for `key`, if present.
    pub fn invalidate(&self, key: &CacheKey) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Remove entries older than `days`. Corrupt entries are removed too.
    /// Returns the number of files deleted.
    pub fn clear_old(&self, days: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut removed = 0;

        for path in self.entry_paths()? {
            let stale = match fs::read_to_string(&path)
                .ok()
                .and_then(|c| serde_json::from_str::<CacheEntry<serde_json::Value>>(&c).ok())
            {
                Some(entry) => entry.fetched_at < cutoff,
                None => true,
            };

            if stale {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Remove every cache entry. Returns the number of files deleted.
    pub fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_paths()? {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}
