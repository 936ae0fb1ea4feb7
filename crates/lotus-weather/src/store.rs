//! Flat-file snapshot store.
//!
//! One pretty-printed JSON file per fetch, named
//! `{yyyyMMdd-HHmmss}-{stationId}.json`. Files are written once and never
//! touched again; the directory only grows.

use chrono::NaiveDateTime;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::types::{FieldKey, StoreError, WeatherError, WeatherSnapshot};

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const TIMESTAMP_LEN: usize = 15;

/// A snapshot file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub station_id: String,
    pub fetched_at: NaiveDateTime,
    pub path: PathBuf,
}

/// Snapshot directory for all stations
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a snapshot of `station_id` taken at `fetched_at`
    pub fn file_name(fetched_at: NaiveDateTime, station_id: &str) -> String {
        format!("{}-{}.json", fetched_at.format(TIMESTAMP_FORMAT), station_id)
    }

    /// Write a raw payload. The directory is created on first use.
    pub fn save(
        &self,
        station_id: &str,
        fetched_at: NaiveDateTime,
        payload: &Value,
    ) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(Self::file_name(fetched_at, station_id));
        let json = serde_json::to_string_pretty(payload)?;
        std::fs::write(&path, json)?;

        tracing::debug!("Saved weather snapshot {}", path.display());
        Ok(path)
    }

    /// Snapshot files for `station_id`, newest first.
    ///
    /// A missing directory is an empty history.
    pub fn entries(&self, station_id: &str) -> Result<Vec<SnapshotEntry>, StoreError> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some((fetched_at, station)) = parse_file_name(name) else {
                continue;
            };
            if station != station_id {
                continue;
            }
            entries.push(SnapshotEntry {
                station_id: station.to_string(),
                fetched_at,
                path: dir_entry.path(),
            });
        }

        entries.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
        Ok(entries)
    }

    /// Read and parse one snapshot file
    pub fn load(&self, entry: &SnapshotEntry) -> Result<WeatherSnapshot, WeatherError> {
        let body = std::fs::read_to_string(&entry.path).map_err(StoreError::from)?;
        WeatherSnapshot::from_json(&entry.station_id, entry.fetched_at, &body)
    }

    /// Parsed snapshots for `station_id`, newest first, loaded lazily.
    /// Unreadable files are skipped.
    pub fn history<'a>(
        &'a self,
        station_id: &str,
    ) -> Result<impl Iterator<Item = WeatherSnapshot> + 'a, StoreError> {
        let entries = self.entries(station_id)?;
        Ok(entries
            .into_iter()
            .filter_map(move |entry| match self.load(&entry) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!("Skipping snapshot {}: {}", entry.path.display(), e);
                    None
                }
            }))
    }

    /// Most recent reported value of `key` for `station_id`
    pub fn latest_value(&self, station_id: &str, key: FieldKey) -> Result<Option<String>, StoreError> {
        Ok(self
            .history(station_id)?
            .find_map(|snapshot| snapshot.field(key).map(str::to_string)))
    }
}

/// Split `{yyyyMMdd-HHmmss}-{stationId}.json` into its parts
fn parse_file_name(name: &str) -> Option<(NaiveDateTime, &str)> {
    let stem = name.strip_suffix(".json")?;
    let timestamp = stem.get(..TIMESTAMP_LEN)?;
    let station = stem.get(TIMESTAMP_LEN..)?.strip_prefix('-')?;
    if station.is_empty() {
        return None;
    }
    let fetched_at = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    Some((fetched_at, station))
}
