//! Datasets and version markers
//!
//! A [`Dataset`] is the set of records of one [`DatasetKind`], keyed by
//! `record_id`. It is immutable once built: every change produces a new
//! dataset, which the client publishes as a fresh `Arc<Dataset>`.

use crate::shared::record::Record;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The two parallel ledgers served by the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Consumers awaiting disconnection action
    Consumers,
    /// Deemed visit list
    DeemedVisits,
}

impl DatasetKind {
    /// Every dataset kind, in refresh order
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Consumers, DatasetKind::DeemedVisits];

    /// Stable name used for cache keys and logs
    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Consumers => "consumers",
            DatasetKind::DeemedVisits => "deemed_visits",
        }
    }

    /// Path segment of the remote endpoints
    pub fn path_segment(&self) -> &'static str {
        match self {
            DatasetKind::Consumers => "consumers",
            DatasetKind::DeemedVisits => "deemed-visits",
        }
    }

    /// Cache key holding the serialized dataset
    pub fn cache_key(&self) -> String {
        format!("{}_data_cache", self.name())
    }

    /// Marker key holding the row count of the last snapshot
    pub fn row_count_key(&self) -> String {
        format!("{}_last_row_count", self.name())
    }

    /// Marker key holding the time of the last applied snapshot or patch
    pub fn sync_date_key(&self) -> String {
        format!("{}_last_sync_date", self.name())
    }

    /// Marker key holding the version hash reported with the last snapshot
    pub fn version_hash_key(&self) -> String {
        format!("{}_last_version_hash", self.name())
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cheap fingerprint of the remote dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMarker {
    /// Number of non-empty rows in the identity column
    pub count: u64,
    /// Content hash, when the remote computes one
    pub hash: Option<String>,
}

impl VersionMarker {
    pub fn new(count: u64, hash: Option<String>) -> Self {
        Self { count, hash }
    }

    /// Only the row count decides whether a full snapshot is needed.
    pub fn requires_snapshot(&self, local_count: Option<u64>) -> bool {
        local_count != Some(self.count)
    }
}

/// How far back the patch endpoint should look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchWindow {
    /// Rolling window of the given number of hours
    Hours(u32),
    /// Since midnight UTC of the current day
    Today,
}

impl PatchWindow {
    /// Oldest last-modified time a patch should include
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            PatchWindow::Hours(hours) => now - Duration::hours(i64::from(*hours)),
            PatchWindow::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc())
                .unwrap_or(now),
        }
    }

    /// Default window for a dataset kind
    pub fn default_for(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::Consumers => PatchWindow::Hours(48),
            DatasetKind::DeemedVisits => PatchWindow::Today,
        }
    }
}

impl FromStr for PatchWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "today" {
            return Ok(PatchWindow::Today);
        }
        let hours = s
            .strip_suffix('h')
            .ok_or_else(|| format!("expected 'today' or '<hours>h', got '{}'", s))?;
        match hours.parse::<u32>() {
            Ok(0) | Err(_) => Err(format!("invalid patch window '{}'", s)),
            Ok(n) => Ok(PatchWindow::Hours(n)),
        }
    }
}

impl fmt::Display for PatchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchWindow::Hours(n) => write!(f, "{}h", n),
            PatchWindow::Today => f.write_str("today"),
        }
    }
}

/// Records of one dataset, unique by `record_id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl Dataset {
    /// Empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, keeping the last occurrence of a repeated id in the
    /// position of its first occurrence.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut dataset = Self::new();
        for record in records {
            dataset.upsert_in_place(record);
        }
        dataset
    }

    /// Copy of this dataset with `record` inserted or replaced
    pub fn with_record(&self, record: Record) -> Self {
        let mut next = self.clone();
        next.upsert_in_place(record);
        next
    }

    pub(crate) fn upsert_in_place(&mut self, record: Record) {
        match self.index.get(&record.record_id) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.index.insert(record.record_id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, record_id: &str) -> Option<&Record> {
        self.index.get(record_id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, record_id: &str) -> bool {
        self.index.contains_key(record_id)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records carrying an unacknowledged local change
    pub fn pending(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_pending())
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}
