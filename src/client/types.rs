/**
 * Wire Types
 *
 * JSON shapes exchanged with the version, patch and update endpoints.
 * Snapshot and patch bodies are plain `Record` arrays.
 */

use crate::shared::dataset::VersionMarker;
use crate::shared::record::{Record, RecordFields};
use serde::{Deserialize, Serialize};

/// Response of the version-count endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub count: u64,
    #[serde(default)]
    pub version: Option<String>,
}

impl From<VersionResponse> for VersionMarker {
    fn from(value: VersionResponse) -> Self {
        VersionMarker::new(value.count, value.version)
    }
}

/// Body posted to the update endpoint
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRequest<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub fields: &'a RecordFields,
}

impl<'a> From<&'a Record> for UpdateRequest<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            id: &record.record_id,
            fields: &record.fields,
        }
    }
}

/// Response of the update endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UpdateResponse {
    /// Best description of a refusal
    pub fn failure_reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "update not acknowledged".to_string())
    }
}
