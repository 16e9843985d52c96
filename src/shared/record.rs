//! Ledger Record
//!
//! A `Record` is one row of a spreadsheet-backed ledger: a consumer awaiting
//! disconnection action, or a deemed visit. Both datasets share this shape.
//!
//! Wire format (as served by the snapshot and patch endpoints):
//!
//! ```json
//! {
//!   "id": "C1",
//!   "status": "disconnected",
//!   "address": "12 Canal Road",
//!   "outstanding": "1450.50",
//!   "agency": "North Zone",
//!   "lastUpdated": "2024-05-02T10:31:00Z",
//!   "imageUrl": null,
//!   "remarks": "meter sealed",
//!   "feeder": "F-11"
//! }
//! ```
//!
//! Unknown columns (`feeder` above) are preserved in [`RecordFields::extra`].
//! The local sync marker is cached under `_syncState` and never sent back to
//! the update endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Local, transient state of a record's most recent mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No unresolved local change
    #[default]
    None,
    /// Optimistic copy waiting for remote confirmation
    Syncing,
    /// Retries exhausted, needs a manual resubmit
    Error,
}

impl SyncState {
    /// True for `None`
    pub fn is_none(&self) -> bool {
        matches!(self, SyncState::None)
    }

    /// True when the record carries a local change the remote has not acknowledged
    pub fn is_pending(&self) -> bool {
        matches!(self, SyncState::Syncing | SyncState::Error)
    }
}

/// Domain attributes of a ledger row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    /// Disconnection status (`connected`, `disconnected`, `pending`...)
    #[serde(default, deserialize_with = "sheet_text")]
    pub status: String,
    /// Consumer address
    #[serde(default, deserialize_with = "sheet_text")]
    pub address: String,
    /// Financial outstanding amount, as written in the sheet
    #[serde(default)]
    pub outstanding: Option<Amount>,
    /// Agency the record is assigned to
    #[serde(default, deserialize_with = "sheet_text")]
    pub agency: String,
    /// Remote last-modified timestamp, as written by the sheet
    #[serde(default, deserialize_with = "sheet_opt_text", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Reference to captured evidence image
    #[serde(default, deserialize_with = "sheet_opt_text", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Free-text remarks
    #[serde(default, deserialize_with = "sheet_opt_text", skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Columns this crate does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One row of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable natural key, never reused
    #[serde(rename = "id", alias = "recordId")]
    pub record_id: String,
    #[serde(flatten)]
    pub fields: RecordFields,
    #[serde(
        rename = "_syncState",
        default,
        skip_serializing_if = "SyncState::is_none"
    )]
    pub sync_state: SyncState,
}

impl Record {
    /// Create a record with empty fields
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            fields: RecordFields::default(),
            sync_state: SyncState::None,
        }
    }

    /// Builder-style status setter
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.fields.status = status.into();
        self
    }

    /// Builder-style remarks setter
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.fields.remarks = Some(remarks.into());
        self
    }

    /// Copy of this record carrying the given sync state
    pub fn with_sync_state(&self, sync_state: SyncState) -> Self {
        Self {
            sync_state,
            ..self.clone()
        }
    }

    /// Whether an unacknowledged local mutation is attached
    pub fn is_pending(&self) -> bool {
        self.sync_state.is_pending()
    }
}

/// Cell value kept verbatim so it is posted back exactly as read
///
/// Sheets hold amounts as numbers, formatted text (`"1,450.50"`) or
/// placeholders (`"N/A"`, `"-"`). [`Amount::value`] parses what it can.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(serde_json::Value);

impl Amount {
    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }

    /// Numeric value; `None` for blanks and placeholders
    pub fn value(&self) -> Option<f64> {
        match &self.0 {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => {
                let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
                cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
            }
            _ => None,
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self(serde_json::json!(value))
    }
}

impl RecordFields {
    /// Parsed outstanding amount, if the cell holds a number
    pub fn outstanding_value(&self) -> Option<f64> {
        self.outstanding.as_ref().and_then(Amount::value)
    }
}

fn cell_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Text cell; `null` reads as empty and numbers keep their digits
fn sheet_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(cell_text(value).unwrap_or_default())
}

fn sheet_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(cell_text(value))
}
