use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::EtlError;

/// One line of the input file, as read. Columns missing from a short row stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputRow {
    pub object_type: String,
    pub name: String,
    pub label: String,
    pub description: String,
    pub group_name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub field_type: String,
    pub options: String,
}

/// CRM entity a property is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Contact,
    Deal,
    Ticket,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Contact, ObjectKind::Deal, ObjectKind::Ticket];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Contact => "contact",
            ObjectKind::Deal => "deal",
            ObjectKind::Ticket => "ticket",
        }
    }

    /// Path segment used by the properties API.
    pub fn api_segment(&self) -> &'static str {
        match self {
            ObjectKind::Contact => "contacts",
            ObjectKind::Deal => "deals",
            ObjectKind::Ticket => "tickets",
        }
    }

    pub fn default_endpoint(&self, base_url: &str) -> String {
        format!(
            "{}/crm/v3/properties/{}",
            base_url.trim_end_matches('/'),
            self.api_segment()
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contact" | "contacts" => Ok(ObjectKind::Contact),
            "deal" | "deals" => Ok(ObjectKind::Deal),
            "ticket" | "tickets" => Ok(ObjectKind::Ticket),
            _ => Err(EtlError::InvalidObjectType {
                value: s.trim().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOption {
    pub label: String,
    pub value: String,
}

/// Request body for the create-property endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    pub label: String,
    pub description: String,
    pub group_name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub field_type: String,
    pub form_field: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PropertyOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_display_hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MappedProperty {
    pub kind: ObjectKind,
    pub definition: PropertyDefinition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Success,
    Failure,
    InvalidObject,
    CriticalError,
}

impl ResultStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ResultStatus::Success => "Success",
            ResultStatus::Failure => "Failure",
            ResultStatus::InvalidObject => "Invalid Object",
            ResultStatus::CriticalError => "Critical Error",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one row (or of the input stream failing). Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub object_type: String,
    pub name: String,
    pub label: String,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ResultRecord {
    pub fn success(kind: ObjectKind, definition: &PropertyDefinition) -> Self {
        Self {
            object_type: kind.to_string(),
            name: definition.name.clone(),
            label: definition.label.clone(),
            status: ResultStatus::Success,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        kind: ObjectKind,
        definition: &PropertyDefinition,
        message: impl Into<String>,
    ) -> Self {
        Self {
            object_type: kind.to_string(),
            name: definition.name.clone(),
            label: definition.label.clone(),
            status: ResultStatus::Failure,
            error_message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn invalid_object(row: &InputRow, message: impl Into<String>) -> Self {
        Self {
            object_type: row.object_type.trim().to_string(),
            name: row.name.trim().to_string(),
            label: row.label.trim().to_string(),
            status: ResultStatus::InvalidObject,
            error_message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            object_type: "N/A".to_string(),
            name: "N/A".to_string(),
            label: "N/A".to_string(),
            status: ResultStatus::CriticalError,
            error_message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

/// One data line of the input. A row whose bytes could not be decoded keeps a lossy
/// copy of its fields for the report and is never submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRow {
    pub line: u64,
    pub row: InputRow,
    pub decode_error: Option<String>,
}

/// Rows read before the input ended, plus the stream error that ended it early, if any.
#[derive(Debug, Clone, Default)]
pub struct ExtractedRows {
    pub rows: Vec<ExtractedRow>,
    pub stream_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report_path: String,
    pub results: Vec<ResultRecord>,
}

impl RunSummary {
    pub fn count(&self, status: ResultStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
