use crate::models::domain::{Assignment, Attendee, HistoryRecord, TableConfig};
use crate::services::ExportFormat;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to generate (or regenerate) a seating arrangement
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateSeatingRequest {
    #[validate(length(min = 1))]
    pub attendees: Vec<Attendee>,
    pub tables: TableConfig,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
    /// Omit to get a fresh arrangement; the response carries the seed used
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Request to fold an approved arrangement into the history sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendHistoryRequest {
    #[serde(alias = "history_csv", rename = "historyCsv", default)]
    pub history_csv: Option<String>,
    pub assignment: Assignment,
    #[serde(alias = "event_date", rename = "eventDate", default)]
    pub event_date: Option<NaiveDate>,
}

/// Body of the export endpoint
///
/// `history` is optional; when present the Markdown export lists recent
/// repeat pairings per table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportAssignmentRequest {
    pub assignment: Assignment,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

/// Query string of the export endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}
