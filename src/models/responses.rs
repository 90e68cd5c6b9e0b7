use serde::{Deserialize, Serialize};
use crate::models::domain::{Assignment, Attendee};

/// Response for the generate endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSeatingResponse {
    #[serde(rename = "arrangementId")]
    pub arrangement_id: String,
    pub assignment: Assignment,
    pub seed: u64,
    #[serde(rename = "attendeeCount")]
    pub attendee_count: usize,
    #[serde(rename = "seatCount")]
    pub seat_count: usize,
}

/// Response for the attendee import endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportAttendeesResponse {
    pub attendees: Vec<Attendee>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
