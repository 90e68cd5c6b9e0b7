// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Attendee, TableConfig, HistoryRecord, HistorySeat, SeatedTable, Assignment};
pub use requests::{
    AppendHistoryRequest, ExportAssignmentRequest, ExportQuery, GenerateSeatingRequest,
};
pub use responses::{
    ErrorResponse, GenerateSeatingResponse, HealthResponse, ImportAttendeesResponse,
};
