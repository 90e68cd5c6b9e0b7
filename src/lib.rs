//! Seating planner - diversity-aware table assignment for recurring events
//!
//! Seats a roster of attendees at capacity-bounded tables so that people who
//! share attributes (department, location, ...) or who sat together at recent
//! events end up apart. The engine is a randomized greedy search with restarts;
//! services read attendee and history sheets and export finished arrangements.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{PairHistory, PenaltyModel, RecencyDecay, SeatingEngine, SeatingError};
pub use models::{Assignment, Attendee, HistoryRecord, SeatedTable, TableConfig};
