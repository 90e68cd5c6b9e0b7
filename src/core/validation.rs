//! Input and output checks for seating runs.
//!
//! `validate_request` guards the engine: it rejects malformed configs and
//! infeasible capacity before anything is seated. `validate_assignment`
//! checks a finished (or client-supplied) assignment against the invariants
//! every arrangement must hold:
//! - each attendee is seated exactly once
//! - no table holds more people than its capacity
//! - table numbers are unique

use crate::core::engine::SeatingError;
use crate::models::{Assignment, Attendee, TableConfig};
use std::collections::HashSet;

/// Validation result for assignments
pub type ValidationResult = Result<(), Vec<ValidationError>>;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The same attendee is seated more than once
    DuplicateAttendee,
    /// A table holds more people than it seats
    OverCapacity,
    /// Two tables share a number
    DuplicateTable,
    /// Someone on the roster was not seated
    MissingAttendee,
    /// Someone seated is not on the roster
    UnknownAttendee,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Checks an engine request before any seating happens
///
/// Capacity shortfalls are `InfeasibleConfiguration`; everything else that is
/// wrong with the request itself is `MalformedInput`.
pub fn validate_request(attendees: &[Attendee], config: &TableConfig) -> Result<(), SeatingError> {
    if config.capacities.is_empty() {
        return Err(SeatingError::MalformedInput(
            "at least one table is required".to_string(),
        ));
    }

    if let Some(idx) = config.capacities.iter().position(|&c| c == 0) {
        return Err(SeatingError::MalformedInput(format!(
            "table {} has zero capacity",
            idx + 1
        )));
    }

    let min_seats = config.minimum();
    if let Some(idx) = config.capacities.iter().position(|&c| c < min_seats) {
        return Err(SeatingError::MalformedInput(format!(
            "table {} seats {} but every table needs at least {}",
            idx + 1,
            config.capacities[idx],
            min_seats
        )));
    }

    if !config.diversity_weight.is_finite() || config.diversity_weight < 0.0 {
        return Err(SeatingError::MalformedInput(format!(
            "diversity weight must be a non-negative number, got {}",
            config.diversity_weight
        )));
    }

    let mut ids = HashSet::new();
    for attendee in attendees {
        if attendee.id.trim().is_empty() {
            return Err(SeatingError::MalformedInput(format!(
                "attendee '{}' has an empty id",
                attendee.name
            )));
        }
        if !ids.insert(attendee.id.as_str()) {
            return Err(SeatingError::MalformedInput(format!(
                "duplicate attendee id: {}",
                attendee.id
            )));
        }
    }

    let seats = config.total_capacity();
    if seats < attendees.len() {
        return Err(SeatingError::InfeasibleConfiguration {
            seats,
            attendees: attendees.len(),
        });
    }

    let pinned = attendees.iter().filter(|a| a.head_table).count();
    let head_capacity = config.capacities[0];
    if pinned > head_capacity {
        return Err(SeatingError::HeadTableOverflow {
            pinned,
            capacity: head_capacity,
        });
    }

    // Pinned guests count towards the head table's minimum
    let needed = min_seats
        .saturating_mul(config.table_count() - 1)
        .saturating_add(min_seats.saturating_sub(pinned));
    if attendees.len() - pinned < needed {
        return Err(SeatingError::BelowMinimumSeats {
            attendees: attendees.len(),
            tables: config.table_count(),
            min_seats,
        });
    }

    Ok(())
}

/// Structural checks that need no roster: duplicates, capacity, table numbers
pub fn check_assignment(assignment: &Assignment) -> ValidationResult {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    let mut tables = HashSet::new();

    for table in &assignment.tables {
        if !tables.insert(table.table) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateTable,
                format!("Table {} appears more than once", table.table),
            ));
        }

        if table.attendees.len() > table.capacity {
            errors.push(ValidationError::new(
                ValidationErrorKind::OverCapacity,
                format!(
                    "Table {} seats {} but holds {}",
                    table.table,
                    table.capacity,
                    table.attendees.len()
                ),
            ));
        }

        for attendee in &table.attendees {
            if !seen.insert(attendee.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateAttendee,
                    format!("Attendee '{}' is seated more than once", attendee.id),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Full check of an assignment against the roster it was built from
pub fn validate_assignment(assignment: &Assignment, attendees: &[Attendee]) -> ValidationResult {
    let mut errors = check_assignment(assignment).err().unwrap_or_default();

    let roster: HashSet<&str> = attendees.iter().map(|a| a.id.as_str()).collect();
    let seated: HashSet<&str> = assignment
        .tables
        .iter()
        .flat_map(|t| t.attendees.iter().map(|a| a.id.as_str()))
        .collect();

    for missing in roster.difference(&seated) {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingAttendee,
            format!("Attendee '{missing}' was not seated"),
        ));
    }

    for unknown in seated.difference(&roster) {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownAttendee,
            format!("Attendee '{unknown}' is not on the roster"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
