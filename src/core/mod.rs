// Seating engine exports
pub mod engine;
pub mod history;
pub mod penalty;
pub mod validation;

pub use engine::{SeatingEngine, SeatingError};
pub use history::PairHistory;
pub use penalty::{PenaltyModel, RecencyDecay};
pub use validation::{
    check_assignment, validate_assignment, validate_request, ValidationError, ValidationErrorKind,
};
