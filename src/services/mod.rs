// Service exports
pub mod export;
pub mod history;
pub mod loader;

pub use export::{ExportError, ExportFormat};
pub use history::HistoryError;
pub use loader::LoaderError;
