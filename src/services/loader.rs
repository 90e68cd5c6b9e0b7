use crate::models::Attendee;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading an attendee sheet
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

/// Column positions resolved from the header row
struct Columns {
    name: usize,
    id: Option<usize>,
    attending: Option<usize>,
    head_table: Option<usize>,
    attributes: Vec<(usize, String)>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, LoaderError> {
        let find = |wanted: &[&str]| {
            headers
                .iter()
                .position(|h| wanted.iter().any(|w| normalize(h) == *w))
        };

        let name = find(&["name"]).ok_or_else(|| {
            LoaderError::MalformedInput("missing required column 'name'".to_string())
        })?;
        let id = find(&["id"]);
        let attending = find(&["attending"]);
        let head_table = find(&["head table", "head_table", "headtable"]);

        let reserved = [Some(name), id, attending, head_table];
        let attributes = headers
            .iter()
            .enumerate()
            .filter(|(idx, header)| !reserved.contains(&Some(*idx)) && !header.trim().is_empty())
            .map(|(idx, header)| (idx, header.trim().to_string()))
            .collect();

        Ok(Self {
            name,
            id,
            attending,
            head_table,
            attributes,
        })
    }
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Interprets the yes/no cells of a sheet ("Y", "yes", "true", "1", "1.0")
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "y" | "yes" | "true" | "1" | "1.0" | "x"
    )
}

/// Parse attendees from CSV
///
/// # Format
/// - `name` (required): display name
/// - `id` (optional): identifier, defaults to the name
/// - `attending` (optional): only rows marked yes are kept
/// - `head table` (optional): yes pins the attendee to table 1
/// - any other column is a categorical attribute used for diversity scoring
pub fn parse_attendees<R: Read>(reader: R) -> Result<Vec<Attendee>, LoaderError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut attendees = Vec::new();
    let mut ids = HashSet::new();

    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1
        let line = idx + 2;

        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        if let Some(col) = columns.attending {
            if !parse_flag(record.get(col).unwrap_or("")) {
                continue;
            }
        }

        let name = record.get(columns.name).unwrap_or("");
        if name.is_empty() {
            return Err(LoaderError::MalformedInput(format!(
                "row {} has no name",
                line
            )));
        }

        let id = columns
            .id
            .and_then(|col| record.get(col))
            .filter(|id| !id.is_empty())
            .unwrap_or(name);

        if !ids.insert(id.to_string()) {
            return Err(LoaderError::MalformedInput(format!(
                "duplicate attendee '{}' on row {}",
                id, line
            )));
        }

        let mut attendee = Attendee::new(id, name);
        attendee.head_table = columns
            .head_table
            .and_then(|col| record.get(col))
            .map(parse_flag)
            .unwrap_or(false);

        for (col, key) in &columns.attributes {
            if let Some(value) = record.get(*col).filter(|v| !v.is_empty()) {
                attendee.attributes.insert(key.clone(), value.to_string());
            }
        }

        attendees.push(attendee);
    }

    tracing::debug!("Parsed {} attendees from sheet", attendees.len());

    Ok(attendees)
}

/// Load attendees from a CSV file on disk
pub fn load_attendees<P: AsRef<Path>>(path: P) -> Result<Vec<Attendee>, LoaderError> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_attendees(file)
}
