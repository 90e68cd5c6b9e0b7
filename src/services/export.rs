use crate::core::PairHistory;
use crate::models::{Assignment, SeatedTable};
use chrono::NaiveDateTime;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use thiserror::Error;

/// Errors that can occur while rendering an assignment
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid UTF-8 in output: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "seating_arrangement.md",
            ExportFormat::Csv => "seating_arrangement.csv",
        }
    }
}

/// Render an assignment in the requested format
///
/// `history` only affects Markdown, which then lists recent repeat pairings
/// under each table.
pub fn render(
    assignment: &Assignment,
    format: ExportFormat,
    generated_at: NaiveDateTime,
    history: Option<&PairHistory>,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Markdown => Ok(to_markdown_with_history(assignment, generated_at, history)),
        ExportFormat::Csv => to_csv(assignment),
    }
}

/// Attribute names used anywhere in the assignment, sorted
fn attribute_columns(assignment: &Assignment) -> Vec<&str> {
    let keys: BTreeSet<&str> = assignment
        .tables
        .iter()
        .flat_map(|t| t.attendees.iter())
        .flat_map(|a| a.attributes.keys().map(String::as_str))
        .collect();
    keys.into_iter().collect()
}

fn table_title(table: &SeatedTable) -> String {
    if table.is_head_table() {
        "Head Table".to_string()
    } else {
        format!("Table {}", table.table)
    }
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn events_ago_text(events_ago: usize) -> String {
    if events_ago == 1 {
        "1 event ago".to_string()
    } else {
        format!("{} events ago", events_ago)
    }
}

/// "X and Y sat together: 1 event ago, 3 events ago" for each pair at the table
/// that shared a table inside the history window
pub fn repeat_pairings(table: &SeatedTable, history: &PairHistory) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, a) in table.attendees.iter().enumerate() {
        for b in &table.attendees[i + 1..] {
            let mut events = history.events_together(&a.id, &b.id).to_vec();
            if events.is_empty() {
                continue;
            }
            events.sort_unstable();

            let when: Vec<String> = events.into_iter().map(events_ago_text).collect();
            lines.push(format!("{} and {} sat together: {}", a.name, b.name, when.join(", ")));
        }
    }

    lines
}

/// Markdown document with one section per table
pub fn to_markdown(assignment: &Assignment, generated_at: NaiveDateTime) -> String {
    to_markdown_with_history(assignment, generated_at, None)
}

/// Markdown document, with a "recent interactions" list per table when
/// `history` is given
pub fn to_markdown_with_history(
    assignment: &Assignment,
    generated_at: NaiveDateTime,
    history: Option<&PairHistory>,
) -> String {
    let columns = attribute_columns(assignment);
    let mut md = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(md, "# Seating Arrangement\n");
    let _ = writeln!(md, "Generated on: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S"));

    for table in &assignment.tables {
        let _ = writeln!(md, "## {}\n", table_title(table));
        let _ = writeln!(
            md,
            "Number of guests: {} of {}\n",
            table.attendees.len(),
            table.capacity
        );

        let mut header = String::from("| Name |");
        let mut rule = String::from("|------|");
        for column in &columns {
            let _ = write!(header, " {} |", escape_cell(column));
            rule.push_str("------|");
        }
        if table.is_head_table() {
            header.push_str(" Assigned |");
            rule.push_str("----------|");
        }
        let _ = writeln!(md, "{header}\n{rule}");

        for attendee in &table.attendees {
            let mut row = format!("| {} |", escape_cell(&attendee.name));
            for column in &columns {
                let _ = write!(row, " {} |", escape_cell(attendee.attribute(column).unwrap_or("")));
            }
            if table.is_head_table() {
                row.push_str(if attendee.head_table { " ✓ |" } else { "  |" });
            }
            let _ = writeln!(md, "{row}");
        }
        md.push('\n');

        let repeats = history.map(|h| repeat_pairings(table, h)).unwrap_or_default();
        if !repeats.is_empty() {
            md.push_str("Recent interactions at this table:\n\n");
            for line in &repeats {
                let _ = writeln!(md, "- {}", escape_cell(line));
            }
            md.push('\n');
        }
    }

    md
}

/// Flat CSV: one row per seated attendee
pub fn to_csv(assignment: &Assignment) -> Result<String, ExportError> {
    let columns = attribute_columns(assignment);
    let mut wtr = Writer::from_writer(Vec::new());

    let mut header = vec!["table", "name", "id", "head_table"];
    header.extend(columns.iter().copied());
    wtr.write_record(&header)?;

    for table in &assignment.tables {
        for attendee in &table.attendees {
            let mut row = vec![
                table.table.to_string(),
                attendee.name.clone(),
                attendee.id.clone(),
                if attendee.head_table { "Y" } else { "" }.to_string(),
            ];
            row.extend(
                columns
                    .iter()
                    .map(|c| attendee.attribute(c).unwrap_or("").to_string()),
            );
            wtr.write_record(&row)?;
        }
    }

    let bytes = wtr.into_inner().map_err(|e| ExportError::IoError(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
