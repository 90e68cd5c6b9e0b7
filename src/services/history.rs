use crate::models::{Assignment, HistoryRecord, HistorySeat};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// First column of the history sheet
pub const NAME_COLUMN: &str = "Name";
/// Header format of the per-event columns
pub const DATE_FORMAT: &str = "%m/%d/%Y";

const HEAD_TABLE_MARKER: &str = "[head table]";
const ABSENT_MARKER: &str = "(did not attend)";

/// Errors that can occur while reading or writing the history sheet
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

/// Parse the wide history sheet: `Name`, then one `MM/DD/YYYY` column per event
///
/// Cells hold the 1-based table number, `1 [head table]` for a pinned
/// head-table seat, or nothing / `(did not attend)`. Columns that are not
/// dates or hold an unreadable cell are skipped.
pub fn parse_history<R: Read>(reader: R) -> Result<Vec<HistoryRecord>, HistoryError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let name_col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(NAME_COLUMN))
        .ok_or_else(|| {
            HistoryError::MalformedInput(format!("missing required column '{}'", NAME_COLUMN))
        })?;

    let rows: Vec<StringRecord> = rdr.records().collect::<Result<_, _>>()?;
    let mut records = Vec::new();

    'columns: for (col, header) in headers.iter().enumerate() {
        if col == name_col {
            continue;
        }

        let date = match NaiveDate::parse_from_str(header, DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                tracing::warn!("Skipping history column '{}': not a {} date", header, DATE_FORMAT);
                continue;
            }
        };

        let mut record = HistoryRecord::new(date);

        for row in &rows {
            let name = row.get(name_col).unwrap_or("");
            if name.is_empty() {
                continue;
            }

            match parse_cell(row.get(col).unwrap_or("")) {
                Ok(Some((table, head_table))) => record.seats.push(HistorySeat {
                    attendee_id: name.to_string(),
                    table,
                    head_table,
                }),
                Ok(None) => {}
                Err(cell) => {
                    tracing::warn!(
                        "Skipping history column '{}': unreadable cell '{}' for {}",
                        header,
                        cell,
                        name
                    );
                    continue 'columns;
                }
            }
        }

        records.push(record);
    }

    records.sort_by_key(|r| r.date);

    tracing::debug!("Parsed {} history events", records.len());

    Ok(records)
}

/// `Ok(None)` is an absence, `Err` gives back the unreadable cell
fn parse_cell(cell: &str) -> Result<Option<(usize, bool)>, String> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case(ABSENT_MARKER) {
        return Ok(None);
    }

    if cell.to_lowercase().contains(HEAD_TABLE_MARKER) {
        return Ok(Some((1, true)));
    }

    // Spreadsheets export whole numbers as "3" or "3.0"
    match cell.parse::<f64>() {
        Ok(value) if value >= 1.0 && value.fract() == 0.0 => Ok(Some((value as usize, false))),
        _ => Err(cell.to_string()),
    }
}

/// Add an approved arrangement as the event on `date`
///
/// An existing event with the same date is replaced.
pub fn append_assignment(
    mut records: Vec<HistoryRecord>,
    assignment: &Assignment,
    date: NaiveDate,
) -> Vec<HistoryRecord> {
    records.retain(|r| r.date != date);
    records.push(HistoryRecord::from_assignment(date, assignment));
    records.sort_by_key(|r| r.date);
    records
}

/// Write records back out in the wide sheet format
///
/// Rows are every attendee that appears in any event, sorted; columns are the
/// event dates in ascending order.
pub fn write_history<W: Write>(records: &[HistoryRecord], writer: W) -> Result<(), HistoryError> {
    let mut ordered: Vec<&HistoryRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.date);

    let names: BTreeSet<&str> = ordered
        .iter()
        .flat_map(|r| r.seats.iter().map(|s| s.attendee_id.as_str()))
        .collect();

    let lookups: Vec<HashMap<&str, &HistorySeat>> = ordered
        .iter()
        .map(|r| r.seats.iter().map(|s| (s.attendee_id.as_str(), s)).collect())
        .collect();

    let mut wtr = Writer::from_writer(writer);

    let mut header = vec![NAME_COLUMN.to_string()];
    header.extend(ordered.iter().map(|r| r.date.format(DATE_FORMAT).to_string()));
    wtr.write_record(&header)?;

    for name in names {
        let mut row = vec![name.to_string()];
        for lookup in &lookups {
            let cell = match lookup.get(name) {
                Some(seat) if seat.head_table => format!("{} {}", seat.table, HEAD_TABLE_MARKER),
                Some(seat) => seat.table.to_string(),
                None => String::new(),
            };
            row.push(cell);
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Load history from disk; a missing file is an empty history
pub fn load_history<P: AsRef<Path>>(path: P) -> Result<Vec<HistoryRecord>, HistoryError> {
    match std::fs::File::open(path.as_ref()) {
        Ok(file) => parse_history(file),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No history at {}, starting fresh", path.as_ref().display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn save_history<P: AsRef<Path>>(
    path: P,
    records: &[HistoryRecord],
) -> Result<(), HistoryError> {
    let file = std::fs::File::create(path.as_ref())?;
    write_history(records, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendee, SeatedTable};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_parse_sheet() {
        let csv = "Name,01/15/2024,03/01/2024\n\
                   Ann,1 [head table],2\n\
                   Bob,2,(did not attend)\n\
                   Cat,2.0,\n";
        let records = parse_history(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(1, 15));
        assert_eq!(records[0].seats.len(), 3);
        assert!(records[0]
            .seats
            .iter()
            .any(|s| s.attendee_id == "Ann" && s.head_table && s.table == 1));
        assert_eq!(records[0].tables()[&2], vec!["Bob", "Cat"]);
        assert_eq!(records[1].seats.len(), 1);
    }

    #[test]
    fn test_skips_bad_columns() {
        let csv = "Name,notes,02/01/2024,02/08/2024\n\
                   Ann,vip,1,x\n\
                   Bob,,1,2\n";
        let records = parse_history(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, date(2, 1));
    }

    #[test]
    fn test_missing_name_column() {
        let err = parse_history("Who,01/01/2024\nAnn,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, HistoryError::MalformedInput(_)));
    }

    #[test]
    fn test_append_replaces_same_date() {
        let assignment = Assignment {
            tables: vec![SeatedTable {
                table: 1,
                capacity: 2,
                attendees: vec![Attendee::named("Ann"), Attendee::named("Dan")],
            }],
            penalty: 0.0,
            seed: None,
        };
        let records = vec![
            HistoryRecord::new(date(5, 1)).with_seat("Ann", 3),
            HistoryRecord::new(date(4, 1)).with_seat("Ann", 2),
        ];

        let updated = append_assignment(records, &assignment, date(5, 1));

        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].date, date(4, 1));
        assert_eq!(updated[1].seats.len(), 2);
        assert!(updated[1].seats.iter().all(|s| s.table == 1));
    }

    #[test]
    fn test_write_sheet() {
        let records = vec![
            HistoryRecord::new(date(6, 1)).with_seat("Bob", 2),
            HistoryRecord {
                date: date(1, 2),
                seats: vec![HistorySeat {
                    attendee_id: "Ann".to_string(),
                    table: 1,
                    head_table: true,
                }],
            },
        ];

        let mut out = Vec::new();
        write_history(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name,01/02/2024,06/01/2024");
        assert_eq!(lines[1], "Ann,1 [head table],");
        assert_eq!(lines[2], "Bob,,2");
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let records = load_history("/nonexistent/seating/history.csv").unwrap();
        assert!(records.is_empty());
    }
}
