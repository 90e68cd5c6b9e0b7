use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A person to be seated
///
/// `attributes` holds the categorical columns used for diversity scoring
/// (department, location, seniority, ...). Keys are the column names as they
/// appeared in the uploaded sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(rename = "headTable", default)]
    pub head_table: bool,
}

impl Attendee {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: BTreeMap::new(),
            head_table: false,
        }
    }

    /// Attendee whose identifier is their display name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Pin this attendee to the head table
    pub fn at_head_table(mut self) -> Self {
        self.head_table = true;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Tables available for one run and how hard to push for diversity
///
/// Table `n` (1-based) has capacity `capacities[n - 1]`. Table 1 is the head
/// table. With `min_seats` set, every table must end up with at least that
/// many guests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub capacities: Vec<usize>,
    #[serde(rename = "diversityWeight", default = "default_diversity_weight")]
    pub diversity_weight: f64,
    #[serde(
        rename = "minSeats",
        alias = "min_seats",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub min_seats: Option<usize>,
}

fn default_diversity_weight() -> f64 { 1.0 }

impl TableConfig {
    pub fn uniform(tables: usize, capacity: usize) -> Self {
        Self::per_table(vec![capacity; tables])
    }

    pub fn per_table(capacities: Vec<usize>) -> Self {
        Self {
            capacities,
            diversity_weight: default_diversity_weight(),
            min_seats: None,
        }
    }

    /// Smallest number of uniform tables that seats everyone
    pub fn sized_for(attendee_count: usize, capacity: usize) -> Self {
        let tables = if capacity == 0 {
            0
        } else {
            attendee_count.div_ceil(capacity).max(1)
        };
        Self::uniform(tables, capacity)
    }

    pub fn with_diversity_weight(mut self, weight: f64) -> Self {
        self.diversity_weight = weight;
        self
    }

    pub fn with_min_seats(mut self, min_seats: usize) -> Self {
        self.min_seats = Some(min_seats);
        self
    }

    pub fn table_count(&self) -> usize {
        self.capacities.len()
    }

    /// Seats across all tables, saturating at `usize::MAX`
    pub fn total_capacity(&self) -> usize {
        self.capacities
            .iter()
            .fold(0usize, |total, &capacity| total.saturating_add(capacity))
    }

    /// Guests every table needs; zero when there is no minimum
    pub fn minimum(&self) -> usize {
        self.min_seats.unwrap_or(0)
    }
}

/// One attendee's seat at a past event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySeat {
    #[serde(rename = "attendeeId")]
    pub attendee_id: String,
    pub table: usize,
    #[serde(rename = "headTable", default)]
    pub head_table: bool,
}

/// Seating of a past event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: NaiveDate,
    pub seats: Vec<HistorySeat>,
}

impl HistoryRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, seats: Vec::new() }
    }

    pub fn with_seat(mut self, attendee_id: impl Into<String>, table: usize) -> Self {
        self.seats.push(HistorySeat {
            attendee_id: attendee_id.into(),
            table,
            head_table: false,
        });
        self
    }

    /// Fold an approved assignment into a history entry
    pub fn from_assignment(date: NaiveDate, assignment: &Assignment) -> Self {
        let seats = assignment
            .tables
            .iter()
            .flat_map(|table| {
                table.attendees.iter().map(move |attendee| HistorySeat {
                    attendee_id: attendee.id.clone(),
                    table: table.table,
                    head_table: table.table == 1 && attendee.head_table,
                })
            })
            .collect();

        Self { date, seats }
    }

    /// Attendee ids grouped by table number
    pub fn tables(&self) -> BTreeMap<usize, Vec<&str>> {
        let mut tables: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for seat in &self.seats {
            tables.entry(seat.table).or_default().push(&seat.attendee_id);
        }
        tables
    }
}

/// Attendees seated at one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatedTable {
    pub table: usize,
    pub capacity: usize,
    pub attendees: Vec<Attendee>,
}

impl SeatedTable {
    pub fn is_head_table(&self) -> bool {
        self.table == 1
    }

    pub fn free_seats(&self) -> usize {
        self.capacity.saturating_sub(self.attendees.len())
    }
}

/// Result of one engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub tables: Vec<SeatedTable>,
    /// Total pairwise penalty of the arrangement (lower is more diverse)
    pub penalty: f64,
    /// Seed that reproduces this arrangement, when one was used
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Assignment {
    pub fn seated_count(&self) -> usize {
        self.tables.iter().map(|t| t.attendees.len()).sum()
    }

    pub fn seat_count(&self) -> usize {
        self.tables
            .iter()
            .fold(0usize, |total, t| total.saturating_add(t.capacity))
    }

    /// Table number an attendee was placed at
    pub fn table_of(&self, attendee_id: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|t| t.attendees.iter().any(|a| a.id == attendee_id))
            .map(|t| t.table)
    }

    pub fn table(&self, table: usize) -> Option<&SeatedTable> {
        self.tables.iter().find(|t| t.table == table)
    }
}
