use crate::models::HistoryRecord;
use std::collections::HashMap;

/// Who sat with whom over the most recent events
///
/// For every pair of attendees that shared a table, stores the list of
/// "events ago" (1 = most recent event in the window) in which they did.
/// Pairs are stored in both directions so lookups don't allocate.
#[derive(Debug, Clone, Default)]
pub struct PairHistory {
    pairs: HashMap<String, HashMap<String, Vec<usize>>>,
    events: usize,
}

impl PairHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build pair history from the last `memory_events` records by date
    pub fn from_records(records: &[HistoryRecord], memory_events: usize) -> Self {
        let mut ordered: Vec<&HistoryRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.date);

        let skip = ordered.len().saturating_sub(memory_events);
        let recent = &ordered[skip..];

        let mut history = Self {
            pairs: HashMap::new(),
            events: recent.len(),
        };

        for (idx, record) in recent.iter().enumerate() {
            let events_ago = recent.len() - idx;

            for members in record.tables().values() {
                for (i, a) in members.iter().enumerate() {
                    for b in &members[i + 1..] {
                        if a == b {
                            continue;
                        }
                        history.record_pair(a, b, events_ago);
                        history.record_pair(b, a, events_ago);
                    }
                }
            }
        }

        tracing::debug!(
            "Built pair history from {} of {} events ({} attendees with past neighbours)",
            history.events,
            records.len(),
            history.pairs.len()
        );

        history
    }

    fn record_pair(&mut self, a: &str, b: &str, events_ago: usize) {
        let seen = self
            .pairs
            .entry(a.to_string())
            .or_default()
            .entry(b.to_string())
            .or_default();
        if !seen.contains(&events_ago) {
            seen.push(events_ago);
        }
    }

    /// Events (as "events ago") in which `a` and `b` shared a table
    pub fn events_together(&self, a: &str, b: &str) -> &[usize] {
        self.pairs
            .get(a)
            .and_then(|neighbours| neighbours.get(b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn sat_together(&self, a: &str, b: &str) -> bool {
        !self.events_together(a, b).is_empty()
    }

    /// Number of events inside the window
    pub fn event_count(&self) -> usize {
        self.events
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
