use crate::core::history::PairHistory;
use crate::core::penalty::PenaltyModel;
use crate::core::validation::validate_request;
use crate::models::{Assignment, Attendee, HistoryRecord, SeatedTable, TableConfig};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Penalties closer than this are treated as ties
const TIE_EPSILON: f64 = 1e-9;

/// Errors that end a seating run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeatingError {
    #[error("Infeasible configuration: {attendees} attendees but only {seats} seats")]
    InfeasibleConfiguration { seats: usize, attendees: usize },

    #[error(
        "Infeasible configuration: {pinned} attendees are pinned to the head table \
         but it seats {capacity}"
    )]
    HeadTableOverflow { pinned: usize, capacity: usize },

    #[error(
        "Infeasible configuration: {attendees} attendees cannot give {tables} tables \
         at least {min_seats} guests each"
    )]
    BelowMinimumSeats {
        attendees: usize,
        tables: usize,
        min_seats: usize,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

/// Randomized greedy seating engine
///
/// # Algorithm
/// 1. Validate the request; insufficient capacity fails before anything is seated
/// 2. Seat head-table attendees at table 1
/// 3. Shuffle everyone else and place each at the open table with the lowest
///    placement penalty, breaking ties at random. Once the people left only
///    just cover the tables still under `min_seats`, only those tables are open
/// 4. Repeat for `restarts` passes and keep the arrangement with the lowest
///    total penalty
///
/// All randomness comes from the caller's RNG, so a seeded RNG reproduces a run.
#[derive(Debug, Clone)]
pub struct SeatingEngine {
    model: PenaltyModel,
    restarts: usize,
}

impl SeatingEngine {
    pub fn new(model: PenaltyModel, restarts: usize) -> Self {
        Self {
            model,
            restarts: restarts.max(1),
        }
    }

    pub fn with_default_model() -> Self {
        Self::new(PenaltyModel::default(), 32)
    }

    pub fn model(&self) -> &PenaltyModel {
        &self.model
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Seat every attendee, or fail without a partial result
    ///
    /// # Arguments
    /// * `attendees` - Everyone to be seated; ids must be unique
    /// * `config` - Table capacities and the diversity weight
    /// * `history` - Past events, used to discourage repeat neighbours
    /// * `rng` - Source of all random choices
    pub fn assign<R: Rng + ?Sized>(
        &self,
        attendees: &[Attendee],
        config: &TableConfig,
        history: &[HistoryRecord],
        rng: &mut R,
    ) -> Result<Assignment, SeatingError> {
        validate_request(attendees, config)?;

        let pair_history = PairHistory::from_records(history, self.model.memory_events);
        let (pinned, free): (Vec<usize>, Vec<usize>) =
            (0..attendees.len()).partition(|&i| attendees[i].head_table);

        let mut best: Option<(f64, Vec<Vec<usize>>)> = None;

        for pass in 0..self.restarts {
            let tables = self.greedy_pass(attendees, config, &pinned, &free, &pair_history, rng)?;
            let penalty = self.model.arrangement_penalty(
                &resolve(attendees, &tables),
                config.diversity_weight,
                &pair_history,
            );

            tracing::trace!("Seating pass {} finished with penalty {:.3}", pass, penalty);

            let penalty = comparable(penalty);
            if best.as_ref().map_or(true, |(score, _)| penalty.total_cmp(score).is_lt()) {
                best = Some((penalty, tables));
            }
        }

        let (penalty, tables) = best.ok_or_else(|| {
            SeatingError::MalformedInput("engine ran no seating passes".to_string())
        })?;

        tracing::debug!(
            "Seated {} attendees at {} tables (penalty {:.3}, {} passes)",
            attendees.len(),
            config.table_count(),
            penalty,
            self.restarts
        );

        Ok(Assignment {
            tables: tables
                .into_iter()
                .zip(&config.capacities)
                .enumerate()
                .map(|(idx, (seated, &capacity))| SeatedTable {
                    table: idx + 1,
                    capacity,
                    attendees: seated.into_iter().map(|i| attendees[i].clone()).collect(),
                })
                .collect(),
            penalty,
            seed: None,
        })
    }

    /// `assign` driven by a `StdRng` seeded with `seed`
    ///
    /// Same inputs and seed always produce the same assignment; a new seed is
    /// how "regenerate" asks for a different one.
    pub fn assign_seeded(
        &self,
        attendees: &[Attendee],
        config: &TableConfig,
        history: &[HistoryRecord],
        seed: u64,
    ) -> Result<Assignment, SeatingError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut assignment = self.assign(attendees, config, history, &mut rng)?;
        assignment.seed = Some(seed);
        Ok(assignment)
    }

    fn greedy_pass<R: Rng + ?Sized>(
        &self,
        attendees: &[Attendee],
        config: &TableConfig,
        pinned: &[usize],
        free: &[usize],
        history: &PairHistory,
        rng: &mut R,
    ) -> Result<Vec<Vec<usize>>, SeatingError> {
        let roster = attendees.len();
        let mut tables: Vec<Vec<usize>> = config
            .capacities
            .iter()
            .map(|&capacity| Vec::with_capacity(capacity.min(roster)))
            .collect();

        if let Some(head) = tables.first_mut() {
            head.extend_from_slice(pinned);
        }

        let minimum = config.minimum();
        let mut shortfall: usize = tables
            .iter()
            .map(|seated| minimum.saturating_sub(seated.len()))
            .sum();

        let mut order = free.to_vec();
        order.shuffle(rng);

        let mut remaining = order.len();
        let mut candidates = Vec::with_capacity(tables.len());

        for idx in order {
            let attendee = &attendees[idx];
            // Everyone left is needed to bring short tables up to the minimum
            let fill_short_tables = remaining <= shortfall;
            let mut lowest = f64::INFINITY;
            candidates.clear();

            for (table, seated) in tables.iter().enumerate() {
                let capacity = config.capacities[table];
                if seated.len() >= capacity {
                    continue;
                }
                if fill_short_tables && seated.len() >= minimum {
                    continue;
                }

                let penalty = comparable(self.model.placement_penalty(
                    attendee,
                    seated.iter().map(|&i| &attendees[i]),
                    capacity,
                    config.diversity_weight,
                    history,
                ));

                if candidates.is_empty() || penalty < lowest - TIE_EPSILON {
                    lowest = penalty;
                    candidates.clear();
                    candidates.push(table);
                } else if penalty <= lowest + TIE_EPSILON {
                    candidates.push(table);
                }
            }

            let &table = candidates.choose(rng).ok_or(SeatingError::InfeasibleConfiguration {
                seats: config.total_capacity(),
                attendees: attendees.len(),
            })?;

            if tables[table].len() < minimum {
                shortfall -= 1;
            }
            remaining -= 1;
            tables[table].push(idx);
        }

        Ok(tables)
    }
}

impl Default for SeatingEngine {
    fn default() -> Self {
        Self::with_default_model()
    }
}

/// NaN sorts as the worst possible penalty
#[inline]
fn comparable(penalty: f64) -> f64 {
    if penalty.is_nan() {
        f64::INFINITY
    } else {
        penalty
    }
}

fn resolve<'a>(attendees: &'a [Attendee], tables: &[Vec<usize>]) -> Vec<Vec<&'a Attendee>> {
    tables
        .iter()
        .map(|seated| seated.iter().map(|&i| &attendees[i]).collect())
        .collect()
}
