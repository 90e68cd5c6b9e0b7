use crate::core::history::PairHistory;
use crate::models::Attendee;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How much a past shared table still counts, by how many events ago it was
///
/// `events_ago` is 1 for the most recent event in the history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecencyDecay {
    /// Explicit weight per event: `weights[events_ago - 1]`, zero beyond
    Stepped { weights: Vec<f64> },
    /// Falls linearly from 1.0 to zero over `window` events
    Linear { window: usize },
    /// Halves every `half_life` events
    Exponential {
        #[serde(rename = "halfLife", alias = "half_life")]
        half_life: f64,
    },
}

impl RecencyDecay {
    #[inline]
    pub fn weight(&self, events_ago: usize) -> f64 {
        if events_ago == 0 {
            return 0.0;
        }

        match self {
            RecencyDecay::Stepped { weights } => {
                weights.get(events_ago - 1).copied().unwrap_or(0.0)
            }
            RecencyDecay::Linear { window } => {
                if events_ago > *window {
                    0.0
                } else {
                    (*window - events_ago + 1) as f64 / *window as f64
                }
            }
            RecencyDecay::Exponential { half_life } => {
                if *half_life <= 0.0 {
                    return if events_ago == 1 { 1.0 } else { 0.0 };
                }
                0.5_f64.powf((events_ago - 1) as f64 / half_life)
            }
        }
    }
}

impl RecencyDecay {
    /// Rejects weights that would turn penalties into NaN or reward repeats
    pub fn check(&self) -> Result<(), String> {
        match self {
            RecencyDecay::Stepped { weights } => {
                match weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
                    Some(w) => Err(format!(
                        "stepped decay weight must be a non-negative number, got {}",
                        w
                    )),
                    None => Ok(()),
                }
            }
            RecencyDecay::Linear { .. } => Ok(()),
            RecencyDecay::Exponential { half_life } => {
                if half_life.is_finite() && *half_life >= 0.0 {
                    Ok(())
                } else {
                    Err(format!("half life must be a non-negative number, got {}", half_life))
                }
            }
        }
    }
}

impl Default for RecencyDecay {
    fn default() -> Self {
        RecencyDecay::Stepped {
            weights: vec![1.0, 0.6, 0.3],
        }
    }
}

/// Tunable penalty function driving the seating engine
///
/// The cost of seating `c` at a table is:
///
/// ```text
/// diversity_weight * Σ_{m at table} pair_cost(c, m)
///     + balance_weight * occupied / capacity
///
/// pair_cost(a, b) = Σ_{attr shared by a and b} attribute_weight(attr)
///                 + history_weight * Σ_{k: a and b shared a table k events ago} decay(k)
/// ```
///
/// `diversity_weight` comes from the run's `TableConfig`; everything else is
/// service configuration. Attributes without an explicit weight count 1.0, and
/// attribute names match without regard to ASCII case.
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyModel {
    pub history_weight: f64,
    pub balance_weight: f64,
    pub memory_events: usize,
    pub decay: RecencyDecay,
    pub attribute_weights: HashMap<String, f64>,
}

impl Default for PenaltyModel {
    fn default() -> Self {
        Self {
            history_weight: 1.0,
            balance_weight: 0.5,
            memory_events: 3,
            decay: RecencyDecay::default(),
            attribute_weights: HashMap::new(),
        }
    }
}

impl PenaltyModel {
    pub fn with_attribute_weight(mut self, attribute: impl Into<String>, weight: f64) -> Self {
        self.attribute_weights.insert(attribute.into(), weight);
        self
    }

    pub fn attribute_weight(&self, attribute: &str) -> f64 {
        if let Some(&weight) = self.attribute_weights.get(attribute) {
            return weight;
        }
        self.attribute_weights
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, &weight)| weight)
            .unwrap_or(1.0)
    }

    /// Every weight must be a finite, non-negative number
    pub fn check(&self) -> Result<(), String> {
        let scalars = [
            ("history_weight", self.history_weight),
            ("balance_weight", self.balance_weight),
        ];
        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }

        if let Some((name, weight)) = self
            .attribute_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(format!(
                "weight for attribute '{}' must be a non-negative number, got {}",
                name, weight
            ));
        }

        self.decay.check()
    }

    /// Weighted count of attribute values two attendees share
    pub fn attribute_overlap(&self, a: &Attendee, b: &Attendee) -> f64 {
        a.attributes
            .iter()
            .filter(|(key, value)| b.attribute(key) == Some(value.as_str()))
            .map(|(key, _)| self.attribute_weight(key))
            .sum()
    }

    /// Recency-weighted count of past events where two attendees shared a table
    pub fn history_overlap(&self, a: &Attendee, b: &Attendee, history: &PairHistory) -> f64 {
        history
            .events_together(&a.id, &b.id)
            .iter()
            .map(|&events_ago| self.decay.weight(events_ago))
            .sum()
    }

    #[inline]
    pub fn pair_cost(&self, a: &Attendee, b: &Attendee, history: &PairHistory) -> f64 {
        let mut cost = self.attribute_overlap(a, b);
        if !history.is_empty() {
            cost += self.history_weight * self.history_overlap(a, b, history);
        }
        cost
    }

    /// Cost of adding `candidate` to a table already holding `members`
    pub fn placement_penalty<'a>(
        &self,
        candidate: &Attendee,
        members: impl IntoIterator<Item = &'a Attendee>,
        capacity: usize,
        diversity_weight: f64,
        history: &PairHistory,
    ) -> f64 {
        let mut occupied = 0usize;
        let mut clash = 0.0;

        for member in members {
            occupied += 1;
            clash += self.pair_cost(candidate, member, history);
        }

        let fill = if capacity == 0 {
            1.0
        } else {
            occupied as f64 / capacity as f64
        };

        diversity_weight * clash + self.balance_weight * fill
    }

    /// Total pairwise cost of a finished arrangement
    pub fn arrangement_penalty(
        &self,
        tables: &[Vec<&Attendee>],
        diversity_weight: f64,
        history: &PairHistory,
    ) -> f64 {
        let clash: f64 = tables
            .iter()
            .map(|table| {
                let mut cost = 0.0;
                for (i, a) in table.iter().enumerate() {
                    for b in &table[i + 1..] {
                        cost += self.pair_cost(a, b, history);
                    }
                }
                cost
            })
            .sum();

        diversity_weight * clash
    }
}
