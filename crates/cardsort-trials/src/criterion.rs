//! Consecutive-correct criterion tracking
//!
//! `Running` until the streak reaches the criterion, then `Met` for good.
//! An incorrect response resets the streak to zero, never decrements it.

use cardsort_core::{Condition, Error, Phase, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionState {
    Running,
    Met,
}

/// Per-phase streak counter. Created at phase start, dropped at phase end.
#[derive(Debug, Clone)]
pub struct CriterionTracker {
    phase: Phase,
    criterion: u32,
    started_at: DateTime<Utc>,
    consecutive_correct: u32,
    trials: u32,
    completions: Vec<DateTime<Utc>>,
    state: CriterionState,
}

impl CriterionTracker {
    pub fn new(phase: Phase, criterion: u32, started_at: DateTime<Utc>) -> Self {
        debug_assert!(criterion > 0, "criterion is validated at config time");
        Self {
            phase,
            criterion,
            started_at,
            consecutive_correct: 0,
            trials: 0,
            completions: Vec::new(),
            state: CriterionState::Running,
        }
    }

    pub fn for_card_sort(condition: &Condition, started_at: DateTime<Utc>) -> Self {
        Self::new(Phase::CardSort, condition.card_sort_criterion(), started_at)
    }

    pub fn for_transfer(condition: &Condition, started_at: DateTime<Utc>) -> Self {
        Self::new(Phase::Transfer, condition.transfer_criterion(), started_at)
    }

    /// Record one trial outcome completed at `now`. Returns whether the phase
    /// is complete. Outcomes arriving after the criterion is met are ignored.
    pub fn record_outcome(&mut self, correct: bool, now: DateTime<Utc>) -> bool {
        if self.state == CriterionState::Met {
            tracing::warn!(phase = %self.phase, "Outcome after criterion met; ignored");
            return true;
        }

        self.trials += 1;
        self.completions.push(now);
        if correct {
            self.consecutive_correct += 1;
        } else {
            self.consecutive_correct = 0;
        }

        if self.consecutive_correct >= self.criterion {
            self.state = CriterionState::Met;
            tracing::info!(
                phase = %self.phase,
                trials = self.trials,
                criterion = self.criterion,
                "Criterion met"
            );
        }
        self.is_met()
    }

    pub fn is_met(&self) -> bool {
        self.state == CriterionState::Met
    }

    pub fn state(&self) -> CriterionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn criterion(&self) -> u32 {
        self.criterion
    }

    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completions(&self) -> &[DateTime<Utc>] {
        &self.completions
    }

    /// Derived statistics. Only available once the criterion is met.
    pub fn summarize(&self) -> Result<PhaseSummary> {
        if !self.is_met() {
            return Err(Error::PhaseIncomplete {
                phase: self.phase,
                consecutive: self.consecutive_correct,
                criterion: self.criterion,
            });
        }

        // 0-indexed first trial of the winning streak.
        let streak_start = self.trials - self.criterion;
        let streak_first = self.completions[streak_start as usize];
        let last = self.completions[self.completions.len() - 1];

        Ok(PhaseSummary {
            phase: self.phase,
            total_trials: self.trials,
            trials_to_criterion: streak_start,
            switch_latency_seconds: seconds_between(self.started_at, streak_first),
            phase_total_time_seconds: seconds_between(self.started_at, last),
        })
    }
}

/// Elapsed seconds, rounded half away from zero to the millisecond.
fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let elapsed = to - from;
    let millis = match elapsed.num_microseconds() {
        Some(us) => (us as f64 / 1000.0).round(),
        None => elapsed.num_milliseconds() as f64,
    };
    millis / 1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSummary {
    pub phase: Phase,
    pub total_trials: u32,
    pub trials_to_criterion: u32,
    pub switch_latency_seconds: f64,
    pub phase_total_time_seconds: f64,
}
