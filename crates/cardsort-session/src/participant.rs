//! Participant input seam
//!
//! A participant answers one trial at a time, at whatever pace it likes. The
//! runner never generates trial N+1 before trial N's response is in.

use cardsort_core::{Arrangement, CardSortTrial, Error, Result, TransferTrial, SLOT_COUNT};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use crate::clock::ManualClock;

#[async_trait::async_trait]
pub trait Participant: Send {
    /// Click one of the three choice cards. Returns its slot index.
    async fn choose(&mut self, trial: &CardSortTrial) -> Result<usize>;

    /// Rearrange the transfer cards and submit the final order.
    async fn arrange(&mut self, trial: &TransferTrial) -> Result<Arrangement>;

    /// Dismiss an instruction or transition screen.
    async fn acknowledge(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Slot to click for a given outcome: the correct one, or the next slot over.
fn choice_for(trial: &CardSortTrial, correct: bool) -> usize {
    if correct {
        trial.correct_choice_index
    } else {
        (trial.correct_choice_index + 1) % SLOT_COUNT
    }
}

/// Arrangement for a given outcome: drag the incidental card to slot 0, or
/// submit the starting order (which never has it there).
fn arrangement_for(trial: &TransferTrial, correct: bool) -> Result<Arrangement> {
    let mut arrangement = Arrangement::identity();
    if correct {
        arrangement.swap(trial.incidental_index, 0)?;
    }
    Ok(arrangement)
}

/// Answers from fixed outcome lists. Runs out with [`Error::InputClosed`].
#[derive(Debug, Default, Clone)]
pub struct ScriptedParticipant {
    card_sort: VecDeque<bool>,
    transfer: VecDeque<bool>,
    acknowledged: Vec<String>,
}

impl ScriptedParticipant {
    pub fn new(card_sort: impl IntoIterator<Item = bool>, transfer: impl IntoIterator<Item = bool>) -> Self {
        Self {
            card_sort: card_sort.into_iter().collect(),
            transfer: transfer.into_iter().collect(),
            acknowledged: Vec::new(),
        }
    }

    /// Texts dismissed so far, in order.
    pub fn acknowledged(&self) -> &[String] {
        &self.acknowledged
    }

    pub fn remaining(&self) -> (usize, usize) {
        (self.card_sort.len(), self.transfer.len())
    }
}

#[async_trait::async_trait]
impl Participant for ScriptedParticipant {
    async fn choose(&mut self, trial: &CardSortTrial) -> Result<usize> {
        let correct = self.card_sort.pop_front().ok_or(Error::InputClosed)?;
        Ok(choice_for(trial, correct))
    }

    async fn arrange(&mut self, trial: &TransferTrial) -> Result<Arrangement> {
        let correct = self.transfer.pop_front().ok_or(Error::InputClosed)?;
        arrangement_for(trial, correct)
    }

    async fn acknowledge(&mut self, text: &str) -> Result<()> {
        self.acknowledged.push(text.to_string());
        Ok(())
    }
}

fn check_accuracy(accuracy: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&accuracy) {
        Ok(accuracy)
    } else {
        Err(Error::invalid_config(format!(
            "accuracy must be between 0 and 1, got {accuracy}"
        )))
    }
}

/// A seeded stand-in participant for pilot runs. Each response is correct
/// with probability `accuracy`. With a [`ManualClock`] attached, every
/// response advances it by a random think time so latencies are non-trivial.
#[derive(Debug)]
pub struct SimulatedParticipant {
    rng: StdRng,
    card_sort_accuracy: f64,
    transfer_accuracy: f64,
    clock: Option<(ManualClock, std::ops::RangeInclusive<i64>)>,
}

impl SimulatedParticipant {
    /// Fails unless `accuracy` is a probability in `[0, 1]`.
    pub fn new(seed: u64, accuracy: f64) -> Result<Self> {
        let accuracy = check_accuracy(accuracy)?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            card_sort_accuracy: accuracy,
            transfer_accuracy: accuracy,
            clock: None,
        })
    }

    pub fn with_transfer_accuracy(mut self, accuracy: f64) -> Result<Self> {
        self.transfer_accuracy = check_accuracy(accuracy)?;
        Ok(self)
    }

    /// Advance `clock` by a uniform draw from `think_ms` per response.
    pub fn with_clock(mut self, clock: ManualClock, think_ms: std::ops::RangeInclusive<i64>) -> Self {
        self.clock = Some((clock, think_ms));
        self
    }

    fn think(&mut self) {
        if let Some((clock, range)) = &self.clock {
            let ms = self.rng.random_range(range.clone());
            clock.advance(Duration::milliseconds(ms));
        }
    }
}

#[async_trait::async_trait]
impl Participant for SimulatedParticipant {
    async fn choose(&mut self, trial: &CardSortTrial) -> Result<usize> {
        self.think();
        if self.rng.random_bool(self.card_sort_accuracy) {
            return Ok(trial.correct_choice_index);
        }
        // Either wrong slot, uniformly.
        let offset = self.rng.random_range(1..SLOT_COUNT);
        Ok((trial.correct_choice_index + offset) % SLOT_COUNT)
    }

    async fn arrange(&mut self, trial: &TransferTrial) -> Result<Arrangement> {
        self.think();
        let correct = self.rng.random_bool(self.transfer_accuracy);
        let mut arrangement = arrangement_for(trial, correct)?;
        if !correct && self.rng.random_bool(0.5) {
            // Shuffle the back two without touching slot 0.
            arrangement.swap(1, 2)?;
        }
        Ok(arrangement)
    }
}
