//! Session runner
//!
//! Sequences intro -> demonstration -> card sort -> transfer -> done. Each
//! interactive phase owns a fresh criterion tracker, so no streak carries
//! over. Cancellation is honored at every trial boundary and while waiting
//! on the participant; nothing needs cleanup since trials are plain values.

use std::future::Future;
use std::sync::Arc;

use cardsort_core::{Condition, Error, Result, Trial};
use cardsort_trials::{
    build_demonstration_script, next_card_sort_trial, next_transfer_trial, CriterionTracker,
    PhaseSummary,
};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::participant::Participant;
use crate::renderer::Renderer;
use crate::report::SessionReport;

pub const COMPLETION_TEXT: &str = "Task complete.";

pub struct SessionRunner<R> {
    condition: Condition,
    rng: R,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    trial_limit: Option<u32>,
}

impl<R: Rng + Send> SessionRunner<R> {
    pub fn new(condition: Condition, rng: R) -> Self {
        Self {
            condition,
            rng,
            clock: Arc::new(SystemClock),
            cancel: CancellationToken::new(),
            trial_limit: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Give up on a phase with [`Error::TrialLimit`] once it has run `limit`
    /// trials without meeting its criterion. Unlimited by default.
    pub fn with_trial_limit(mut self, limit: u32) -> Self {
        self.trial_limit = Some(limit);
        self
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Token that abandons the session at the next trial boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Wait for a participant response, giving up if the session is cancelled.
    async fn await_response<T>(&self, response: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = response => result,
        }
    }

    /// Called after each unfinished trial. Yields so a participant that
    /// answers without awaiting cannot starve timers or cancellation.
    async fn next_trial(&self, tracker: &CriterionTracker) -> Result<()> {
        if let Some(limit) = self.trial_limit {
            if tracker.trials() >= limit {
                tracing::warn!(phase = %tracker.phase(), limit, "Trial limit reached");
                return Err(Error::TrialLimit {
                    phase: tracker.phase(),
                    limit,
                });
            }
        }
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn show_text(
        &self,
        text: &str,
        participant: &mut dyn Participant,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        renderer.message(text).await?;
        self.await_response(participant.acknowledge(text)).await
    }

    /// Run a full session and return its report.
    pub async fn run(
        &mut self,
        participant: &mut dyn Participant,
        renderer: &mut dyn Renderer,
    ) -> Result<SessionReport> {
        let started_at = self.clock.now();
        tracing::info!(condition = %self.condition.name(), "Session started");

        let texts = self.condition.texts().clone();
        let demo_trials = if self.condition.skip_demo() {
            tracing::info!("Demonstration skipped");
            0
        } else {
            self.show_text(&texts.intro, participant, renderer).await?;
            self.run_demonstration(renderer).await?
        };

        self.show_text(&texts.sort_transition, participant, renderer).await?;
        let card_sort = self.run_card_sort(participant, renderer).await?;

        self.show_text(&texts.transfer_transition, participant, renderer).await?;
        let transfer = self.run_transfer(participant, renderer).await?;

        renderer.message(COMPLETION_TEXT).await?;
        let report = SessionReport {
            session_id: Uuid::new_v4(),
            condition: self.condition.name().to_string(),
            started_at,
            finished_at: self.clock.now(),
            demo_trials,
            card_sort,
            transfer,
        };
        tracing::info!(
            session = %report.session_id,
            card_sort_trials = report.card_sort.total_trials,
            transfer_trials = report.transfer.total_trials,
            "Session complete"
        );
        Ok(report)
    }

    /// Play the scripted demonstration. Returns the number of trials shown.
    pub async fn run_demonstration(&mut self, renderer: &mut dyn Renderer) -> Result<usize> {
        let script = build_demonstration_script(&self.condition, &mut self.rng);
        tracing::info!(trials = script.len(), "Demonstration started");

        renderer.message(&self.condition.texts().demo_label).await?;
        for trial in &script {
            self.check_cancelled()?;
            renderer.clear().await?;
            renderer.play_demo(trial, self.condition.animation_cue()).await?;
        }
        renderer.clear().await?;
        Ok(script.len())
    }

    /// Card-sort trials until the criterion streak is reached.
    pub async fn run_card_sort(
        &mut self,
        participant: &mut dyn Participant,
        renderer: &mut dyn Renderer,
    ) -> Result<PhaseSummary> {
        let mut tracker = CriterionTracker::for_card_sort(&self.condition, self.clock.now());
        tracing::info!(criterion = tracker.criterion(), "Card-sort phase started");

        loop {
            self.check_cancelled()?;
            let trial = next_card_sort_trial(&self.condition, &mut self.rng);
            renderer.clear().await?;
            renderer.present(&Trial::CardSort(trial.clone())).await?;

            let choice = self.await_response(participant.choose(&trial)).await?;
            let correct = trial.is_correct(choice)?;
            let done = tracker.record_outcome(correct, self.clock.now());
            tracing::debug!(
                trial = tracker.trials(),
                choice,
                correct,
                streak = tracker.consecutive_correct(),
                "Card-sort response"
            );
            renderer.feedback(correct).await?;
            if done {
                break;
            }
            self.next_trial(&tracker).await?;
        }

        renderer.clear().await?;
        tracker.summarize()
    }

    /// Transfer trials until the criterion streak is reached. A response is
    /// correct when the card ending in slot 0 carries the incidental value.
    pub async fn run_transfer(
        &mut self,
        participant: &mut dyn Participant,
        renderer: &mut dyn Renderer,
    ) -> Result<PhaseSummary> {
        let mut tracker = CriterionTracker::for_transfer(&self.condition, self.clock.now());
        tracing::info!(criterion = tracker.criterion(), "Transfer phase started");

        renderer.message(&self.condition.texts().transfer_label).await?;
        loop {
            self.check_cancelled()?;
            let trial = next_transfer_trial(&self.condition, &mut self.rng);
            renderer.clear().await?;
            renderer.present(&Trial::Transfer(trial.clone())).await?;

            let arrangement = self.await_response(participant.arrange(&trial)).await?;
            let correct = trial.is_correct(&arrangement, self.condition.incidental());
            let done = tracker.record_outcome(correct, self.clock.now());
            tracing::debug!(
                trial = tracker.trials(),
                arrangement = ?arrangement.slots(),
                correct,
                streak = tracker.consecutive_correct(),
                "Transfer response"
            );
            renderer.feedback(correct).await?;
            if done {
                break;
            }
            self.next_trial(&tracker).await?;
        }

        renderer.clear().await?;
        tracker.summarize()
    }
}
