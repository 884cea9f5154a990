//! Presentation seam
//!
//! The renderer owns everything visual: card drawing, slot geometry, demo
//! animation timing. The runner only tells it what to show and when.

use cardsort_core::{AnimationCue, DemoTrial, Result, Trial};

#[async_trait::async_trait]
pub trait Renderer: Send {
    /// Show an instruction or transition text.
    async fn message(&mut self, text: &str) -> Result<()>;

    /// Lay out a trial's cards in their starting slots.
    async fn present(&mut self, trial: &Trial) -> Result<()>;

    /// Play one demonstration trial: show it, move the incidental card on
    /// accidental trials, then sort the stimulus onto the correct card.
    async fn play_demo(&mut self, trial: &DemoTrial, _cue: AnimationCue) -> Result<()> {
        self.present(&Trial::Demonstration(trial.clone())).await
    }

    /// Mark the participant's response correct or incorrect.
    async fn feedback(&mut self, correct: bool) -> Result<()>;

    /// Remove all cards.
    async fn clear(&mut self) -> Result<()>;
}

/// Renders nothing. For headless runs and simulations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

#[async_trait::async_trait]
impl Renderer for NullRenderer {
    async fn message(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    async fn present(&mut self, _trial: &Trial) -> Result<()> {
        Ok(())
    }

    async fn feedback(&mut self, _correct: bool) -> Result<()> {
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}
