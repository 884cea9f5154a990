//! Cardsort Trials - trial generation and the consecutive-correct criterion
//!
//! Every generator is a synchronous function of a validated
//! [`Condition`](cardsort_core::Condition) and an injected random source, so a
//! seeded `rand::rngs::StdRng` reproduces a session exactly.
//!
//! - [`attributes`]: complement pairs, uniform shuffle and pick
//! - [`choices`]: Latin-square choice sets for one stimulus
//! - [`demo`]: the scripted demonstration sequence
//! - [`generators`]: on-demand card-sort and transfer trials
//! - [`criterion`]: streak tracking and phase summaries

pub mod attributes;
pub mod choices;
pub mod criterion;
pub mod demo;
pub mod generators;

pub use choices::ChoiceSet;
pub use criterion::{CriterionState, CriterionTracker, PhaseSummary};
pub use demo::build_demonstration_script;
pub use generators::{next_card_sort_trial, next_transfer_trial};
