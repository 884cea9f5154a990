//! Cardsort Session - phase orchestration
//!
//! Drives a full session: intro, demonstration playback, the card-sort and
//! transfer phases until each criterion is met, and the final report.
//! Presentation, participant input and wall-clock time are seams
//! ([`Renderer`], [`Participant`], [`Clock`]) so the loop runs unchanged
//! against a terminal, a simulated participant, or a test script.

pub mod clock;
pub mod participant;
pub mod renderer;
pub mod report;
pub mod runner;

pub use clock::{Clock, ManualClock, SystemClock};
pub use participant::{Participant, ScriptedParticipant, SimulatedParticipant};
pub use renderer::{NullRenderer, Renderer};
pub use report::{write_json_pretty, SessionReport};
pub use runner::SessionRunner;
