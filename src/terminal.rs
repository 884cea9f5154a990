//! Terminal front end: a text renderer and a stdin participant.

use std::io::BufRead;
use std::time::Duration;

use cardsort_core::{
    AnimationCue, Arrangement, Card, CardSortTrial, DemoTrial, DemoTrialType, Error, Result,
    TransferTrial, Trial, SLOT_COUNT,
};
use cardsort_session::{Participant, Renderer};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

// Demo playback timing, in milliseconds at pace 1.0.
const PAUSE_APPEAR_MS: u64 = 1000;
const PAUSE_SWAP_MS: u64 = 500;
const PAUSE_SORT_MS: u64 = 1500;
const ROTATE_MS: u64 = 600;
const FEEDBACK_MS: u64 = 500;

fn slot_line(cards: impl IntoIterator<Item = Card>) -> String {
    cards
        .into_iter()
        .enumerate()
        .map(|(i, card)| format!("[{}] {card}", i + 1))
        .collect::<Vec<_>>()
        .join("   ")
}

/// Prints trials as text. `pace` scales every pause; 0 plays instantly.
#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    pace: f64,
}

impl TerminalRenderer {
    pub fn new(pace: f64) -> Self {
        Self { pace: pace.max(0.0) }
    }

    async fn pause(&self, ms: u64) {
        let scaled = (ms as f64 * self.pace) as u64;
        if scaled > 0 {
            tokio::time::sleep(Duration::from_millis(scaled)).await;
        }
    }
}

#[async_trait::async_trait]
impl Renderer for TerminalRenderer {
    async fn message(&mut self, text: &str) -> Result<()> {
        println!("\n{text}\n");
        Ok(())
    }

    async fn present(&mut self, trial: &Trial) -> Result<()> {
        match trial {
            Trial::Demonstration(demo) => {
                println!("{}", slot_line(demo.initial_slots.map(|c| c.card)));
                println!("        stimulus: {}", demo.stimulus);
            }
            Trial::CardSort(sort) => {
                println!("{}", slot_line(sort.slots.map(|c| c.card)));
                println!("        stimulus: {}", sort.stimulus);
            }
            Trial::Transfer(transfer) => {
                println!("{}", slot_line(transfer.slots));
            }
        }
        Ok(())
    }

    async fn play_demo(&mut self, trial: &DemoTrial, cue: AnimationCue) -> Result<()> {
        println!("-- demonstration {} --", trial.trial_number);
        self.present(&Trial::Demonstration(trial.clone())).await?;
        self.pause(PAUSE_APPEAR_MS).await;

        let incidental = trial.initial_slots[trial.incidental_index].card;
        match (trial.trial_type, cue) {
            (DemoTrialType::Accidental, AnimationCue::Accidental) => {
                println!("   {incidental} jumps to the left of slot 1");
                self.pause(PAUSE_SWAP_MS).await;
            }
            (DemoTrialType::Accidental, AnimationCue::Pedagogical) => {
                println!("   {incidental} glows and turns upside down");
                self.pause(ROTATE_MS + PAUSE_SWAP_MS).await;
            }
            (DemoTrialType::RuleOnly, AnimationCue::Pedagogical) => {
                println!("   {incidental} is shown upside down");
            }
            (DemoTrialType::RuleOnly, AnimationCue::Accidental) => {}
        }

        let target = trial.initial_slots[trial.correct_choice_index].card;
        println!(
            "   {} is sorted onto [{}] {target}",
            trial.stimulus,
            trial.correct_choice_index + 1
        );
        self.pause(PAUSE_SORT_MS).await;
        Ok(())
    }

    async fn feedback(&mut self, correct: bool) -> Result<()> {
        println!("{}", if correct { "\u{2713} correct" } else { "\u{2717} incorrect" });
        self.pause(FEEDBACK_MS).await;
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        println!();
        Ok(())
    }
}

/// One line of transfer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferCommand {
    /// Move the card in the first slot onto the second; they trade places.
    Swap(usize, usize),
    /// Full order by starting card number, e.g. `2 1 3`.
    Order([usize; SLOT_COUNT]),
    Submit,
}

/// Parse a 1-based card choice.
pub fn parse_choice(line: &str) -> Option<usize> {
    let n: usize = line.trim().parse().ok()?;
    (1..=SLOT_COUNT).contains(&n).then(|| n - 1)
}

/// Parse `swap A B`, `A B C`, or `submit` (an empty line also submits).
/// Slot and card numbers are 1-based.
pub fn parse_transfer_command(line: &str) -> Option<TransferCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let numbers = |parts: &[&str]| -> Option<Vec<usize>> {
        parts
            .iter()
            .map(|w| parse_choice(w))
            .collect::<Option<Vec<usize>>>()
    };
    match words.as_slice() {
        [] | ["submit"] => Some(TransferCommand::Submit),
        ["swap", rest @ ..] if rest.len() == 2 => {
            let n = numbers(rest)?;
            Some(TransferCommand::Swap(n[0], n[1]))
        }
        parts if parts.len() == SLOT_COUNT => {
            let n = numbers(parts)?;
            Some(TransferCommand::Order([n[0], n[1], n[2]]))
        }
        _ => None,
    }
}

/// Reads responses line by line. Invalid input re-prompts; end of input is
/// [`Error::InputClosed`].
///
/// Lines arrive over a channel from a feeder that owns the reader, so an
/// abandoned read never holds up shutdown.
pub struct TerminalParticipant {
    lines: mpsc::UnboundedReceiver<std::io::Result<String>>,
}

impl TerminalParticipant {
    /// Read from process stdin on a detached thread. tokio's own stdin
    /// blocks runtime shutdown until the pending line completes.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }

    /// Read from any async reader on a spawned task. Needs a tokio runtime.
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                let next = match lines.next_line().await {
                    Ok(Some(line)) => Ok(line),
                    Ok(None) => break,
                    Err(e) => Err(e),
                };
                let failed = next.is_err();
                if tx.send(next).is_err() || failed {
                    break;
                }
            }
        });
        Self { lines: rx }
    }

    async fn read_line(&mut self, prompt: &str) -> Result<String> {
        println!("{prompt}");
        match self.lines.recv().await {
            Some(line) => Ok(line?),
            None => Err(Error::InputClosed),
        }
    }
}

#[async_trait::async_trait]
impl Participant for TerminalParticipant {
    async fn choose(&mut self, _trial: &CardSortTrial) -> Result<usize> {
        loop {
            let line = self.read_line("Which card matches? (1-3)").await?;
            match parse_choice(&line) {
                Some(choice) => return Ok(choice),
                None => println!("Please type 1, 2 or 3."),
            }
        }
    }

    async fn arrange(&mut self, trial: &TransferTrial) -> Result<Arrangement> {
        let mut arrangement = Arrangement::identity();
        loop {
            let line = self
                .read_line("Rearrange with `swap A B` or an order like `2 1 3`; Enter to submit")
                .await?;
            match parse_transfer_command(&line) {
                Some(TransferCommand::Submit) => return Ok(arrangement),
                Some(TransferCommand::Swap(a, b)) => arrangement.swap(a, b)?,
                Some(TransferCommand::Order(order)) => match Arrangement::from_slots(order) {
                    Ok(next) => arrangement = next,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                },
                None => {
                    println!("Unrecognized input.");
                    continue;
                }
            }
            println!("{}", slot_line(arrangement.slots().map(|i| trial.slots[i])));
        }
    }

    async fn acknowledge(&mut self, _text: &str) -> Result<()> {
        self.read_line("Press Enter to continue.").await.map(|_| ())
    }
}
