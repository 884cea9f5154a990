//! Core types for Cardsort
//!
//! A card is three independent categorical attributes. Trials are plain
//! values: each generator call produces a fresh one owned by the caller.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of choice slots on every trial.
pub const SLOT_COUNT: usize = 3;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Red, Color::Blue, Color::Green];
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Circle,
    Star,
    Triangle,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Circle, Shape::Star, Shape::Triangle];
}

/// Card count. Serialized as the bare integer 1, 2 or 3.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Number {
    One,
    Two,
    Three,
}

impl Number {
    pub const ALL: [Number; 3] = [Number::One, Number::Two, Number::Three];

    pub fn value(self) -> u8 {
        match self {
            Number::One => 1,
            Number::Two => 2,
            Number::Three => 3,
        }
    }
}

impl TryFrom<u8> for Number {
    type Error = String;

    fn try_from(n: u8) -> std::result::Result<Self, Self::Error> {
        match n {
            1 => Ok(Number::One),
            2 => Ok(Number::Two),
            3 => Ok(Number::Three),
            other => Err(format!("number must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Number> for u8 {
    fn from(n: Number) -> u8 {
        n.value()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// One of the three attribute axes. Also used as a choice card's match type
/// and as the sorting rule.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Color,
    Shape,
    Number,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Color, Attribute::Shape, Attribute::Number];

    /// Every value on this axis, in canonical order.
    pub fn domain(self) -> [AttributeValue; 3] {
        match self {
            Attribute::Color => Color::ALL.map(AttributeValue::Color),
            Attribute::Shape => Shape::ALL.map(AttributeValue::Shape),
            Attribute::Number => Number::ALL.map(AttributeValue::Number),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color => write!(f, "color"),
            Self::Shape => write!(f, "shape"),
            Self::Number => write!(f, "number"),
        }
    }
}

/// The axis a choice card shares with its stimulus.
pub type MatchType = Attribute;

/// A single value tagged with its axis.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "attribute", content = "value", rename_all = "lowercase")]
pub enum AttributeValue {
    Color(Color),
    Shape(Shape),
    Number(Number),
}

impl AttributeValue {
    pub fn attribute(&self) -> Attribute {
        match self {
            Self::Color(_) => Attribute::Color,
            Self::Shape(_) => Attribute::Shape,
            Self::Number(_) => Attribute::Number,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(c) => write!(f, "color={c}"),
            Self::Shape(s) => write!(f, "shape={s}"),
            Self::Number(n) => write!(f, "number={n}"),
        }
    }
}

/// An immutable attribute triple. 27 distinct cards exist.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub color: Color,
    pub shape: Shape,
    pub number: Number,
}

impl Card {
    pub fn new(color: Color, shape: Shape, number: Number) -> Self {
        Self { color, shape, number }
    }

    /// All 27 cards, color-major.
    pub fn all() -> Vec<Card> {
        let mut cards = Vec::with_capacity(27);
        for color in Color::ALL {
            for shape in Shape::ALL {
                for number in Number::ALL {
                    cards.push(Card::new(color, shape, number));
                }
            }
        }
        cards
    }

    pub fn value(&self, attribute: Attribute) -> AttributeValue {
        match attribute {
            Attribute::Color => AttributeValue::Color(self.color),
            Attribute::Shape => AttributeValue::Shape(self.shape),
            Attribute::Number => AttributeValue::Number(self.number),
        }
    }

    pub fn carries(&self, value: AttributeValue) -> bool {
        self.value(value.attribute()) == value
    }

    /// Axes on which the two cards agree.
    pub fn shared_attributes(&self, other: &Card) -> Vec<Attribute> {
        Attribute::ALL
            .into_iter()
            .filter(|a| self.value(*a) == other.value(*a))
            .collect()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.number, self.color, self.shape)
    }
}

/// A candidate card tagged with the single axis it shares with the stimulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceCard {
    #[serde(flatten)]
    pub card: Card,
    pub match_type: MatchType,
}

/// Demonstration trial kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DemoTrialType {
    /// Incidental card already sits in slot 0; nothing moves.
    RuleOnly,
    /// Incidental card starts in slot 1 or 2 and visibly moves toward slot 0.
    Accidental,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoTrial {
    /// 1-based position in the script.
    pub trial_number: u32,
    pub trial_type: DemoTrialType,
    pub stimulus: Card,
    pub initial_slots: [ChoiceCard; SLOT_COUNT],
    pub correct_choice_index: usize,
    pub incidental_index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSortTrial {
    pub stimulus: Card,
    pub slots: [ChoiceCard; SLOT_COUNT],
    pub correct_choice_index: usize,
}

impl CardSortTrial {
    /// Score a click on `choice`.
    pub fn is_correct(&self, choice: usize) -> Result<bool> {
        if choice >= SLOT_COUNT {
            return Err(Error::invalid_response(format!(
                "choice {choice} out of range 0..{SLOT_COUNT}"
            )));
        }
        Ok(choice == self.correct_choice_index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTrial {
    pub slots: [Card; SLOT_COUNT],
    /// Never 0.
    pub incidental_index: usize,
}

impl TransferTrial {
    /// Score a submitted arrangement: correct iff the card ending in slot 0
    /// carries `incidental`.
    pub fn is_correct(&self, arrangement: &Arrangement, incidental: AttributeValue) -> bool {
        self.slots[arrangement.card_at(0)].carries(incidental)
    }
}

/// A trial of any phase, as handed to a renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum Trial {
    Demonstration(DemoTrial),
    CardSort(CardSortTrial),
    Transfer(TransferTrial),
}

impl Trial {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Demonstration(_) => Phase::Demonstration,
            Self::CardSort(_) => Phase::CardSort,
            Self::Transfer(_) => Phase::Transfer,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Demonstration,
    CardSort,
    Transfer,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Demonstration => write!(f, "demonstration"),
            Self::CardSort => write!(f, "card-sort"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

/// Final card order of a transfer trial: `slots[s]` is the index into the
/// trial's starting slots of the card now sitting in slot `s`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrangement([usize; SLOT_COUNT]);

impl Default for Arrangement {
    fn default() -> Self {
        Self::identity()
    }
}

impl Arrangement {
    /// Cards where they started.
    pub fn identity() -> Self {
        Self([0, 1, 2])
    }

    pub fn from_slots(slots: [usize; SLOT_COUNT]) -> Result<Self> {
        let mut seen = [false; SLOT_COUNT];
        for &card in &slots {
            if card >= SLOT_COUNT || seen[card] {
                return Err(Error::invalid_response(format!(
                    "arrangement {slots:?} is not a permutation of 0..{SLOT_COUNT}"
                )));
            }
            seen[card] = true;
        }
        Ok(Self(slots))
    }

    /// Drop the card in slot `a` onto slot `b`; the two cards trade places.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        if a >= SLOT_COUNT || b >= SLOT_COUNT {
            return Err(Error::invalid_response(format!(
                "slot out of range: {a} <-> {b}"
            )));
        }
        self.0.swap(a, b);
        Ok(())
    }

    pub fn card_at(&self, slot: usize) -> usize {
        self.0[slot]
    }

    pub fn slots(&self) -> [usize; SLOT_COUNT] {
        self.0
    }
}
