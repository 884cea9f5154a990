//! Choice-set generation
//!
//! Three choice cards per stimulus, one matching it on each axis. The match
//! axis keeps the stimulus value; the other two axes take the two complement
//! values in a fixed cross-assignment, which makes every color, shape and
//! number appear exactly once across the set.

use cardsort_core::{
    AttributeValue, Card, ChoiceCard, Color, MatchType, Number, Shape, SLOT_COUNT,
};
use rand::Rng;

use crate::attributes::complement_values;

/// A stimulus and its three choices, in match-type order (color, shape, number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceSet {
    pub stimulus: Card,
    pub cards: [ChoiceCard; SLOT_COUNT],
}

impl ChoiceSet {
    pub fn generate<R: Rng + ?Sized>(stimulus: Card, rng: &mut R) -> Self {
        let [c0, c1] = complement_values(&Color::ALL, stimulus.color, rng);
        let [s0, s1] = complement_values(&Shape::ALL, stimulus.shape, rng);
        let [n0, n1] = complement_values(&Number::ALL, stimulus.number, rng);

        let cards = [
            ChoiceCard {
                card: Card::new(stimulus.color, s0, n0),
                match_type: MatchType::Color,
            },
            ChoiceCard {
                card: Card::new(c0, stimulus.shape, n1),
                match_type: MatchType::Shape,
            },
            ChoiceCard {
                card: Card::new(c1, s1, stimulus.number),
                match_type: MatchType::Number,
            },
        ];
        debug_assert!(is_latin_square(&stimulus, &cards));
        Self { stimulus, cards }
    }

    /// Index of the one card carrying `value`. Each axis is a permutation of
    /// its domain, so exactly one card does.
    pub fn carrier_of(&self, value: AttributeValue) -> usize {
        self.cards
            .iter()
            .position(|c| c.card.carries(value))
            .unwrap_or_else(|| unreachable!("choice set axes cover every value"))
    }
}

/// Slot holding the card whose match type is `rule`.
pub fn slot_matching(slots: &[ChoiceCard; SLOT_COUNT], rule: MatchType) -> usize {
    slots
        .iter()
        .position(|c| c.match_type == rule)
        .unwrap_or_else(|| unreachable!("choice set holds one card per match type"))
}

/// Check the choice-set invariants: each card shares exactly its tagged
/// axis with the stimulus, and every value of every axis appears once.
pub fn is_latin_square(stimulus: &Card, cards: &[ChoiceCard]) -> bool {
    if cards.len() != SLOT_COUNT {
        return false;
    }
    let single_match = cards
        .iter()
        .all(|c| c.card.shared_attributes(stimulus) == vec![c.match_type]);
    let axes_complete = MatchType::ALL.iter().all(|axis| {
        axis.domain()
            .iter()
            .all(|value| cards.iter().filter(|c| c.card.carries(*value)).count() == 1)
    });
    single_match && axes_complete
}
