//! On-demand trial generators for the two interactive phases.

use cardsort_core::{
    AttributeValue, Card, CardSortTrial, Color, Condition, Number, Shape, TransferTrial,
};
use rand::Rng;

use crate::attributes::{coin, complement_values, uniform_pick, uniform_shuffle};
use crate::choices::{slot_matching, ChoiceSet};

/// One card-sort trial: uniformly random stimulus, shuffled choices, no
/// incidental placement.
pub fn next_card_sort_trial<R: Rng + ?Sized>(condition: &Condition, rng: &mut R) -> CardSortTrial {
    let stimulus = Card::new(
        uniform_pick(&Color::ALL, rng),
        uniform_pick(&Shape::ALL, rng),
        uniform_pick(&Number::ALL, rng),
    );
    let slots = uniform_shuffle(ChoiceSet::generate(stimulus, rng).cards, rng);
    let correct_choice_index = slot_matching(&slots, condition.sorting_rule());

    tracing::debug!(%stimulus, correct = correct_choice_index, "Generated card-sort trial");
    CardSortTrial {
        stimulus,
        slots,
        correct_choice_index,
    }
}

/// One transfer trial: exactly one card carries the incidental value and it
/// never starts in slot 0. Non-incidental axes are shuffled independently of
/// each other, with no match-type structure tying the cards together.
pub fn next_transfer_trial<R: Rng + ?Sized>(condition: &Condition, rng: &mut R) -> TransferTrial {
    let incidental = condition.incidental();
    let (color, shape, number) = match incidental {
        AttributeValue::Color(v) => (Some(v), None, None),
        AttributeValue::Shape(v) => (None, Some(v), None),
        AttributeValue::Number(v) => (None, None, Some(v)),
    };
    let colors = distribute(Color::ALL, color, rng);
    let shapes = distribute(Shape::ALL, shape, rng);
    let numbers = distribute(Number::ALL, number, rng);
    // Card 2 is the incidental card.
    let cards: [Card; 3] = std::array::from_fn(|i| Card::new(colors[i], shapes[i], numbers[i]));

    let incidental_index = if coin(rng) { 1 } else { 2 };
    let other_slot = 3 - incidental_index;
    let (lead, trail) = if coin(rng) { (0, 1) } else { (1, 0) };

    let mut slots = [cards[2]; 3];
    slots[0] = cards[lead];
    slots[other_slot] = cards[trail];

    tracing::debug!(incidental = incidental_index, "Generated transfer trial");
    TransferTrial {
        slots,
        incidental_index,
    }
}

/// Values of one axis across the three cards. On the incidental axis the two
/// other values go to cards 0 and 1 in random order and the incidental value
/// to card 2; any other axis is a uniform shuffle of its domain.
fn distribute<T, R>(domain: [T; 3], incidental: Option<T>, rng: &mut R) -> [T; 3]
where
    T: Copy + PartialEq,
    R: Rng + ?Sized,
{
    match incidental {
        Some(value) => {
            let [a, b] = complement_values(&domain, value, rng);
            [a, b, value]
        }
        None => uniform_shuffle(domain, rng),
    }
}
