//! Demonstration sequencer
//!
//! One trial per configured demo stimulus. The first `demo_rule_only_count`
//! trials are rule-only (incidental card already in slot 0); the rest are
//! accidental (incidental card starts in slot 1 or 2 and moves to slot 0
//! during playback). The incidental card may also be the rule-correct card.

use cardsort_core::{Condition, DemoTrial, DemoTrialType};
use rand::Rng;

use crate::attributes::coin;
use crate::choices::{slot_matching, ChoiceSet};

/// Build the full demonstration script. Called once per session.
pub fn build_demonstration_script<R: Rng + ?Sized>(
    condition: &Condition,
    rng: &mut R,
) -> Vec<DemoTrial> {
    let script: Vec<DemoTrial> = condition
        .demo_stimuli()
        .iter()
        .enumerate()
        .map(|(i, stimulus)| {
            let trial_type = if i < condition.demo_rule_only_count() {
                DemoTrialType::RuleOnly
            } else {
                DemoTrialType::Accidental
            };
            let choices = ChoiceSet::generate(*stimulus, rng);
            let carrier = choices.carrier_of(condition.incidental());
            let incidental = choices.cards[carrier];

            let mut others = choices
                .cards
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != carrier)
                .map(|(_, c)| *c);
            let (Some(a), Some(b)) = (others.next(), others.next()) else {
                unreachable!("three choices minus one leaves two")
            };
            let (first, second) = if coin(rng) { (a, b) } else { (b, a) };

            let (initial_slots, incidental_index) = match trial_type {
                DemoTrialType::RuleOnly => ([incidental, first, second], 0),
                DemoTrialType::Accidental if coin(rng) => ([first, incidental, second], 1),
                DemoTrialType::Accidental => ([first, second, incidental], 2),
            };

            DemoTrial {
                trial_number: i as u32 + 1,
                trial_type,
                stimulus: *stimulus,
                correct_choice_index: slot_matching(&initial_slots, condition.sorting_rule()),
                initial_slots,
                incidental_index,
            }
        })
        .collect();

    tracing::debug!(
        trials = script.len(),
        rule_only = condition.demo_rule_only_count(),
        "Built demonstration script"
    );
    script
}
