//! Tests for cardsort-trials: choice sets, demonstration script, on-demand
//! generators and the criterion tracker

use cardsort_core::*;
use cardsort_trials::choices::is_latin_square;
use cardsort_trials::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn condition(name: Option<&str>) -> Condition {
    ExperimentConfig::default().resolve(name).unwrap()
}

fn settings_condition(settings: ConditionSettings) -> Condition {
    settings.validate().unwrap()
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
}

// ===========================================================================
// Choice-set generator
// ===========================================================================

#[test]
fn every_stimulus_yields_latin_square() {
    let mut rng = StdRng::seed_from_u64(1);
    for stimulus in Card::all() {
        for _ in 0..20 {
            let set = ChoiceSet::generate(stimulus, &mut rng);
            assert!(is_latin_square(&stimulus, &set.cards), "{stimulus}: {:?}", set.cards);
        }
    }
}

#[test]
fn each_choice_differs_from_stimulus_on_two_axes() {
    let mut rng = StdRng::seed_from_u64(2);
    for stimulus in Card::all() {
        let set = ChoiceSet::generate(stimulus, &mut rng);
        for choice in set.cards {
            assert_ne!(choice.card, stimulus);
            assert_eq!(choice.card.shared_attributes(&stimulus), vec![choice.match_type]);
        }
    }
}

#[test]
fn match_types_are_color_shape_number_in_order() {
    let mut rng = StdRng::seed_from_u64(3);
    let set = ChoiceSet::generate(Card::new(Color::Blue, Shape::Circle, Number::One), &mut rng);
    let types: Vec<MatchType> = set.cards.iter().map(|c| c.match_type).collect();
    assert_eq!(types, vec![Attribute::Color, Attribute::Shape, Attribute::Number]);
}

#[test]
fn number_match_keeps_stimulus_number() {
    // Stimulus {Red, Star, 3} under a number rule.
    let mut rng = StdRng::seed_from_u64(4);
    let stimulus = Card::new(Color::Red, Shape::Star, Number::Three);
    for _ in 0..50 {
        let set = ChoiceSet::generate(stimulus, &mut rng);
        let number_card = set
            .cards
            .iter()
            .find(|c| c.match_type == Attribute::Number)
            .unwrap();
        assert_eq!(number_card.card.number, Number::Three);
    }
}

#[test]
fn same_stimulus_produces_varied_valid_sets() {
    let mut rng = StdRng::seed_from_u64(5);
    let stimulus = Card::new(Color::Green, Shape::Triangle, Number::Two);
    let mut seen = HashSet::new();
    for _ in 0..100 {
        let set = ChoiceSet::generate(stimulus, &mut rng);
        assert!(is_latin_square(&stimulus, &set.cards));
        seen.insert(set.cards.map(|c| c.card));
    }
    // Three independent pair swaps give 8 possible sets.
    assert_eq!(seen.len(), 8);
}

#[test]
fn carrier_of_finds_the_unique_card() {
    let mut rng = StdRng::seed_from_u64(6);
    for stimulus in Card::all() {
        let set = ChoiceSet::generate(stimulus, &mut rng);
        for attribute in Attribute::ALL {
            for value in attribute.domain() {
                let idx = set.carrier_of(value);
                assert!(set.cards[idx].card.carries(value));
            }
        }
    }
}

#[test]
fn latin_square_check_rejects_broken_sets() {
    let stimulus = Card::new(Color::Red, Shape::Star, Number::Three);
    let cards = [
        ChoiceCard { card: Card::new(Color::Red, Shape::Circle, Number::One), match_type: Attribute::Color },
        // Shares color and shape with the stimulus.
        ChoiceCard { card: Card::new(Color::Red, Shape::Star, Number::Two), match_type: Attribute::Shape },
        ChoiceCard { card: Card::new(Color::Green, Shape::Triangle, Number::Three), match_type: Attribute::Number },
    ];
    assert!(!is_latin_square(&stimulus, &cards));
    assert!(!is_latin_square(&stimulus, &cards[..2]));
}

// ===========================================================================
// Demonstration sequencer
// ===========================================================================

#[test]
fn default_script_has_three_rule_only_then_five_accidental() {
    let condition = condition(None);
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let script = build_demonstration_script(&condition, &mut rng);
        assert_eq!(script.len(), 8);
        for (i, trial) in script.iter().enumerate() {
            assert_eq!(trial.trial_number as usize, i + 1);
            if i < 3 {
                assert_eq!(trial.trial_type, DemoTrialType::RuleOnly);
                assert_eq!(trial.incidental_index, 0);
            } else {
                assert_eq!(trial.trial_type, DemoTrialType::Accidental);
                assert!([1, 2].contains(&trial.incidental_index));
            }
        }
    }
}

#[test]
fn script_uses_configured_stimuli_in_order() {
    let condition = condition(None);
    let mut rng = StdRng::seed_from_u64(9);
    let script = build_demonstration_script(&condition, &mut rng);
    let stimuli: Vec<Card> = script.iter().map(|t| t.stimulus).collect();
    assert_eq!(stimuli, default_demo_stimuli());
}

#[test]
fn script_indices_point_at_rule_and_incidental_cards() {
    for name in ["NA_V1", "NA_V2"] {
        let condition = condition(Some(name));
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for trial in build_demonstration_script(&condition, &mut rng) {
                assert!(is_latin_square(&trial.stimulus, &trial.initial_slots));
                assert_eq!(
                    trial.initial_slots[trial.correct_choice_index].match_type,
                    condition.sorting_rule()
                );
                let carriers: Vec<usize> = (0..3)
                    .filter(|&i| trial.initial_slots[i].card.carries(condition.incidental()))
                    .collect();
                assert_eq!(carriers, vec![trial.incidental_index]);
            }
        }
    }
}

#[test]
fn incidental_card_sometimes_coincides_with_correct_card() {
    let condition = condition(None);
    let mut coincided = false;
    let mut separate = false;
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        for trial in build_demonstration_script(&condition, &mut rng) {
            if trial.incidental_index == trial.correct_choice_index {
                coincided = true;
            } else {
                separate = true;
            }
        }
    }
    assert!(coincided && separate);
}

#[test]
fn accidental_slot_is_randomized() {
    let condition = condition(None);
    let mut seen = HashSet::new();
    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        for trial in build_demonstration_script(&condition, &mut rng) {
            if trial.trial_type == DemoTrialType::Accidental {
                seen.insert(trial.incidental_index);
            }
        }
    }
    assert_eq!(seen, HashSet::from([1, 2]));
}

#[test]
fn rule_only_count_is_configurable() {
    let condition = settings_condition(ConditionSettings {
        demo_rule_only_count: 0,
        ..Default::default()
    });
    let mut rng = StdRng::seed_from_u64(0);
    let script = build_demonstration_script(&condition, &mut rng);
    assert!(script.iter().all(|t| t.trial_type == DemoTrialType::Accidental));
}

#[test]
fn same_seed_reproduces_script() {
    let condition = condition(None);
    let a = build_demonstration_script(&condition, &mut StdRng::seed_from_u64(42));
    let b = build_demonstration_script(&condition, &mut StdRng::seed_from_u64(42));
    assert_eq!(a, b);
}

// ===========================================================================
// Card-sort generator
// ===========================================================================

#[test]
fn card_sort_correct_index_matches_rule() {
    for rule in Attribute::ALL {
        let condition = settings_condition(ConditionSettings {
            sorting_rule: rule,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(rule as u64);
        for _ in 0..500 {
            let trial = next_card_sort_trial(&condition, &mut rng);
            assert_eq!(trial.slots[trial.correct_choice_index].match_type, rule);
            assert!(is_latin_square(&trial.stimulus, &trial.slots));
        }
    }
}

#[test]
fn card_sort_covers_stimulus_space_and_slots() {
    let condition = condition(None);
    let mut rng = StdRng::seed_from_u64(77);
    let mut stimuli = HashSet::new();
    let mut correct_slots = HashSet::new();
    for _ in 0..2_000 {
        let trial = next_card_sort_trial(&condition, &mut rng);
        stimuli.insert(trial.stimulus);
        correct_slots.insert(trial.correct_choice_index);
    }
    assert_eq!(stimuli.len(), 27);
    assert_eq!(correct_slots, HashSet::from([0, 1, 2]));
}

// ===========================================================================
// Transfer generator
// ===========================================================================

#[test]
fn transfer_incidental_index_never_zero() {
    for name in ["NA_V1", "NA_V2"] {
        let condition = condition(Some(name));
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..1_000 {
            let trial = next_transfer_trial(&condition, &mut rng);
            assert_ne!(trial.incidental_index, 0);
            assert!(trial.incidental_index < 3);
        }
    }
}

#[test]
fn transfer_has_exactly_one_incidental_card_at_its_index() {
    let number_incidental = settings_condition(ConditionSettings {
        incidental_attribute: Attribute::Number,
        incidental_value: RawValue::Integer(1),
        ..Default::default()
    });
    for condition in [condition(None), condition(Some("NA_V2")), number_incidental] {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..500 {
            let trial = next_transfer_trial(&condition, &mut rng);
            let carriers: Vec<usize> = (0..3)
                .filter(|&i| trial.slots[i].carries(condition.incidental()))
                .collect();
            assert_eq!(carriers, vec![trial.incidental_index]);
        }
    }
}

#[test]
fn transfer_starting_arrangement_is_incorrect() {
    let condition = condition(None);
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..200 {
        let trial = next_transfer_trial(&condition, &mut rng);
        assert!(!trial.is_correct(&Arrangement::identity(), condition.incidental()));

        let mut fixed = Arrangement::identity();
        fixed.swap(trial.incidental_index, 0).unwrap();
        assert!(trial.is_correct(&fixed, condition.incidental()));
    }
}

#[test]
fn transfer_incidental_slot_is_balanced() {
    let condition = condition(None);
    let mut rng = StdRng::seed_from_u64(21);
    let ones = (0..2_000)
        .filter(|_| next_transfer_trial(&condition, &mut rng).incidental_index == 1)
        .count();
    assert!((850..1150).contains(&ones), "slot 1 drawn {ones} times of 2000");
}

// ===========================================================================
// Criterion tracker
// ===========================================================================

fn run_outcomes(tracker: &mut CriterionTracker, outcomes: &[bool]) -> Vec<bool> {
    outcomes
        .iter()
        .enumerate()
        .map(|(i, &correct)| tracker.record_outcome(correct, t0() + Duration::seconds(i as i64 + 1)))
        .collect()
}

#[test]
fn tracker_starts_running_at_zero() {
    let tracker = CriterionTracker::new(Phase::CardSort, 5, t0());
    assert_eq!(tracker.state(), CriterionState::Running);
    assert_eq!(tracker.consecutive_correct(), 0);
    assert_eq!(tracker.trials(), 0);
    assert!(tracker.completions().is_empty());
}

#[test]
fn near_miss_then_incorrect_resets_streak() {
    let mut tracker = CriterionTracker::new(Phase::CardSort, 5, t0());
    let done = run_outcomes(&mut tracker, &[true, true, true, true, false]);
    assert!(done.iter().all(|d| !d));
    assert_eq!(tracker.consecutive_correct(), 0);
    assert_eq!(tracker.state(), CriterionState::Running);
    assert_eq!(tracker.trials(), 5);
}

#[test]
fn exact_criterion_streak_meets_on_last() {
    let mut tracker = CriterionTracker::new(Phase::Transfer, 5, t0());
    let done = run_outcomes(&mut tracker, &[true; 5]);
    assert_eq!(done, vec![false, false, false, false, true]);
    assert_eq!(tracker.state(), CriterionState::Met);
}

#[test]
fn scenario_streak_after_one_miss() {
    // criterion 5, outcomes T T F T T T T T: completes at trial 8.
    let mut tracker = CriterionTracker::new(Phase::Transfer, 5, t0());
    let done = run_outcomes(&mut tracker, &[true, true, false, true, true, true, true, true]);
    assert_eq!(done.iter().position(|d| *d), Some(7));

    let summary = tracker.summarize().unwrap();
    assert_eq!(summary.total_trials, 8);
    assert_eq!(summary.trials_to_criterion, 3);
    // Trial k completes at t0 + k seconds; streak starts at trial index 3.
    assert_eq!(summary.switch_latency_seconds, 4.0);
    assert_eq!(summary.phase_total_time_seconds, 8.0);
}

#[test]
fn tracker_records_every_trial_timestamp() {
    let mut tracker = CriterionTracker::new(Phase::CardSort, 2, t0());
    run_outcomes(&mut tracker, &[false, true, false, true, true]);
    assert_eq!(tracker.trials(), 5);
    assert_eq!(tracker.completions().len(), 5);
    assert_eq!(tracker.completions()[0], t0() + Duration::seconds(1));
}

#[test]
fn criterion_of_one_meets_on_first_correct() {
    let condition = condition(Some("pilot"));
    let mut tracker = CriterionTracker::for_card_sort(&condition, t0());
    assert!(!tracker.record_outcome(false, t0() + Duration::milliseconds(1500)));
    assert!(tracker.record_outcome(true, t0() + Duration::milliseconds(2250)));
    let summary = tracker.summarize().unwrap();
    assert_eq!(summary.total_trials, 2);
    assert_eq!(summary.trials_to_criterion, 1);
    assert_eq!(summary.switch_latency_seconds, 2.25);
}

#[test]
fn summary_seconds_round_to_nearest_millisecond() {
    let mut tracker = CriterionTracker::new(Phase::CardSort, 1, t0());
    tracker.record_outcome(true, t0() + Duration::microseconds(1_234_900));
    let summary = tracker.summarize().unwrap();
    assert_eq!(summary.switch_latency_seconds, 1.235);
    assert_eq!(summary.phase_total_time_seconds, 1.235);

    let mut tracker = CriterionTracker::new(Phase::CardSort, 1, t0());
    tracker.record_outcome(true, t0() + Duration::microseconds(1_234_400));
    assert_eq!(tracker.summarize().unwrap().switch_latency_seconds, 1.234);
}

#[test]
fn summarize_before_met_is_error() {
    let mut tracker = CriterionTracker::new(Phase::CardSort, 3, t0());
    run_outcomes(&mut tracker, &[true, true]);
    let err = tracker.summarize().unwrap_err();
    assert!(matches!(
        err,
        Error::PhaseIncomplete { consecutive: 2, criterion: 3, .. }
    ));
}

#[test]
fn outcomes_after_met_are_ignored() {
    let mut tracker = CriterionTracker::new(Phase::CardSort, 1, t0());
    assert!(tracker.record_outcome(true, t0() + Duration::seconds(1)));
    assert!(tracker.record_outcome(false, t0() + Duration::seconds(2)));
    assert_eq!(tracker.trials(), 1);
    assert_eq!(tracker.consecutive_correct(), 1);
    assert!(tracker.is_met());
}

#[test]
fn trackers_take_phase_criteria_from_condition() {
    let condition = settings_condition(ConditionSettings {
        card_sort_criterion: 4,
        transfer_criterion: 6,
        ..Default::default()
    });
    let sort = CriterionTracker::for_card_sort(&condition, t0());
    let transfer = CriterionTracker::for_transfer(&condition, t0());
    assert_eq!((sort.phase(), sort.criterion()), (Phase::CardSort, 4));
    assert_eq!((transfer.phase(), transfer.criterion()), (Phase::Transfer, 6));
}

#[test]
fn phase_summary_serializes_camel_case() {
    let mut tracker = CriterionTracker::new(Phase::Transfer, 1, t0());
    tracker.record_outcome(true, t0() + Duration::milliseconds(1234));
    let json = serde_json::to_value(tracker.summarize().unwrap()).unwrap();
    assert_eq!(json["totalTrials"], 1);
    assert_eq!(json["trialsToCriterion"], 0);
    assert_eq!(json["switchLatencySeconds"], 1.234);
    assert_eq!(json["phaseTotalTimeSeconds"], 1.234);
    assert_eq!(json["phase"], "transfer");
}
