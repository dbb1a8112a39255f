//! Property-based invariants of the formatter.
//!
//! 1. Tickables starting at the same tick share X.
//! 2. Minimum total width is deterministic and idempotent.
//! 3. A width at or below the minimum never stretches the layout.
//! 4. A width above the minimum is filled exactly.
//! 5. Cost is finite and never negative, including after tuning.

use proptest::prelude::*;
use score_spacing::{
    formatter::Formatter,
    primitives::{Note, Tickable, Ticks, Voice, VoiceTime},
};

const SIXTEENTHS: u64 = 16;

/// Durations in sixteenths filling one 4/4 measure, paired with widths.
fn measure() -> impl Strategy<Value = Vec<(u64, f64)>> {
    proptest::collection::vec(
        (prop_oneof![Just(1u64), Just(2), Just(4), Just(8)], 5.0f64..30.0),
        1..16,
    )
    .prop_map(|notes| {
        let mut used = 0;
        let mut filled = Vec::new();
        for (duration, width) in notes {
            if used + duration <= SIXTEENTHS {
                used += duration;
                filled.push((duration, width));
            }
        }
        while used < SIXTEENTHS {
            used += 1;
            filled.push((1, 10.0));
        }
        filled
    })
}

fn voice(notes: &[(u64, f64)]) -> Voice {
    let mut voice = Voice::new(VoiceTime::default());
    for (duration, width) in notes {
        voice
            .add_tickable(Note::new(
                Ticks::from_note_value(SIXTEENTHS).scaled(*duration, 1),
                *width,
            ))
            .unwrap();
    }
    voice
}

/// (start in sixteenths, x, width) of every tickable.
fn placements(notes: &[(u64, f64)], voice: &Voice) -> Vec<(u64, f64, f64)> {
    let mut start = 0;
    notes
        .iter()
        .zip(voice.tickables())
        .map(|((duration, width), tickable)| {
            let placement = (start, tickable.x(), *width);
            start += duration;
            placement
        })
        .collect()
}

/// Right edge of the last column.
fn right_edge(all: &[(u64, f64, f64)]) -> f64 {
    let last = all.iter().map(|p| p.0).max().unwrap_or(0);
    all.iter()
        .filter(|p| p.0 == last)
        .map(|p| p.1 + p.2)
        .fold(f64::NEG_INFINITY, f64::max)
}

proptest! {
    #[test]
    fn simultaneous_tickables_share_x(
        upper in measure(),
        lower in measure(),
        width in 0.0f64..800.0,
    ) {
        let mut voices = [voice(&upper), voice(&lower)];
        let mut formatter = Formatter::default();
        formatter.format(&mut voices, width).unwrap();
        let upper = placements(&upper, &voices[0]);
        let lower = placements(&lower, &voices[1]);
        for (start, x, _) in upper.iter() {
            if let Some((_, other, _)) = lower.iter().find(|p| p.0 == *start) {
                prop_assert_eq!(x, other, "tick {}", start);
            }
        }
    }
}

proptest! {
    #[test]
    fn min_total_width_is_idempotent(upper in measure(), lower in measure()) {
        let voices = [voice(&upper), voice(&lower)];
        let mut formatter = Formatter::default();
        let first = formatter.pre_calculate_min_total_width(&voices).unwrap();
        let second = formatter.pre_calculate_min_total_width(&voices).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(formatter.min_total_width().unwrap(), first);

        let mut other = Formatter::default();
        prop_assert_eq!(
            other.pre_calculate_min_total_width(&voices).unwrap(),
            first
        );
    }
}

proptest! {
    #[test]
    fn narrow_width_keeps_packed_edge(
        upper in measure(),
        lower in measure(),
        ratio in 0.0f64..=1.0,
    ) {
        let mut voices = [voice(&upper), voice(&lower)];
        let mut formatter = Formatter::default();
        formatter.format(&mut voices, 0.0).unwrap();
        let mut packed = placements(&upper, &voices[0]);
        packed.extend(placements(&lower, &voices[1]));
        let packed_edge = right_edge(&packed);

        let min_total_width = formatter.min_total_width().unwrap();
        formatter.format(&mut voices, min_total_width * ratio).unwrap();
        let mut narrow = placements(&upper, &voices[0]);
        narrow.extend(placements(&lower, &voices[1]));
        prop_assert!(right_edge(&narrow) <= packed_edge + 1e-9);
    }
}

proptest! {
    #[test]
    fn wide_width_is_filled_exactly(
        upper in measure(),
        lower in measure(),
        extra in 1.0f64..500.0,
    ) {
        let mut voices = [voice(&upper), voice(&lower)];
        let mut formatter = Formatter::default();
        formatter.format(&mut voices, 0.0).unwrap();
        let width = formatter.min_total_width().unwrap() + extra;
        formatter.format(&mut voices, width).unwrap();
        if formatter.tick_contexts().unwrap().len() > 1 {
            let mut all = placements(&upper, &voices[0]);
            all.extend(placements(&lower, &voices[1]));
            prop_assert!((right_edge(&all) - width).abs() < 1e-6);
        }
    }
}

proptest! {
    #[test]
    fn cost_is_never_negative(
        upper in measure(),
        lower in measure(),
        width in 0.0f64..800.0,
        steps in 0usize..5,
    ) {
        let mut voices = [voice(&upper), voice(&lower)];
        let mut formatter = Formatter::default();
        let cost = formatter.format(&mut voices, width).unwrap();
        prop_assert!(cost >= 0.0 && cost.is_finite());
        for _ in 0..steps {
            let cost = formatter.tune(0.5).unwrap();
            prop_assert!(cost >= 0.0 && cost.is_finite());
        }
        prop_assert_eq!(formatter.loss_history().len(), steps + 1);
    }
}
