//! Columns of the layout: everything that starts at one musical instant.
//!
//! Voices are expanded onto a shared integer timeline (ticks multiplied by
//! the LCM of all voices' tick denominators), and each distinct integer
//! tick becomes one context. Contexts are stored in ascending tick order
//! and addressed by their index; neighbours are index ± 1.

use std::collections::BTreeMap;

use crate::{
    error::{FormatError, FormatResult},
    primitives::{lcm, Ticks, Voice, VoiceMode},
};

pub mod modifier_context;
pub mod tick_context;

pub use modifier_context::{ModifierContext, ModifierState};
pub use tick_context::{ContextMetrics, Freedom, TickContext, TickContextMember};

/// A column type that can be keyed by an integer tick.
pub trait Context {
    fn new(tick_id: u64) -> Self;
    fn tick_id(&self) -> u64;
}

/// Contexts built from one set of voices, in ascending tick order.
#[derive(Debug, Clone)]
pub struct Contexts<C> {
    contexts: Vec<C>,
    list: Vec<u64>,
    resolution_multiplier: u64,
}
impl<C: Context> Contexts<C> {
    /// Integer tick keys, ascending and unique.
    pub fn list(&self) -> &[u64] {
        &self.list
    }
    pub fn resolution_multiplier(&self) -> u64 {
        self.resolution_multiplier
    }
    pub fn len(&self) -> usize {
        self.contexts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&C> {
        self.contexts.get(index)
    }
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.contexts.get_mut(index)
    }
    /// Index of the context keyed by `tick`.
    pub fn index_of(&self, tick: u64) -> Option<usize> {
        self.list.binary_search(&tick).ok()
    }
    pub fn by_tick(&self, tick: u64) -> Option<&C> {
        self.index_of(tick).and_then(|idx| self.contexts.get(idx))
    }
    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.contexts.iter()
    }
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, C> {
        self.contexts.iter_mut()
    }
    pub fn as_slice(&self) -> &[C] {
        &self.contexts
    }
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.contexts
    }
}

/// Check that voices can be formatted together and return the
/// resolution multiplier of their shared timeline.
///
/// # Errors
/// - BadArgument: no voices.
/// - TickMismatch: budgets differ.
/// - IncompleteVoice: a Strict voice is not full.
pub fn resolution_multiplier(voices: &[Voice]) -> FormatResult<u64> {
    let first = voices.first().ok_or_else(|| {
        FormatError::BadArgument("No voices to format".to_string())
    })?;
    let total_ticks = first.total_ticks();
    voices.iter().try_fold(1, |multiplier, voice| {
        if voice.total_ticks() != total_ticks {
            return Err(FormatError::TickMismatch {
                expected: total_ticks,
                found: voice.total_ticks(),
            });
        }
        if voice.mode() == VoiceMode::Strict && !voice.is_complete() {
            return Err(FormatError::IncompleteVoice {
                used: voice.ticks_used(),
                total: voice.total_ticks(),
            });
        }
        Ok(lcm(multiplier, voice.resolution_multiplier()))
    })
}

/// Place every tickable of every voice into the context of the tick it
/// starts at.
///
/// `add` receives the context, the voice, the voice index and the index
/// of the tickable inside the voice. Voices are walked in order, so
/// members of a context arrive sorted by voice index.
pub fn create_contexts<C, F>(
    voices: &[Voice],
    mut add: F,
) -> FormatResult<Contexts<C>>
where
    C: Context,
    F: FnMut(&mut C, &Voice, usize, usize),
{
    let resolution_multiplier = resolution_multiplier(voices)?;
    let mut map: BTreeMap<u64, C> = BTreeMap::new();

    for (voice_index, voice) in voices.iter().enumerate() {
        let mut ticks_used = Ticks::zero();
        for (index, tickable) in voice.tickables().iter().enumerate() {
            let integer_ticks = ticks_used
                .scaled_to(resolution_multiplier)
                .ok_or_else(|| {
                    FormatError::BadArgument(format!(
                        "tick {} does not fit resolution {}",
                        ticks_used, resolution_multiplier
                    ))
                })?;
            let context = map
                .entry(integer_ticks)
                .or_insert_with(|| C::new(integer_ticks));
            add(context, voice, voice_index, index);
            ticks_used += tickable.ticks();
        }
    }

    let list = map.keys().copied().collect();
    Ok(Contexts {
        contexts: map.into_values().collect(),
        list,
        resolution_multiplier,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        error::FormatError,
        primitives::{Note, Ticks, Voice, VoiceMode, VoiceTime},
    };

    use super::{create_contexts, resolution_multiplier, TickContext};

    fn voice(values: &[u64]) -> Voice {
        let mut voice = Voice::new(VoiceTime::default());
        let note = |v: &u64| Note::new(Ticks::from_note_value(*v), 10.0);
        voice.add_tickables(values.iter().map(note)).unwrap();
        voice
    }

    #[test]
    fn no_voices() {
        assert!(matches!(
            resolution_multiplier(&[]),
            Err(FormatError::BadArgument(_))
        ));
    }

    #[test]
    fn tick_mismatch() {
        let mut three_four = Voice::new(VoiceTime::new(3, 4));
        three_four
            .add_tickable(Note::new(Ticks::from_note_value(2).dotted(), 10.0))
            .unwrap();
        let err =
            resolution_multiplier(&[voice(&[1]), three_four]).unwrap_err();
        assert_eq!(
            err,
            FormatError::TickMismatch {
                expected: Ticks::from(16384),
                found: Ticks::from(12288),
            }
        );
    }

    #[test]
    fn incomplete_voice() {
        let strict = voice(&[2]);
        assert!(matches!(
            resolution_multiplier(&[strict]),
            Err(FormatError::IncompleteVoice { .. })
        ));
        let soft = voice(&[2]).with_mode(VoiceMode::Soft);
        assert_eq!(resolution_multiplier(&[soft]), Ok(1));
    }

    #[test]
    fn tuplets_align_on_integer_ticks() {
        let mut triplets = Voice::new(VoiceTime::default());
        let third = Ticks::from_note_value(4).scaled(2, 3);
        triplets
            .add_tickables((0..3).map(|_| Note::new(third, 10.0)))
            .unwrap();
        triplets
            .add_tickable(Note::new(Ticks::from_note_value(2), 10.0))
            .unwrap();
        let quarters = voice(&[4, 4, 4, 4]);

        let contexts = create_contexts::<TickContext, _>(
            &[triplets, quarters],
            |context, voice, voice_index, index| {
                context.add_tickable(voice, voice_index, index)
            },
        )
        .unwrap();
        assert_eq!(contexts.resolution_multiplier(), 3);
        // triplets at 0, 1/3, 2/3 of a half; quarters at 1/4, 1/2, 3/4
        assert_eq!(contexts.len(), 6);
        assert_eq!(
            contexts.list(),
            &[0, 8192, 12288, 16384, 24576, 36864]
        );
        // the half-note boundary is shared by both voices
        let half = Ticks::from_note_value(2).scaled_to(3).unwrap();
        assert_eq!(contexts.by_tick(half).unwrap().members().len(), 2);
        assert_eq!(contexts.by_tick(0).unwrap().members().len(), 2);
    }
}
