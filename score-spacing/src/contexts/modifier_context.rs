//! Column of modifiers sharing one tick.
//!
//! Modifiers are formatted category by category. Every category pushes the
//! column's left or right edge outwards, and all tickables registered in
//! the column receive the resulting shift.

use itertools::Itertools;

use crate::primitives::{
    modifier::ModifierCategory, JazzPlacement, Modifier, ModifierKind,
    ModifierShift, OrnamentStyle, Voice,
};

use super::Context;

const DOT_SPACING: f64 = 1.0;
const ACCIDENTAL_SPACING: f64 = 3.0;
const STROKE_SPACING: f64 = 2.0;
const GRACE_NOTE_SPACING: f64 = 2.0;

/// Accumulated room taken by the formatted categories.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModifierState {
    pub left_shift: f64,
    pub right_shift: f64,
    pub text_line: u32,
    pub top_text_line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifierContext {
    tick_id: u64,
    members: Vec<Modifier>,
    registrations: Vec<(usize, usize)>,
    state: ModifierState,
    pre_formatted: bool,
}
impl Context for ModifierContext {
    fn new(tick_id: u64) -> Self {
        Self {
            tick_id,
            members: Vec::new(),
            registrations: Vec::new(),
            state: ModifierState::default(),
            pre_formatted: false,
        }
    }
    fn tick_id(&self) -> u64 {
        self.tick_id
    }
}
impl ModifierContext {
    /// Register tickable `index` of `voice` and collect its modifiers.
    pub fn add_tickable(
        &mut self,
        voice: &Voice,
        voice_index: usize,
        index: usize,
    ) {
        if let Some(tickable) = voice.tickables().get(index) {
            self.members.extend_from_slice(tickable.modifiers());
            self.registrations.push((voice_index, index));
            self.pre_formatted = false;
        }
    }
    pub fn add_modifier(&mut self, modifier: Modifier) -> &mut Self {
        self.members.push(modifier);
        self.pre_formatted = false;
        self
    }
    pub fn members(&self) -> &[Modifier] {
        &self.members
    }
    /// `(voice index, tickable index)` of every registered tickable.
    pub fn registrations(&self) -> &[(usize, usize)] {
        &self.registrations
    }
    pub fn state(&self) -> &ModifierState {
        &self.state
    }
    pub fn shift(&self) -> ModifierShift {
        ModifierShift {
            left: self.state.left_shift,
            right: self.state.right_shift,
        }
    }

    pub fn pre_format(&mut self) -> &mut Self {
        if self.pre_formatted {
            return self;
        }
        let mut state = ModifierState::default();
        let groups = self
            .members
            .iter()
            .sorted_by_key(|m| m.kind.category())
            .group_by(|m| m.kind.category());
        for (category, group) in &groups {
            let group: Vec<&Modifier> = group.collect();
            format_category(category, &group, &mut state);
        }
        log::trace!("modifier context at {}: {:?}", self.tick_id, state);
        self.state = state;
        self.pre_formatted = true;
        self
    }
}

fn max_width(modifiers: &[&Modifier]) -> f64 {
    modifiers.iter().map(|m| m.width).fold(0.0, f64::max)
}

fn format_side(
    placement: JazzPlacement,
    width: f64,
    state: &mut ModifierState,
) {
    match placement {
        JazzPlacement::Left => state.left_shift += width,
        JazzPlacement::Right => state.right_shift += width,
        JazzPlacement::Neutral => (),
    }
}

fn format_centered(width: f64, state: &mut ModifierState) {
    state.left_shift += width / 2.0;
    state.right_shift += width / 2.0;
}

fn format_category(
    category: ModifierCategory,
    modifiers: &[&Modifier],
    state: &mut ModifierState,
) {
    match category {
        ModifierCategory::Dot => {
            state.right_shift += max_width(modifiers) + DOT_SPACING;
        }
        ModifierCategory::Accidental => {
            state.left_shift += max_width(modifiers) + ACCIDENTAL_SPACING;
        }
        ModifierCategory::Stroke => {
            state.left_shift += max_width(modifiers) + STROKE_SPACING;
        }
        ModifierCategory::GraceNoteGroup => {
            state.left_shift += max_width(modifiers) + GRACE_NOTE_SPACING;
        }
        ModifierCategory::Articulation => {
            format_centered(max_width(modifiers), state);
            state.text_line += modifiers.len() as u32;
        }
        ModifierCategory::Annotation => {
            format_centered(max_width(modifiers), state);
            state.top_text_line += modifiers.len() as u32;
        }
        ModifierCategory::Ornament => {
            let (classical, jazz): (Vec<&Modifier>, Vec<&Modifier>) = modifiers
                .iter()
                .copied()
                .partition(|m| {
                    m.kind == ModifierKind::Ornament(OrnamentStyle::Classical)
                });
            if !classical.is_empty() {
                format_centered(max_width(&classical), state);
                state.text_line += 2 * classical.len() as u32;
            }
            for ornament in jazz {
                if let ModifierKind::Ornament(OrnamentStyle::Jazz(placement)) =
                    ornament.kind
                {
                    format_side(placement, ornament.width, state);
                }
            }
        }
        ModifierCategory::JazzTechnique => {
            for technique in modifiers {
                if let ModifierKind::JazzTechnique(placement) = technique.kind {
                    format_side(placement, technique.width, state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        contexts::Context,
        primitives::{
            JazzPlacement, Modifier, ModifierKind, Note, OrnamentStyle, Ticks,
            Voice, VoiceTime,
        },
    };

    use super::ModifierContext;

    fn context(modifiers: &[(ModifierKind, f64)]) -> ModifierContext {
        let mut context = ModifierContext::new(0);
        for (kind, width) in modifiers {
            context.add_modifier(Modifier::new(*kind, *width));
        }
        context.pre_format();
        context
    }

    #[test]
    fn dots_and_accidentals() {
        let context = context(&[
            (ModifierKind::Accidental, 8.0),
            (ModifierKind::Dot, 3.0),
            (ModifierKind::Accidental, 10.0),
        ]);
        assert_eq!(context.state().left_shift, 13.0);
        assert_eq!(context.state().right_shift, 4.0);
    }

    #[test]
    fn strokes_and_grace_notes_stack() {
        let context = context(&[
            (ModifierKind::Stroke, 4.0),
            (ModifierKind::GraceNoteGroup, 12.0),
        ]);
        assert_eq!(context.state().left_shift, 20.0);
        assert_eq!(context.state().right_shift, 0.0);
    }

    #[test]
    fn centered_modifiers() {
        let context = context(&[
            (ModifierKind::Articulation, 6.0),
            (ModifierKind::Articulation, 4.0),
            (ModifierKind::Ornament(OrnamentStyle::Classical), 10.0),
            (ModifierKind::Annotation, 2.0),
        ]);
        let state = context.state();
        assert_eq!(state.left_shift, 9.0);
        assert_eq!(state.right_shift, 9.0);
        assert_eq!(state.text_line, 4);
        assert_eq!(state.top_text_line, 1);
    }

    #[test]
    fn jazz_placement() {
        let scoop = OrnamentStyle::Jazz(JazzPlacement::Left);
        let context = context(&[
            (ModifierKind::Ornament(scoop), 7.0),
            (ModifierKind::JazzTechnique(JazzPlacement::Right), 5.0),
            (ModifierKind::JazzTechnique(JazzPlacement::Neutral), 50.0),
        ]);
        assert_eq!(context.state().left_shift, 7.0);
        assert_eq!(context.state().right_shift, 5.0);
        assert_eq!(context.state().text_line, 0);
    }

    #[test]
    fn registers_tickables() {
        let mut voice = Voice::new(VoiceTime::new(1, 4));
        voice
            .add_tickable(
                Note::new(Ticks::from_note_value(4), 10.0)
                    .add_modifier(Modifier::new(ModifierKind::Dot, 2.0)),
            )
            .unwrap();
        let mut context = ModifierContext::new(0);
        context.add_tickable(&voice, 1, 0);
        context.add_tickable(&voice, 1, 5);
        assert_eq!(context.registrations(), &[(1, 0)]);
        assert_eq!(context.pre_format().shift().right, 3.0);
    }
}
