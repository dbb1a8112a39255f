use crate::primitives::{TickableMetrics, Voice};

use super::Context;

/// Padding added on each side of every column.
pub const DEFAULT_PADDING: f64 = 1.0;

/// A tickable registered in a column.
///
/// Metrics are captured when the column is built, already widened by the
/// tickable's ModifierContext shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContextMember {
    pub voice: usize,
    pub index: usize,
    pub metrics: TickableMetrics,
    pub center_aligned: bool,
}

/// Column-level aggregate of the members' metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContextMetrics {
    pub note_px: f64,
    pub left_displaced_head_px: f64,
    pub right_displaced_head_px: f64,
    pub mod_left_px: f64,
    pub mod_right_px: f64,
    pub total_left_px: f64,
    pub total_right_px: f64,
    /// `note_px + total_left_px + total_right_px`, without padding.
    pub width: f64,
}

/// Slack between a column and its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Freedom {
    pub left: f64,
    pub right: f64,
}

/// All tickables starting at one integer tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickContext {
    tick_id: u64,
    members: Vec<TickContextMember>,
    metrics: ContextMetrics,
    x: f64,
    padding: f64,
    freedom: Freedom,
}
impl Context for TickContext {
    fn new(tick_id: u64) -> Self {
        Self {
            tick_id,
            members: Vec::new(),
            metrics: ContextMetrics::default(),
            x: 0.0,
            padding: DEFAULT_PADDING,
            freedom: Freedom::default(),
        }
    }
    fn tick_id(&self) -> u64 {
        self.tick_id
    }
}
impl TickContext {
    /// Register tickable `index` of `voice` as the member for
    /// `voice_index`.
    pub fn add_tickable(
        &mut self,
        voice: &Voice,
        voice_index: usize,
        index: usize,
    ) {
        let metrics = match voice.effective_metrics(index) {
            Some(metrics) => metrics,
            None => return,
        };
        let center_aligned = voice.tickables()[index].is_center_aligned();
        self.add_member(TickContextMember {
            voice: voice_index,
            index,
            metrics,
            center_aligned,
        });
    }
    pub fn add_member(&mut self, member: TickContextMember) {
        self.members.push(member);
    }
    pub fn members(&self) -> &[TickContextMember] {
        &self.members
    }
    /// Member of the given voice, if the voice has a tickable here.
    pub fn member(&self, voice: usize) -> Option<&TickContextMember> {
        self.members.iter().find(|m| m.voice == voice)
    }
    pub fn center_aligned_members(
        &self,
    ) -> impl Iterator<Item = &TickContextMember> {
        self.members.iter().filter(|m| m.center_aligned)
    }

    /// Aggregate members' metrics. Each field is the maximum over the
    /// members, so the widest tickable defines the column.
    pub fn pre_format(&mut self) -> &mut Self {
        let mut metrics = ContextMetrics::default();
        for member in self.members.iter() {
            let m = &member.metrics;
            metrics.note_px = metrics.note_px.max(m.note_px);
            metrics.left_displaced_head_px =
                metrics.left_displaced_head_px.max(m.left_displaced_head_px);
            metrics.right_displaced_head_px = metrics
                .right_displaced_head_px
                .max(m.right_displaced_head_px);
            metrics.mod_left_px = metrics.mod_left_px.max(m.mod_left_px);
            metrics.mod_right_px = metrics.mod_right_px.max(m.mod_right_px);
            metrics.total_left_px =
                metrics.total_left_px.max(m.total_left_px());
            metrics.total_right_px =
                metrics.total_right_px.max(m.total_right_px());
        }
        metrics.width =
            metrics.note_px + metrics.total_left_px + metrics.total_right_px;
        self.metrics = metrics;
        self
    }
    pub fn metrics(&self) -> &ContextMetrics {
        &self.metrics
    }
    /// Width including padding on both sides.
    pub fn width(&self) -> f64 {
        self.metrics.width + self.padding * 2.0
    }
    pub fn padding(&self) -> f64 {
        self.padding
    }
    pub fn set_padding(&mut self, padding: f64) -> &mut Self {
        self.padding = padding;
        self
    }
    pub fn x(&self) -> f64 {
        self.x
    }
    pub fn set_x(&mut self, x: f64) -> &mut Self {
        self.x = x;
        self
    }
    pub fn freedom(&self) -> &Freedom {
        &self.freedom
    }
    pub fn freedom_mut(&mut self) -> &mut Freedom {
        &mut self.freedom
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        contexts::Context,
        primitives::{Note, Ticks, TickableMetrics, Voice, VoiceTime},
    };

    use super::{TickContext, TickContextMember};

    fn member(voice: usize, metrics: TickableMetrics) -> TickContextMember {
        TickContextMember {
            voice,
            index: 0,
            metrics,
            center_aligned: false,
        }
    }

    #[test]
    fn widest_member_defines_column() {
        let mut context = TickContext::new(0);
        context.add_member(member(
            0,
            TickableMetrics {
                note_px: 10.0,
                mod_left_px: 5.0,
                ..Default::default()
            },
        ));
        context.add_member(member(
            1,
            TickableMetrics {
                note_px: 14.0,
                left_displaced_head_px: 2.0,
                right_displaced_head_px: 3.0,
                ..Default::default()
            },
        ));
        context.pre_format();
        let metrics = context.metrics();
        assert_eq!(metrics.note_px, 14.0);
        assert_eq!(metrics.total_left_px, 5.0);
        assert_eq!(metrics.total_right_px, 3.0);
        assert_eq!(metrics.width, 22.0);
        assert_eq!(context.width(), 24.0);
        assert_eq!(context.set_padding(0.0).width(), 22.0);
    }

    #[test]
    fn pre_format_is_repeatable() {
        let mut context = TickContext::new(0);
        context.add_member(member(0, TickableMetrics::new(10.0)));
        let first = *context.pre_format().metrics();
        assert_eq!(*context.pre_format().metrics(), first);
    }

    #[test]
    fn members_from_voice() {
        let mut voice = Voice::new(VoiceTime::new(1, 4));
        voice
            .add_tickable(
                Note::new(Ticks::from_note_value(4), 10.0).center_aligned(true),
            )
            .unwrap();
        let mut context = TickContext::new(0);
        context.add_tickable(&voice, 3, 0);
        context.add_tickable(&voice, 4, 7);
        assert_eq!(context.members().len(), 1);
        assert_eq!(context.member(3).unwrap().metrics.note_px, 10.0);
        assert!(context.member(4).is_none());
        assert_eq!(context.center_aligned_members().count(), 1);
    }
}
