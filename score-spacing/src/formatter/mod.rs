//! Horizontal layout of voices.
//!
//! The usual sequence is:
//! 1. [Formatter::join_voices] for the voices of every stave.
//! 2. [Formatter::format] with the target width. This builds the
//!    columns, packs them, stretches them proportionally to the notes'
//!    durations, corrects collisions and writes X back to the tickables.
//! 3. Optionally [Formatter::tune] a few times, then
//!    [Formatter::apply_positions].
//!
//! # Example
//! ```
//! use score_spacing::{
//!     formatter::Formatter,
//!     primitives::{Note, Tickable, Ticks, Voice, VoiceTime},
//! };
//!
//! let mut voice = Voice::new(VoiceTime::default());
//! let quarter = || Note::new(Ticks::from_note_value(4), 10.0);
//! voice.add_tickables((0..4).map(|_| quarter())).unwrap();
//! let mut voices = [voice];
//!
//! let mut formatter = Formatter::default();
//! formatter.join_voices(&mut voices).unwrap();
//! assert_eq!(formatter.pre_calculate_min_total_width(&voices).unwrap(), 48.0);
//! formatter.format(&mut voices, 200.0).unwrap();
//! let last = voices[0].tickables().last().unwrap();
//! assert!((last.x() + 10.0 - 200.0).abs() < 1e-9);
//! ```

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    contexts::{
        create_contexts, Context, Contexts, Freedom, ModifierContext,
        TickContext, TickContextMember,
    },
    error::{FormatError, FormatResult},
    primitives::{Tickable, TickableMetrics, Ticks, Voice},
};

mod evaluate;
pub mod options;
pub mod width_map;

pub use evaluate::{ContextGaps, DurationStats, Gap};
pub use options::FormatterOptions;
pub use width_map::{OverlapStats, WidthEntry, WidthMap};

/// Default space between tickables laid out by
/// [Formatter::simple_format], and default stave padding of
/// [Formatter::format_to_stave].
pub const DEFAULT_PADDING_BETWEEN: f64 = 10.0;

/// Horizontal span of a stave available to notes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaveSpan {
    pub note_start_x: f64,
    pub note_end_x: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Space {
    pub used: f64,
    pub mean: f64,
    pub deviation: f64,
}

/// Per-note results of the last evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoteFormatterMetrics {
    pub freedom: Freedom,
    pub space: Space,
    pub iterations: usize,
}

/// What the formatter knows about one tickable.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteLayout {
    /// Index of the column the tickable starts in.
    pub column: usize,
    pub ticks: Ticks,
    /// Weight used by the softmax distribution; starts as the tick value
    /// and is inflated or shrunk by overlap correction.
    pub width_ticks: f64,
    pub metrics: TickableMetrics,
    pub duration_class: String,
    pub center_aligned: bool,
    pub center_x_shift: f64,
    pub formatter_metrics: NoteFormatterMetrics,
}
impl NoteLayout {
    pub fn new(
        column: usize,
        ticks: Ticks,
        metrics: TickableMetrics,
        center_aligned: bool,
    ) -> Self {
        Self {
            column,
            ticks,
            width_ticks: ticks.as_f64(),
            metrics,
            duration_class: ticks.to_string(),
            center_aligned,
            center_x_shift: 0.0,
            formatter_metrics: NoteFormatterMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceLayout {
    pub softmax_factor: f64,
    pub notes: Vec<NoteLayout>,
}

fn no_contexts() -> FormatError {
    FormatError::BadArgument(
        "no tick contexts: call `create_tick_contexts` or `format` first"
            .to_string(),
    )
}

/// Place columns one after another with no slack. Returns the right edge
/// of the last column.
fn pack(contexts: &mut [TickContext]) -> f64 {
    let mut x = 0.0;
    let mut shift = 0.0;
    for context in contexts.iter_mut() {
        context.pre_format();
        let total_left_px = context.metrics().total_left_px;
        x += shift + total_left_px;
        context.set_x(x);
        shift = context.width() - total_left_px;
    }
    x + shift
}

#[derive(Debug, Default)]
pub struct Formatter {
    options: FormatterOptions,
    min_total_width: f64,
    has_min_total_width: bool,
    total_ticks: Ticks,
    justify_width: f64,
    tick_contexts: Option<Contexts<TickContext>>,
    modifier_contexts: Vec<Contexts<ModifierContext>>,
    voices: Vec<VoiceLayout>,
    context_gaps: ContextGaps,
    duration_stats: BTreeMap<String, DurationStats>,
    total_cost: f64,
    total_shift: f64,
    iterations_completed: usize,
    loss_history: Vec<f64>,
    overlap_history: Vec<f64>,
}
impl Formatter {
    /// # Errors
    /// InvalidOption if options do not validate.
    pub fn new(options: FormatterOptions) -> FormatResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            ..Default::default()
        })
    }
    pub fn options(&self) -> &FormatterOptions {
        &self.options
    }

    /// Lay tickables out one after another, each in its own column,
    /// ignoring durations.
    ///
    /// Returns X after the last tickable.
    pub fn simple_format(
        tickables: &mut [Box<dyn Tickable>],
        x: f64,
        padding_between: f64,
    ) -> f64 {
        tickables.iter_mut().fold(x, |x, tickable| {
            let mut context = TickContext::new(0);
            context.add_member(TickContextMember {
                voice: 0,
                index: 0,
                metrics: tickable.metrics(),
                center_aligned: tickable.is_center_aligned(),
            });
            context.pre_format();
            let metrics = *context.metrics();
            tickable.set_x(x + metrics.total_left_px);
            x + context.width() + metrics.total_right_px + padding_between
        })
    }

    /// Build columns for `voices` and take a snapshot of their tickables.
    ///
    /// # Errors
    /// See [create_contexts].
    pub fn create_tick_contexts(
        &mut self,
        voices: &[Voice],
    ) -> FormatResult<&Contexts<TickContext>> {
        let mut contexts = create_contexts::<TickContext, _>(
            voices,
            |context, voice, voice_index, index| {
                context.add_tickable(voice, voice_index, index)
            },
        )?;
        for context in contexts.iter_mut() {
            context.set_padding(self.options.context_padding);
        }

        let mut layouts: Vec<VoiceLayout> = voices
            .iter()
            .map(|voice| VoiceLayout {
                softmax_factor: self
                    .options
                    .softmax_factor
                    .unwrap_or_else(|| voice.softmax_factor()),
                notes: voice
                    .tickables()
                    .iter()
                    .enumerate()
                    .filter_map(|(index, tickable)| {
                        let metrics = voice.effective_metrics(index)?;
                        let mut note = NoteLayout::new(
                            0,
                            tickable.ticks(),
                            metrics,
                            tickable.is_center_aligned(),
                        );
                        note.duration_class = tickable.duration_class();
                        Some(note)
                    })
                    .collect(),
            })
            .collect();
        for (column, context) in contexts.iter().enumerate() {
            for member in context.members() {
                if let Some(note) = layouts
                    .get_mut(member.voice)
                    .and_then(|layout| layout.notes.get_mut(member.index))
                {
                    note.column = column;
                }
            }
        }
        log::debug!(
            "created {} tick contexts for {} voices, resolution multiplier: {}",
            contexts.len(),
            voices.len(),
            contexts.resolution_multiplier()
        );

        self.total_ticks = voices
            .first()
            .map_or_else(Ticks::zero, |voice| voice.ticks_used());
        self.voices = layouts;
        Ok(&*self.tick_contexts.insert(contexts))
    }

    /// Build ModifierContexts for the voices of one stave.
    ///
    /// Contexts are stored and returned unformatted. Prefer
    /// [Formatter::join_voices], which also applies their shifts.
    pub fn create_modifier_contexts(
        &mut self,
        voices: &[Voice],
    ) -> FormatResult<&mut Contexts<ModifierContext>> {
        let contexts = create_contexts::<ModifierContext, _>(
            voices,
            |context, voice, voice_index, index| {
                context.add_tickable(voice, voice_index, index)
            },
        )?;
        self.modifier_contexts.push(contexts);
        self.modifier_contexts.last_mut().ok_or_else(no_contexts)
    }

    /// Declare that `voices` share a stave: their modifiers are formatted
    /// together, and every tickable is widened by its column's shift.
    ///
    /// Drops built tick columns, since their metrics predate the shifts.
    pub fn join_voices(
        &mut self,
        voices: &mut [Voice],
    ) -> FormatResult<&mut Self> {
        let contexts = self.create_modifier_contexts(voices)?;
        for context in contexts.iter_mut() {
            context.pre_format();
            let shift = context.shift();
            for &(voice_index, index) in context.registrations() {
                if let Some(voice) = voices.get_mut(voice_index) {
                    voice.set_modifier_shift(index, shift);
                }
            }
        }
        self.tick_contexts = None;
        self.has_min_total_width = false;
        Ok(self)
    }

    /// Sum of every column's width and left extent.
    ///
    /// Builds columns from `voices` if none exist yet. The value is
    /// cached until voices are joined again.
    ///
    /// # Errors
    /// BadArgument if there are no columns and `voices` is empty.
    pub fn pre_calculate_min_total_width(
        &mut self,
        voices: &[Voice],
    ) -> FormatResult<f64> {
        if self.has_min_total_width {
            return Ok(self.min_total_width);
        }
        if self.tick_contexts.is_none() {
            if voices.is_empty() {
                return Err(FormatError::BadArgument(
                    "voices required to run pre_calculate_min_total_width"
                        .to_string(),
                ));
            }
            self.create_tick_contexts(voices)?;
        }
        let contexts = self.tick_contexts.as_mut().ok_or_else(no_contexts)?;
        self.min_total_width = contexts
            .iter_mut()
            .map(|context| {
                context.pre_format();
                context.width() + context.metrics().total_left_px
            })
            .sum();
        self.has_min_total_width = true;
        Ok(self.min_total_width)
    }

    /// # Errors
    /// NoMinTotalWidth if neither [Self::pre_calculate_min_total_width]
    /// nor a format pass was run.
    pub fn min_total_width(&self) -> FormatResult<f64> {
        match self.has_min_total_width {
            true => Ok(self.min_total_width),
            false => Err(FormatError::NoMinTotalWidth),
        }
    }

    /// Build columns for `voices`, justify them to `justify_width` and
    /// write positions back. Returns the cost of the layout.
    ///
    /// A `justify_width` of zero or less leaves the music left-justified.
    pub fn format(
        &mut self,
        voices: &mut [Voice],
        justify_width: f64,
    ) -> FormatResult<f64> {
        self.create_tick_contexts(voices)?;
        if let Some(factor) = self.options.softmax_factor {
            for voice in voices.iter_mut() {
                voice.set_softmax_factor(factor)?;
            }
        }
        let cost = self.pre_format(justify_width)?;
        self.apply_positions(voices)?;
        Ok(cost)
    }

    /// Like [Formatter::format], with the width taken from the stave
    /// minus `padding`.
    pub fn format_to_stave(
        &mut self,
        voices: &mut [Voice],
        stave: &StaveSpan,
        padding: f64,
    ) -> FormatResult<f64> {
        let justify_width = stave.note_end_x - stave.note_start_x - padding;
        log::debug!("formatting voices to width: {}", justify_width);
        self.format(voices, justify_width)
    }

    /// Position the existing columns. Returns the cost of the layout.
    ///
    /// Columns are packed first. If `justify_width` exceeds the packed
    /// width, they are spread proportionally to the notes' durations and
    /// stretched so the right edge of the last column lands on
    /// `justify_width`.
    pub fn pre_format(&mut self, justify_width: f64) -> FormatResult<f64> {
        let contexts = self.tick_contexts.as_mut().ok_or_else(no_contexts)?;
        let columns = contexts.as_mut_slice();
        self.loss_history.clear();
        self.overlap_history.clear();
        for note in self.voices.iter_mut().flat_map(|v| v.notes.iter_mut()) {
            note.width_ticks = note.ticks.as_f64();
            note.center_x_shift = 0.0;
        }

        let min_total_width = pack(columns);
        self.min_total_width = min_total_width;
        self.has_min_total_width = true;
        self.justify_width = justify_width.max(min_total_width);

        if justify_width <= 0.0
            || justify_width <= min_total_width
            || columns.len() < 2
        {
            log::debug!(
                "left-justified: {} columns, min total width {}",
                columns.len(),
                min_total_width
            );
            return self.evaluate();
        }

        let last = *columns[columns.len() - 1].metrics();
        let adjusted_width = justify_width
            - last.note_px
            - last.total_right_px
            - last.total_left_px;

        let mut width_map =
            WidthMap::calculate(columns, &self.voices, adjusted_width);
        self.overlap_history.push(width_map.max_overlap());
        let stats = width_map.overlap_stats();
        log::debug!(
            "ideal overlap mean: {}, std dev: {}",
            stats.mean,
            stats.std_dev
        );

        let mut iterations = self.options.max_iterations;
        let mut overlaps = width_map.adjust_overlaps(&stats, &mut self.voices);
        while overlaps && iterations > 0 {
            iterations -= 1;
            width_map =
                WidthMap::calculate(columns, &self.voices, adjusted_width);
            self.overlap_history.push(width_map.max_overlap());
            overlaps = width_map.adjust_overlaps(&stats, &mut self.voices);
        }
        log::debug!(
            "overlap correction ran {} iterations, max overlap: {:?}",
            self.options.max_iterations - iterations,
            self.overlap_history.last()
        );

        width_map.shift_to_ideal_distances(
            columns,
            &mut self.voices,
            adjusted_width,
        );

        let last = &columns[columns.len() - 1];
        let right_edge =
            last.x() + last.metrics().note_px + last.metrics().total_right_px;
        let residual = justify_width - right_edge;
        let spread = (columns.len() - 1) as f64;
        log::debug!(
            "stretching residual {} over {} columns",
            residual,
            columns.len()
        );
        for (index, context) in columns.iter_mut().enumerate() {
            let x = context.x() + residual * index as f64 / spread;
            context.set_x(x);
        }

        self.evaluate()
    }

    /// Write column positions (and center shifts) to the tickables of
    /// `voices`, which must be the voices last formatted.
    pub fn apply_positions(&self, voices: &mut [Voice]) -> FormatResult<()> {
        let contexts = self.tick_contexts.as_ref().ok_or_else(no_contexts)?;
        let matches = voices.len() == self.voices.len()
            && voices
                .iter()
                .zip(self.voices.iter())
                .all(|(voice, layout)| voice.len() == layout.notes.len());
        if !matches {
            return Err(FormatError::BadArgument(
                "voices do not match the formatted layout".to_string(),
            ));
        }
        for (voice, layout) in voices.iter_mut().zip_eq(self.voices.iter()) {
            for (tickable, note) in
                voice.tickables_mut().iter_mut().zip_eq(layout.notes.iter())
            {
                if let Some(context) = contexts.get(note.column) {
                    tickable.set_x(context.x());
                }
                tickable.set_center_x_shift(note.center_x_shift);
            }
        }
        Ok(())
    }

    /// X of tickable `index` of voice `voice` in the current layout.
    pub fn tickable_x(&self, voice: usize, index: usize) -> Option<f64> {
        let note = self.voices.get(voice)?.notes.get(index)?;
        Some(self.tick_contexts.as_ref()?.get(note.column)?.x())
    }

    pub fn tick_contexts(&self) -> Option<&Contexts<TickContext>> {
        self.tick_contexts.as_ref()
    }
    pub fn modifier_contexts(&self) -> &[Contexts<ModifierContext>] {
        &self.modifier_contexts
    }
    pub fn voices(&self) -> &[VoiceLayout] {
        &self.voices
    }
    /// Budget of the formatted voices.
    pub fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }
    /// Width the last pass justified to; never below the packed width.
    pub fn justify_width(&self) -> f64 {
        self.justify_width
    }
    pub fn context_gaps(&self) -> &ContextGaps {
        &self.context_gaps
    }
    pub fn duration_stats(&self) -> &BTreeMap<String, DurationStats> {
        &self.duration_stats
    }
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }
    pub fn total_shift(&self) -> f64 {
        self.total_shift
    }
    pub fn iterations_completed(&self) -> usize {
        self.iterations_completed
    }
    /// Cost after the last pre-format and every tuning step since.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }
    /// Maximum overlap of every width map computed by the last
    /// pre-format.
    pub fn overlap_history(&self) -> &[f64] {
        &self.overlap_history
    }
}
