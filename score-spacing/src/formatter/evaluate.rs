//! Cost of a layout and the local search that lowers it.
//!
//! Notes of one duration class should take the same space. The cost is
//! the root of the summed squared deviations of every note's used space
//! from its class mean. The mean is a running one that halves the weight
//! of older samples, so later notes of a class dominate it.

use std::collections::BTreeMap;

use super::{no_contexts, options::validate_alpha, Formatter};
use crate::{contexts::TickContext, error::FormatResult};

/// Free space between the right edge of one column and the left edge of
/// the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    pub x1: f64,
    pub x2: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextGaps {
    pub total: f64,
    pub gaps: Vec<Gap>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub mean: f64,
    pub count: usize,
}
impl DurationStats {
    fn update(&mut self, space: f64) {
        self.count += 1;
        self.mean = (self.mean + space) / 2.0;
    }
}

impl Formatter {
    /// Measure gaps and freedoms of the current layout, and return its
    /// cost. The cost is also appended to the loss history.
    ///
    /// # Errors
    /// BadArgument if no columns were built.
    pub fn evaluate(&mut self) -> FormatResult<f64> {
        let contexts = self.tick_contexts.as_mut().ok_or_else(no_contexts)?;
        let columns = contexts.as_mut_slice();

        let mut context_gaps = ContextGaps::default();
        for index in 1..columns.len() {
            let previous = &columns[index - 1];
            let current = &columns[index];
            let inside_right_edge = previous.x()
                + previous.metrics().note_px
                + previous.metrics().total_right_px;
            let inside_left_edge =
                current.x() - current.metrics().total_left_px;
            let gap = inside_left_edge - inside_right_edge;
            context_gaps.total += gap;
            context_gaps.gaps.push(Gap {
                x1: inside_right_edge,
                x2: inside_left_edge,
            });
            columns[index].freedom_mut().left = gap;
            columns[index - 1].freedom_mut().right = gap;
        }

        let boundary = self.justify_width;
        let mut duration_stats: BTreeMap<String, DurationStats> =
            BTreeMap::new();
        for voice in self.voices.iter_mut() {
            let xs: Vec<f64> = voice
                .notes
                .iter()
                .map(|note| columns.get(note.column).map_or(0.0, |c| c.x()))
                .collect();
            for index in 0..voice.notes.len() {
                let note = &voice.notes[index];
                let left_note_edge = xs[index]
                    + note.metrics.note_px
                    + note.metrics.total_right_px();
                let (space, used) = match voice.notes.get(index + 1) {
                    Some(right) => (
                        xs[index + 1]
                            - right.metrics.total_left_px()
                            - left_note_edge,
                        xs[index + 1] - xs[index],
                    ),
                    None => (boundary - left_note_edge, boundary - xs[index]),
                };
                duration_stats
                    .entry(note.duration_class.clone())
                    .and_modify(|stats| stats.update(used))
                    .or_insert(DurationStats {
                        mean: used,
                        count: 1,
                    });
                if let Some(right) = voice.notes.get_mut(index + 1) {
                    right.formatter_metrics.freedom.left = space;
                }
                let metrics = &mut voice.notes[index].formatter_metrics;
                metrics.space.used = used;
                metrics.freedom.right = space;
            }
        }

        let mut total_deviation = 0.0;
        for note in self.voices.iter_mut().flat_map(|v| v.notes.iter_mut()) {
            let mean = duration_stats
                .get(&note.duration_class)
                .map_or(0.0, |stats| stats.mean);
            let metrics = &mut note.formatter_metrics;
            metrics.space.mean = mean;
            metrics.space.deviation = metrics.space.used - mean;
            metrics.iterations += 1;
            total_deviation += metrics.space.deviation.powi(2);
        }

        self.total_cost = total_deviation.sqrt();
        self.loss_history.push(self.total_cost);
        self.context_gaps = context_gaps;
        self.duration_stats = duration_stats;
        log::debug!(
            "cost: {}, total gap: {}",
            self.total_cost,
            self.context_gaps.total
        );
        Ok(self.total_cost)
    }

    /// One step of local search over column positions.
    ///
    /// Columns whose notes take more space than their classes' means are
    /// pulled left, the others pushed right, each by at most its freedom
    /// scaled by `alpha`. Returns the new cost; positions are not written
    /// to tickables until [Formatter::apply_positions].
    ///
    /// # Errors
    /// - InvalidOption if alpha is not in (0, 1].
    /// - BadArgument if no columns were built.
    pub fn tune(&mut self, alpha: f64) -> FormatResult<f64> {
        validate_alpha(alpha)?;
        let contexts = self.tick_contexts.as_mut().ok_or_else(no_contexts)?;
        let columns = contexts.as_mut_slice();

        let mut shift = 0.0;
        self.total_shift = 0.0;
        for index in 0..columns.len() {
            move_column(columns, index, shift);

            let pressure = -columns[index]
                .members()
                .iter()
                .map(|m| {
                    self.voices[m.voice].notes[m.index]
                        .formatter_metrics
                        .space
                        .deviation
                })
                .sum::<f64>();
            if pressure > 0.0 {
                shift = -columns[index].freedom().right.min(pressure.abs());
            } else if pressure < 0.0 {
                shift = match columns.get(index + 1) {
                    Some(next) => next.freedom().right.min(pressure.abs()),
                    None => 0.0,
                };
            }
            shift *= alpha;
            self.total_shift += shift;
        }

        self.iterations_completed += 1;
        log::debug!(
            "tuning step {}: total shift {}",
            self.iterations_completed,
            self.total_shift
        );
        self.evaluate()
    }
}

/// Move a column and keep its own and its neighbours' freedom in sync.
fn move_column(columns: &mut [TickContext], index: usize, shift: f64) {
    let x = columns[index].x() + shift;
    let current = columns[index].set_x(x).freedom_mut();
    current.left += shift;
    current.right -= shift;
    if index > 0 {
        columns[index - 1].freedom_mut().right += shift;
    }
    if let Some(next) = columns.get_mut(index + 1) {
        next.freedom_mut().left -= shift;
    }
}
