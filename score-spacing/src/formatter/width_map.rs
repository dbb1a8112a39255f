//! Softmax-weighted ideal distances between consecutive notes of a voice,
//! and the overlap bookkeeping that drives width correction.

use std::collections::BTreeSet;

use crate::contexts::TickContext;

use super::VoiceLayout;

/// Share of the voice's width weights used up by `width_ticks`.
fn softmax(voice: &VoiceLayout, basis: &SoftmaxBasis, width_ticks: f64) -> f64 {
    voice.softmax_factor.powf(width_ticks / basis.width_ticks_used)
        / basis.exp_ticks_used
}

#[derive(Debug, Clone, Copy)]
struct SoftmaxBasis {
    width_ticks_used: f64,
    exp_ticks_used: f64,
}
impl SoftmaxBasis {
    fn new(voice: &VoiceLayout) -> Self {
        let width_ticks_used: f64 =
            voice.notes.iter().map(|n| n.width_ticks).sum();
        let exp_ticks_used = voice
            .notes
            .iter()
            .map(|n| {
                voice.softmax_factor.powf(n.width_ticks / width_ticks_used)
            })
            .sum();
        Self {
            width_ticks_used,
            exp_ticks_used,
        }
    }
}

/// One voice's tickable inside one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthEntry {
    pub voice: usize,
    pub note: usize,
    /// Column and slot of the previous entry of the same voice.
    pub previous: Option<(usize, usize)>,
    pub expected_distance: f64,
    /// Positive when the ideal distance would make the note collide with
    /// its predecessor.
    pub overlap: f64,
    pub x: f64,
}
impl WidthEntry {
    /// Index of the previous note in the voice.
    pub fn previous_note(&self) -> Option<usize> {
        self.previous.map(|_| self.note - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Width entries grouped by column, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct WidthMap {
    columns: Vec<Vec<WidthEntry>>,
}
impl WidthMap {
    /// Lay every voice out at its softmax-weighted ideal distances.
    ///
    /// `adjusted_width` is the width available to column origins.
    pub fn calculate(
        contexts: &[TickContext],
        voices: &[VoiceLayout],
        adjusted_width: f64,
    ) -> Self {
        let bases: Vec<SoftmaxBasis> =
            voices.iter().map(SoftmaxBasis::new).collect();
        let mut last_entry: Vec<Option<(usize, usize)>> =
            vec![None; voices.len()];
        let mut columns: Vec<Vec<WidthEntry>> =
            Vec::with_capacity(contexts.len());
        let mut found_overlap = false;

        for (column, context) in contexts.iter().enumerate() {
            let mut entries = Vec::with_capacity(context.members().len());
            for member in context.members() {
                let voice = &voices[member.voice];
                let mut entry = WidthEntry {
                    voice: member.voice,
                    note: member.index,
                    previous: last_entry[member.voice],
                    expected_distance: 0.0,
                    overlap: 0.0,
                    x: context.x(),
                };
                if let Some((prev_column, prev_slot)) = entry.previous {
                    let previous = &voice.notes[member.index - 1];
                    let basis = &bases[member.voice];
                    entry.expected_distance =
                        softmax(voice, basis, previous.width_ticks)
                            * adjusted_width;
                    entry.overlap = previous.metrics.right_extent_px()
                        - (entry.expected_distance
                            - context.metrics().total_left_px);
                    entry.x = columns[prev_column][prev_slot].x
                        + entry.expected_distance;
                    if entry.overlap > 0.0 {
                        found_overlap = true;
                    }
                }
                log::trace!(
                    "expected distance: {}, overlap: {}, x: {}, \
                     column: {}, voice: {}",
                    entry.expected_distance,
                    entry.overlap,
                    entry.x,
                    column,
                    entry.voice
                );
                last_entry[member.voice] = Some((column, entries.len()));
                entries.push(entry);
            }
            columns.push(entries);
        }

        let mut map = Self { columns };
        if !found_overlap {
            map.find_cross_voice_overlaps();
        }
        map
    }

    /// Catch notes placed left of an earlier note of another voice.
    fn find_cross_voice_overlaps(&mut self) {
        // dress rehearsal: every entry sits at the furthest candidate X of
        // its column
        for column in 0..self.columns.len() {
            let max_x = self.columns[column]
                .iter()
                .map(|entry| match entry.previous {
                    Some((c, s)) => {
                        self.columns[c][s].x + entry.expected_distance
                    }
                    None => entry.x,
                })
                .fold(0.0, f64::max);
            for entry in self.columns[column].iter_mut() {
                entry.x = max_x;
            }
        }

        let voice_count = self
            .columns
            .iter()
            .flatten()
            .map(|entry| entry.voice)
            .collect::<BTreeSet<_>>()
            .len();
        for column in 1..self.columns.len() {
            let mut checked_voices = BTreeSet::new();
            for slot in 0..self.columns[column].len() {
                let mut entry = self.columns[column][slot];
                for earlier in (0..column).rev() {
                    for previous in self.columns[earlier].iter() {
                        checked_voices.insert(previous.voice);
                        if previous.x >= entry.x
                            && previous.x - entry.x > entry.overlap
                        {
                            entry.overlap = previous.x - entry.x + 1.0;
                            log::trace!(
                                "cross-voice overlap from column {} \
                                 voice {}: {}",
                                earlier,
                                previous.voice,
                                entry.overlap
                            );
                        }
                    }
                    if checked_voices.len() == voice_count {
                        break;
                    }
                }
                self.columns[column][slot] = entry;
            }
        }
    }

    pub fn columns(&self) -> &[Vec<WidthEntry>] {
        &self.columns
    }
    pub fn entries(&self) -> impl Iterator<Item = &WidthEntry> {
        self.columns.iter().flatten()
    }

    /// Largest overlap of each column.
    fn column_overlaps(&self) -> impl Iterator<Item = f64> + '_ {
        self.columns.iter().map(|entries| {
            entries
                .iter()
                .map(|e| e.overlap)
                .fold(f64::NEG_INFINITY, f64::max)
        })
    }
    pub fn max_overlap(&self) -> f64 {
        self.column_overlaps().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Population mean and standard deviation of the per-column maximum
    /// overlap, skipping the first column.
    pub fn overlap_stats(&self) -> OverlapStats {
        let overlaps: Vec<f64> = self.column_overlaps().skip(1).collect();
        if overlaps.is_empty() {
            return OverlapStats {
                mean: 1.0,
                std_dev: 1.0,
            };
        }
        let count = overlaps.len() as f64;
        let mean = overlaps.iter().sum::<f64>() / count;
        let variance =
            overlaps.iter().map(|o| (o - mean).powi(2)).sum::<f64>() / count;
        OverlapStats {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// Give colliding notes' predecessors more width weight, and take some
    /// from the predecessor of the most underused gap.
    ///
    /// Returns true if any overlap was corrected.
    pub fn adjust_overlaps(
        &self,
        stats: &OverlapStats,
        voices: &mut [VoiceLayout],
    ) -> bool {
        let mut overlaps = false;
        let mut max_underlap: Option<&WidthEntry> = None;
        for entry in self.entries() {
            if entry.overlap > 0.0 && stats.std_dev > 1.0 {
                overlaps = true;
                if let Some(previous) = entry.previous_note() {
                    voices[entry.voice].notes[previous].width_ticks *=
                        1.0 + entry.overlap / stats.std_dev;
                }
            } else if (entry.overlap < stats.mean - stats.std_dev
                || entry.overlap < 2.0 * stats.mean)
                && max_underlap.map_or(true, |u| entry.overlap < u.overlap)
                && entry.overlap < 0.0
                && stats.std_dev > 1.0
                && overlaps
            {
                max_underlap = Some(entry);
            }
        }
        if overlaps {
            if let Some(previous) = max_underlap.and_then(|u| {
                u.previous_note().map(|previous| (u.voice, previous))
            }) {
                voices[previous.0].notes[previous.1].width_ticks *= 0.85;
            }
        }
        overlaps
    }

    /// Move every column to the furthest ideal position any of its voices
    /// asks for.
    ///
    /// Center-aligned notes get the shift that puts them at the middle of
    /// `adjusted_width`.
    pub fn shift_to_ideal_distances(
        &self,
        contexts: &mut [TickContext],
        voices: &mut [VoiceLayout],
        adjusted_width: f64,
    ) {
        let center_x = adjusted_width / 2.0;
        for (column, entries) in self.columns.iter().enumerate() {
            let context_x = entries
                .iter()
                .map(|entry| {
                    let start_column = match entry.previous_note() {
                        Some(previous) => {
                            voices[entry.voice].notes[previous].column
                        }
                        None => column,
                    };
                    let start_x = contexts[start_column].x();
                    start_x + entry.expected_distance
                })
                .fold(0.0, f64::max);
            let context = &mut contexts[column];
            context.set_x(context_x);
            for member in context.center_aligned_members() {
                voices[member.voice].notes[member.index].center_x_shift =
                    center_x - context_x;
            }
        }
    }
}
