//! JSON description of a system to format.
//!
//! ```json
//! {
//!   "options": {"width": 400},
//!   "staves": [{
//!     "note_start_x": 40,
//!     "voices": [{
//!       "notes": [
//!         {"ticks": 4096, "width": 10,
//!          "modifiers": [{"kind": "accidental", "width": 8}]},
//!         {"ticks": [8192, 3], "width": 10}
//!       ]
//!     }]
//!   }]
//! }
//! ```

use std::error::Error;

use serde::Deserialize;

use score_spacing::{
    primitives::{
        Modifier, Note, TickableMetrics, Ticks, Voice, VoiceMode, VoiceTime,
    },
    SystemOptions,
};

#[derive(Debug, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub options: SystemOptions,
    pub staves: Vec<StaveLayout>,
}

#[derive(Debug, Deserialize)]
pub struct StaveLayout {
    #[serde(default)]
    pub note_start_x: f64,
    pub voices: Vec<VoiceLayout>,
}

#[derive(Debug, Deserialize)]
pub struct VoiceLayout {
    #[serde(default)]
    pub time: TimeLayout,
    #[serde(default)]
    pub mode: VoiceMode,
    #[serde(default)]
    pub softmax_factor: Option<f64>,
    pub notes: Vec<NoteLayout>,
}

#[derive(Debug, Deserialize)]
pub struct TimeLayout {
    pub num_beats: u32,
    pub beat_value: u32,
}
impl Default for TimeLayout {
    fn default() -> Self {
        Self {
            num_beats: 4,
            beat_value: 4,
        }
    }
}

/// Ticks as an integer or a `[numerator, denominator]` pair.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum TicksLayout {
    Whole(u64),
    Ratio(u64, u64),
}
impl TicksLayout {
    fn ticks(&self) -> Result<Ticks, Box<dyn Error>> {
        match *self {
            Self::Whole(ticks) => Ok(Ticks::from(ticks)),
            Self::Ratio(_, 0) => {
                Err("tick denominator should not be zero".into())
            }
            Self::Ratio(num, den) => Ok(Ticks::new(num, den)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NoteLayout {
    pub ticks: TicksLayout,
    pub width: f64,
    #[serde(default)]
    pub left_displaced_head_px: f64,
    #[serde(default)]
    pub right_displaced_head_px: f64,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub center_aligned: bool,
}

impl VoiceLayout {
    pub fn build(&self) -> Result<Voice, Box<dyn Error>> {
        let time = VoiceTime::new(self.time.num_beats, self.time.beat_value);
        let mut voice = Voice::new(time).with_mode(self.mode);
        if let Some(factor) = self.softmax_factor {
            voice.set_softmax_factor(factor)?;
        }
        for note in self.notes.iter() {
            let metrics = TickableMetrics {
                left_displaced_head_px: note.left_displaced_head_px,
                right_displaced_head_px: note.right_displaced_head_px,
                ..TickableMetrics::new(note.width)
            };
            let tickable = note
                .modifiers
                .iter()
                .fold(Note::with_metrics(note.ticks.ticks()?, metrics), |n, m| {
                    n.add_modifier(*m)
                })
                .center_aligned(note.center_aligned);
            voice.add_tickable(tickable)?;
        }
        Ok(voice)
    }
}
