//! System is a group of staves formatted together against one width.
//!
//! Voices of one stave share modifier columns; voices of all staves share
//! tick columns, so simultaneous notes line up across the whole system.
//!
//! # Example
//! ```
//! use score_spacing::{
//!     primitives::{Note, Ticks, Voice, VoiceTime},
//!     system::{System, SystemOptions},
//! };
//!
//! let voice = |values: &[u64]| {
//!     let mut voice = Voice::new(VoiceTime::default());
//!     let note = |v: &u64| Note::new(Ticks::from_note_value(*v), 10.0);
//!     voice.add_tickables(values.iter().map(note)).unwrap();
//!     voice
//! };
//! let mut system = System::new(SystemOptions {
//!     width: Some(400.0),
//!     ..Default::default()
//! })
//! .unwrap();
//! system
//!     .add_stave(vec![voice(&[4, 4, 2])], 30.0)
//!     .add_stave(vec![voice(&[2, 2])], 40.0);
//! system.format().unwrap();
//! assert_eq!(system.start_x(), 40.0);
//! assert_eq!(system.stave_width(), 400.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    error::FormatResult,
    formatter::{Formatter, FormatterOptions},
    primitives::Voice,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemOptions {
    #[serde(default = "SystemOptions::default_x")]
    pub x: f64,
    /// Total stave width. Without it (and with justification on), the
    /// system sizes itself to the music.
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub auto_width: bool,
    #[serde(default)]
    pub no_justification: bool,
    /// Do not reserve stave padding at the end of the justified width.
    #[serde(default)]
    pub no_padding: bool,
    /// Tuning steps run after formatting.
    #[serde(default)]
    pub format_iterations: usize,
    #[serde(default = "SystemOptions::default_stave_padding")]
    pub stave_padding: f64,
    #[serde(default)]
    pub details: FormatterOptions,
}

impl SystemOptions {
    fn default_x() -> f64 {
        10.0
    }
    fn default_width() -> f64 {
        500.0
    }
    fn default_stave_padding() -> f64 {
        12.0
    }
    pub fn width(&self) -> f64 {
        self.width.unwrap_or_else(Self::default_width)
    }
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self {
            x: Self::default_x(),
            width: None,
            auto_width: false,
            no_justification: false,
            no_padding: false,
            format_iterations: 0,
            stave_padding: Self::default_stave_padding(),
            details: FormatterOptions::default(),
        }
    }
}

#[derive(Debug)]
pub struct SystemStave {
    pub voices: Vec<Voice>,
    /// X where notes of this stave may start, after clef and signatures.
    pub note_start_x: f64,
}

#[derive(Debug)]
pub struct System {
    options: SystemOptions,
    staves: Vec<SystemStave>,
    formatter: Option<Formatter>,
    start_x: f64,
    stave_width: f64,
}
impl System {
    /// # Errors
    /// InvalidOption if formatter options do not validate.
    pub fn new(mut options: SystemOptions) -> FormatResult<Self> {
        options.details.validate()?;
        if !options.no_justification && options.width.is_none() {
            options.auto_width = true;
        }
        let stave_width = options.width();
        Ok(Self {
            options,
            staves: Vec::new(),
            formatter: None,
            start_x: 0.0,
            stave_width,
        })
    }
    pub fn options(&self) -> &SystemOptions {
        &self.options
    }

    pub fn add_stave(
        &mut self,
        voices: Vec<Voice>,
        note_start_x: f64,
    ) -> &mut Self {
        self.staves.push(SystemStave {
            voices,
            note_start_x,
        });
        self
    }
    /// Append voices to an existing stave. Returns false if there is no
    /// stave at `stave`.
    pub fn add_voices_to_stave(
        &mut self,
        voices: Vec<Voice>,
        stave: usize,
    ) -> bool {
        match self.staves.get_mut(stave) {
            Some(stave) => {
                stave.voices.extend(voices);
                true
            }
            None => false,
        }
    }

    /// Format all voices of all staves together. Returns the cost of the
    /// final layout.
    pub fn format(&mut self) -> FormatResult<f64> {
        let mut formatter = Formatter::new(self.options.details.clone())?;
        let mut start_x: f64 = 0.0;
        for stave in self.staves.iter_mut() {
            formatter.join_voices(&mut stave.voices)?;
            start_x = start_x.max(stave.note_start_x);
        }
        for stave in self.staves.iter_mut() {
            stave.note_start_x = start_x;
        }

        let counts: Vec<usize> =
            self.staves.iter().map(|s| s.voices.len()).collect();
        let mut voices: Vec<Voice> = self
            .staves
            .iter_mut()
            .flat_map(|stave| stave.voices.drain(..))
            .collect();
        let result = format_voices(
            &self.options,
            &mut formatter,
            &mut voices,
            start_x,
        );
        let mut voices = voices.into_iter();
        for (stave, count) in self.staves.iter_mut().zip(counts) {
            stave.voices.extend(voices.by_ref().take(count));
        }
        let (cost, stave_width) = result?;

        log::debug!(
            "system formatted: start x {}, stave width {}, cost {}",
            start_x,
            stave_width,
            cost
        );
        self.start_x = start_x;
        self.stave_width = stave_width;
        self.formatter = Some(formatter);
        Ok(cost)
    }

    /// Note start X shared by all staves after formatting.
    pub fn start_x(&self) -> f64 {
        self.start_x
    }
    pub fn stave_width(&self) -> f64 {
        self.stave_width
    }
    /// Formatter of the last [System::format] call.
    pub fn formatter(&self) -> Option<&Formatter> {
        self.formatter.as_ref()
    }
    pub fn staves(&self) -> &[SystemStave] {
        &self.staves
    }
    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.staves.iter().flat_map(|stave| stave.voices.iter())
    }
}

/// Returns the cost and the resulting stave width.
fn format_voices(
    options: &SystemOptions,
    formatter: &mut Formatter,
    voices: &mut [Voice],
    start_x: f64,
) -> FormatResult<(f64, f64)> {
    let (justify_width, stave_width) = match options.auto_width {
        true => {
            let width = formatter.pre_calculate_min_total_width(voices)?;
            (width, width + options.stave_padding + (start_x - options.x))
        }
        false => {
            let width = options.width();
            let justify_width = match options.no_padding {
                true => width - (start_x - options.x),
                false => width - (start_x - options.x) - options.stave_padding,
            };
            (justify_width, width)
        }
    };
    let justify_width = match options.no_justification {
        true => 0.0,
        false => justify_width,
    };
    let mut cost = formatter.format(voices, justify_width)?;
    for _ in 0..options.format_iterations {
        cost = formatter.tune(options.details.alpha)?;
    }
    formatter.apply_positions(voices)?;
    Ok((cost, stave_width))
}
