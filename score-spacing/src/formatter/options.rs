use serde::{Deserialize, Serialize};

use crate::{
    contexts::tick_context::DEFAULT_PADDING,
    error::{FormatError, FormatResult},
};

/// Tuning knobs of the [Formatter](super::Formatter).
///
/// # Example
/// ```
/// use score_spacing::formatter::FormatterOptions;
/// let options: FormatterOptions =
///     serde_json::from_str(r#"{"softmax_factor": 5.0}"#).unwrap();
/// assert_eq!(options.max_iterations, 10);
/// assert_eq!(options.softmax_factor, Some(5.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatterOptions {
    /// Overrides the softmax factor of every formatted voice.
    #[serde(default)]
    pub softmax_factor: Option<f64>,
    /// Budget of the overlap-correction loop.
    #[serde(default = "FormatterOptions::default_max_iterations")]
    pub max_iterations: usize,
    /// Learning rate of [tune](super::Formatter::tune) when driven by a
    /// System.
    #[serde(default = "FormatterOptions::default_alpha")]
    pub alpha: f64,
    /// Padding on each side of every column.
    #[serde(default = "FormatterOptions::default_context_padding")]
    pub context_padding: f64,
}

impl FormatterOptions {
    fn default_max_iterations() -> usize {
        10
    }
    fn default_alpha() -> f64 {
        0.5
    }
    fn default_context_padding() -> f64 {
        DEFAULT_PADDING
    }

    /// Preset for layouts squeezed into a fixed width.
    pub fn width_constrained() -> Self {
        Self {
            max_iterations: 5,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> FormatResult<()> {
        if let Some(factor) = self.softmax_factor {
            if !factor.is_finite() || factor < 1.0 {
                return Err(FormatError::InvalidOption(format!(
                    "softmax_factor should be finite and >= 1, got {}",
                    factor
                )));
            }
        }
        validate_alpha(self.alpha)?;
        if !self.context_padding.is_finite() || self.context_padding < 0.0 {
            return Err(FormatError::InvalidOption(format!(
                "context_padding should be finite and >= 0, got {}",
                self.context_padding
            )));
        }
        Ok(())
    }
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            softmax_factor: None,
            max_iterations: Self::default_max_iterations(),
            alpha: Self::default_alpha(),
            context_padding: Self::default_context_padding(),
        }
    }
}

pub(crate) fn validate_alpha(alpha: f64) -> FormatResult<()> {
    if !alpha.is_finite() || alpha <= 0.0 || alpha > 1.0 {
        return Err(FormatError::InvalidOption(format!(
            "alpha should be in (0, 1], got {}",
            alpha
        )));
    }
    Ok(())
}
