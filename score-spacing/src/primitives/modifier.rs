//! Non-tickable annotations attached to a tickable.
//!
//! Only their horizontal footprint matters here: glyph metrics are
//! resolved by the caller and arrive as a plain width.

use serde::{Deserialize, Serialize};

/// Where a jazz ornament or technique sits relative to the notehead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JazzPlacement {
    /// Before the note (scoop).
    Left,
    /// After the note (doit, fall, flip, turn, smear).
    Right,
    /// Above or below the note (bend, plunger); takes no horizontal room.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrnamentStyle {
    /// Centred over the notehead.
    Classical,
    /// Placed beside the notehead, pushing neighbours away.
    Jazz(JazzPlacement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModifierKind {
    Accidental,
    Dot,
    Stroke,
    GraceNoteGroup,
    Articulation,
    Annotation,
    Ornament(OrnamentStyle),
    JazzTechnique(JazzPlacement),
}
impl ModifierKind {
    /// Formatting order inside a ModifierContext.
    pub(crate) fn category(&self) -> ModifierCategory {
        match self {
            Self::Dot => ModifierCategory::Dot,
            Self::Accidental => ModifierCategory::Accidental,
            Self::Stroke => ModifierCategory::Stroke,
            Self::GraceNoteGroup => ModifierCategory::GraceNoteGroup,
            Self::Articulation => ModifierCategory::Articulation,
            Self::Ornament(_) => ModifierCategory::Ornament,
            Self::Annotation => ModifierCategory::Annotation,
            Self::JazzTechnique(_) => ModifierCategory::JazzTechnique,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ModifierCategory {
    Dot,
    Accidental,
    Stroke,
    GraceNoteGroup,
    Articulation,
    Ornament,
    Annotation,
    JazzTechnique,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub width: f64,
}
impl Modifier {
    pub fn new(kind: ModifierKind, width: f64) -> Self {
        Self { kind, width }
    }
}

/// Room reserved around a tickable by its ModifierContext.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModifierShift {
    pub left: f64,
    pub right: f64,
}
