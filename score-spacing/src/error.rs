use crate::primitives::Ticks;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormatError {
    #[error("Bad argument: {0}")]
    BadArgument(String),
    #[error(
        "Voices should have same total note duration in ticks. \
        Expected: {expected}, found: {found}"
    )]
    TickMismatch { expected: Ticks, found: Ticks },
    #[error("Voice does not have enough notes. Used: {used} of {total}")]
    IncompleteVoice { used: Ticks, total: Ticks },
    #[error("Too many ticks. Used: {used} of {total}")]
    TooManyTicks { used: Ticks, total: Ticks },
    #[error(
        "No minimum total width: call `pre_calculate_min_total_width` \
        or `format` before `min_total_width`"
    )]
    NoMinTotalWidth,
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
pub type FormatResult<T> = Result<T, FormatError>;
