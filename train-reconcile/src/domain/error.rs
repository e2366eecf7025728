//! Calendar construction errors.

use chrono::NaiveDate;

/// A trip variant's calendar could not be built from its raw fields.
///
/// Most variants are recoverable: the caller skips the offending trip and
/// carries on. [`CalendarFormatError::EndMismatch`] is different, since a
/// validity period that disagrees with its own bitmap means the feed itself
/// is corrupt; see [`CalendarFormatError::is_fatal`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarFormatError {
    /// Validity timestamp is not an ISO date at midnight
    #[error("invalid validity timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: &'static str },

    /// Bitmap has no days at all
    #[error("calendar bitmap is empty")]
    EmptyBitmap,

    /// Bitmap contains something other than '0' or '1'
    #[error("invalid bitmap character {found:?} at offset {offset}")]
    InvalidBitmapChar { offset: usize, found: char },

    /// Multi-day bitmap without an end of validity
    #[error("missing validity end for {days}-day bitmap")]
    MissingEnd { days: usize },

    /// Validity end disagrees with the bitmap length
    #[error("validity end {found} does not match bitmap (expected {expected})")]
    EndMismatch { expected: NaiveDate, found: NaiveDate },
}

impl CalendarFormatError {
    /// Whether this error should abort the whole conversion run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CalendarFormatError::EndMismatch { .. })
    }
}
