//! Suspension date-range rules.

use crate::error::CoreError;
use crate::types::Date;

/// Maximum length of a suspension reason.
pub const MAX_SUSPENSION_REASON_LENGTH: usize = 255;

/// A suspension must start on or before the day it ends.
pub fn validate_range(start: Date, end: Date) -> Result<(), CoreError> {
    if start > end {
        return Err(CoreError::Validation(
            "Suspension start date must be on or before the end date".to_string(),
        ));
    }
    Ok(())
}

/// Whether a suspension covers `today` (both bounds inclusive).
pub fn is_active(start: Date, end: Date, today: Date) -> bool {
    start <= today && today <= end
}
