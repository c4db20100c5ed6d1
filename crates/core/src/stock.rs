//! Stock counter arithmetic for `book_stocks` rows.
//!
//! Every function returns the new counter values and never produces a state
//! where `available > total` or either counter is negative.

use crate::error::CoreError;

/// Validate a pair of stock counters.
pub fn validate_quantities(total: i32, available: i32) -> Result<(), CoreError> {
    if total < 0 {
        return Err(CoreError::Validation(
            "Total quantity must not be negative".to_string(),
        ));
    }
    if available < 0 {
        return Err(CoreError::Validation(
            "Available quantity must not be negative".to_string(),
        ));
    }
    if available > total {
        return Err(CoreError::Validation(format!(
            "Available quantity ({available}) cannot exceed total quantity ({total})"
        )));
    }
    Ok(())
}

/// Take `qty` copies off the shelf. Returns the new available count.
pub fn checkout(available: i32, qty: i32) -> Result<i32, CoreError> {
    if qty < 1 {
        return Err(CoreError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    if qty > available {
        return Err(CoreError::Conflict(format!(
            "Insufficient stock: requested {qty}, available {available}"
        )));
    }
    Ok(available - qty)
}

/// Put `qty` copies back on the shelf, capped at `total`.
pub fn restock(available: i32, total: i32, qty: i32) -> i32 {
    available.saturating_add(qty.max(0)).min(total)
}

/// Change the total number of copies, keeping the number on loan constant.
///
/// Returns the new available count. Fails when `new_total` would leave fewer
/// copies than are currently out on loan.
pub fn resize(total: i32, available: i32, new_total: i32) -> Result<i32, CoreError> {
    if new_total < 0 {
        return Err(CoreError::Validation(
            "Total quantity must not be negative".to_string(),
        ));
    }
    let on_loan = (total - available).max(0);
    if new_total < on_loan {
        return Err(CoreError::Validation(format!(
            "Total quantity cannot be reduced below the {on_loan} copies currently on loan"
        )));
    }
    Ok(new_total - on_loan)
}

/// Remove `qty` lost copies from the collection.
///
/// Lost copies were on loan, so only the total shrinks; available is clamped
/// so it never exceeds the new total. Returns `(new_total, new_available)`.
pub fn write_off(total: i32, available: i32, qty: i32) -> (i32, i32) {
    let new_total = (total - qty.max(0)).max(0);
    (new_total, available.min(new_total))
}
