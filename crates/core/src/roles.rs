//! Well-known role name constants.
//!
//! These must match the `chk_users_role` constraint in the users migration.

pub const ROLE_READER: &str = "reader";
pub const ROLE_SECRETARY: &str = "secretary";
pub const ROLE_ADMIN: &str = "admin";

/// All roles a user row may carry.
pub const VALID_ROLES: &[&str] = &[ROLE_READER, ROLE_SECRETARY, ROLE_ADMIN];

/// Librarians (secretaries and admins) process requests, loans and penalties.
pub fn is_librarian(role: &str) -> bool {
    role == ROLE_SECRETARY || role == ROLE_ADMIN
}

/// Validate that a role string is one of [`VALID_ROLES`].
pub fn validate_role(role: &str) -> Result<(), crate::error::CoreError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(crate::error::CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        )))
    }
}
