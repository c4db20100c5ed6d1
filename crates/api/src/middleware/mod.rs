//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller, from a Bearer token or the `access_token` cookie.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireLibrarian`] -- requires `secretary` or `admin`.
//! - [`rbac::RequireAuth`] -- requires any authenticated user.

pub mod auth;
pub mod rbac;
