//! Domain rules for the library circulation backend.
//!
//! Everything here is pure: no database, no HTTP. The `db` and `api` crates
//! call into these functions to validate input and to decide state
//! transitions before persisting them.

pub mod audit;
pub mod catalog;
pub mod circulation;
pub mod error;
pub mod notification;
pub mod roles;
pub mod search;
pub mod status;
pub mod stock;
pub mod suspension;
pub mod types;
