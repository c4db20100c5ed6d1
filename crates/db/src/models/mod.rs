//! Row models and request DTOs, one module per table family.
//!
//! Row structs derive `FromRow` (and `Serialize` unless they carry secrets);
//! `Create*`/`Update*` DTOs derive `Deserialize` so handlers can accept them
//! directly.

pub mod audit;
pub mod author;
pub mod book;
pub mod category;
pub mod dashboard;
pub mod loan;
pub mod loan_request;
pub mod notification;
pub mod penalty;
pub mod session;
pub mod stock;
pub mod suspension;
pub mod user;
