//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that take `&PgPool` run on their own connection; methods that take
//! `impl PgExecutor` also run on a transaction and are what the
//! [`circulation`](crate::circulation) workflow composes.

pub mod audit_repo;
pub mod author_repo;
pub mod book_repo;
pub mod category_repo;
pub mod dashboard_repo;
pub mod loan_repo;
pub mod loan_request_repo;
pub mod notification_repo;
pub mod penalty_repo;
pub mod session_repo;
pub mod stock_repo;
pub mod suspension_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use author_repo::AuthorRepo;
pub use book_repo::BookRepo;
pub use category_repo::CategoryRepo;
pub use dashboard_repo::DashboardRepo;
pub use loan_repo::LoanRepo;
pub use loan_request_repo::LoanRequestRepo;
pub use notification_repo::NotificationRepo;
pub use penalty_repo::PenaltyRepo;
pub use session_repo::SessionRepo;
pub use stock_repo::StockRepo;
pub use suspension_repo::SuspensionRepo;
pub use user_repo::UserRepo;
