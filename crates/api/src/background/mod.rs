//! Background jobs.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. All jobs stop when their
//! [`CancellationToken`](tokio_util::sync::CancellationToken) is cancelled.

pub mod due_reminders;
pub mod session_cleanup;
