//! I/O helpers for persistence: error classification and retries.

use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::error::DbError;

/// Maps an I/O error onto the persistence error variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> DbError {
    let message = format!("{}: {}", context, error);
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => DbError::DiskFull(message),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            DbError::TransientIoError(message)
        }
        _ => DbError::IoError(message),
    }
}

/// Builds the context string used in I/O error messages.
pub fn io_context(action: &str, path: &Path) -> String {
    format!("Failed to {} '{}'", action, path.display())
}

/// Runs `operation`, retrying only on `TransientIoError`.
///
/// At most `max_retries` retries follow the first attempt, each preceded by
/// a sleep of `retry_delay_ms`.
pub fn retry_io_operation<F, T>(
    operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, DbError>
where
    F: Fn() -> Result<T, DbError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Err(err @ DbError::TransientIoError(_)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    err
                );
                if retry_delay_ms > 0 {
                    thread::sleep(Duration::from_millis(retry_delay_ms));
                }
            }
            result => return result,
        }
    }
}
