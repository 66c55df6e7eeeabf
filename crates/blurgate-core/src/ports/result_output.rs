//! Output port for writing check records.

use crate::domain::CheckRecord;

/// Port for emitting one record per checked image.
pub trait ResultOutput: Send + Sync {
    /// Writes a single check record.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, record: &CheckRecord) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
