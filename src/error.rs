use thiserror::Error;

/// Error taxonomy shared by every backend.
///
/// Failures are values: every operation on the data layer resolves to a
/// `Result` carrying one of these variants, and adapters never panic on a
/// backend-reported failure. The variant tells a caller bug (`Translation`)
/// from a rejected operation (`Backend`) from a dead connection
/// (`Connection`).
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// Startup configuration is missing or inconsistent. Fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials or network are invalid. Surfaced verbatim, never retried
    /// inside the adapter.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The caller supplied a filter, order, projection, or identifier shape
    /// the adapters do not translate.
    #[error("Translation error: {0}")]
    Translation(String),

    /// The physical backend rejected the operation: constraint violation,
    /// permission denial, timeout.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Begin/commit/rollback plumbing failed.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A row could not be converted to or from the caller's type.
    #[error("Row decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DatastoreError {
    /// Whether this error indicates the backend itself is unreachable.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Whether this error is a caller-side shape problem rather than a
    /// backend failure.
    #[must_use]
    pub fn is_translation(&self) -> bool {
        matches!(self, Self::Translation(_))
    }
}
