//! Error types for ghkit-sync.

use thiserror::Error;

use ghkit_core::StoreError;
use ghkit_gateway::GatewayError;

/// All errors that can arise from collection, generation, drift detection
/// and refresh. Every variant is terminal for the operation in progress.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required identifier is missing or malformed; no remote call was made.
    #[error("usage error: {0}")]
    Usage(String),

    /// A remote query failed; propagated verbatim.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The snapshot store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Data that must be unique or ordered was not.
    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("workspace '{login}' is already initialized; use refresh instead")]
    AlreadyInitialized { login: String },

    #[error("workspace '{login}' is not initialized; run init first")]
    NotInitialized { login: String },

    /// Pagination ran past the configured page bound.
    #[error("pagination exceeded {limit} pages; raise max_pages or narrow the query")]
    PageLimit { limit: u32 },
}
