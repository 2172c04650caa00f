//! Error types for ghkit-gateway.

use thiserror::Error;

/// Everything that can go wrong between building a query and holding a typed
/// response. Callers propagate these verbatim; nothing here is retried.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The `gh` binary could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `gh` ran but exited unsuccessfully without a GraphQL payload.
    #[error("`{program}` failed (status {status}): {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    /// The GraphQL endpoint answered with a non-success HTTP status.
    #[error("HTTP {status} from GraphQL endpoint: {message}")]
    Http { status: u16, message: String },

    /// Connection, TLS or timeout failure below HTTP.
    #[error("transport error: {0}")]
    Transport(String),

    /// No token found for the HTTP transport.
    #[error("no API token: set GH_TOKEN or GITHUB_TOKEN, or use the gh transport")]
    MissingToken,

    /// The response carried a top-level `errors` array.
    #[error("GraphQL error: {}", .0.join("; "))]
    Graphql(Vec<String>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The addressed owner, project or repository does not exist (or is not visible).
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The payload parsed but is not shaped like the query asked for.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}
