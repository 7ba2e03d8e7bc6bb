use thiserror::Error;

/// Top-level error type for the `relaydir-api` crate.
///
/// Covers transport failures, query endpoint errors, row decoding, and
/// edge-function invocation. `relaydir-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The base URL cannot carry endpoint path segments (e.g. a
    /// cannot-be-a-base URL like `data:`).
    #[error("Invalid URL: cannot extend '{base}' with '{path}'")]
    InvalidUrl { base: String, path: String },

    // ── Query endpoint ──────────────────────────────────────────────
    /// The query endpoint answered with a non-success status.
    ///
    /// The message is a truncated preview of the response body; the store
    /// layer leaves its state untouched when this surfaces.
    #[error("Query API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded as a row array.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String },

    // ── Edge functions ──────────────────────────────────────────────
    /// An edge-function invocation failed. The raw body is preserved so
    /// the caller can extract the server-provided `{error: ...}` message.
    #[error("Edge function '{name}' failed (HTTP {status})")]
    EdgeFunction {
        name: String,
        status: u16,
        body: String,
    },
}
