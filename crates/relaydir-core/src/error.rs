use thiserror::Error;

/// Error type for the core data layer.
///
/// Remote query failures pass through unchanged from `relaydir-api`;
/// everything else is raised here. No variant is ever retried — failures
/// surface to the caller with the owning store left in its last
/// consistent state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The remote query service reported an error.
    #[error(transparent)]
    Api(#[from] relaydir_api::Error),

    /// A remote write (edge function) failed; `message` is the
    /// server-provided reason, or a generic fallback when absent.
    #[error("{message}")]
    RemoteWrite { message: String },

    /// A store was constructed with an invalid key configuration.
    #[error("store configuration error: {reason}")]
    Configuration { reason: String },

    /// A filter rule carried a malformed value (e.g. a between range
    /// without exactly two elements).
    #[error("invalid filter: {reason}")]
    InvalidFilter { reason: String },

    /// A single-entity fetch matched no row.
    #[error("{what} not found")]
    NotFound { what: String },

    /// A fetched row did not match the expected wire shape.
    #[error("row decoding failed: {message}")]
    Deserialization { message: String },
}
