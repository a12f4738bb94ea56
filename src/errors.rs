use thiserror::Error;

/// Top-level client error — every failure the chat and report clients can
/// surface. All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Failed to connect to {url}: {message}")]
    ConnectFailed { url: String, message: String },

    #[error("Timed out connecting to {url} after {seconds}s")]
    ConnectTimeout { url: String, seconds: u64 },

    #[error("Connection closed")]
    ConnectionClosed,

    // ── Protocol errors ──────────────────────────────────────────────────────
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Timed out waiting for the strategy result")]
    ReportTimeout,

    // ── Persistence errors ───────────────────────────────────────────────────
    #[error("Failed to read persisted session state from {path}: {source}")]
    StateLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write persisted session state to {path}: {source}")]
    StateStore {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid persisted session state at {path}: {source}")]
    StateFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not determine a data directory for persisted state")]
    NoStateDir,

    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Unknown role '{0}' (expected 'store' or 'customer')")]
    UnknownRole(String),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidEndpoint { .. }
                | ClientError::ConnectFailed { .. }
                | ClientError::ConnectTimeout { .. }
                | ClientError::ConnectionClosed
        )
    }

    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            ClientError::StateLoad { .. }
                | ClientError::StateStore { .. }
                | ClientError::StateFormat { .. }
                | ClientError::NoStateDir
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectTimeout { .. } | ClientError::ReportTimeout
        )
    }
}
