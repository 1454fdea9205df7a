use thiserror::Error;

/// Errors from running the callback relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to bind callback relay to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Callback relay stopped: {0}")]
    Serve(#[from] std::io::Error),
}
