use std::io;

use thiserror::Error;

/// Failure starting or running the HTTP listener.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] io::Error),
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}
