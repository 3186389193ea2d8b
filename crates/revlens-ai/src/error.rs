use thiserror::Error;

/// Failure talking to a hosted inference service.
///
/// Always wrapped in a `ReviewError` before leaving this crate; kept separate so
/// the HTTP status and body survive in the error message.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl AdapterError {
    /// Turn a non-2xx response into [`AdapterError::Server`].
    pub(crate) async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Self> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Self::Server {
            status: status.as_u16(),
            body,
        })
    }
}
