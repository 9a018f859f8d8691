/// Errors returned by a pipeline stage collaborator.
///
/// The `Display` text is what ends up in a failed campaign's
/// `error_message`, so variants keep it short and user-facing.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Collaborator-reported failure; displays the bare message.
    #[error("{0}")]
    Failed(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream service returned a non-2xx status code.
    #[error("Upstream API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The upstream response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stage '{stage}' timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
