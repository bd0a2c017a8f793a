use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("storefront request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("storefront returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("failed to decode storefront response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fragment response has no element matching `{selector}`")]
    FragmentNotFound { selector: String },
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("mount point `{selector}` is not in the document")]
    MountMissing { selector: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CartError {
    /// Transport-level failures: the request never produced a usable body.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CartError::Transport(_) | CartError::Status { .. } | CartError::Decode(_)
        )
    }
}

pub type Result<T, E = CartError> = std::result::Result<T, E>;
