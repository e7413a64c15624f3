use thiserror::Error;

pub type Result<T> = std::result::Result<T, WikiError>;

#[derive(Error, Debug)]
pub enum WikiError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid article reference: {0}")]
    MalformedReference(String),

    #[error("Timed out waiting on {0}")]
    Timeout(String),

    #[error("No walk completed after {0} attempts")]
    RetriesExhausted(u32),
}

impl From<reqwest::Error> for WikiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            WikiError::Timeout("upstream request".to_string())
        } else {
            WikiError::UpstreamUnavailable(error.to_string())
        }
    }
}

impl From<serde_json::Error> for WikiError {
    fn from(error: serde_json::Error) -> Self {
        WikiError::UpstreamUnavailable(format!("unreadable response: {error}"))
    }
}
