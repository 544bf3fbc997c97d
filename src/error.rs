use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentError>;

/// Failures surfaced by the content gateway and the cache in front of it.
///
/// Must stay `Clone`: a shared in-flight fetch hands the same outcome to
/// every caller attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("Article not found: {id}")]
    NotFound { id: String },

    #[error("Gateway error{}: {}", status_suffix(.status), .message)]
    Gateway { status: Option<u16>, message: String },

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Invalid article: {0}")]
    Invalid(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

impl ContentError {
    pub fn gateway(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Gateway {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for ContentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            // Body arrived but could not be parsed
            Self::gateway(err.status().map(|s| s.as_u16()), err.to_string())
        } else {
            Self::Fetch(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        Self::gateway(None, format!("malformed payload: {}", err))
    }
}
