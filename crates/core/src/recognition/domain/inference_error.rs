use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InferenceErrorKind {
    Network,
    Malformed,
}

/// Failure of a single inference round trip.
///
/// Never surfaced to the operator per tick; the scheduler logs it and keeps
/// the last published result.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("recognizer unreachable at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("recognizer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed recognizer response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl InferenceError {
    pub fn kind(&self) -> InferenceErrorKind {
        match self {
            InferenceError::Transport { .. } | InferenceError::Status { .. } => {
                InferenceErrorKind::Network
            }
            InferenceError::Malformed(_) => InferenceErrorKind::Malformed,
        }
    }
}
