use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("directory service unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("directory service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed directory response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
