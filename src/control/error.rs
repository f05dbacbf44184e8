use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("request to control server failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("control server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("only the station administrator may delete archived scans")]
    NotAdmin,
    #[error("unexpected control server reply: {0}")]
    Unexpected(String),
}

pub type ControlResult<T> = Result<T, ControlError>;
