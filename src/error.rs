use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid print job: {0}")]
    InvalidJob(String),
    #[error("invalid pagination config: {0}")]
    InvalidConfig(String),
    #[error("PDF error: {0}")]
    Pdf(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidJob(e.to_string())
    }
}
