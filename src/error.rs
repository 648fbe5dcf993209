use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitmateError {
    #[error("Login response did not include a token")]
    MissingToken,
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Encryption error: {0}")]
    Crypto(String),
}

impl From<sled::Error> for SplitmateError {
    fn from(err: sled::Error) -> Self {
        SplitmateError::Storage(err.to_string())
    }
}
