use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemexError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("No internet connection")]
    NoConnection,

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("AI service error: {0}")]
    Ai(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bridge protocol error: {0}")]
    Protocol(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Blocked(String),

    #[error("You saved this {0}.")]
    AlreadySaved(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, MemexError>;
