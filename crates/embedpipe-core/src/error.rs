use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Input must be a JSON array of strings")]
    NotAnArray,

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, Error>;
