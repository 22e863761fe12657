use thiserror::Error;

/// Result type for fatal verifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a verification job.
///
/// Expected verification findings are never represented here; those are
/// collected as [`crate::problems::Problem`] values in the result. This
/// enum covers only the failures that make the job itself meaningless.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid plugin: {message}")]
    InvalidPlugin { message: String },

    #[error("plugin archive error: {message}")]
    Archive { message: String },

    #[error("verification cancelled")]
    Cancelled,

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("internal verifier error: {message}")]
    Internal { message: String },
}

impl Error {
    pub fn invalid_plugin(message: impl Into<String>) -> Self {
        Self::InvalidPlugin { message: message.into() }
    }

    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}
