use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpNextError {
    /// Library lookup or write matched nothing. Normal outcome, logged at debug.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

pub type UpNextResult<T> = Result<T, UpNextError>;

impl UpNextError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Errors that should never surface above trace/debug level.
    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
