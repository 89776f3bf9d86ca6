use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RegexError {
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("compiled pattern exceeds size limit: {pattern}")]
    TooLarge { pattern: String },
}
