//! Error types shared by every docpanel crate

use thiserror::Error;

/// docpanel error
#[derive(Debug, Error)]
pub enum PanelError {
    /// A required request field is missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing store cannot be reached or opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// The addressed document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other failure inside the store
    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PanelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PanelError::Validation(msg.into())
    }

    /// Stable machine-readable code, used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            PanelError::Validation(_) => "VALIDATION_ERROR",
            PanelError::Connection(_) => "CONNECTION_ERROR",
            PanelError::NotFound(_) => "NOT_FOUND",
            PanelError::Store(_) | PanelError::Serialization(_) | PanelError::Io(_) => {
                "STORE_ERROR"
            }
        }
    }

    /// The message without the kind prefix
    pub fn message(&self) -> String {
        match self {
            PanelError::Validation(msg)
            | PanelError::Connection(msg)
            | PanelError::NotFound(msg)
            | PanelError::Store(msg) => msg.clone(),
            PanelError::Serialization(e) => e.to_string(),
            PanelError::Io(e) => e.to_string(),
        }
    }

    /// Rebuild an error from a code and message received over the wire
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "VALIDATION_ERROR" => PanelError::Validation(message),
            "CONNECTION_ERROR" => PanelError::Connection(message),
            "NOT_FOUND" => PanelError::NotFound(message),
            _ => PanelError::Store(message),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PanelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PanelError::validation("x").code(), "VALIDATION_ERROR");
        assert_eq!(PanelError::Connection("x".into()).code(), "CONNECTION_ERROR");
        assert_eq!(PanelError::NotFound("1".into()).code(), "NOT_FOUND");
        assert_eq!(PanelError::validation("bad name").message(), "bad name");
        assert!(matches!(
            PanelError::from_code("NOT_FOUND", "7"),
            PanelError::NotFound(ref id) if id == "7"
        ));
        assert!(matches!(PanelError::from_code("???", "x"), PanelError::Store(_)));
        assert_eq!(PanelError::Store("x".into()).code(), "STORE_ERROR");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(PanelError::from(io).code(), "STORE_ERROR");
    }

    #[test]
    fn test_error_display() {
        let err = PanelError::NotFound("no document with _id 'abc'".to_string());
        assert_eq!(err.to_string(), "Not found: no document with _id 'abc'");
    }
}
