//! Error types for permflow

/// The main error type for permflow operations
#[derive(Debug, Clone)]
pub struct PermError(pub String);

impl std::fmt::Display for PermError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PermError {}

/// Result type alias for permflow operations
pub type Result<T> = std::result::Result<T, PermError>;

/// Convert any error to PermError
pub fn err<E: std::error::Error>(e: E) -> PermError {
    PermError(e.to_string())
}
