//! Error types for bubble classification and message actions

use thiserror::Error;

/// Errors raised by the accessibility capabilities and by message operations.
///
/// The classification pipeline itself never surfaces these: failed reads are
/// degraded to `none`/`Other`/empty values where they happen. Operations that
/// need a live control (clicks, scrolling, field lookup) return them as-is.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// A requested window or control could not be located
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The underlying UI element vanished between reads
    #[error("Control is stale: {0}")]
    StaleControl(String),

    /// Failure reported by the platform accessibility layer
    #[error("Platform error: {0}")]
    PlatformError(String),

    /// The operation is not available for this kind of message or platform
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Synthetic input could not be delivered
    #[error("Action failed: {0}")]
    ActionFailed(String),

    /// Indexed field lookup on a message record with an unknown key
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutomationError {
    /// True when the error means the control no longer resolves.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            AutomationError::StaleControl(_) | AutomationError::ElementNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AutomationError::FieldNotFound("sender".to_string());
        assert_eq!(err.to_string(), "Field not found: sender");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AutomationError = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(!err.is_stale());
    }

    #[test]
    fn test_stale_classification() {
        assert!(AutomationError::StaleControl("gone".into()).is_stale());
        assert!(AutomationError::ElementNotFound("gone".into()).is_stale());
        assert!(!AutomationError::ActionFailed("click".into()).is_stale());
    }
}
