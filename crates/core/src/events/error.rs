use thiserror::Error;

/// Errors that can occur when reading from or subscribing to the game
/// service's event log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventSourceError {
    #[error("Event source unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid page request: {0}")]
    InvalidPage(String),
    #[error("Subscription stream closed: {0}")]
    StreamClosed(String),
}

/// Result type for event source operations.
pub type Result<T> = std::result::Result<T, EventSourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display() {
        let error = EventSourceError::Unavailable("connrefused".to_string());
        assert_eq!(error.to_string(), "Event source unavailable: connrefused");
    }

    #[test]
    fn test_invalid_page_display() {
        let error = EventSourceError::InvalidPage("bad token".to_string());
        assert_eq!(error.to_string(), "Invalid page request: bad token");
    }

    #[test]
    fn test_stream_closed_display() {
        let error = EventSourceError::StreamClosed("lagged".to_string());
        assert_eq!(error.to_string(), "Subscription stream closed: lagged");
    }
}
