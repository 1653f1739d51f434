//! Error types for serial-link operations.

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors that can occur while opening or reading the serial link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The underlying device could not be opened.
    #[error("Failed to open {port}: {message}")]
    OpenFailed { port: String, message: String },

    /// An operation was attempted before the link was opened.
    #[error("Link not open")]
    NotOpen,

    /// The link dropped out from under an open handle.
    #[error("Link disconnected: {port}")]
    Disconnected { port: String },

    /// A read primitive failed.
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Create a new open-failed error.
    pub fn open_failed(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(port: impl Into<String>) -> Self {
        Self::Disconnected { port: port.into() }
    }

    /// Create a new read-failed error.
    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::ReadFailed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failed_display() {
        let error = LinkError::open_failed("COM1", "permission denied");
        assert!(matches!(error, LinkError::OpenFailed { .. }));
        assert_eq!(error.to_string(), "Failed to open COM1: permission denied");
    }

    #[test]
    fn test_not_open_display() {
        assert_eq!(LinkError::NotOpen.to_string(), "Link not open");
    }

    #[test]
    fn test_read_failed_display() {
        let error = LinkError::read_failed("device removed");
        assert_eq!(error.to_string(), "Read failed: device removed");
    }

    #[test]
    fn test_disconnected_display() {
        let error = LinkError::disconnected("/dev/ttyUSB0");
        assert_eq!(error.to_string(), "Link disconnected: /dev/ttyUSB0");
    }
}
