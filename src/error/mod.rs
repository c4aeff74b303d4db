//! Program wide error type

use std::fmt;

/// A render failure, carried as an HTTP-status-like code plus a message.
/// The resolver itself only ever raises 500-class errors; the content
/// store and page identity validation use the 4xx constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    pub status: u16,
    pub message: String,
}

impl PageError {
    pub fn internal(message: impl Into<String>) -> PageError {
        PageError {
            status: 500,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> PageError {
        PageError {
            status: 400,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> PageError {
        PageError {
            status: 404,
            message: message.into(),
        }
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for PageError {}
