//! Error types for immediate_gfx
//!
//! Every fallible operation in the core and in the backends returns
//! [`Result`]. Backend failures arrive as [`Error::BackendError`] and are
//! treated as fatal by applications; usage errors the core can detect cheaply
//! arrive as [`Error::InvalidState`] or [`Error::InvalidResource`].

use std::fmt;

/// Result type for immediate_gfx operations
pub type Result<T> = std::result::Result<T, Error>;

/// immediate_gfx errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (a failed Vulkan call, a lost device, ...)
    BackendError(String),

    /// Out of GPU memory, or out of room in a fixed arena
    OutOfMemory,

    /// Invalid resource (stale handle, wrong format for the role, out of range write)
    InvalidResource(String),

    /// Initialization failed (device bootstrap, swapchain, window)
    InitializationFailed(String),

    /// Operation called in a state where it is not legal
    InvalidState(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
