//! Error types for the Triframe engine
//!
//! Every fatal condition of the client (device selection, resource creation,
//! drawable acquisition) is reported through this single enum.

use std::fmt;

/// Result type for Triframe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Triframe engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, framebuffer, pipeline, etc.)
    InvalidResource(String),

    /// Initialization failed (device, swapchain, initial resources)
    InitializationFailed(String),

    /// No discrete or integrated GPU could be found
    DeviceNotFound,

    /// The swapchain could not provide a presentable image
    DrawableUnavailable(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::DeviceNotFound => write!(f, "No GPU detected"),
            Error::DrawableUnavailable(msg) => write!(f, "Drawable unavailable: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
