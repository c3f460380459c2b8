use thiserror::Error;

use crate::types::{Dimensions, Plane};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to allocate {bytes} bytes for the {plane} buffer")]
    Allocation { plane: Plane, bytes: usize },
    #[error("invalid plane dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("{plane} surface is {actual} but its buffer is {expected}")]
    SurfaceMismatch {
        plane: Plane,
        expected: Dimensions,
        actual: Dimensions,
    },
    #[error("device failed to start (status {status})")]
    ConnectFailed { status: i32 },
    #[error("device is already connected")]
    AlreadyConnected,
    #[error("storage path contains an interior nul byte")]
    InvalidStoragePath,
}

/// A refill that did not produce a usable frame. The bridge skips the
/// surface update for that plane and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefillError {
    #[error("{plane} buffer holds {actual} bytes but the device writes {required}")]
    BufferTooSmall {
        plane: Plane,
        required: usize,
        actual: usize,
    },
    #[error("{plane} refill failed: {reason}")]
    Device { plane: Plane, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{plane} dimensions {dims} are not usable")]
    Dimensions { plane: Plane, dims: Dimensions },
}
