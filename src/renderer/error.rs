use std::path::PathBuf;

use thiserror::Error;

use super::BufferHandle;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Failed to allocate buffer {label:?} ({size} bytes): {reason}")]
    AllocationFailed {
        label: String,
        size: u64,
        reason: String,
    },
    #[error("Unknown buffer handle {0:?}")]
    UnknownHandle(BufferHandle),
}

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to read texture {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode texture {name:?}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to create texture {name:?} on the device: {reason}")]
    Device { name: String, reason: String },
}

pub type BufferResult<T> = Result<T, BufferError>;
