//! Error handling.
//!
//! Most things that can go wrong while translating drawings into PDF are either
//! related to the inputs (fonts that can't be embedded, images that can't be
//! decoded, geometry that degenerates under a transform) or to the output sink.
//! This module provides the error type that covers all of them.

use thiserror::Error;

/// A wrapper type for pdf-canvas errors.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// An error in pdf-canvas.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// A font couldn't be read or embedded.
    #[error("font error: {0}")]
    Font(String),
    /// An image couldn't be decoded or encoded.
    #[error("image error: {0}")]
    Image(String),
    /// A path couldn't be transformed or serialized.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Writing the finished document failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
