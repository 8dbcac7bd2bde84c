//! Error type shared by the host side of the renderer.
//!
//! Kernels never fail. Everything that can go wrong is caught on the host
//! before or around a dispatch, and a failed dispatch produces no output.

use thiserror::Error;

use crate::world::BuildState;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The handle was never allocated or has been released.
    #[error("invalid buffer handle: {0}")]
    InvalidHandle(u64),

    /// The handle refers to a buffer of another element type.
    #[error("buffer {handle} does not hold elements of type {expected}")]
    TypeMismatch { handle: u64, expected: &'static str },

    /// More primitives than a packed node index can address.
    #[error("too many primitives: {count} (max {max})")]
    TooManyPrimitives { count: usize, max: usize },

    /// Two buffers that must be index-aligned are not.
    #[error("length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Acceleration structure used before the required build phase ran.
    #[error("acceleration structure is not ready: needs {needed:?}, currently {current:?}")]
    NotBuilt { needed: BuildState, current: BuildState },

    /// Geometry id does not name a registered geometry.
    #[error("unknown geometry id {0}")]
    UnknownGeometry(usize),

    /// Sphere centers must be finite.
    #[error("sphere {index} has non-finite center {center:?}")]
    InvalidCenter { index: usize, center: crate::math::Vec3 },

    /// Spheres need a finite, strictly positive radius.
    #[error("sphere {index} has invalid radius {radius}")]
    InvalidRadius { index: usize, radius: f32 },

    /// Image must be at least 2x2 so that `x / (width - 1)` is defined.
    #[error("degenerate image size {width}x{height}")]
    DegenerateImage { width: u32, height: u32 },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
