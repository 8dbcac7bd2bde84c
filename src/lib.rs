//! Progressive sphere ray tracer.
//!
//! Spheres are uploaded into a device arena, boxed by a bounds kernel, organised
//! into a two-level QBVH and rendered by a per-pixel ray generation launch into
//! a packed RGBA8 frame buffer.

pub mod math;
pub mod rng;
pub mod collide;
pub mod device;
pub mod bounds;
pub mod spatial;
pub mod world;
pub mod shading;
pub mod camera;
pub mod raygen;
pub mod framebuffer;
pub mod config;
pub mod renderer;
pub mod error;

pub use error::{Error, Result};
pub use renderer::{render, Renderer};
