use std::path::Path;

use tracing::info;

use super::error::Result;
use super::math::*;

/// Tone maps a linear color to packed RGBA8: red in the low byte, alpha 255.
pub fn pack_rgba8(color: Vec3) -> u32 {
    let to_byte = |c: f32| (clamp(c, 0.0, 1.0) * 255.0).round() as u32;
    to_byte(color.x) | (to_byte(color.y) << 8) | (to_byte(color.z) << 16) | (255 << 24)
}

pub fn unpack_rgba8(pixel: u32) -> [u8; 4] {
    pixel.to_le_bytes()
}

/// Row-major packed pixels; index `y * width + x` is pixel `(x, y)`, row 0 at the
/// bottom of the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

/// Number of pixels in a `width` x `height` image, without u32 overflow.
pub fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> FrameBuffer {
        debug_assert_eq!(pixels.len(), pixel_count(width, height));
        FrameBuffer { width, height, pixels }
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// RGBA bytes with the top of the view first, the order image files expect.
    pub fn to_rgba_top_down(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for row in self.pixels.chunks(self.width as usize).rev() {
            for &p in row {
                bytes.extend_from_slice(&unpack_rgba8(p));
            }
        }
        bytes
    }

    /// Writes the image losslessly; the format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        image::save_buffer(path, &self.to_rgba_top_down(), self.width, self.height, image::ColorType::Rgba8)?;
        info!(path = %path.display(), width = self.width, height = self.height, "saved frame");
        Ok(())
    }
}
