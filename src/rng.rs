// rng.rs: Per-pixel hashed random stream.
//
// A stream is seeded from (frame, pixel, image size) with a Murmur3 style mix and
// advanced with a 32-bit LCG. It is a plain value: every pixel task owns its own
// copy, nothing is shared between tasks.

use std::f32::consts::PI;

use super::math::*;
use super::vec3;

const LCG_MUL: u32 = 1664525;
const LCG_INC: u32 = 1013904223;

fn murmur_hash3_mix(mut hash: u32, mut k: u32) -> u32 {
    const C1: u32 = 0xcc9e2d51;
    const C2: u32 = 0x1b873593;
    const M: u32 = 5;
    const N: u32 = 0xe6546b64;

    k = k.wrapping_mul(C1);
    k = k.rotate_left(15);
    k = k.wrapping_mul(C2);

    hash ^= k;
    hash.rotate_left(13).wrapping_mul(M).wrapping_add(N)
}

fn murmur_hash3_finalize(mut hash: u32) -> u32 {
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85ebca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2ae35);
    hash ^= hash >> 16;
    hash
}

/// Largest f32 below 1.0.
const ONE_MINUS_ULP: f32 = 1.0 - f32::EPSILON / 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashRng {
    pub state: u32,
}

impl HashRng {
    /// Seeds the stream for one pixel of one frame. Pure: equal inputs give equal streams.
    pub fn seed(frame_id: i32, pixel: (u32, u32), dims: (u32, u32)) -> HashRng {
        let linear = pixel.0.wrapping_add(pixel.1.wrapping_mul(dims.0));
        let mut state = murmur_hash3_mix(0, linear);
        state = murmur_hash3_mix(state, frame_id as u32);
        HashRng { state: murmur_hash3_finalize(state) }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        self.state
    }

    /// Uniform in [0, 1): the next draw scaled by 2^-32.
    pub fn next_f32(&mut self) -> f32 {
        let f = self.next_u32() as f32 * (1.0 / 4294967296.0);
        // Draws within 128 of u32::MAX round up to 2^32.
        if f < 1.0 { f } else { ONE_MINUS_ULP }
    }

    /// Uniform in [min, max).
    pub fn uniform(&mut self, min: f32, max: f32) -> f32 {
        let v = (max - min) * self.next_f32() + min;
        // f32 rounding can land exactly on max for narrow ranges.
        if v < max { v } else { min }
    }

    /// Uniformly distributed point on the unit sphere.
    pub fn random_unit_vector(&mut self) -> Vec3 {
        let theta = 2.0 * PI * self.next_f32();
        let phi = f32::acos(1.0 - 2.0 * self.next_f32());

        normalized(vec3![
            phi.sin() * theta.cos(),
            phi.sin() * theta.sin(),
            phi.cos()
        ])
    }

    /// Unit vector on the same side of the surface as `normal`.
    pub fn random_in_hemisphere(&mut self, normal: Vec3) -> Vec3 {
        let dir = self.random_unit_vector();
        if dot(dir, normal) > 0.0 { dir } else { -dir }
    }
}
