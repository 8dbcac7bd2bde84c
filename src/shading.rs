use super::collide::*;
use super::math::*;
use super::rng::HashRng;
use super::vec3;
use super::world::SceneView;

/// Scatter rays start on the surface they leave; hits closer than this are
/// the surface itself.
pub const SCATTER_T_MIN: f32 = 1e-3;

/// Energy kept by a diffuse bounce.
const SCATTER_ATTENUATION: f32 = 0.5;

/// Closest-hit program attached to a geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingMode {
    /// Visualize the surface normal as a color.
    Normal,
    /// One diffuse bounce towards a random direction above the surface.
    HemisphereScatter,
}

/// Miss program record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Background {
    /// Vertical blend from `bottom` (looking down) to `top` (looking up).
    Gradient { bottom: Vec3, top: Vec3 },
    Flat(Vec3),
}

impl Default for Background {
    fn default() -> Background {
        Background::Gradient { bottom: vec3![1.0, 1.0, 1.0], top: vec3![0.5, 0.7, 1.0] }
    }
}

impl Background {
    pub fn miss_color(&self, r: &Ray) -> Vec3 {
        match *self {
            Background::Gradient { bottom, top } => {
                let unit_dir = normalized(r.direction);
                let t = 0.5 * (unit_dir.y + 1.0);
                lerp(bottom, top, t)
            }
            Background::Flat(color) => color,
        }
    }
}

pub fn normal_color(normal: Vec3) -> Vec3 {
    0.5 * (normal + 1.0)
}

/// Closest-hit dispatch. `rng` is the calling pixel's own stream.
pub fn closest_hit(hit: &HitRecord, scene: &SceneView, background: &Background, rng: &mut HashRng) -> Vec3 {
    match scene.shading(hit.geometry) {
        ShadingMode::Normal => normal_color(hit.normal),
        ShadingMode::HemisphereScatter => {
            let scattered = Ray::new(hit.point, rng.random_in_hemisphere(hit.normal));
            match scene.trace(scattered, SCATTER_T_MIN, f32::MAX) {
                Some(_) => Vec3::zero(),
                None => SCATTER_ATTENUATION * background.miss_color(&scattered),
            }
        }
    }
}
