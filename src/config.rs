//! Compiled-in render settings and the progressive sequence of renderers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::collide::Sphere;
use super::math::*;
use super::shading::{Background, ShadingMode};
use super::vec3;

pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_ASPECT_RATIO: f32 = 16.0 / 9.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 2.0;
pub const DEFAULT_FOCAL_LENGTH: f32 = 1.0;

/// The renderer a run of the binary uses, and where its image goes.
pub const OUTPUT_VARIANT: Variant = Variant::Diffuse;
pub const OUTPUT_PATH: &str = "test.png";

/// Seed for the generated sphere field, fixed so every run renders the same scene.
const SPHERE_FIELD_SEED: u64 = 0x5EED_F1E1D;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub camera_origin: Vec3,
    pub viewport_height: f32,
    pub focal_length: f32,
    /// Seeds the per-pixel random streams; one value per launch.
    pub frame_id: i32,
    pub background: Background,
}

impl Default for RenderSettings {
    fn default() -> RenderSettings {
        RenderSettings::new(DEFAULT_WIDTH, DEFAULT_ASPECT_RATIO)
    }
}

impl RenderSettings {
    /// Height follows from width and aspect ratio.
    pub fn new(width: u32, aspect_ratio: f32) -> RenderSettings {
        RenderSettings {
            width,
            height: (width as f32 / aspect_ratio) as u32,
            camera_origin: Vec3::zero(),
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            focal_length: DEFAULT_FOCAL_LENGTH,
            frame_id: 0,
            background: Background::default(),
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// One bottom-level geometry of a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryDesc {
    pub spheres: Vec<Sphere>,
    pub shading: ShadingMode,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDesc {
    pub geometries: Vec<GeometryDesc>,
}

impl SceneDesc {
    pub fn sphere_count(&self) -> usize {
        self.geometries.iter().map(|g| g.spheres.len()).sum()
    }
}

/// The renderers in order of capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Background,
    SingleSphere,
    SphereField,
    Instanced,
    Diffuse,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Variant::Background,
        Variant::SingleSphere,
        Variant::SphereField,
        Variant::Instanced,
        Variant::Diffuse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variant::Background => "background",
            Variant::SingleSphere => "single_sphere",
            Variant::SphereField => "sphere_field",
            Variant::Instanced => "instanced",
            Variant::Diffuse => "diffuse",
        }
    }

    pub fn settings(self) -> RenderSettings {
        RenderSettings::default()
    }

    pub fn scene(self) -> SceneDesc {
        match self {
            Variant::Background => SceneDesc::default(),
            Variant::SingleSphere => SceneDesc {
                geometries: vec![GeometryDesc {
                    spheres: vec![Sphere::new(vec3![0.0, 0.0, -1.0], 0.5)],
                    shading: ShadingMode::Normal,
                }],
            },
            Variant::SphereField => SceneDesc {
                geometries: vec![GeometryDesc { spheres: sphere_field(), shading: ShadingMode::Normal }],
            },
            Variant::Instanced => instanced_scene(),
            Variant::Diffuse => SceneDesc {
                geometries: vec![GeometryDesc { spheres: sphere_field(), shading: ShadingMode::HemisphereScatter }],
            },
        }
    }
}

fn push_sphere(objects: &mut Vec<Sphere>, center: Vec3, radius: f32) {
    objects.push(Sphere::new(center, radius));
}

/// Ground sphere, one large sphere in view and a grid of small jittered ones.
fn sphere_field() -> Vec<Sphere> {
    let mut rng = StdRng::seed_from_u64(SPHERE_FIELD_SEED);
    let mut objects = Vec::new();

    push_sphere(&mut objects, vec3![0.0, -100.5, -1.0], 100.0);
    push_sphere(&mut objects, vec3![0.0, 0.0, -1.0], 0.5);

    for a in -5..5 {
        for b in -6..-1 {
            let center = vec3![
                a as f32 * 0.6 + rng.gen_range(0.0..0.3),
                -0.4,
                b as f32 * 0.6 + rng.gen_range(0.0..0.3)
            ];
            // Keep clear of the big sphere.
            if length(center - vec3![0.0, 0.0, -1.0]) > 0.7 {
                push_sphere(&mut objects, center, 0.1);
            }
        }
    }

    objects
}

/// Three geometries, each its own bottom level.
fn instanced_scene() -> SceneDesc {
    let ground = GeometryDesc {
        spheres: vec![Sphere::new(vec3![0.0, -100.5, -1.0], 100.0)],
        shading: ShadingMode::Normal,
    };
    let left = GeometryDesc {
        spheres: vec![Sphere::new(vec3![-1.0, 0.0, -1.0], 0.5), Sphere::new(vec3![-1.0, 0.7, -1.5], 0.25)],
        shading: ShadingMode::Normal,
    };
    let right = GeometryDesc {
        spheres: vec![Sphere::new(vec3![1.0, 0.0, -1.0], 0.5), Sphere::new(vec3![0.0, 0.0, -1.5], 0.4)],
        shading: ShadingMode::Normal,
    };
    SceneDesc { geometries: vec![ground, left, right] }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = RenderSettings::default();
        assert_eq!((s.width, s.height), (400, 225));
        assert_eq!(s.camera_origin, Vec3::zero());
        assert!((s.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_variant_scenes() {
        assert_eq!(Variant::Background.scene().sphere_count(), 0);
        assert_eq!(Variant::SingleSphere.scene().sphere_count(), 1);
        assert_eq!(Variant::Instanced.scene().geometries.len(), 3);

        let field = Variant::SphereField.scene();
        assert_eq!(field.geometries.len(), 1);
        assert!(field.sphere_count() > 10);
        assert!(field.geometries[0].spheres.iter().all(|s| s.is_valid()));
        // Generated from a fixed seed.
        assert_eq!(field, Variant::SphereField.scene());

        let diffuse = Variant::Diffuse.scene();
        assert_eq!(diffuse.geometries[0].shading, ShadingMode::HemisphereScatter);
        assert_eq!(diffuse.geometries[0].spheres, field.geometries[0].spheres);
    }

    #[test]
    fn test_variant_names_are_unique() {
        let mut names: Vec<&str> = Variant::ALL.iter().map(|v| v.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Variant::ALL.len());
    }
}
