use super::camera::Camera;
use super::device::Buffer;
use super::framebuffer::pack_rgba8;
use super::rng::HashRng;
use super::shading::{closest_hit, Background};
use super::world::SceneView;

/// Per-launch record of the ray generation program.
#[derive(Clone, Copy, Debug)]
pub struct RayGenData {
    pub frame_buffer: Buffer<u32>,
    pub fb_size: (u32, u32),
    /// Seeds the random streams of this launch. Nothing accumulates across frames.
    pub frame_id: i32,
    pub camera: Camera,
}

/// Miss program record.
#[derive(Clone, Copy, Debug)]
pub struct MissData {
    pub background: Background,
}

/// Ray generation for one pixel: primary ray, closest hit or miss, packed color.
/// Needs a frame buffer at least 2x2.
pub fn ray_gen(x: u32, y: u32, record: &RayGenData, miss: &MissData, scene: &SceneView) -> u32 {
    let (width, height) = record.fb_size;
    let u = x as f32 / (width - 1) as f32;
    let v = y as f32 / (height - 1) as f32;
    let r = record.camera.get_ray(u, v);

    let color = match scene.trace(r, 0.0, f32::MAX) {
        Some(hit) => {
            let mut rng = HashRng::seed(record.frame_id, (x, y), record.fb_size);
            closest_hit(&hit, scene, &miss.background, &mut rng)
        }
        None => miss.background.miss_color(&r),
    };

    pack_rgba8(color)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collide::Sphere;
    use crate::device::Device;
    use crate::framebuffer::unpack_rgba8;
    use crate::math::Vec3;
    use crate::shading::ShadingMode;
    use crate::vec3;
    use crate::world::World;

    #[test]
    fn test_ray_gen_center_and_corner() {
        let mut device = Device::new();
        let mut world = World::new();
        world.add_spheres(&mut device, &[Sphere::new(vec3![0.0, 0.0, -1.0], 0.5)], ShadingMode::Normal).unwrap();
        world.build(&mut device).unwrap();
        let frame_buffer = device.allocate(9, None).unwrap();
        let scene = world.bind(&device).unwrap();

        let record = RayGenData {
            frame_buffer,
            fb_size: (3, 3),
            frame_id: 0,
            camera: Camera::new(Vec3::zero(), 1.0, 2.0, 1.0),
        };
        let miss = MissData { background: Background::Flat(vec3![0.0, 0.0, 0.0]) };

        // Center pixel looks straight at the sphere: normal (0,0,1).
        assert_eq!(unpack_rgba8(ray_gen(1, 1, &record, &miss, &scene)), [128, 128, 255, 255]);
        // Corner looks past it.
        assert_eq!(ray_gen(0, 0, &record, &miss, &scene), 0xff000000);
    }
}
