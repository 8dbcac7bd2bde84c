use super::collide::Ray;
use super::math::*;
use super::vec3;

/// Pinhole camera looking down -z with +y up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    pub horizontal: Vec3,
    pub vertical: Vec3,
    pub lower_left_corner: Vec3,
}

impl Camera {
    pub fn new(origin: Vec3, aspect_ratio: f32, viewport_height: f32, focal_length: f32) -> Camera {
        let horizontal = vec3![aspect_ratio * viewport_height, 0.0, 0.0];
        let vertical = vec3![0.0, viewport_height, 0.0];

        Camera {
            origin,
            horizontal,
            vertical,
            lower_left_corner: origin - horizontal / 2.0 - vertical / 2.0 - vec3![0.0, 0.0, focal_length],
        }
    }

    /// Ray through the viewport point `(u, v)`, both in [0, 1] from the lower left corner.
    pub fn get_ray(&self, u: f32, v: f32) -> Ray {
        Ray::new(
            self.origin,
            self.lower_left_corner + u * self.horizontal + v * self.vertical - self.origin
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_camera_frame() {
        let cam = Camera::new(Vec3::zero(), 16.0 / 9.0, 2.0, 1.0);
        assert_eq!(cam.vertical, vec3![0.0, 2.0, 0.0]);
        assert!((cam.horizontal.x - 32.0 / 9.0).abs() < 1e-6);
        assert!((cam.lower_left_corner.x + 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(cam.lower_left_corner.y, -1.0);
        assert_eq!(cam.lower_left_corner.z, -1.0);
    }

    #[test]
    fn test_center_ray_looks_down_minus_z() {
        let cam = Camera::new(Vec3::zero(), 2.0, 2.0, 1.0);
        let r = cam.get_ray(0.5, 0.5);
        assert_eq!(r.origin, Vec3::zero());
        assert_eq!(r.direction, vec3![0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_corner_rays() {
        let origin = vec3![1.0, 2.0, 3.0];
        let cam = Camera::new(origin, 1.5, 2.0, 0.5);
        assert_eq!(cam.get_ray(0.0, 0.0).direction, vec3![-1.5, -1.0, -0.5]);
        assert_eq!(cam.get_ray(1.0, 1.0).direction, vec3![1.5, 1.0, -0.5]);
        assert_eq!(cam.get_ray(1.0, 1.0).origin, origin);
    }
}
