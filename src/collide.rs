use super::math::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis { X, Y, Z }

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Ray {
        Ray { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Closest hit reported by the acceleration structure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitRecord {
    pub point: Vec3,
    /// Outward surface normal, unit length.
    pub normal: Vec3,
    pub t: f32,
    /// Geometry the hit primitive belongs to.
    pub geometry: usize,
    /// Primitive index inside that geometry.
    pub prim: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    /// Inverted box; merging anything into it yields that thing.
    pub const EMPTY: AABB = AABB {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    pub fn longest_axis(&self) -> Axis {
        let d =  self.max - self.min;
        if (d.x > d.y) && (d.x > d.z) {
            Axis::X
        }
        else if d.y > d.z {
            Axis::Y
        }
        else {
            Axis::Z
        }
    }

    pub fn get_center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn min_at_axis(&self, axis: Axis) -> f32 {
        self.min.at(axis as usize)
    }

    pub fn max_at_axis(&self, axis: Axis) -> f32 {
        self.max.at(axis as usize)
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn merge(a: &AABB, b: &AABB) -> AABB {
        AABB { min: a.min.min(&b.min), max: a.max.max(&b.max) }
    }
}

impl Default for AABB {
    fn default() -> AABB {
        AABB::EMPTY
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Sphere {
        Sphere { center, radius }
    }

    pub fn calc_aabb(&self) -> AABB {
        AABB {
            min: self.center - self.radius,
            max: self.center + self.radius,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite() && self.radius > 0.0
    }
}

/// Where a ray meets a sphere, before it is tagged with geometry ids.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereHit {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Analytic ray/sphere test. Returns the nearest root inside `[t_min, t_max]`.
pub fn hit_sphere(r: Ray, center: Vec3, radius: f32, t_min: f32, t_max: f32) -> Option<SphereHit> {
    let oc = r.origin - center;
    let a = dot(r.direction, r.direction);
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * dot(oc, r.direction);
    let c = dot(oc, oc) - radius * radius;

    // b^2 - 4ac, written as 4a(r^2 - |l|^2) with l the part of oc orthogonal to
    // the ray. Same value, but no cancellation for small distant spheres.
    let l = oc - r.direction * (dot(oc, r.direction) / a);
    let discriminant = 4.0 * a * (radius * radius - dot(l, l));
    if discriminant < 0.0 {
        return None;
    }

    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    let (t1, t2) = if q == 0.0 {
        (0.0, 0.0)
    }
    else {
        let (ta, tb) = (q / a, c / q);
        if ta <= tb { (ta, tb) } else { (tb, ta) }
    };

    let t = if t1 >= t_min && t1 <= t_max {
        t1
    }
    else if t2 >= t_min && t2 <= t_max {
        t2
    }
    else {
        return None;
    };

    let point = r.at(t);
    Some(SphereHit { t, point, normal: (point - center) / radius })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::test::assert_nearly_eq;
    use crate::vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_sphere(rng: &mut StdRng) -> Sphere {
        Sphere::new(
            vec3![rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)],
            rng.gen_range(0.05..3.0),
        )
    }

    #[test]
    fn test_sphere_aabb() {
        let s = Sphere::new(vec3![1.0, -2.0, 3.0], 0.5);
        let b = s.calc_aabb();
        assert_eq!(b.min, vec3![0.5, -2.5, 2.5]);
        assert_eq!(b.max, vec3![1.5, -1.5, 3.5]);
        assert_eq!(b.get_center(), s.center);
    }

    #[test]
    fn test_aabb_merge_and_axis() {
        let a = AABB { min: vec3![0.0], max: vec3![1.0] };
        let b = AABB { min: vec3![-1.0, 0.5, 0.0], max: vec3![4.0, 1.0, 2.0] };
        let m = AABB::merge(&a, &b);
        assert_eq!(m.min, vec3![-1.0, 0.0, 0.0]);
        assert_eq!(m.max, vec3![4.0, 1.0, 2.0]);
        assert_eq!(m.longest_axis(), Axis::X);
        assert_eq!(AABB::merge(&AABB::EMPTY, &b), b);
        assert!(!AABB::EMPTY.is_valid());
    }

    #[test]
    fn test_hit_sphere_front() {
        let r = Ray::new(vec3![0.0], vec3![0.0, 0.0, -1.0]);
        let hit = hit_sphere(r, vec3![0.0, 0.0, -1.0], 0.5, 0.0, f32::MAX).unwrap();
        assert_nearly_eq!(hit.t, 0.5);
        assert_eq!(hit.normal, vec3![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_hit_sphere_takes_far_root_from_inside() {
        let r = Ray::new(vec3![0.0, 0.0, -1.0], vec3![0.0, 0.0, -1.0]);
        let hit = hit_sphere(r, vec3![0.0, 0.0, -1.0], 0.5, 0.001, f32::MAX).unwrap();
        assert_nearly_eq!(hit.t, 0.5);
        // Normal stays outward when leaving the sphere.
        assert_eq!(hit.normal, vec3![0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_hit_sphere_interval() {
        let r = Ray::new(vec3![0.0], vec3![0.0, 0.0, -1.0]);
        let center = vec3![0.0, 0.0, -1.0];
        assert!(hit_sphere(r, center, 0.5, 0.0, 0.4).is_none());
        assert!(hit_sphere(r, center, 0.5, 1.6, 10.0).is_none());
        let far = hit_sphere(r, center, 0.5, 0.6, 10.0).unwrap();
        assert_nearly_eq!(far.t, 1.5);
    }

    #[test]
    fn test_hit_sphere_surface_origin_needs_epsilon() {
        let center = vec3![0.0, 0.0, -1.0];
        let on_surface = vec3![0.0, 0.0, -0.5];
        let outward = Ray::new(on_surface, vec3![0.0, 1.0, 1.0]);
        assert!(hit_sphere(outward, center, 0.5, 0.0, f32::MAX).is_some());
        assert!(hit_sphere(outward, center, 0.5, 1e-3, f32::MAX).is_none());
    }

    #[test]
    fn test_rays_aimed_at_spheres_hit_on_surface() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..1_000 {
            let s = random_sphere(&mut rng);
            let dir = normalized(vec3![rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)]);
            let origin = s.center - dir * (s.radius + rng.gen_range(0.1..20.0));
            let target = s.center + vec3![rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5)] * s.radius;
            let r = Ray::new(origin, target - origin);

            let hit = hit_sphere(r, s.center, s.radius, 0.0, f32::MAX).expect("aimed ray must hit");
            // Absolute error grows with the coordinates involved.
            let tol = 1e-4 * f32::max(1.0, length(origin));
            assert!(hit.t > 0.0);
            assert_nearly_eq!(hit.normal.length(), 1.0, tol / s.radius);
            assert_nearly_eq!(length(hit.point - s.center), s.radius, tol);
        }
    }

    #[test]
    fn test_rays_passing_wide_miss() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let s = random_sphere(&mut rng);
            let dir = normalized(vec3![rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 1.0]);
            let side = normalized(cross(dir, vec3![0.0, 1.0, 0.0]));
            // Closest approach to the center is radius + gap.
            let closest = s.center + side * (s.radius + rng.gen_range(0.01..5.0));
            let origin = closest - dir * rng.gen_range(1.0..30.0);
            let r = Ray::new(origin, dir);
            assert!(hit_sphere(r, s.center, s.radius, f32::MIN, f32::MAX).is_none());
        }
    }
}
