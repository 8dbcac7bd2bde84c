use tracing::debug;

use super::collide::*;
use super::device::{Buffer, Device};
use super::error::{Error, Result};
use super::math::*;

/// Launch record for the bounds stage: index-aligned sphere arrays in, one box per sphere out.
#[derive(Clone, Copy, Debug)]
pub struct SphereBoundsData {
    pub centers: Buffer<Vec3>,
    pub radii: Buffer<f32>,
    pub aabbs: Buffer<AABB>,
}

/// Bounds kernel, invoked once per sphere index.
pub fn sphere_bounds(index: usize, centers: &[Vec3], radii: &[f32]) -> AABB {
    Sphere::new(centers[index], radii[index]).calc_aabb()
}

/// Runs the bounds stage over every sphere of `record` and stores the boxes.
/// The boxes are complete when this returns.
#[tracing::instrument(skip_all, fields(spheres = record.centers.len()))]
pub fn dispatch_sphere_bounds(device: &mut Device, record: &SphereBoundsData) -> Result<()> {
    let centers = device.get(record.centers)?;
    let radii = device.get(record.radii)?;
    if centers.len() != radii.len() {
        return Err(Error::LengthMismatch { expected: centers.len(), actual: radii.len() });
    }

    let aabbs = device.launch_1d(centers.len(), |i| sphere_bounds(i, centers, radii));
    device.write(record.aabbs, aabbs)?;
    debug!("sphere bounds computed");
    Ok(())
}
