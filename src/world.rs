//! Two-level acceleration structure over sphere geometries.
//!
//! Each geometry gets a bottom-level QBVH over its sphere boxes; a top-level QBVH
//! instances every bottom level with an identity transform. Builds run in a
//! fixed order (bounds, bottom, top) and the state machine refuses anything out
//! of order, including tracing before the top level exists.

use std::time::Instant;

use tracing::{debug, info};

use super::bounds::{dispatch_sphere_bounds, SphereBoundsData};
use super::collide::*;
use super::device::{Buffer, Device};
use super::error::{Error, Result};
use super::math::*;
use super::shading::ShadingMode;
use super::spatial::QBVH;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildState {
    /// Sphere data uploaded, boxes not computed yet.
    Uploaded,
    AabbsReady,
    BottomBuilt,
    TopBuilt,
}

/// Intersection/closest-hit record of one sphere geometry.
#[derive(Clone, Copy, Debug)]
pub struct SphereGeomData {
    pub centers: Buffer<Vec3>,
    pub radii: Buffer<f32>,
}

#[derive(Clone, Copy, Debug)]
pub struct SphereGeometry {
    pub data: SphereGeomData,
    pub aabbs: Buffer<AABB>,
    pub shading: ShadingMode,
}

struct BottomLevel {
    geometry: usize,
    bvh: QBVH,
}

/// Top-level entry. The transform is always the identity.
#[derive(Clone, Copy, Debug)]
struct Instance {
    blas: usize,
}

pub struct World {
    geometries: Vec<SphereGeometry>,
    bottom: Vec<BottomLevel>,
    instances: Vec<Instance>,
    top: QBVH,
    state: BuildState,
}

impl Default for World {
    fn default() -> World {
        World {
            geometries: Vec::new(),
            bottom: Vec::new(),
            instances: Vec::new(),
            top: QBVH::new(),
            state: BuildState::Uploaded,
        }
    }
}

impl World {
    pub fn new() -> World {
        World::default()
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn geometry(&self, id: usize) -> Result<&SphereGeometry> {
        self.geometries.get(id).ok_or(Error::UnknownGeometry(id))
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    fn require(&self, needed: BuildState) -> Result<()> {
        if self.state < needed {
            return Err(Error::NotBuilt { needed, current: self.state });
        }
        Ok(())
    }

    /// Uploads one geometry's spheres. Any earlier build is invalidated and the
    /// whole bounds/bottom/top sequence has to run again.
    pub fn add_spheres(&mut self, device: &mut Device, spheres: &[Sphere], shading: ShadingMode) -> Result<usize> {
        for (index, s) in spheres.iter().enumerate() {
            if !s.center.is_finite() {
                return Err(Error::InvalidCenter { index, center: s.center });
            }
            if !(s.radius.is_finite() && s.radius > 0.0) {
                return Err(Error::InvalidRadius { index, radius: s.radius });
            }
        }

        let centers: Vec<Vec3> = spheres.iter().map(|s| s.center).collect();
        let radii: Vec<f32> = spheres.iter().map(|s| s.radius).collect();
        let geometry = SphereGeometry {
            data: SphereGeomData {
                centers: device.allocate(centers.len(), Some(centers.as_slice()))?,
                radii: device.allocate(radii.len(), Some(radii.as_slice()))?,
            },
            aabbs: device.allocate(spheres.len(), None)?,
            shading,
        };

        self.geometries.push(geometry);
        self.state = BuildState::Uploaded;
        debug!(geometry = self.geometries.len() - 1, spheres = spheres.len(), ?shading, "added sphere geometry");
        Ok(self.geometries.len() - 1)
    }

    /// Bounds stage for every geometry.
    pub fn compute_bounds(&mut self, device: &mut Device) -> Result<()> {
        for geometry in &self.geometries {
            let record = SphereBoundsData {
                centers: geometry.data.centers,
                radii: geometry.data.radii,
                aabbs: geometry.aabbs,
            };
            dispatch_sphere_bounds(device, &record)?;
        }
        self.state = BuildState::AabbsReady;
        Ok(())
    }

    /// First build phase: one QBVH per geometry from its boxes.
    #[tracing::instrument(skip_all, fields(geometries = self.geometries.len()))]
    pub fn build_bottom_levels(&mut self, device: &Device) -> Result<()> {
        self.require(BuildState::AabbsReady)?;
        let started = Instant::now();

        let mut bottom = Vec::with_capacity(self.geometries.len());
        for (geometry, geom) in self.geometries.iter().enumerate() {
            let aabbs = device.get(geom.aabbs)?;
            let bvh = QBVH::build(aabbs)?;
            debug!(geometry, prims = bvh.prim_count(), nodes = bvh.node_count(), "bottom level built");
            bottom.push(BottomLevel { geometry, bvh });
        }

        self.bottom = bottom;
        self.instances.clear();
        self.top = QBVH::new();
        self.state = BuildState::BottomBuilt;
        info!(count = self.bottom.len(), elapsed_ms = started.elapsed().as_millis() as u64, "bottom levels built");
        Ok(())
    }

    /// Second build phase: instances every bottom level.
    #[tracing::instrument(skip_all, fields(instances = self.bottom.len()))]
    pub fn build_top_level(&mut self) -> Result<()> {
        self.require(BuildState::BottomBuilt)?;

        // Empty bottom levels can never be hit, so they get no instance.
        self.instances = self
            .bottom
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.bvh.is_empty())
            .map(|(blas, _)| Instance { blas })
            .collect();
        let instance_bounds: Vec<AABB> = self
            .instances
            .iter()
            .map(|inst| self.bottom[inst.blas].bvh.bounds())
            .collect();

        self.top = QBVH::build(&instance_bounds)?;
        self.state = BuildState::TopBuilt;
        info!(instances = self.instances.len(), nodes = self.top.node_count(), "top level built");
        Ok(())
    }

    /// Bounds, bottom and top in order.
    pub fn build(&mut self, device: &mut Device) -> Result<()> {
        self.compute_bounds(device)?;
        self.build_bottom_levels(device)?;
        self.build_top_level()
    }

    /// Resolves every buffer the traversal reads. Fails unless the top level is built.
    pub fn bind<'a>(&'a self, device: &'a Device) -> Result<SceneView<'a>> {
        self.require(BuildState::TopBuilt)?;

        let mut geometries = Vec::with_capacity(self.geometries.len());
        for geom in &self.geometries {
            geometries.push(GeomView {
                centers: device.get(geom.data.centers)?,
                radii: device.get(geom.data.radii)?,
                shading: geom.shading,
            });
        }

        Ok(SceneView { world: self, geometries })
    }
}

struct GeomView<'a> {
    centers: &'a [Vec3],
    radii: &'a [f32],
    shading: ShadingMode,
}

/// Read-only, fully built scene handed to ray generation.
pub struct SceneView<'a> {
    world: &'a World,
    geometries: Vec<GeomView<'a>>,
}

impl<'a> SceneView<'a> {
    pub fn shading(&self, geometry: usize) -> ShadingMode {
        self.geometries[geometry].shading
    }

    /// Intersection routine for one sphere of one geometry.
    fn intersect(&self, geometry: usize, prim: usize, r: Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        let geom = &self.geometries[geometry];
        hit_sphere(r, geom.centers[prim], geom.radii[prim], t_min, t_max).map(|hit| HitRecord {
            point: hit.point,
            normal: hit.normal,
            t: hit.t,
            geometry,
            prim,
        })
    }

    /// Closest hit in `[t_min, t_max]` over the whole scene, or `None` on a miss.
    pub fn trace(&self, r: Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        let world = self.world;
        world.top.traverse(r, t_min, t_max, |inst, lo, hi| {
            let blas = &world.bottom[world.instances[inst as usize].blas];
            blas.bvh
                .traverse(r, lo, hi, |prim, lo, hi| {
                    self.intersect(blas.geometry, prim as usize, r, lo, hi).map(|h| (h.t, h))
                })
                .map(|h| (h.t, h))
        })
    }
}
