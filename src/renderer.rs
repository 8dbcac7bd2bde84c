//! Rendering session: owns the device buffers and the acceleration structure and
//! runs the phases strictly in order. Bounds, then bottom levels, then the top
//! level, then one ray generation launch per frame.

use std::path::Path;
use std::time::Instant;

use tracing::info;

use super::camera::Camera;
use super::config::{RenderSettings, SceneDesc, Variant};
use super::device::{Buffer, Device};
use super::error::{Error, Result};
use super::framebuffer::{pixel_count, FrameBuffer};
use super::raygen::{ray_gen, MissData, RayGenData};
use super::world::World;

pub struct Renderer {
    device: Device,
    world: World,
    settings: RenderSettings,
    frame_buffer: Buffer<u32>,
}

impl Renderer {
    /// Uploads the scene and builds both acceleration levels.
    #[tracing::instrument(skip_all, fields(geometries = scene.geometries.len(), spheres = scene.sphere_count()))]
    pub fn new(settings: RenderSettings, scene: &SceneDesc) -> Result<Renderer> {
        if settings.width < 2 || settings.height < 2 {
            return Err(Error::DegenerateImage { width: settings.width, height: settings.height });
        }

        let mut device = Device::new();
        let mut world = World::new();
        for geom in &scene.geometries {
            world.add_spheres(&mut device, &geom.spheres, geom.shading)?;
        }

        world.compute_bounds(&mut device)?;
        world.build_bottom_levels(&device)?;
        world.build_top_level()?;

        let frame_buffer = device.allocate(pixel_count(settings.width, settings.height), None)?;
        Ok(Renderer { device, world, settings, frame_buffer })
    }

    /// One ray generation launch over every pixel. Each launch overwrites the
    /// previous frame.
    #[tracing::instrument(skip(self), fields(width = self.settings.width, height = self.settings.height))]
    pub fn render_frame(&mut self, frame_id: i32) -> Result<FrameBuffer> {
        let s = &self.settings;
        let record = RayGenData {
            frame_buffer: self.frame_buffer,
            fb_size: (s.width, s.height),
            frame_id,
            camera: Camera::new(s.camera_origin, s.aspect_ratio(), s.viewport_height, s.focal_length),
        };
        let miss = MissData { background: s.background };

        let started = Instant::now();
        let pixels = {
            let scene = self.world.bind(&self.device)?;
            self.device.launch_2d(s.width, s.height, |x, y| ray_gen(x, y, &record, &miss, &scene))
        };
        self.device.write(self.frame_buffer, pixels)?;
        info!(
            fb = self.device.device_handle(self.frame_buffer)?,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "frame rendered"
        );

        Ok(FrameBuffer::new(
            self.settings.width,
            self.settings.height,
            self.device.get(self.frame_buffer)?.to_vec(),
        ))
    }
}

/// Builds the scene and renders a single frame with `settings.frame_id`.
pub fn render(settings: &RenderSettings, scene: &SceneDesc) -> Result<FrameBuffer> {
    Renderer::new(*settings, scene)?.render_frame(settings.frame_id)
}

/// Renders one frame of `variant` and writes it to `path`. Nothing is written
/// when rendering fails.
#[tracing::instrument(skip(path), fields(variant = variant.name()))]
pub fn render_variant<P: AsRef<Path>>(variant: Variant, path: P) -> Result<FrameBuffer> {
    let scene = variant.scene();
    let started = Instant::now();
    let frame = render(&variant.settings(), &scene)?;
    info!(
        spheres = scene.sphere_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "finished rendering"
    );
    frame.save(path)?;
    Ok(frame)
}
