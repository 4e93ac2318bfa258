//! Renderer: frame orchestration and the application-facing surface
//!
//! Owns the resource tables, the command context and the staging pipe, and
//! drives the per-frame protocol:
//!
//! 1. `begin_frame`: wait for the previous frame's fence, open recording and
//!    the staging window
//! 2. recording calls (barriers, render targets, clears, draws, ...)
//! 3. `acquire_presentable_image` before the swapchain image is touched
//! 4. `end_frame`: submit staging, submit the frame, present

use std::path::Path;
use crate::config::Config;
use crate::context::{CommandContext, ContextStats};
use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::layout::{BarrierFlags, ImageLayout};
use crate::resource::{
    BindingScope, BindingSetKey, BufferKey, BufferUsage, ImageFormat, ImageKey, ImageUsage,
    MeshKey, RenderObjects, SamplerType, ShaderBinaries, ShaderKey, Vertex,
};
use crate::staging::StagingPipe;
use crate::{igfx_debug, igfx_error, igfx_info};

const SOURCE: &str = "igfx::Renderer";

pub struct Renderer {
    context: CommandContext,
    staging: StagingPipe,
    presentable: ImageKey,
    acquired: Option<u32>,
    frame_open: bool,
    frame_index: u64,
    // Declared last: owns the device
    objects: RenderObjects,
}

impl Renderer {
    /// Build the renderer on top of an initialized device
    ///
    /// The presentable image starts Undefined; nothing touches a swapchain
    /// slot before it has been acquired.
    pub fn new(device: Box<dyn GraphicsDevice>, config: &Config) -> Result<Self> {
        let mut objects = RenderObjects::new(device);
        let command_list = objects.device_mut().create_command_list()?;
        let context = CommandContext::new(command_list);
        let staging = StagingPipe::new(objects.device_mut(), config.staging_buffer_size)?;

        let presentable = objects.create_presentable_image()?;

        let image = objects.image(presentable)?;
        igfx_info!(
            SOURCE,
            "Renderer ready: presentable {}x{} {:?}, {} slots",
            image.width(),
            image.height(),
            image.format(),
            image.slot_count()
        );

        Ok(Self {
            context,
            staging,
            presentable,
            acquired: None,
            frame_open: false,
            frame_index: 0,
            objects,
        })
    }

    pub fn objects(&self) -> &RenderObjects {
        &self.objects
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    pub fn staging(&self) -> &StagingPipe {
        &self.staging
    }

    /// The swapchain image; its active slot changes on each acquisition
    pub fn presentable_image(&self) -> ImageKey {
        self.presentable
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn stats(&self) -> ContextStats {
        self.context.stats()
    }

    // ===== FRAME =====

    /// Wait for the previous frame, then open recording
    pub fn begin_frame(&mut self) -> Result<()> {
        if self.frame_open {
            return Err(Error::InvalidState("begin_frame called twice".to_string()));
        }
        self.objects.device_mut().wait_for_frame()?;
        self.context.begin()?;
        self.staging.begin_frame()?;
        self.acquired = None;
        self.frame_open = true;
        Ok(())
    }

    /// Acquire the next swapchain image and make it the presentable image's active slot
    ///
    /// The tracked layout drops to Undefined: the slots share one tracked
    /// layout, and a freshly acquired slot may never have been transitioned.
    pub fn acquire_presentable_image(&mut self) -> Result<()> {
        if !self.frame_open {
            return Err(Error::InvalidState("acquire outside a frame".to_string()));
        }
        if self.acquired.is_some() {
            return Err(Error::InvalidState("presentable image already acquired".to_string()));
        }
        let index = self.objects.device_mut().acquire_next_image()?;
        let image = self.objects.image_mut(self.presentable)?;
        image.select_slot(index as usize)?;
        image.set_layout(ImageLayout::Undefined);
        self.acquired = Some(index);
        Ok(())
    }

    /// Submit staging work and the frame, then present if an image was acquired
    pub fn end_frame(&mut self) -> Result<()> {
        if !self.frame_open {
            return Err(Error::InvalidState("end_frame without begin_frame".to_string()));
        }
        self.frame_open = false;

        self.staging.end_frame()?;
        self.objects.device_mut().submit_staging(self.staging.command_list())?;

        self.context.end()?;
        let presenting = self.acquired.is_some();
        self.objects
            .device_mut()
            .submit_frame(self.context.command_list(), presenting)?;

        if let Some(index) = self.acquired.take() {
            self.objects.device_mut().present(index)?;
        }
        self.frame_index += 1;
        Ok(())
    }

    pub fn wait_idle(&mut self) -> Result<()> {
        self.objects.device_mut().wait_idle()
    }

    // ===== RECORDING =====

    pub fn pipeline_barrier(&mut self, image: ImageKey, layout: ImageLayout, flags: BarrierFlags) -> Result<()> {
        self.context.pipeline_barrier(&mut self.objects, image, layout, flags)
    }

    pub fn set_render_targets(&mut self, color: Option<ImageKey>, depth: Option<ImageKey>) -> Result<()> {
        self.context.set_render_targets(&mut self.objects, color, depth)
    }

    pub fn clear(&mut self, clear_color: bool, clear_depth: bool, color: [f32; 4], depth: f32) -> Result<()> {
        self.context.clear(&mut self.objects, clear_color, clear_depth, color, depth)
    }

    pub fn set_viewport_and_scissor(&mut self, width: u32, height: u32) {
        self.context.set_viewport_and_scissor(width, height);
    }

    pub fn draw(&mut self, mesh: MeshKey, shader: ShaderKey) -> Result<()> {
        self.context.draw(&mut self.objects, mesh, shader)
    }

    pub fn bind_resource_set(&mut self, set: BindingSetKey) -> Result<()> {
        self.context.bind_resource_set(&self.objects, set)
    }

    pub fn blit(&mut self, src: ImageKey, dst: ImageKey) -> Result<()> {
        self.context.blit(&self.objects, src, dst)
    }

    pub fn end_render_pass(&mut self) -> Result<()> {
        self.context.end_render_pass()
    }

    // ===== RESOURCES =====

    pub fn create_image(
        &mut self,
        width: u32,
        height: u32,
        format: ImageFormat,
        usage: ImageUsage,
    ) -> Result<ImageKey> {
        self.objects.create_image(width, height, format, usage)
    }

    /// Create a sampled RGBA8 image and stage `pixels` into it
    pub fn create_image_from_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) -> Result<ImageKey> {
        let key = self.objects.create_image(width, height, ImageFormat::Rgba8, ImageUsage::SHADER)?;
        self.staging.stage_image_data(&mut self.objects, key, pixels)?;
        Ok(key)
    }

    /// Decode an image file (PNG, JPEG) to RGBA8 and stage it
    pub fn create_image_from_file(&mut self, path: &Path) -> Result<ImageKey> {
        let decoded = image::open(path)
            .map_err(|e| {
                igfx_error!(SOURCE, "Cannot load image '{}': {}", path.display(), e);
                Error::InvalidResource(format!("cannot load image '{}': {}", path.display(), e))
            })?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        igfx_debug!(SOURCE, "Loaded '{}' ({}x{})", path.display(), width, height);
        self.create_image_from_rgba8(width, height, decoded.as_raw())
    }

    /// Record the transition of a fresh image to the layout of its first use
    pub fn initialize_image_layout(&mut self, image: ImageKey) -> Result<()> {
        self.staging.initialize_image_layout(&mut self.objects, image)
    }

    pub fn create_buffer(&mut self, usage: BufferUsage, size: u64) -> Result<BufferKey> {
        self.objects.create_buffer(usage, size)
    }

    pub fn create_buffer_with_data(&mut self, usage: BufferUsage, data: &[u8]) -> Result<BufferKey> {
        self.objects.create_buffer_with_data(usage, data)
    }

    pub fn write_buffer(&self, buffer: BufferKey, offset: u64, data: &[u8]) -> Result<()> {
        self.objects.write_buffer(buffer, offset, data)
    }

    pub fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) -> Result<MeshKey> {
        self.objects.create_mesh(vertices, indices)
    }

    pub fn create_shader_program(&mut self, name: &str, binaries: &ShaderBinaries) -> Result<ShaderKey> {
        self.objects.create_shader_program(name, binaries)
    }

    /// Load `<dir>/<name>.vspv` + `<dir>/<name>.fspv`
    pub fn load_shader_program(&mut self, dir: &Path, name: &str) -> Result<ShaderKey> {
        let binaries = ShaderBinaries::from_files(dir, name)?;
        self.objects.create_shader_program(name, &binaries)
    }

    pub fn allocate_binding_set(&mut self, scope: BindingScope) -> Result<BindingSetKey> {
        self.objects.allocate_binding_set(scope)
    }

    pub fn set_uniform_buffer(&mut self, set: BindingSetKey, slot: u32, buffer: BufferKey) -> Result<()> {
        self.objects.set_uniform_buffer(set, slot, buffer)
    }

    pub fn set_image_sampler(
        &mut self,
        set: BindingSetKey,
        slot: u32,
        sampler: SamplerType,
        image: ImageKey,
    ) -> Result<()> {
        self.objects.set_image_sampler(set, slot, sampler, image)
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Command lists and the staging arena are released before the tables
        if let Err(e) = self.wait_idle() {
            igfx_error!(SOURCE, "wait_idle failed during shutdown: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
