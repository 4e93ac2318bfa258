/// GraphicsDevice trait - the boundary between the core and a GPU backend

use std::sync::Arc;
use crate::cache::{FramebufferDesc, PipelineDesc, RenderPassDesc};
use crate::error::Result;
use crate::graphics_device::{
    CommandList, NativeBindingSet, NativeBuffer, NativeFramebuffer, NativeImage, NativePipeline,
    NativeRenderPass, NativeShader,
};
use crate::resource::{BindingScope, BufferUsage, ImageFormat, ImageUsage, SamplerType};

/// Image creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub usage: ImageUsage,
}

/// Buffer creation parameters (buffers are always host-visible)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u64,
    pub usage: BufferUsage,
}

/// SPIR-V for a vertex + fragment program
#[derive(Debug, Clone, Copy)]
pub struct ShaderDesc<'a> {
    pub name: &'a str,
    pub vertex_code: &'a [u8],
    pub fragment_code: &'a [u8],
}

/// Everything needed to build a framebuffer for a [`FramebufferDesc`]
pub struct FramebufferCreateInfo<'a> {
    pub desc: &'a FramebufferDesc,
    pub render_pass: &'a Arc<dyn NativeRenderPass>,
    pub color: Option<&'a Arc<dyn NativeImage>>,
    pub depth: Option<&'a Arc<dyn NativeImage>>,
}

/// Everything needed to build a pipeline for a [`PipelineDesc`]
pub struct PipelineCreateInfo<'a> {
    pub desc: &'a PipelineDesc,
    pub render_pass: &'a Arc<dyn NativeRenderPass>,
    pub shader: &'a Arc<dyn NativeShader>,
}

/// The ring of images owned by the presentation engine
pub struct PresentableImages {
    pub images: Vec<Arc<dyn NativeImage>>,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// GPU backend
///
/// Implemented by `immediate_gfx_renderer_vulkan::VulkanGraphicsDevice`.
/// All creation methods return shared native objects; the core owns the
/// handles to them in its resource tables and caches.
pub trait GraphicsDevice: Send {
    /// Create an image with device-local memory
    fn create_image(&mut self, desc: &ImageDesc) -> Result<Arc<dyn NativeImage>>;

    /// Native images of the swapchain, in slot order
    fn presentable_images(&mut self) -> Result<PresentableImages>;

    /// Create a mapped, host-visible buffer
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn NativeBuffer>>;

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<Arc<dyn NativeShader>>;

    /// Synthesize a render pass (called on render pass cache miss)
    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Arc<dyn NativeRenderPass>>;

    /// Synthesize a framebuffer (called on framebuffer cache miss)
    fn create_framebuffer(
        &mut self,
        info: &FramebufferCreateInfo,
    ) -> Result<Arc<dyn NativeFramebuffer>>;

    /// Synthesize a pipeline (called on pipeline cache miss)
    fn create_pipeline(&mut self, info: &PipelineCreateInfo) -> Result<Arc<dyn NativePipeline>>;

    /// Allocate a binding set with the fixed layout of `scope`
    fn allocate_binding_set(&mut self, scope: BindingScope) -> Result<Arc<dyn NativeBindingSet>>;

    /// Point a uniform-buffer slot of a binding set at `buffer`
    fn write_uniform_buffer(
        &mut self,
        binding_set: &Arc<dyn NativeBindingSet>,
        slot: u32,
        buffer: &Arc<dyn NativeBuffer>,
    ) -> Result<()>;

    /// Point a combined image-sampler slot at `image`, read as FragmentShaderRead
    fn write_image_sampler(
        &mut self,
        binding_set: &Arc<dyn NativeBindingSet>,
        slot: u32,
        sampler: SamplerType,
        image: &Arc<dyn NativeImage>,
    ) -> Result<()>;

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>>;

    /// Block until the previous frame's submission completed, then reset the fence
    fn wait_for_frame(&mut self) -> Result<()>;

    /// Acquire the next presentable image, returning its slot index
    fn acquire_next_image(&mut self) -> Result<u32>;

    /// Submit a command list without synchronization primitives
    fn submit_staging(&mut self, commands: &dyn CommandList) -> Result<()>;

    /// Submit the frame's command list and signal the frame fence
    ///
    /// With `presenting`, the submission waits for the acquired image at
    /// color output and signals the render-complete semaphore.
    fn submit_frame(&mut self, commands: &dyn CommandList, presenting: bool) -> Result<()>;

    /// Present slot `image_index` after render completion
    fn present(&mut self, image_index: u32) -> Result<()>;

    /// Wait until the GPU is idle
    fn wait_idle(&mut self) -> Result<()>;
}
