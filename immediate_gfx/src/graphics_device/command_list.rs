/// CommandList trait - native command recording surface

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    NativeBindingSet, NativeBuffer, NativeFramebuffer, NativeImage, NativePipeline,
    NativeRenderPass,
};
use crate::layout::ImageLayout;
use crate::resource::{BindingScope, ImageFormat};

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 2D rectangle (scissor, render area)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for one attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

/// One image layout transition
pub struct ImageBarrier<'a> {
    pub image: &'a Arc<dyn NativeImage>,
    /// Selects the color or depth aspect
    pub format: ImageFormat,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

/// Full-surface copy between two images
pub struct ImageBlit<'a> {
    pub src: &'a Arc<dyn NativeImage>,
    pub src_width: u32,
    pub src_height: u32,
    pub dst: &'a Arc<dyn NativeImage>,
    pub dst_width: u32,
    pub dst_height: u32,
}

/// Tightly packed buffer region copied to the full extent of an image
pub struct BufferImageCopy<'a> {
    pub buffer: &'a Arc<dyn NativeBuffer>,
    pub buffer_offset: u64,
    pub image: &'a Arc<dyn NativeImage>,
    pub width: u32,
    pub height: u32,
}

/// Command list for recording rendering commands
///
/// Commands are recorded here and later submitted through
/// [`super::GraphicsDevice::submit_frame`] or
/// [`super::GraphicsDevice::submit_staging`].
pub trait CommandList: Send {
    fn as_any(&self) -> &dyn Any;

    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass
    ///
    /// # Arguments
    ///
    /// * `render_pass` - Pass object (fixes attachment formats and load ops)
    /// * `framebuffer` - Framebuffer compatible with `render_pass`
    /// * `render_area` - Area affected by the pass
    /// * `clear_values` - One value per attachment in attachment order (color, depth).
    ///   Values for attachments that do not clear are ignored
    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn NativeRenderPass>,
        framebuffer: &Arc<dyn NativeFramebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn NativePipeline>) -> Result<()>;

    /// Bind a binding set at the set index of its scope
    ///
    /// # Arguments
    ///
    /// * `scope` - Frame, View or Object; selects the set index
    /// * `binding_set` - The set to bind
    fn bind_binding_set(
        &mut self,
        scope: BindingScope,
        binding_set: &Arc<dyn NativeBindingSet>,
    ) -> Result<()>;

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn NativeBuffer>, offset: u64) -> Result<()>;

    fn bind_index_buffer(
        &mut self,
        buffer: &Arc<dyn NativeBuffer>,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()>;

    /// Draw indexed primitives (one instance)
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Linear-filtered copy of one full image onto another
    ///
    /// `src` must be in TransferSource and `dst` in TransferDestination.
    fn blit_image(&mut self, blit: &ImageBlit) -> Result<()>;

    /// Record an image layout transition
    fn pipeline_barrier(&mut self, barrier: &ImageBarrier) -> Result<()>;

    /// Copy staged bytes into an image that is in TransferDestination
    fn copy_buffer_to_image(&mut self, copy: &BufferImageCopy) -> Result<()>;
}
