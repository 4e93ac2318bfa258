/// Mock graphics device for unit tests (no GPU required)
///
/// Natives carry a numeric id so tests can check object identity. The
/// command list records every call as a string plus structured logs for
/// barriers and render pass begins. Device-level counters live behind a
/// shared [`MockDeviceStats`] handle that survives moving the device into
/// `RenderObjects`.

use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::{FramebufferDesc, PipelineDesc, RenderPassDesc};
use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferDesc, BufferImageCopy, ClearValue, CommandList, FramebufferCreateInfo, GraphicsDevice,
    ImageBarrier, ImageBlit, ImageDesc, IndexType, NativeBindingSet, NativeBuffer,
    NativeFramebuffer, NativeImage, NativePipeline, NativeRenderPass, NativeShader,
    PipelineCreateInfo, PresentableImages, Rect2D, ShaderDesc, Viewport,
};
use crate::layout::ImageLayout;
use crate::resource::{BindingScope, ImageFormat, SamplerType};

// ============================================================================
// Mock natives
// ============================================================================

pub struct MockImage {
    pub id: u32,
    pub desc: ImageDesc,
    pub alignment: u64,
}

impl NativeImage for MockImage {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn memory_alignment(&self) -> u64 {
        self.alignment
    }
}

pub struct MockBuffer {
    pub id: u32,
    pub desc: BufferDesc,
    pub data: Mutex<Vec<u8>>,
}

impl NativeBuffer for MockBuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn size(&self) -> u64 {
        self.desc.size
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset + data.len() as u64;
        if end > self.desc.size {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at {} exceeds buffer size {}",
                data.len(),
                offset,
                self.desc.size
            )));
        }
        let mut bytes = self.data.lock().unwrap();
        bytes[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }
}

pub struct MockShader {
    pub id: u32,
    pub name: String,
}

impl NativeShader for MockShader {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockRenderPass {
    pub id: u32,
    pub desc: RenderPassDesc,
}

impl NativeRenderPass for MockRenderPass {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockFramebuffer {
    pub id: u32,
    pub desc: FramebufferDesc,
}

impl NativeFramebuffer for MockFramebuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn width(&self) -> u32 {
        self.desc.width
    }

    fn height(&self) -> u32 {
        self.desc.height
    }
}

pub struct MockPipeline {
    pub id: u32,
    pub desc: PipelineDesc,
    pub render_pass_id: u32,
}

impl NativePipeline for MockPipeline {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockBindingSet {
    pub id: u32,
    pub scope: BindingScope,
}

impl NativeBindingSet for MockBindingSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn id_of<T: 'static>(any: &dyn Any, id: impl Fn(&T) -> u32) -> u32 {
    any.downcast_ref::<T>().map(id).unwrap_or(u32::MAX)
}

// ============================================================================
// Mock command list
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MockBarrier {
    pub image_id: u32,
    pub format: ImageFormat,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockPassBegin {
    pub render_pass_id: u32,
    pub framebuffer_id: u32,
    pub render_area: Rect2D,
    pub clear_values: Vec<ClearValue>,
}

#[derive(Default)]
pub struct MockCommandList {
    pub commands: Vec<String>,
    pub barriers: Vec<MockBarrier>,
    pub pass_begins: Vec<MockPassBegin>,
    pub viewports: Vec<Viewport>,
    pub draws: Vec<u32>,
    pub bound_pipelines: Vec<u32>,
    pub is_recording: bool,
    pub in_render_pass: bool,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, command: &str) -> usize {
        self.commands.iter().filter(|c| c.as_str() == command).count()
    }

    /// Position of the last occurrence of `command`
    pub fn last_position(&self, command: &str) -> Option<usize> {
        self.commands.iter().rposition(|c| c.as_str() == command)
    }

    fn record(&mut self, command: &str) -> Result<()> {
        if !self.is_recording && command != "begin" {
            return Err(Error::BackendError(format!("{} while not recording", command)));
        }
        self.commands.push(command.to_string());
        Ok(())
    }

    fn require_pass(&self, command: &str, inside: bool) -> Result<()> {
        if self.in_render_pass != inside {
            return Err(Error::BackendError(format!(
                "{} {} a render pass",
                command,
                if inside { "outside" } else { "inside" }
            )));
        }
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn begin(&mut self) -> Result<()> {
        self.record("begin")?;
        self.is_recording = true;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_pass("end", false)?;
        self.record("end")?;
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn NativeRenderPass>,
        framebuffer: &Arc<dyn NativeFramebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_pass("begin_render_pass", false)?;
        self.record("begin_render_pass")?;
        self.in_render_pass = true;
        self.pass_begins.push(MockPassBegin {
            render_pass_id: id_of(render_pass.as_any(), |p: &MockRenderPass| p.id),
            framebuffer_id: id_of(framebuffer.as_any(), |f: &MockFramebuffer| f.id),
            render_area,
            clear_values: clear_values.to_vec(),
        });
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_pass("end_render_pass", true)?;
        self.record("end_render_pass")?;
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record("set_viewport")?;
        self.viewports.push(viewport);
        Ok(())
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.record("set_scissor")
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn NativePipeline>) -> Result<()> {
        self.record("bind_pipeline")?;
        self.bound_pipelines
            .push(id_of(pipeline.as_any(), |p: &MockPipeline| p.id));
        Ok(())
    }

    fn bind_binding_set(
        &mut self,
        scope: BindingScope,
        _binding_set: &Arc<dyn NativeBindingSet>,
    ) -> Result<()> {
        self.record(&format!("bind_binding_set:{}", scope.set_index()))
    }

    fn bind_vertex_buffer(&mut self, _buffer: &Arc<dyn NativeBuffer>, _offset: u64) -> Result<()> {
        self.record("bind_vertex_buffer")
    }

    fn bind_index_buffer(
        &mut self,
        _buffer: &Arc<dyn NativeBuffer>,
        _offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        if index_type != IndexType::U16 {
            return Err(Error::BackendError("mock expects u16 indices".to_string()));
        }
        self.record("bind_index_buffer")
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.require_pass("draw_indexed", true)?;
        self.record("draw_indexed")?;
        self.draws.push(index_count);
        Ok(())
    }

    fn blit_image(&mut self, _blit: &ImageBlit) -> Result<()> {
        self.require_pass("blit_image", false)?;
        self.record("blit_image")
    }

    fn pipeline_barrier(&mut self, barrier: &ImageBarrier) -> Result<()> {
        self.require_pass("pipeline_barrier", false)?;
        self.record("pipeline_barrier")?;
        self.barriers.push(MockBarrier {
            image_id: id_of(barrier.image.as_any(), |i: &MockImage| i.id),
            format: barrier.format,
            old_layout: barrier.old_layout,
            new_layout: barrier.new_layout,
        });
        Ok(())
    }

    fn copy_buffer_to_image(&mut self, _copy: &BufferImageCopy) -> Result<()> {
        self.require_pass("copy_buffer_to_image", false)?;
        self.record("copy_buffer_to_image")
    }
}

// ============================================================================
// Mock graphics device
// ============================================================================

/// Counters shared between a [`MockGraphicsDevice`] and the test
#[derive(Debug, Default)]
pub struct MockDeviceStats {
    pub images_created: u32,
    pub buffers_created: u32,
    pub shaders_created: u32,
    pub render_passes_created: u32,
    pub framebuffers_created: u32,
    pub pipelines_created: u32,
    pub binding_sets_allocated: u32,
    pub uniform_writes: u32,
    pub sampler_writes: u32,
    pub frame_waits: u32,
    pub acquired: Vec<u32>,
    /// Command streams submitted through `submit_staging`
    pub staging_submissions: Vec<Vec<String>>,
    /// Command streams submitted through `submit_frame`, with the presenting flag
    pub frame_submissions: Vec<(Vec<String>, bool)>,
    pub presents: Vec<u32>,
    pub idle_waits: u32,
    /// Make the next `create_pipeline` fail
    pub fail_pipeline_creation: bool,
}

pub struct MockGraphicsDevice {
    next_id: AtomicU32,
    presentable_count: u32,
    presentable_width: u32,
    presentable_height: u32,
    image_alignment: u64,
    next_acquire: u32,
    stats: Arc<Mutex<MockDeviceStats>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1),
            presentable_count: 2,
            presentable_width: 800,
            presentable_height: 600,
            image_alignment: 256,
            next_acquire: 0,
            stats: Arc::new(Mutex::new(MockDeviceStats::default())),
        }
    }

    pub fn stats(&self) -> Arc<Mutex<MockDeviceStats>> {
        Arc::clone(&self.stats)
    }

    fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn commands_of(commands: &dyn CommandList) -> Vec<String> {
        commands
            .as_any()
            .downcast_ref::<MockCommandList>()
            .map(|list| list.commands.clone())
            .unwrap_or_default()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_image(&mut self, desc: &ImageDesc) -> Result<Arc<dyn NativeImage>> {
        self.stats.lock().unwrap().images_created += 1;
        Ok(Arc::new(MockImage { id: self.next_id(), desc: *desc, alignment: self.image_alignment }))
    }

    fn presentable_images(&mut self) -> Result<PresentableImages> {
        let desc = ImageDesc {
            width: self.presentable_width,
            height: self.presentable_height,
            format: ImageFormat::Bgra8,
            usage: crate::resource::ImageUsage::RENDER_TARGET,
        };
        let images = (0..self.presentable_count)
            .map(|_| {
                Arc::new(MockImage { id: self.next_id(), desc, alignment: 1 }) as Arc<dyn NativeImage>
            })
            .collect();
        Ok(PresentableImages {
            images,
            width: self.presentable_width,
            height: self.presentable_height,
            format: ImageFormat::Bgra8,
        })
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn NativeBuffer>> {
        self.stats.lock().unwrap().buffers_created += 1;
        Ok(Arc::new(MockBuffer {
            id: self.next_id(),
            desc: *desc,
            data: Mutex::new(vec![0; desc.size as usize]),
        }))
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<Arc<dyn NativeShader>> {
        self.stats.lock().unwrap().shaders_created += 1;
        Ok(Arc::new(MockShader { id: self.next_id(), name: desc.name.to_string() }))
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Arc<dyn NativeRenderPass>> {
        self.stats.lock().unwrap().render_passes_created += 1;
        Ok(Arc::new(MockRenderPass { id: self.next_id(), desc: *desc }))
    }

    fn create_framebuffer(
        &mut self,
        info: &FramebufferCreateInfo,
    ) -> Result<Arc<dyn NativeFramebuffer>> {
        self.stats.lock().unwrap().framebuffers_created += 1;
        Ok(Arc::new(MockFramebuffer { id: self.next_id(), desc: *info.desc }))
    }

    fn create_pipeline(&mut self, info: &PipelineCreateInfo) -> Result<Arc<dyn NativePipeline>> {
        let mut stats = self.stats.lock().unwrap();
        if stats.fail_pipeline_creation {
            stats.fail_pipeline_creation = false;
            return Err(Error::BackendError("vkCreateGraphicsPipelines failed".to_string()));
        }
        stats.pipelines_created += 1;
        drop(stats);
        Ok(Arc::new(MockPipeline {
            id: self.next_id(),
            desc: *info.desc,
            render_pass_id: id_of(info.render_pass.as_any(), |p: &MockRenderPass| p.id),
        }))
    }

    fn allocate_binding_set(&mut self, scope: BindingScope) -> Result<Arc<dyn NativeBindingSet>> {
        self.stats.lock().unwrap().binding_sets_allocated += 1;
        Ok(Arc::new(MockBindingSet { id: self.next_id(), scope }))
    }

    fn write_uniform_buffer(
        &mut self,
        _binding_set: &Arc<dyn NativeBindingSet>,
        _slot: u32,
        _buffer: &Arc<dyn NativeBuffer>,
    ) -> Result<()> {
        self.stats.lock().unwrap().uniform_writes += 1;
        Ok(())
    }

    fn write_image_sampler(
        &mut self,
        _binding_set: &Arc<dyn NativeBindingSet>,
        _slot: u32,
        _sampler: SamplerType,
        _image: &Arc<dyn NativeImage>,
    ) -> Result<()> {
        self.stats.lock().unwrap().sampler_writes += 1;
        Ok(())
    }

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList::new()))
    }

    fn wait_for_frame(&mut self) -> Result<()> {
        self.stats.lock().unwrap().frame_waits += 1;
        Ok(())
    }

    fn acquire_next_image(&mut self) -> Result<u32> {
        let index = self.next_acquire;
        self.next_acquire = (self.next_acquire + 1) % self.presentable_count;
        self.stats.lock().unwrap().acquired.push(index);
        Ok(index)
    }

    fn submit_staging(&mut self, commands: &dyn CommandList) -> Result<()> {
        let recorded = Self::commands_of(commands);
        self.stats.lock().unwrap().staging_submissions.push(recorded);
        Ok(())
    }

    fn submit_frame(&mut self, commands: &dyn CommandList, presenting: bool) -> Result<()> {
        let recorded = Self::commands_of(commands);
        self.stats.lock().unwrap().frame_submissions.push((recorded, presenting));
        Ok(())
    }

    fn present(&mut self, image_index: u32) -> Result<()> {
        self.stats.lock().unwrap().presents.push(image_index);
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.stats.lock().unwrap().idle_waits += 1;
        Ok(())
    }
}
