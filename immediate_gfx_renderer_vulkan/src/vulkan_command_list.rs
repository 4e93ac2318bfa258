/// CommandList - Vulkan implementation of the core CommandList trait
///
/// Owns a command pool with a single primary command buffer that is reset on
/// every `begin`.

use ash::vk;
use immediate_gfx::igfx::device::{
    BufferImageCopy, ClearValue, CommandList as IgfxCommandList, ImageBarrier, ImageBlit,
    IndexType, NativeBindingSet, NativeBuffer, NativeFramebuffer, NativePipeline,
    NativeRenderPass, Rect2D, Viewport,
};
use immediate_gfx::igfx::resource::BindingScope;
use immediate_gfx::igfx::{Error, Result};
use immediate_gfx::igfx_err;
use std::any::Any;
use std::sync::Arc;

use crate::downcast;
use crate::vulkan_binding_set::BindingSet;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_mask, layout_info};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_image::Image;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;

pub struct CommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    /// Unified layout all binding sets are bound against
    pipeline_layout: vk::PipelineLayout,
    is_recording: bool,
    in_render_pass: bool,
}

fn full_subresource(aspect_mask: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask,
        base_mip_level: 0,
        level_count: vk::REMAINING_MIP_LEVELS,
        base_array_layer: 0,
        layer_count: vk::REMAINING_ARRAY_LAYERS,
    }
}

fn color_layers() -> vk::ImageSubresourceLayers {
    vk::ImageSubresourceLayers {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        mip_level: 0,
        base_array_layer: 0,
        layer_count: 1,
    }
}

pub(crate) fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match *value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
    }
}

impl CommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>, pipeline_layout: vk::PipelineLayout) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx
                .device
                .create_command_pool(&command_pool_create_info, None)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to create command pool: {:?}", e))?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match ctx.device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) if !buffers.is_empty() => buffers[0],
                Ok(_) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(igfx_err!("igfx::vulkan", "No command buffer allocated"));
                }
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(igfx_err!("igfx::vulkan", "Failed to allocate command buffer: {:?}", e));
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer,
                pipeline_layout,
                is_recording: false,
                in_render_pass: false,
            })
        }
    }

    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::InvalidState("Command list not recording".to_string()));
        }
        Ok(())
    }
}

impl IgfxCommandList for CommandList {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::InvalidState("Command list already recording".to_string()));
        }

        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }

        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidState(
                "Render pass not ended before ending command list".to_string(),
            ));
        }

        unsafe {
            self.ctx
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
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
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidState("Already inside a render pass".to_string()));
        }

        let vk_render_pass = downcast::<RenderPass>(render_pass.as_any(), "render pass")?;
        let vk_framebuffer = downcast::<Framebuffer>(framebuffer.as_any(), "framebuffer")?;
        let vk_clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();

        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: render_area.x, y: render_area.y },
                extent: vk::Extent2D { width: render_area.width, height: render_area.height },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            return Err(Error::InvalidState("Not inside a render pass".to_string()));
        }

        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording()?;

        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording()?;

        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };

        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn NativePipeline>) -> Result<()> {
        self.ensure_recording()?;
        let vk_pipeline = downcast::<Pipeline>(pipeline.as_any(), "pipeline")?;

        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn bind_binding_set(
        &mut self,
        scope: BindingScope,
        binding_set: &Arc<dyn NativeBindingSet>,
    ) -> Result<()> {
        self.ensure_recording()?;
        let vk_set = downcast::<BindingSet>(binding_set.as_any(), "binding set")?;

        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout,
                scope.set_index(),
                &[vk_set.descriptor_set],
                &[],
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn NativeBuffer>, offset: u64) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "vertex buffer")?;

        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                0,
                &[vk_buffer.buffer],
                &[offset],
            );
        }
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        buffer: &Arc<dyn NativeBuffer>,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "index buffer")?;
        let vk_index_type = match index_type {
            IndexType::U16 => vk::IndexType::UINT16,
            IndexType::U32 => vk::IndexType::UINT32,
        };

        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                vk_index_type,
            );
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            return Err(Error::InvalidState("draw_indexed outside a render pass".to_string()));
        }

        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                1,
                first_index,
                vertex_offset,
                0,
            );
        }
        Ok(())
    }

    fn blit_image(&mut self, blit: &ImageBlit) -> Result<()> {
        self.ensure_recording()?;
        let src = downcast::<Image>(blit.src.as_any(), "blit source")?;
        let dst = downcast::<Image>(blit.dst.as_any(), "blit destination")?;

        let region = vk::ImageBlit {
            src_subresource: color_layers(),
            src_offsets: [
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D { x: blit.src_width as i32, y: blit.src_height as i32, z: 1 },
            ],
            dst_subresource: color_layers(),
            dst_offsets: [
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D { x: blit.dst_width as i32, y: blit.dst_height as i32, z: 1 },
            ],
        };

        unsafe {
            self.ctx.device.cmd_blit_image(
                self.command_buffer,
                src.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
                vk::Filter::LINEAR,
            );
        }
        Ok(())
    }

    fn pipeline_barrier(&mut self, barrier: &ImageBarrier) -> Result<()> {
        self.ensure_recording()?;
        let image = downcast::<Image>(barrier.image.as_any(), "barrier image")?;
        let old = layout_info(barrier.old_layout);
        let new = layout_info(barrier.new_layout);

        let vk_barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old.layout)
            .new_layout(new.layout)
            .src_access_mask(old.access)
            .dst_access_mask(new.access)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image.image)
            .subresource_range(full_subresource(aspect_mask(barrier.format)));

        unsafe {
            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                old.stage,
                new.stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[vk_barrier],
            );
        }
        Ok(())
    }

    fn copy_buffer_to_image(&mut self, copy: &BufferImageCopy) -> Result<()> {
        self.ensure_recording()?;
        let buffer = downcast::<Buffer>(copy.buffer.as_any(), "staging buffer")?;
        let image = downcast::<Image>(copy.image.as_any(), "copy destination")?;

        let region = vk::BufferImageCopy {
            buffer_offset: copy.buffer_offset,
            // Tightly packed
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: aspect_mask(image.format),
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D { width: copy.width, height: copy.height, depth: 1 },
        };

        unsafe {
            self.ctx.device.cmd_copy_buffer_to_image(
                self.command_buffer,
                buffer.buffer,
                image.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
        }
        Ok(())
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            // Frees the command buffer with it
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
