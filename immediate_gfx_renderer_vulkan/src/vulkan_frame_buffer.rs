/// Framebuffer - Vulkan implementation of NativeFramebuffer
///
/// Groups the color and depth views bound by one `set_render_targets` call.
/// Cached by the core and reused for every pass over the same views.

use ash::vk;
use immediate_gfx::igfx::device::{FramebufferCreateInfo, NativeFramebuffer};
use immediate_gfx::igfx::Result;
use immediate_gfx::igfx_err;
use std::any::Any;
use std::sync::Arc;

use crate::downcast;
use crate::vulkan_context::GpuContext;
use crate::vulkan_image::Image;
use crate::vulkan_render_pass::RenderPass;

pub struct Framebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
}

impl Framebuffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, info: &FramebufferCreateInfo) -> Result<Self> {
        let render_pass = downcast::<RenderPass>(info.render_pass.as_any(), "render pass")?;

        let mut attachments = Vec::with_capacity(2);
        if let Some(color) = info.color {
            attachments.push(downcast::<Image>(color.as_any(), "color target")?.view);
        }
        if let Some(depth) = info.depth {
            attachments.push(downcast::<Image>(depth.as_any(), "depth target")?.view);
        }

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&attachments)
            .width(info.desc.width)
            .height(info.desc.height)
            .layers(1);

        let framebuffer = unsafe {
            ctx.device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to create framebuffer: {:?}", e))?
        };

        Ok(Self { ctx, framebuffer, width: info.desc.width, height: info.desc.height })
    }
}

impl NativeFramebuffer for Framebuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
