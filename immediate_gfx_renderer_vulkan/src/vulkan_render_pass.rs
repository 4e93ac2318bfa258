/// RenderPass - Vulkan implementation of NativeRenderPass
///
/// Synthesized from a [`RenderPassDesc`]: one subpass, at most one color and
/// one depth attachment, and initial/final layouts equal to the attachment
/// layout so the pass never moves an image.

use ash::vk;
use immediate_gfx::igfx::cache::RenderPassDesc;
use immediate_gfx::igfx::device::NativeRenderPass;
use immediate_gfx::igfx::{Error, Result};
use immediate_gfx::igfx_err;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{format_to_vk, layout_info, load_op};

pub struct RenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) desc: RenderPassDesc,
}

/// Attachment descriptions in attachment order (color, then depth)
pub(crate) fn attachment_descriptions(desc: &RenderPassDesc) -> Vec<vk::AttachmentDescription> {
    let mut attachments = Vec::with_capacity(2);

    if let Some(color) = desc.color {
        let layout = layout_info(color.attachment_layout()).layout;
        attachments.push(
            vk::AttachmentDescription::default()
                .format(format_to_vk(color))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(load_op(desc.clear_color))
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(layout)
                .final_layout(layout),
        );
    }

    if let Some(depth) = desc.depth {
        let layout = layout_info(depth.attachment_layout()).layout;
        attachments.push(
            vk::AttachmentDescription::default()
                .format(format_to_vk(depth))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(load_op(desc.clear_depth))
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::LOAD)
                .stencil_store_op(vk::AttachmentStoreOp::STORE)
                .initial_layout(layout)
                .final_layout(layout),
        );
    }

    attachments
}

impl RenderPass {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &RenderPassDesc) -> Result<Self> {
        if desc.color.is_none() && desc.depth.is_none() {
            return Err(Error::InvalidResource("render pass without attachments".to_string()));
        }

        let attachments = attachment_descriptions(desc);

        let color_refs: Vec<vk::AttachmentReference> = desc
            .color
            .iter()
            .map(|_| {
                vk::AttachmentReference::default()
                    .attachment(0)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            })
            .collect();
        let depth_ref = desc.depth.map(|_| {
            vk::AttachmentReference::default()
                .attachment(color_refs.len() as u32)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
        });

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(ref depth_ref) = depth_ref {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        let mut stage_mask = vk::PipelineStageFlags::empty();
        let mut access_mask = vk::AccessFlags::empty();
        if desc.color.is_some() {
            stage_mask |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
            access_mask |= vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
        }
        if desc.depth.is_some() {
            stage_mask |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
            access_mask |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
        }

        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stage_mask)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stage_mask)
            .dst_access_mask(access_mask);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        let render_pass = unsafe {
            ctx.device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to create render pass: {:?}", e))?
        };

        Ok(Self { ctx, render_pass, desc: *desc })
    }
}

impl NativeRenderPass for RenderPass {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_render_pass_tests.rs"]
mod tests;
