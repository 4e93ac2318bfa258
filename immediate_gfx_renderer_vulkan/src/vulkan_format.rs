/// Conversions from core enums to Vulkan enums and flags

use ash::vk;
use immediate_gfx::igfx::resource::{BufferUsage, ImageFormat, ImageUsage};
use immediate_gfx::igfx::ImageLayout;

/// Vulkan layout, access mask and pipeline stage that describe one [`ImageLayout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutInfo {
    pub layout: vk::ImageLayout,
    pub access: vk::AccessFlags,
    pub stage: vk::PipelineStageFlags,
}

pub(crate) fn format_to_vk(format: ImageFormat) -> vk::Format {
    match format {
        ImageFormat::Rgba8 => vk::Format::R8G8B8A8_UNORM,
        ImageFormat::Bgra8 => vk::Format::B8G8R8A8_UNORM,
        ImageFormat::Depth32 => vk::Format::D32_SFLOAT,
    }
}

pub(crate) fn format_from_vk(format: vk::Format) -> Option<ImageFormat> {
    match format {
        vk::Format::R8G8B8A8_UNORM => Some(ImageFormat::Rgba8),
        vk::Format::B8G8R8A8_UNORM => Some(ImageFormat::Bgra8),
        vk::Format::D32_SFLOAT => Some(ImageFormat::Depth32),
        _ => None,
    }
}

pub(crate) fn aspect_mask(format: ImageFormat) -> vk::ImageAspectFlags {
    if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

pub(crate) fn image_usage_to_vk(format: ImageFormat, usage: ImageUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(ImageUsage::RENDER_TARGET) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
        flags |= if format.is_depth() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
    }
    if usage.contains(ImageUsage::SHADER) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED;
    }
    flags
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    match usage {
        BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        BufferUsage::Staging => vk::BufferUsageFlags::TRANSFER_SRC,
    }
}

pub(crate) fn layout_info(layout: ImageLayout) -> LayoutInfo {
    let (layout, access, stage) = match layout {
        ImageLayout::Undefined => (
            vk::ImageLayout::UNDEFINED,
            vk::AccessFlags::empty(),
            vk::PipelineStageFlags::TOP_OF_PIPE,
        ),
        ImageLayout::FragmentShaderRead => (
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        ImageLayout::ColorAttachment => (
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        ),
        ImageLayout::DepthStencilAttachment => (
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        ),
        ImageLayout::Present => (
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::AccessFlags::MEMORY_READ,
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        ),
        ImageLayout::TransferSource => (
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::AccessFlags::TRANSFER_READ,
            vk::PipelineStageFlags::TRANSFER,
        ),
        ImageLayout::TransferDestination => (
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TRANSFER,
        ),
    };
    LayoutInfo { layout, access, stage }
}

/// Clear when the pass clears the attachment, otherwise keep its contents
pub(crate) fn load_op(clear: bool) -> vk::AttachmentLoadOp {
    if clear {
        vk::AttachmentLoadOp::CLEAR
    } else {
        vk::AttachmentLoadOp::LOAD
    }
}

/// Vertex attribute format for a vector of `components` f32 values
pub(crate) fn attribute_format(components: u32) -> vk::Format {
    match components {
        1 => vk::Format::R32_SFLOAT,
        2 => vk::Format::R32G32_SFLOAT,
        3 => vk::Format::R32G32B32_SFLOAT,
        _ => vk::Format::R32G32B32A32_SFLOAT,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
