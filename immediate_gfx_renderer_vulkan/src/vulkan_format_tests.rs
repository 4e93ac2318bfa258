//! Unit tests for Vulkan format conversion functions
//!
//! Pure mappings only, no GPU required.

use ash::vk;
use immediate_gfx::igfx::resource::{BufferUsage, ImageFormat, ImageUsage, Vertex};
use immediate_gfx::igfx::ImageLayout;
use crate::vulkan_format::*;
use crate::vulkan_memory::memory_location;

// ============================================================================
// IMAGE FORMATS
// ============================================================================

#[test]
fn test_image_formats_to_vk() {
    assert_eq!(format_to_vk(ImageFormat::Rgba8), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(ImageFormat::Bgra8), vk::Format::B8G8R8A8_UNORM);
    assert_eq!(format_to_vk(ImageFormat::Depth32), vk::Format::D32_SFLOAT);
}

#[test]
fn test_image_formats_from_vk() {
    for format in [ImageFormat::Rgba8, ImageFormat::Bgra8, ImageFormat::Depth32] {
        assert_eq!(format_from_vk(format_to_vk(format)), Some(format));
    }
    assert_eq!(format_from_vk(vk::Format::B8G8R8A8_SRGB), None);
}

#[test]
fn test_aspect_mask_follows_format() {
    assert_eq!(aspect_mask(ImageFormat::Rgba8), vk::ImageAspectFlags::COLOR);
    assert_eq!(aspect_mask(ImageFormat::Bgra8), vk::ImageAspectFlags::COLOR);
    assert_eq!(aspect_mask(ImageFormat::Depth32), vk::ImageAspectFlags::DEPTH);
}

// ============================================================================
// USAGE FLAGS
// ============================================================================

#[test]
fn test_color_render_target_usage() {
    let flags = image_usage_to_vk(ImageFormat::Rgba8, ImageUsage::RENDER_TARGET);
    assert_eq!(
        flags,
        vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC
    );
}

#[test]
fn test_depth_render_target_usage() {
    let flags = image_usage_to_vk(ImageFormat::Depth32, ImageUsage::RENDER_TARGET);
    assert!(flags.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT));
    assert!(!flags.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT));
}

#[test]
fn test_shader_usage_is_sampled_transfer_destination() {
    let flags = image_usage_to_vk(ImageFormat::Rgba8, ImageUsage::SHADER);
    assert_eq!(flags, vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST);

    let both = image_usage_to_vk(ImageFormat::Rgba8, ImageUsage::RENDER_TARGET | ImageUsage::SHADER);
    assert!(both.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED));
}

#[test]
fn test_buffer_usage_to_vk() {
    assert_eq!(buffer_usage_to_vk(BufferUsage::Vertex), vk::BufferUsageFlags::VERTEX_BUFFER);
    assert_eq!(buffer_usage_to_vk(BufferUsage::Index), vk::BufferUsageFlags::INDEX_BUFFER);
    assert_eq!(buffer_usage_to_vk(BufferUsage::Uniform), vk::BufferUsageFlags::UNIFORM_BUFFER);
    assert_eq!(buffer_usage_to_vk(BufferUsage::Staging), vk::BufferUsageFlags::TRANSFER_SRC);
}

// ============================================================================
// LAYOUT TABLE
// ============================================================================

#[test]
fn test_layout_table() {
    let expected = [
        (
            ImageLayout::Undefined,
            vk::ImageLayout::UNDEFINED,
            vk::AccessFlags::empty(),
            vk::PipelineStageFlags::TOP_OF_PIPE,
        ),
        (
            ImageLayout::FragmentShaderRead,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        (
            ImageLayout::ColorAttachment,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        ),
        (
            ImageLayout::DepthStencilAttachment,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        ),
        (
            ImageLayout::Present,
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::AccessFlags::MEMORY_READ,
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        ),
        (
            ImageLayout::TransferSource,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::AccessFlags::TRANSFER_READ,
            vk::PipelineStageFlags::TRANSFER,
        ),
        (
            ImageLayout::TransferDestination,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TRANSFER,
        ),
    ];

    for (layout, vk_layout, access, stage) in expected {
        assert_eq!(
            layout_info(layout),
            LayoutInfo { layout: vk_layout, access, stage },
            "{:?}",
            layout
        );
    }
}

#[test]
fn test_attachment_layouts_match_format_attachment_layout() {
    assert_eq!(
        layout_info(ImageFormat::Rgba8.attachment_layout()).layout,
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
    );
    assert_eq!(
        layout_info(ImageFormat::Depth32.attachment_layout()).layout,
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    );
}

// ============================================================================
// PASS / PIPELINE HELPERS
// ============================================================================

#[test]
fn test_load_op() {
    assert_eq!(load_op(true), vk::AttachmentLoadOp::CLEAR);
    assert_eq!(load_op(false), vk::AttachmentLoadOp::LOAD);
}

#[test]
fn test_vertex_attribute_formats() {
    let formats: Vec<_> = Vertex::ATTRIBUTES
        .iter()
        .map(|attribute| attribute_format(attribute.components))
        .collect();
    assert_eq!(
        formats,
        vec![
            vk::Format::R32G32B32_SFLOAT,
            vk::Format::R32G32_SFLOAT,
            vk::Format::R32G32B32A32_SFLOAT,
        ]
    );
}

#[test]
fn test_memory_location() {
    assert_eq!(memory_location(true), gpu_allocator::MemoryLocation::CpuToGpu);
    assert_eq!(memory_location(false), gpu_allocator::MemoryLocation::GpuOnly);
}
