//! Unit tests for render pass attachment synthesis (no GPU)

use ash::vk;
use immediate_gfx::igfx::cache::RenderPassDesc;
use immediate_gfx::igfx::resource::ImageFormat;
use crate::vulkan_render_pass::attachment_descriptions;

#[test]
fn test_color_and_depth_attachment_order() {
    let desc = RenderPassDesc::for_targets(Some(ImageFormat::Rgba8), Some(ImageFormat::Depth32));
    let attachments = attachment_descriptions(&desc);

    assert_eq!(attachments.len(), 2);
    assert_eq!(attachments[0].format, vk::Format::R8G8B8A8_UNORM);
    assert_eq!(attachments[1].format, vk::Format::D32_SFLOAT);
}

#[test]
fn test_load_ops_follow_clear_flags() {
    let desc = RenderPassDesc::for_targets(Some(ImageFormat::Rgba8), Some(ImageFormat::Depth32));

    let loading = attachment_descriptions(&desc);
    assert_eq!(loading[0].load_op, vk::AttachmentLoadOp::LOAD);
    assert_eq!(loading[1].load_op, vk::AttachmentLoadOp::LOAD);

    let clearing = attachment_descriptions(&desc.with_clear(true, false));
    assert_eq!(clearing[0].load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(clearing[1].load_op, vk::AttachmentLoadOp::LOAD);

    for attachment in attachment_descriptions(&desc.with_clear(true, true)) {
        assert_eq!(attachment.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(attachment.store_op, vk::AttachmentStoreOp::STORE);
    }
}

#[test]
fn test_pass_never_moves_images() {
    let desc = RenderPassDesc::for_targets(Some(ImageFormat::Bgra8), Some(ImageFormat::Depth32));
    let attachments = attachment_descriptions(&desc);

    assert_eq!(attachments[0].initial_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    assert_eq!(attachments[0].final_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    assert_eq!(attachments[1].initial_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    assert_eq!(attachments[1].final_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
}

#[test]
fn test_stencil_ops() {
    let desc = RenderPassDesc::for_targets(Some(ImageFormat::Rgba8), Some(ImageFormat::Depth32));
    let attachments = attachment_descriptions(&desc);

    assert_eq!(attachments[0].stencil_load_op, vk::AttachmentLoadOp::DONT_CARE);
    assert_eq!(attachments[0].stencil_store_op, vk::AttachmentStoreOp::DONT_CARE);
    assert_eq!(attachments[1].stencil_load_op, vk::AttachmentLoadOp::LOAD);
    assert_eq!(attachments[1].stencil_store_op, vk::AttachmentStoreOp::STORE);
}

#[test]
fn test_depth_only_pass() {
    let desc = RenderPassDesc::for_targets(None, Some(ImageFormat::Depth32)).with_clear(true, true);
    let attachments = attachment_descriptions(&desc);

    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].format, vk::Format::D32_SFLOAT);
    assert_eq!(attachments[0].load_op, vk::AttachmentLoadOp::CLEAR);
}
