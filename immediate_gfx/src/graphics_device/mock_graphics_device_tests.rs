//! Unit tests for MockGraphicsDevice and the mock natives
//!
//! The command context tests rely on the mock rejecting the same misuse a
//! validation layer would report, so those guards are checked here.

use std::sync::Arc;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::*;
use crate::graphics_device::{
    BufferDesc, CommandList, GraphicsDevice, NativeBuffer, NativeFramebuffer, NativeRenderPass,
    Rect2D,
};
use crate::cache::{FramebufferDesc, RenderPassDesc};
use crate::resource::{BufferUsage, ImageFormat};

// ============================================================================
// MockBuffer
// ============================================================================

#[test]
fn test_mock_buffer_write_in_bounds() {
    let mut device = MockGraphicsDevice::new();
    let buffer = device.create_buffer(&BufferDesc { size: 8, usage: BufferUsage::Uniform }).unwrap();
    buffer.write(4, &[1, 2, 3, 4]).unwrap();

    let mock = buffer.as_any().downcast_ref::<MockBuffer>().unwrap();
    assert_eq!(*mock.data.lock().unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
    assert_eq!(buffer.size(), 8);
}

#[test]
fn test_mock_buffer_write_out_of_bounds() {
    let mut device = MockGraphicsDevice::new();
    let buffer = device.create_buffer(&BufferDesc { size: 4, usage: BufferUsage::Vertex }).unwrap();
    assert!(matches!(buffer.write(2, &[0; 4]), Err(Error::InvalidResource(_))));
}

// ============================================================================
// MockCommandList
// ============================================================================

fn pass_and_framebuffer(device: &mut MockGraphicsDevice) -> (Arc<dyn NativeRenderPass>, Arc<dyn NativeFramebuffer>) {
    let desc = RenderPassDesc::for_targets(Some(ImageFormat::Rgba8), None);
    let render_pass = device.create_render_pass(&desc).unwrap();
    let fb_desc = FramebufferDesc { width: 4, height: 4, color_view: None, depth_view: None };
    let framebuffer = device
        .create_framebuffer(&crate::graphics_device::FramebufferCreateInfo {
            desc: &fb_desc,
            render_pass: &render_pass,
            color: None,
            depth: None,
        })
        .unwrap();
    (render_pass, framebuffer)
}

#[test]
fn test_mock_command_list_requires_recording() {
    let mut list = MockCommandList::new();
    assert!(list.set_scissor(Rect2D::default()).is_err());
    list.begin().unwrap();
    assert!(list.set_scissor(Rect2D::default()).is_ok());
    assert_eq!(list.commands, vec!["begin", "set_scissor"]);
}

#[test]
fn test_mock_command_list_pass_guards() {
    let mut device = MockGraphicsDevice::new();
    let (render_pass, framebuffer) = pass_and_framebuffer(&mut device);
    let mut list = MockCommandList::new();
    list.begin().unwrap();

    assert!(list.draw_indexed(3, 0, 0).is_err());
    list.begin_render_pass(&render_pass, &framebuffer, Rect2D::default(), &[]).unwrap();
    assert!(list.begin_render_pass(&render_pass, &framebuffer, Rect2D::default(), &[]).is_err());
    assert!(list.end().is_err());
    list.draw_indexed(3, 0, 0).unwrap();
    list.end_render_pass().unwrap();
    list.end().unwrap();

    assert_eq!(list.pass_begins.len(), 1);
    assert_eq!(list.draws, vec![3]);
    assert_eq!(list.count("begin_render_pass"), 1);
    assert_eq!(list.last_position("end"), Some(list.commands.len() - 1));
}

// ============================================================================
// MockGraphicsDevice
// ============================================================================

#[test]
fn test_mock_device_acquire_cycles_slots() {
    let mut device = MockGraphicsDevice::new();
    let stats = device.stats();
    let slots: Vec<u32> = (0..4).map(|_| device.acquire_next_image().unwrap()).collect();
    assert_eq!(slots, vec![0, 1, 0, 1]);
    assert_eq!(stats.lock().unwrap().acquired, slots);
}

#[test]
fn test_mock_device_presentable_images() {
    let mut device = MockGraphicsDevice::new();
    let presentable = device.presentable_images().unwrap();
    assert_eq!(presentable.images.len(), 2);
    assert_eq!(presentable.format, ImageFormat::Bgra8);
}

#[test]
fn test_mock_device_records_submissions() {
    let mut device = MockGraphicsDevice::new();
    let stats = device.stats();
    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    list.end().unwrap();

    device.submit_frame(list.as_ref(), true).unwrap();
    device.present(1).unwrap();

    let stats = stats.lock().unwrap();
    assert_eq!(stats.frame_submissions, vec![(vec!["begin".to_string(), "end".to_string()], true)]);
    assert_eq!(stats.presents, vec![1]);
}
