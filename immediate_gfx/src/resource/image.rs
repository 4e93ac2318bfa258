/// Image resource: a 2-D pixel surface with a tracked layout

use std::sync::Arc;
use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::graphics_device::NativeImage;
use crate::layout::ImageLayout;

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// 8 bits per channel RGBA, unorm
    Rgba8,
    /// 8 bits per channel BGRA, unorm (swapchain)
    Bgra8,
    /// 32-bit float depth
    Depth32,
}

impl ImageFormat {
    pub fn is_depth(self) -> bool {
        matches!(self, ImageFormat::Depth32)
    }

    pub fn bytes_per_pixel(self) -> u32 {
        4
    }

    /// Layout the image must be in while bound as an attachment
    pub fn attachment_layout(self) -> ImageLayout {
        if self.is_depth() {
            ImageLayout::DepthStencilAttachment
        } else {
            ImageLayout::ColorAttachment
        }
    }
}

bitflags! {
    /// How an image will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        /// Color or depth attachment, and blit source
        const RENDER_TARGET = 1 << 0;
        /// Sampled in shaders, and copy destination
        const SHADER = 1 << 1;
    }
}

/// Identity of an image view, unique per surface for the renderer's lifetime
///
/// Framebuffer descriptions key on view ids, so two framebuffers match only
/// when they reference the same concrete surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u32);

/// One native image + view
#[derive(Clone)]
pub struct ImageSurface {
    pub view: ViewId,
    pub native: Arc<dyn NativeImage>,
}

/// A 2-D image
///
/// Plain images have one surface. The presentable image has one surface per
/// swapchain slot; [`Image::select_slot`] rebinds the active one each frame.
pub struct Image {
    width: u32,
    height: u32,
    format: ImageFormat,
    usage: ImageUsage,
    layout: ImageLayout,
    surfaces: Vec<ImageSurface>,
    active_slot: usize,
    presentable: bool,
}

impl Image {
    pub(crate) fn new(
        width: u32,
        height: u32,
        format: ImageFormat,
        usage: ImageUsage,
        surface: ImageSurface,
    ) -> Self {
        Self {
            width,
            height,
            format,
            usage,
            layout: ImageLayout::Undefined,
            surfaces: vec![surface],
            active_slot: 0,
            presentable: false,
        }
    }

    pub(crate) fn new_presentable(
        width: u32,
        height: u32,
        format: ImageFormat,
        surfaces: Vec<ImageSurface>,
    ) -> Result<Self> {
        if surfaces.is_empty() {
            return Err(Error::InitializationFailed(
                "presentable image needs at least one surface".to_string(),
            ));
        }
        Ok(Self {
            width,
            height,
            format,
            usage: ImageUsage::RENDER_TARGET,
            layout: ImageLayout::Undefined,
            surfaces,
            active_slot: 0,
            presentable: true,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn usage(&self) -> ImageUsage {
        self.usage
    }

    /// Layout after the last recorded transition
    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    pub(crate) fn set_layout(&mut self, layout: ImageLayout) {
        self.layout = layout;
    }

    pub fn is_presentable(&self) -> bool {
        self.presentable
    }

    pub fn slot_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn active_slot(&self) -> usize {
        self.active_slot
    }

    /// Make swapchain slot `slot` the active surface
    pub fn select_slot(&mut self, slot: usize) -> Result<()> {
        if slot >= self.surfaces.len() {
            return Err(Error::InvalidResource(format!(
                "slot {} out of range ({} surfaces)",
                slot,
                self.surfaces.len()
            )));
        }
        self.active_slot = slot;
        Ok(())
    }

    /// View of the active surface
    pub fn view(&self) -> ViewId {
        self.surfaces[self.active_slot].view
    }

    /// Native image of the active surface
    pub fn native(&self) -> &Arc<dyn NativeImage> {
        &self.surfaces[self.active_slot].native
    }

    pub fn surfaces(&self) -> &[ImageSurface] {
        &self.surfaces
    }
}
