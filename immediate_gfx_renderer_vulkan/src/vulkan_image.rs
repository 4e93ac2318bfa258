/// Image - Vulkan implementation of NativeImage
///
/// Owns a VkImage, its memory and a 2D view covering the whole image.
/// Swapchain images only own their view; the swapchain owns the VkImage.

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use immediate_gfx::igfx::device::{ImageDesc, NativeImage};
use immediate_gfx::igfx::resource::ImageFormat;
use immediate_gfx::igfx::{Error, Result};
use immediate_gfx::igfx_err;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_mask, format_to_vk, image_usage_to_vk};
use crate::vulkan_memory;

pub struct Image {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    /// None for swapchain images
    allocation: Option<Allocation>,
    pub(crate) format: ImageFormat,
    pub(crate) width: u32,
    pub(crate) height: u32,
    alignment: u64,
}

fn create_view(
    device: &ash::Device,
    image: vk::Image,
    format: ImageFormat,
) -> Result<vk::ImageView> {
    let view_create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format_to_vk(format))
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect_mask(format),
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe {
        device
            .create_image_view(&view_create_info, None)
            .map_err(|e| igfx_err!("igfx::vulkan", "Failed to create image view: {:?}", e))
    }
}

impl Image {
    /// Create a device-local image with one mip level
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &ImageDesc) -> Result<Self> {
        let image_create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format_to_vk(desc.format))
            .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(image_usage_to_vk(desc.format, desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        unsafe {
            let image = ctx
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to create image: {:?}", e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = match vulkan_memory::allocate(&ctx, requirements, false, false, "image") {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
            {
                vulkan_memory::free(&ctx, allocation);
                ctx.device.destroy_image(image, None);
                return Err(igfx_err!("igfx::vulkan", "Failed to bind image memory: {:?}", e));
            }

            let view = match create_view(&ctx.device, image, desc.format) {
                Ok(view) => view,
                Err(e) => {
                    vulkan_memory::free(&ctx, allocation);
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            Ok(Self {
                ctx,
                image,
                view,
                allocation: Some(allocation),
                format: desc.format,
                width: desc.width,
                height: desc.height,
                alignment: requirements.alignment,
            })
        }
    }

    /// Wrap an image owned by the swapchain
    pub(crate) fn from_swapchain(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if format.is_depth() {
            return Err(Error::InitializationFailed("swapchain format must be a color format".to_string()));
        }
        let view = create_view(&ctx.device, image, format)?;
        Ok(Self { ctx, image, view, allocation: None, format, width, height, alignment: 1 })
    }
}

impl NativeImage for Image {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn memory_alignment(&self) -> u64 {
        self.alignment
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);

            // Swapchain images are destroyed with their swapchain
            if let Some(allocation) = self.allocation.take() {
                vulkan_memory::free(&self.ctx, allocation);
                self.ctx.device.destroy_image(self.image, None);
            }
        }
    }
}
