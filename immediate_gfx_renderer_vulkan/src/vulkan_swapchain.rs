/// Swapchain - presentation surface and its image ring
///
/// The images are exposed to the core as presentable slots; views over them
/// are owned by the [`Image`] wrappers handed out by `presentable_images`.

use ash::vk;
use immediate_gfx::igfx::device::{NativeImage, PresentableImages};
use immediate_gfx::igfx::resource::ImageFormat;
use immediate_gfx::igfx::{Error, Result};
use immediate_gfx::{igfx_debug, igfx_err, igfx_error, igfx_warn};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_image::Image;

/// Required surface format; the core renders presentable slots as Bgra8
pub(crate) const SWAPCHAIN_FORMAT: vk::Format = vk::Format::B8G8R8A8_UNORM;

pub(crate) struct Swapchain {
    ctx: Arc<GpuContext>,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    images: Vec<vk::Image>,
    extent: vk::Extent2D,

    /// Signaled by acquire, waited on by the frame submission
    image_available: vk::Semaphore,
    /// One per image, signaled by the frame submission and waited on by present
    render_finished: Vec<vk::Semaphore>,
}

/// Clamp the requested image count to the surface limits (max 0 = unbounded)
pub(crate) fn clamp_image_count(requested: u32, capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = requested.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Current surface extent, or the window size clamped to the surface limits
pub(crate) fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

fn create_semaphore(device: &ash::Device) -> Result<vk::Semaphore> {
    unsafe {
        device
            .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
            .map_err(|e| {
                igfx_error!("igfx::vulkan", "Failed to create semaphore: {:?}", e);
                Error::InitializationFailed(format!("Failed to create semaphore: {:?}", e))
            })
    }
}

impl Swapchain {
    /// Create the swapchain for `surface`; takes ownership of the surface
    pub fn new(
        ctx: Arc<GpuContext>,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        image_count: u32,
        window_width: u32,
        window_height: u32,
    ) -> Result<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);
        let mut swapchain = Self {
            ctx,
            surface,
            surface_loader,
            swapchain: vk::SwapchainKHR::null(),
            swapchain_loader,
            images: Vec::new(),
            extent: vk::Extent2D::default(),
            image_available: vk::Semaphore::null(),
            render_finished: Vec::new(),
        };
        // Drop cleans up whatever was created if a later step fails
        swapchain.build(image_count, window_width, window_height)?;
        Ok(swapchain)
    }

    fn build(&mut self, image_count: u32, window_width: u32, window_height: u32) -> Result<()> {
        let physical_device = self.ctx.physical_device;

        unsafe {
            let capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map_err(|e| {
                    igfx_error!("igfx::vulkan", "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;

            let surface_formats = self
                .surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)
                .map_err(|e| {
                    igfx_error!("igfx::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;

            let surface_format = surface_formats
                .iter()
                .find(|f| f.format == SWAPCHAIN_FORMAT)
                .copied()
                .ok_or_else(|| {
                    igfx_error!(
                        "igfx::vulkan",
                        "Surface does not support B8G8R8A8_UNORM ({} formats offered)",
                        surface_formats.len()
                    );
                    Error::InitializationFailed("Surface does not support B8G8R8A8_UNORM".to_string())
                })?;

            let extent = choose_extent(&capabilities, window_width, window_height);
            let min_image_count = clamp_image_count(image_count, &capabilities);
            if min_image_count != image_count {
                igfx_warn!(
                    "igfx::vulkan",
                    "Swapchain image count {} clamped to {}",
                    image_count, min_image_count
                );
            }

            let wanted_usage = vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::TRANSFER_DST
                | vk::ImageUsageFlags::TRANSFER_SRC;
            let image_usage = wanted_usage & capabilities.supported_usage_flags;

            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(min_image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(image_usage)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true);

            self.swapchain = self
                .swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| {
                    igfx_error!("igfx::vulkan", "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;
            self.extent = extent;

            self.images = self
                .swapchain_loader
                .get_swapchain_images(self.swapchain)
                .map_err(|e| {
                    igfx_error!("igfx::vulkan", "Failed to get swapchain images: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
                })?;
        }

        self.image_available = create_semaphore(&self.ctx.device)?;
        for _ in 0..self.images.len() {
            let semaphore = create_semaphore(&self.ctx.device)?;
            self.render_finished.push(semaphore);
        }

        igfx_debug!(
            "igfx::vulkan",
            "Swapchain created: {} images, {}x{}",
            self.images.len(), self.extent.width, self.extent.height
        );
        Ok(())
    }

    pub fn image_available_semaphore(&self) -> vk::Semaphore {
        self.image_available
    }

    pub fn render_finished_semaphore(&self, image_index: u32) -> Result<vk::Semaphore> {
        self.render_finished
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| {
                Error::InvalidState(format!(
                    "swapchain image index {} out of range (count: {})",
                    image_index,
                    self.render_finished.len()
                ))
            })
    }

    pub fn acquire(&mut self) -> Result<u32> {
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.image_available,
                vk::Fence::null(),
            ) {
                Ok((image_index, suboptimal)) => {
                    if suboptimal {
                        igfx_warn!("igfx::vulkan", "Swapchain suboptimal during acquire");
                    }
                    Ok(image_index)
                }
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    Err(igfx_err!("igfx::vulkan", "Swapchain out of date during acquire"))
                }
                Err(e) => Err(igfx_err!("igfx::vulkan", "Failed to acquire next swapchain image: {:?}", e)),
            }
        }
    }

    pub fn present(&mut self, image_index: u32) -> Result<()> {
        let wait_semaphores = [self.render_finished_semaphore(image_index)?];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            match self.swapchain_loader.queue_present(self.ctx.present_queue, &present_info) {
                Ok(false) => Ok(()),
                Ok(true) => {
                    igfx_warn!("igfx::vulkan", "Swapchain suboptimal during present");
                    Ok(())
                }
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    Err(igfx_err!("igfx::vulkan", "Swapchain out of date during present"))
                }
                Err(e) => Err(igfx_err!("igfx::vulkan", "Failed to present swapchain image: {:?}", e)),
            }
        }
    }

    /// Wrap each swapchain image with a fresh view, in slot order
    pub fn presentable_images(&self) -> Result<PresentableImages> {
        let images = self
            .images
            .iter()
            .map(|&image| {
                Image::from_swapchain(
                    Arc::clone(&self.ctx),
                    image,
                    ImageFormat::Bgra8,
                    self.extent.width,
                    self.extent.height,
                )
                .map(|image| Arc::new(image) as Arc<dyn NativeImage>)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PresentableImages {
            images,
            width: self.extent.width,
            height: self.extent.height,
            format: ImageFormat::Bgra8,
        })
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();

            if self.image_available != vk::Semaphore::null() {
                self.ctx.device.destroy_semaphore(self.image_available, None);
            }
            for &semaphore in &self.render_finished {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }

            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities(current: (u32, u32), min_count: u32, max_count: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            current_extent: vk::Extent2D { width: current.0, height: current.1 },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
            ..Default::default()
        }
    }

    #[test]
    fn test_extent_uses_current_extent() {
        let caps = capabilities((1280, 720), 2, 8);
        let extent = choose_extent(&caps, 800, 600);
        assert_eq!((extent.width, extent.height), (1280, 720));
    }

    #[test]
    fn test_extent_falls_back_to_window_size() {
        let caps = capabilities((u32::MAX, u32::MAX), 2, 8);
        let extent = choose_extent(&caps, 800, 600);
        assert_eq!((extent.width, extent.height), (800, 600));

        let extent = choose_extent(&caps, 10_000, 0);
        assert_eq!((extent.width, extent.height), (4096, 1));
    }

    #[test]
    fn test_image_count_clamped() {
        assert_eq!(clamp_image_count(2, &capabilities((1, 1), 2, 8)), 2);
        assert_eq!(clamp_image_count(2, &capabilities((1, 1), 3, 8)), 3);
        assert_eq!(clamp_image_count(5, &capabilities((1, 1), 2, 3)), 3);
        // No upper bound
        assert_eq!(clamp_image_count(16, &capabilities((1, 1), 2, 0)), 16);
    }
}
