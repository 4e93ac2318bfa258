/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Bootstraps the instance, device, allocator and swapchain for one window
/// and creates every native object the core asks for. Frame pacing is a
/// single fence: one frame in flight.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use immediate_gfx::igfx::device::{
    BufferDesc, CommandList as IgfxCommandList, FramebufferCreateInfo, GraphicsDevice, ImageDesc,
    NativeBindingSet, NativeBuffer, NativeFramebuffer, NativeImage, NativePipeline,
    NativeRenderPass, NativeShader, PipelineCreateInfo, PresentableImages, ShaderDesc,
};
use immediate_gfx::igfx::cache::RenderPassDesc;
use immediate_gfx::igfx::resource::{BindingScope, SamplerType, IMAGE_SAMPLER_SLOT, UNIFORM_BUFFER_SLOT};
use immediate_gfx::igfx::{Config, Error, Result};
use immediate_gfx::{igfx_debug, igfx_err, igfx_error, igfx_info};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::sync::Arc;
use winit::window::Window;

use crate::downcast;
use crate::vulkan_binding_set::{BindingLayouts, BindingSet, DescriptorPools};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_image::Image;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_sampler::SamplerCache;
use crate::vulkan_shader::Shader;
use crate::vulkan_swapchain::Swapchain;

pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    swapchain: Swapchain,
    layouts: BindingLayouts,
    descriptor_pools: DescriptorPools,
    samplers: SamplerCache,
    /// Signaled by every frame submission; created signaled
    frame_fence: vk::Fence,
    /// Image returned by the last acquire, consumed by the presenting submission
    acquired: Option<u32>,
}

/// Validation is on when the config asks for it or the crate feature is set
pub(crate) fn validation_enabled(config: &Config) -> bool {
    config.enable_validation || cfg!(feature = "vulkan-validation")
}

fn init_failed(what: &str, detail: impl std::fmt::Debug) -> Error {
    igfx_error!("igfx::vulkan", "{}: {:?}", what, detail);
    Error::InitializationFailed(format!("{}: {:?}", what, detail))
}

/// Graphics and present queue families of `physical_device`, if it has both
fn find_queue_families(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Option<(u32, u32)> {
    let queue_families =
        unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

    let graphics = queue_families
        .iter()
        .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))? as u32;

    let supports_present = |index: u32| unsafe {
        surface_loader
            .get_physical_device_surface_support(physical_device, index, surface)
            .unwrap_or(false)
    };

    // Prefer presenting from the graphics family
    let present = if supports_present(graphics) {
        graphics
    } else {
        (0..queue_families.len() as u32).find(|&i| supports_present(i))?
    };
    Some((graphics, present))
}

impl VulkanGraphicsDevice {
    /// Create the device and swapchain for `window`
    pub fn new(window: &Window, config: &Config) -> Result<Self> {
        let enable_validation = validation_enabled(config);

        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_failed("Failed to load Vulkan library", e))?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| init_failed("Invalid application name", e))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"immediate_gfx")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window
                .display_handle()
                .map_err(|e| init_failed("Failed to get display handle", e))?;
            let window_handle = window
                .window_handle()
                .map_err(|e| init_failed("Failed to get window handle", e))?;

            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| init_failed("Failed to get required extensions", e))?
                    .to_vec();
            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_failed("Failed to create Vulkan instance", e))?;

            let debug_messenger = if enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                            | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
                    )
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| init_failed("Failed to create debug messenger", e))?;
                Some((debug_utils, messenger))
            } else {
                None
            };

            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_failed("Failed to create surface", e))?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let physical_devices = instance
                .enumerate_physical_devices()
                .map_err(|e| init_failed("Failed to enumerate physical devices", e))?;

            let (physical_device, (graphics_family, present_family)) = physical_devices
                .into_iter()
                .find_map(|pd| {
                    find_queue_families(&instance, &surface_loader, surface, pd).map(|f| (pd, f))
                })
                .ok_or_else(|| {
                    igfx_error!("igfx::vulkan", "No GPU with graphics and present queues found");
                    Error::InitializationFailed("No suitable Vulkan GPU found".to_string())
                })?;

            let properties = instance.get_physical_device_properties(physical_device);
            let gpu_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            igfx_info!(
                "igfx::vulkan",
                "Using GPU '{}' (graphics family {}, present family {})",
                gpu_name, graphics_family, present_family
            );

            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&queue_priorities)];
            if present_family != graphics_family {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| init_failed("Failed to create logical device", e))?;

            let graphics_queue = device.get_device_queue(graphics_family, 0);
            let present_queue = device.get_device_queue(present_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| init_failed("Failed to create GPU allocator", e))?;

            // From here on the context owns device and instance teardown
            let ctx = Arc::new(GpuContext::new(
                entry,
                instance,
                physical_device,
                device,
                allocator,
                graphics_queue,
                graphics_family,
                present_queue,
                debug_messenger,
            ));

            let size = window.inner_size();
            let swapchain = Swapchain::new(
                Arc::clone(&ctx),
                surface,
                surface_loader,
                config.swapchain_image_count,
                size.width,
                size.height,
            )?;

            let mut layouts = BindingLayouts::new(&ctx.device)?;
            let descriptor_pools = match DescriptorPools::new(&ctx.device, config.descriptor_pool_size) {
                Ok(pools) => pools,
                Err(e) => {
                    layouts.destroy(&ctx.device);
                    return Err(e);
                }
            };

            let fence_create_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
            let frame_fence = ctx.device.create_fence(&fence_create_info, None);
            let mut device = Self {
                ctx,
                swapchain,
                layouts,
                descriptor_pools,
                samplers: SamplerCache::new(),
                frame_fence: vk::Fence::null(),
                acquired: None,
            };
            // Drop releases the layouts and pools on failure
            device.frame_fence = frame_fence.map_err(|e| init_failed("Failed to create frame fence", e))?;

            igfx_info!(
                "igfx::vulkan",
                "Vulkan device ready (validation: {})",
                if enable_validation { "on" } else { "off" }
            );
            Ok(device)
        }
    }

    fn command_buffer_of<'a>(commands: &'a dyn IgfxCommandList) -> Result<&'a CommandList> {
        downcast::<CommandList>(commands.as_any(), "command list")
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_image(&mut self, desc: &ImageDesc) -> Result<Arc<dyn NativeImage>> {
        Ok(Arc::new(Image::new(Arc::clone(&self.ctx), desc)?))
    }

    fn presentable_images(&mut self) -> Result<PresentableImages> {
        self.swapchain.presentable_images()
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn NativeBuffer>> {
        Ok(Arc::new(Buffer::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<Arc<dyn NativeShader>> {
        Ok(Arc::new(Shader::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Arc<dyn NativeRenderPass>> {
        Ok(Arc::new(RenderPass::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_framebuffer(
        &mut self,
        info: &FramebufferCreateInfo,
    ) -> Result<Arc<dyn NativeFramebuffer>> {
        Ok(Arc::new(Framebuffer::new(Arc::clone(&self.ctx), info)?))
    }

    fn create_pipeline(&mut self, info: &PipelineCreateInfo) -> Result<Arc<dyn NativePipeline>> {
        Ok(Arc::new(Pipeline::new(
            Arc::clone(&self.ctx),
            info,
            self.layouts.pipeline_layout,
        )?))
    }

    fn allocate_binding_set(&mut self, scope: BindingScope) -> Result<Arc<dyn NativeBindingSet>> {
        let layout = self.layouts.set_layout(scope);
        let descriptor_set = self.descriptor_pools.allocate(&self.ctx.device, layout)?;
        Ok(Arc::new(BindingSet { descriptor_set, scope }))
    }

    fn write_uniform_buffer(
        &mut self,
        binding_set: &Arc<dyn NativeBindingSet>,
        slot: u32,
        buffer: &Arc<dyn NativeBuffer>,
    ) -> Result<()> {
        if slot != UNIFORM_BUFFER_SLOT {
            return Err(Error::InvalidResource(format!("slot {} is not a uniform buffer slot", slot)));
        }
        let set = downcast::<BindingSet>(binding_set.as_any(), "binding set")?;
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "uniform buffer")?;

        let buffer_info = [vk::DescriptorBufferInfo {
            buffer: vk_buffer.buffer,
            offset: 0,
            range: vk::WHOLE_SIZE,
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set.descriptor_set)
            .dst_binding(slot)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&buffer_info);

        unsafe {
            self.ctx.device.update_descriptor_sets(&[write], &[]);
        }
        Ok(())
    }

    fn write_image_sampler(
        &mut self,
        binding_set: &Arc<dyn NativeBindingSet>,
        slot: u32,
        sampler: SamplerType,
        image: &Arc<dyn NativeImage>,
    ) -> Result<()> {
        let set = downcast::<BindingSet>(binding_set.as_any(), "binding set")?;
        if slot != IMAGE_SAMPLER_SLOT || !set.scope.has_image_sampler() {
            return Err(Error::InvalidResource(format!(
                "{:?} binding set has no image sampler at slot {}",
                set.scope, slot
            )));
        }
        let vk_image = downcast::<Image>(image.as_any(), "sampled image")?;
        let vk_sampler = self.samplers.get(&self.ctx.device, sampler)?;

        let image_info = [vk::DescriptorImageInfo {
            sampler: vk_sampler,
            image_view: vk_image.view,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set.descriptor_set)
            .dst_binding(slot)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_info);

        unsafe {
            self.ctx.device.update_descriptor_sets(&[write], &[]);
        }
        Ok(())
    }

    fn create_command_list(&mut self) -> Result<Box<dyn IgfxCommandList>> {
        Ok(Box::new(CommandList::new(
            Arc::clone(&self.ctx),
            self.layouts.pipeline_layout,
        )?))
    }

    fn wait_for_frame(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .wait_for_fences(&[self.frame_fence], true, u64::MAX)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to wait for frame fence: {:?}", e))?;
            self.ctx
                .device
                .reset_fences(&[self.frame_fence])
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to reset frame fence: {:?}", e))?;
        }
        Ok(())
    }

    fn acquire_next_image(&mut self) -> Result<u32> {
        let index = self.swapchain.acquire()?;
        self.acquired = Some(index);
        Ok(index)
    }

    fn submit_staging(&mut self, commands: &dyn IgfxCommandList) -> Result<()> {
        let command_buffers = [Self::command_buffer_of(commands)?.command_buffer()];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to submit staging commands: {:?}", e))?;
        }
        Ok(())
    }

    fn submit_frame(&mut self, commands: &dyn IgfxCommandList, presenting: bool) -> Result<()> {
        let command_buffers = [Self::command_buffer_of(commands)?.command_buffer()];

        let (wait_semaphores, signal_semaphores) = if presenting {
            let image_index = self.acquired.take().ok_or_else(|| {
                Error::InvalidState("submit_frame presenting without an acquired image".to_string())
            })?;
            (
                vec![self.swapchain.image_available_semaphore()],
                vec![self.swapchain.render_finished_semaphore(image_index)?],
            )
        } else {
            (Vec::new(), Vec::new())
        };
        let wait_stages = vec![vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT; wait_semaphores.len()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], self.frame_fence)
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to submit frame commands: {:?}", e))?;
        }
        Ok(())
    }

    fn present(&mut self, image_index: u32) -> Result<()> {
        self.swapchain.present(image_index)
    }

    fn wait_idle(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| igfx_err!("igfx::vulkan", "Failed to wait idle: {:?}", e))
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        igfx_debug!("igfx::vulkan", "Destroying Vulkan device objects");
        unsafe {
            self.ctx.device.device_wait_idle().ok();

            self.samplers.destroy(&self.ctx.device);
            self.descriptor_pools.destroy(&self.ctx.device);
            self.layouts.destroy(&self.ctx.device);
            if self.frame_fence != vk::Fence::null() {
                self.ctx.device.destroy_fence(self.frame_fence, None);
            }
        }
        // The swapchain and the last context reference drop with the fields
    }
}
