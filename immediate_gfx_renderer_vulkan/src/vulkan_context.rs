/// GpuContext - Vulkan objects shared by every native resource
///
/// Each native object holds an `Arc<GpuContext>`, so the device, allocator
/// and instance outlive everything created from them. The last owner to drop
/// tears them down in dependency order.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

pub(crate) struct GpuContext {
    /// Keeps the Vulkan loader alive for the instance
    _entry: ash::Entry,

    pub instance: ash::Instance,

    pub physical_device: vk::PhysicalDevice,

    pub device: ash::Device,

    /// Dropped before the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,

    pub present_queue: vk::Queue,

    /// Validation messenger (None when validation is off)
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        present_queue: vk::Queue,
        debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ) -> Self {
        Self {
            _entry: entry,
            instance,
            physical_device,
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            graphics_queue_family,
            present_queue,
            debug_messenger,
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Allocator frees its VkDeviceMemory blocks, so it goes before the device
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);

            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
