/*!
# immediate_gfx - Vulkan backend

Implements the `immediate_gfx` [`GraphicsDevice`](immediate_gfx::igfx::device::GraphicsDevice)
and [`CommandList`](immediate_gfx::igfx::device::CommandList) traits with
`ash`, using `gpu-allocator` for device memory.

```no_run
use immediate_gfx::igfx::{Config, Renderer};
use immediate_gfx_renderer_vulkan::igfx::VulkanGraphicsDevice;
# fn run(window: &winit::window::Window) -> immediate_gfx::igfx::Result<()> {
let config = Config::default();
let device = VulkanGraphicsDevice::new(window, &config)?;
let mut renderer = Renderer::new(Box::new(device), &config)?;
# Ok(())
# }
```
*/

use std::any::Any;
use immediate_gfx::igfx::{Error, Result};

mod vulkan_context;
mod vulkan_memory;
mod vulkan_format;
mod vulkan_image;
mod vulkan_buffer;
mod vulkan_shader;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_pipeline;
mod vulkan_binding_set;
mod vulkan_sampler;
mod vulkan_command_list;
mod vulkan_swapchain;
mod vulkan_graphics_device;
mod debug;

pub mod igfx {
    pub use crate::vulkan_graphics_device::VulkanGraphicsDevice;
    pub use crate::vulkan_command_list::CommandList as VulkanCommandList;
    pub use crate::debug::{
        print_validation_stats_report, reset_validation_stats, validation_stats, ValidationStats,
    };
}

/// Downcast a native object created by this backend
pub(crate) fn downcast<'a, T: 'static>(native: &'a dyn Any, what: &str) -> Result<&'a T> {
    native.downcast_ref::<T>().ok_or_else(|| {
        Error::InvalidResource(format!("{} was not created by the Vulkan backend", what))
    })
}
