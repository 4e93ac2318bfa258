/// Buffer - Vulkan implementation of NativeBuffer
///
/// All buffers are host-visible and written through gpu-allocator's
/// persistent mapping.

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use immediate_gfx::igfx::device::{BufferDesc, NativeBuffer};
use immediate_gfx::igfx::{Error, Result};
use immediate_gfx::igfx_err;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::buffer_usage_to_vk;
use crate::vulkan_memory;

pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl Buffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &BufferDesc) -> Result<Self> {
        let buffer_create_info = vk::BufferCreateInfo::default()
            .size(desc.size)
            .usage(buffer_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        unsafe {
            let buffer = ctx.device.create_buffer(&buffer_create_info, None).map_err(|e| {
                igfx_err!(
                    "igfx::vulkan",
                    "Failed to create buffer of size {} bytes: {:?}",
                    desc.size, e
                )
            })?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = match vulkan_memory::allocate(&ctx, requirements, true, true, "buffer") {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
            {
                vulkan_memory::free(&ctx, allocation);
                ctx.device.destroy_buffer(buffer, None);
                return Err(igfx_err!("igfx::vulkan", "Failed to bind buffer memory: {:?}", e));
            }

            Ok(Self { ctx, buffer, allocation: Some(allocation), size: desc.size })
        }
    }
}

impl NativeBuffer for Buffer {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at {} exceeds buffer size {}",
                data.len(),
                offset,
                self.size
            )));
        }

        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| igfx_err!("igfx::vulkan", "Buffer write failed: no GPU allocation"))?;
        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.add(offset as usize), data.len());
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            vulkan_memory::free(&self.ctx, allocation);
        }
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
