/// Device memory allocation through gpu-allocator
///
/// Host-visible requests land in `CpuToGpu` memory, which gpu-allocator maps
/// persistently. Everything else is `GpuOnly`.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use immediate_gfx::igfx::{Error, Result};
use immediate_gfx::{igfx_error, igfx_warn};

use crate::vulkan_context::GpuContext;

pub(crate) fn memory_location(host_visible: bool) -> MemoryLocation {
    if host_visible {
        MemoryLocation::CpuToGpu
    } else {
        MemoryLocation::GpuOnly
    }
}

/// Allocate memory satisfying `requirements`
///
/// # Errors
///
/// `OutOfMemory` when gpu-allocator cannot serve the request.
pub(crate) fn allocate(
    ctx: &GpuContext,
    requirements: vk::MemoryRequirements,
    host_visible: bool,
    linear: bool,
    name: &str,
) -> Result<Allocation> {
    let mut allocator = ctx
        .allocator
        .lock()
        .map_err(|_| Error::BackendError("allocator mutex poisoned".to_string()))?;

    allocator
        .allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: memory_location(host_visible),
            linear,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })
        .map_err(|e| {
            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
            igfx_error!(
                "igfx::vulkan",
                "Out of GPU memory for {} ({:.2} MB): {}",
                name, size_mb, e
            );
            Error::OutOfMemory
        })
}

/// Return an allocation to the allocator
pub(crate) fn free(ctx: &GpuContext, allocation: Allocation) {
    match ctx.allocator.lock() {
        Ok(mut allocator) => {
            if let Err(e) = allocator.free(allocation) {
                igfx_warn!("igfx::vulkan", "Failed to free allocation: {}", e);
            }
        }
        Err(_) => igfx_warn!("igfx::vulkan", "Allocator mutex poisoned, leaking allocation"),
    }
}
