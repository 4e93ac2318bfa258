/// Native GPU objects created by a [`super::GraphicsDevice`]
///
/// The core only stores and forwards these. Backends downcast them through
/// `as_any()` when they record commands that reference them.

use std::any::Any;
use crate::error::Result;

/// A native image together with its default view
pub trait NativeImage: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Alignment the image's memory requires, used to place staging data
    fn memory_alignment(&self) -> u64 {
        1
    }
}

/// A host-visible native buffer
pub trait NativeBuffer: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Write `data` at `offset` through the persistent mapping
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the write would go past the end of the buffer.
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;
}

/// Vertex + fragment shader modules
pub trait NativeShader: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

pub trait NativeRenderPass: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

pub trait NativeFramebuffer: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn width(&self) -> u32;

    fn height(&self) -> u32;
}

pub trait NativePipeline: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// An allocated resource-binding set (descriptor set)
pub trait NativeBindingSet: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}
