/// Buffer resource: linear host-visible storage

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::NativeBuffer;

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
    /// Source of staging copies
    Staging,
}

pub struct Buffer {
    usage: BufferUsage,
    native: Arc<dyn NativeBuffer>,
}

impl Buffer {
    pub(crate) fn new(usage: BufferUsage, native: Arc<dyn NativeBuffer>) -> Self {
        Self { usage, native }
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn size(&self) -> u64 {
        self.native.size()
    }

    pub fn native(&self) -> &Arc<dyn NativeBuffer> {
        &self.native
    }

    /// Write through the mapping; visible to the GPU without a flush
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.native.write(offset, data)
    }
}
