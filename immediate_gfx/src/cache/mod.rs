/// Structural object caches (render pass, framebuffer, pipeline)

pub mod descriptions;
pub mod object_cache;

pub use descriptions::*;
pub use object_cache::*;

use std::sync::Arc;
use crate::graphics_device::{NativeFramebuffer, NativePipeline, NativeRenderPass};

pub type RenderPassCache = ObjectCache<RenderPassDesc, Arc<dyn NativeRenderPass>>;
pub type FramebufferCache = ObjectCache<FramebufferDesc, Arc<dyn NativeFramebuffer>>;
pub type PipelineCache = ObjectCache<PipelineDesc, Arc<dyn NativePipeline>>;

/// The three caches, owned by [`crate::resource::RenderObjects`]
pub struct ObjectCaches {
    pub render_passes: RenderPassCache,
    pub framebuffers: FramebufferCache,
    pub pipelines: PipelineCache,
}

impl ObjectCaches {
    pub fn new() -> Self {
        Self {
            render_passes: ObjectCache::new("render pass"),
            framebuffers: ObjectCache::new("framebuffer"),
            pipelines: ObjectCache::new("pipeline"),
        }
    }

    /// Pipelines and framebuffers reference passes; drop them first
    pub fn clear(&mut self) {
        self.pipelines.clear();
        self.framebuffers.clear();
        self.render_passes.clear();
    }
}

impl Default for ObjectCaches {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
