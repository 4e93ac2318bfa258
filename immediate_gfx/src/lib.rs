/*!
# immediate_gfx

An immediate-mode rendering layer over an explicit GPU object model.

Application code calls `set_render_targets`, `clear`, `draw`, `blit` and
`pipeline_barrier`; the layer derives the identity of the render passes,
framebuffers and pipelines those calls need, creates them on first use, and
keeps render pass boundaries and image layouts correct in a single command
stream.

## Architecture

- **GraphicsDevice / CommandList**: backend traits (Vulkan backend in
  `immediate_gfx_renderer_vulkan`)
- **RenderObjects**: resource tables and the three structural caches
- **CommandContext**: the immediate-mode recording state machine
- **StagingPipe**: CPU to device-local image uploads
- **Renderer**: frame orchestration (fence, acquire, submit, present)
*/

mod error;
mod engine;
mod config;
pub mod log;
pub mod layout;
pub mod graphics_device;
pub mod resource;
pub mod cache;
pub mod context;
pub mod staging;
pub mod renderer;

// Main igfx namespace module
pub mod igfx {
    pub use crate::error::{Error, Result};

    pub use crate::engine::Engine;

    pub use crate::config::Config;

    pub use crate::renderer::Renderer;

    pub use crate::context::{CommandContext, ContextStats};

    pub use crate::staging::StagingPipe;

    pub use crate::layout::{BarrierFlags, ImageLayout};

    // Logging sub-module (types only; the igfx_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Backend interface
    pub mod device {
        pub use crate::graphics_device::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod cache {
        pub use crate::cache::*;
    }
}

// Re-export math and POD helpers used by applications for uniform data
pub use glam;
pub use bytemuck;
