/// Structural identities of render passes, framebuffers and pipelines
///
/// Equality is derived; fields are declared in comparison order.

use crate::resource::{ImageFormat, ShaderKey, ViewId};

/// Identity of a render pass
///
/// Clear flags are part of identity because the load operation is baked into
/// the native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderPassDesc {
    pub color: Option<ImageFormat>,
    pub clear_color: bool,
    pub depth: Option<ImageFormat>,
    pub clear_depth: bool,
}

impl RenderPassDesc {
    /// Non-clearing pass for the given attachment formats
    pub fn for_targets(color: Option<ImageFormat>, depth: Option<ImageFormat>) -> Self {
        Self {
            color,
            clear_color: false,
            depth,
            clear_depth: false,
        }
    }

    /// Same attachments with the given clear policy
    ///
    /// A clear flag is dropped when its attachment is absent.
    pub fn with_clear(self, clear_color: bool, clear_depth: bool) -> Self {
        Self {
            clear_color: clear_color && self.color.is_some(),
            clear_depth: clear_depth && self.depth.is_some(),
            ..self
        }
    }

    pub fn attachment_count(&self) -> usize {
        usize::from(self.color.is_some()) + usize::from(self.depth.is_some())
    }
}

/// Identity of a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferDesc {
    pub width: u32,
    pub height: u32,
    pub color_view: Option<ViewId>,
    pub depth_view: Option<ViewId>,
}

/// Identity of a graphics pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineDesc {
    pub render_pass: RenderPassDesc,
    pub shader: ShaderKey,
}
