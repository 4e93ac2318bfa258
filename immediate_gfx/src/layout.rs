//! Image layout state machine
//!
//! Every image carries a tracked [`ImageLayout`]. Barrier decisions trust the
//! tracked value: it is only updated after the matching barrier has been
//! recorded, so it always names the layout the image will be in when the
//! next recorded command executes.

use bitflags::bitflags;

/// How the GPU currently interprets an image's memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageLayout {
    /// Contents undefined (fresh image, or discarded)
    #[default]
    Undefined,
    /// Sampled from fragment shaders
    FragmentShaderRead,
    ColorAttachment,
    DepthStencilAttachment,
    /// Ready for the presentation engine
    Present,
    /// Source of a blit or copy
    TransferSource,
    /// Destination of a blit or copy
    TransferDestination,
}

bitflags! {
    /// Modifiers for a barrier request
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BarrierFlags: u32 {
        /// Previous contents are garbage: transition from Undefined, always
        const DISCARD = 1 << 0;
    }
}

impl BarrierFlags {
    pub const NONE: Self = Self::empty();
}

/// A transition that must be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTransition {
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

/// Decide whether a barrier is needed to move from `current` to `requested`
///
/// Returns `None` when the barrier can be elided.
pub fn plan_transition(
    current: ImageLayout,
    requested: ImageLayout,
    flags: BarrierFlags,
) -> Option<LayoutTransition> {
    if flags.contains(BarrierFlags::DISCARD) {
        return Some(LayoutTransition {
            old_layout: ImageLayout::Undefined,
            new_layout: requested,
        });
    }
    if current == requested {
        return None;
    }
    Some(LayoutTransition {
        old_layout: current,
        new_layout: requested,
    })
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
