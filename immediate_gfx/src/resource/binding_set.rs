/// Resource-binding sets with a fixed, scope-dependent slot layout
///
/// | Scope  | Set | Slot 0         | Slot 1                 |
/// |--------|-----|----------------|------------------------|
/// | Frame  | 0   | uniform buffer |                        |
/// | View   | 1   | uniform buffer |                        |
/// | Object | 2   | uniform buffer | combined image sampler |

use std::sync::Arc;
use crate::graphics_device::NativeBindingSet;

pub const UNIFORM_BUFFER_SLOT: u32 = 0;
pub const IMAGE_SAMPLER_SLOT: u32 = 1;

/// Update frequency of a binding set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingScope {
    Frame,
    View,
    Object,
}

impl BindingScope {
    pub const ALL: [BindingScope; 3] = [BindingScope::Frame, BindingScope::View, BindingScope::Object];

    /// Set index in the unified pipeline layout
    pub fn set_index(self) -> u32 {
        match self {
            BindingScope::Frame => 0,
            BindingScope::View => 1,
            BindingScope::Object => 2,
        }
    }

    pub fn has_image_sampler(self) -> bool {
        self == BindingScope::Object
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    LinearRepeat,
    NearestClamp,
}

pub struct BindingSet {
    scope: BindingScope,
    native: Arc<dyn NativeBindingSet>,
}

impl BindingSet {
    pub(crate) fn new(scope: BindingScope, native: Arc<dyn NativeBindingSet>) -> Self {
        Self { scope, native }
    }

    pub fn scope(&self) -> BindingScope {
        self.scope
    }

    pub fn native(&self) -> &Arc<dyn NativeBindingSet> {
        &self.native
    }
}
