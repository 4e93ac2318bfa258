/// Resource module - GPU resources and the tables that own them

use slotmap::new_key_type;

pub mod image;
pub mod buffer;
pub mod mesh;
pub mod shader;
pub mod binding_set;
pub mod render_objects;

pub use self::image::*;
pub use self::buffer::*;
pub use self::mesh::*;
pub use self::shader::*;
pub use self::binding_set::*;
pub use self::render_objects::*;

// ===== SLOT MAP KEYS =====

new_key_type! {
    /// Handle to an [`Image`] in [`RenderObjects`]
    pub struct ImageKey;

    /// Handle to a [`Buffer`] in [`RenderObjects`]
    pub struct BufferKey;

    /// Handle to a [`Mesh`] in [`RenderObjects`]
    pub struct MeshKey;

    /// Handle to a [`ShaderProgram`]; part of pipeline identity
    pub struct ShaderKey;

    /// Handle to a [`BindingSet`] in [`RenderObjects`]
    pub struct BindingSetKey;
}
