/// Mesh resource and the fixed interleaved vertex layout

use std::mem::{offset_of, size_of};
use bytemuck::{Pod, Zeroable};
use crate::resource::BufferKey;

/// Interleaved vertex: position, texcoord, color
///
/// Pipelines are built for this layout only.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub color: [f32; 4],
}

/// Shader-visible vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    /// Number of f32 components
    pub components: u32,
    pub offset: u32,
}

impl Vertex {
    pub const STRIDE: u32 = size_of::<Vertex>() as u32;

    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute { location: 0, components: 3, offset: offset_of!(Vertex, position) as u32 },
        VertexAttribute { location: 1, components: 2, offset: offset_of!(Vertex, texcoord) as u32 },
        VertexAttribute { location: 2, components: 4, offset: offset_of!(Vertex, color) as u32 },
    ];

    pub const fn new(position: [f32; 3], texcoord: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, texcoord, color }
    }
}

/// Indexed triangle list (u16 indices)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mesh {
    pub(crate) vertex_buffer: BufferKey,
    pub(crate) index_buffer: BufferKey,
    pub(crate) index_count: u32,
}

impl Mesh {
    pub fn vertex_buffer(&self) -> BufferKey {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferKey {
        self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
