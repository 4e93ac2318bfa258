//! Demo scene: a textured cube rendered offscreen, then presented through a
//! fullscreen triangle

use std::path::Path;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use immediate_gfx::igfx::resource::{
    BindingScope, BindingSetKey, BufferKey, BufferUsage, ImageFormat, ImageKey, ImageUsage,
    MeshKey, SamplerType, ShaderKey, Vertex, IMAGE_SAMPLER_SLOT, UNIFORM_BUFFER_SLOT,
};
use immediate_gfx::igfx::{BarrierFlags, Config, ImageLayout, Renderer, Result};
use immediate_gfx::{igfx_info, igfx_warn};

const SOURCE: &str = "demo::Scene";

const CHECKER_SIZE: u32 = 256;
const CHECKER_CELL: u32 = 32;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct FrameUniforms {
    /// x: seconds since start
    time: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ViewUniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
}

pub struct Scene {
    color_target: ImageKey,
    depth_target: ImageKey,
    target_width: u32,
    target_height: u32,

    mesh_shader: ShaderKey,
    triangle_shader: ShaderKey,
    cube: MeshKey,
    fullscreen_triangle: MeshKey,

    frame_buffer: BufferKey,
    cube_buffer: BufferKey,

    frame_set: BindingSetKey,
    view_set: BindingSetKey,
    cube_set: BindingSetKey,
    present_set: BindingSetKey,
}

/// Six faces, four vertices each, counter-clockwise seen from outside
pub fn cube_geometry() -> (Vec<Vertex>, Vec<u16>) {
    // (normal, right, up) with right x up = normal
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let colors = [
        [1.0, 0.6, 0.6, 1.0],
        [0.6, 1.0, 0.6, 1.0],
        [0.6, 0.6, 1.0, 1.0],
        [1.0, 1.0, 0.6, 1.0],
        [0.6, 1.0, 1.0, 1.0],
        [1.0, 0.6, 1.0, 1.0],
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for ((normal, right, up), color) in faces.into_iter().zip(colors) {
        let center = normal * 0.5;
        let base = vertices.len() as u16;
        let corners = [
            (center - right * 0.5 - up * 0.5, [0.0, 1.0]),
            (center + right * 0.5 - up * 0.5, [1.0, 1.0]),
            (center + right * 0.5 + up * 0.5, [1.0, 0.0]),
            (center - right * 0.5 + up * 0.5, [0.0, 0.0]),
        ];
        for (position, texcoord) in corners {
            vertices.push(Vertex { position: position.to_array(), texcoord, color });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// One triangle covering the whole viewport; texcoords span 0..1 on screen
pub fn fullscreen_triangle_geometry() -> (Vec<Vertex>, Vec<u16>) {
    let white = [1.0; 4];
    let vertices = vec![
        Vertex { position: [-1.0, -1.0, 0.0], texcoord: [0.0, 0.0], color: white },
        Vertex { position: [-1.0, 3.0, 0.0], texcoord: [0.0, 2.0], color: white },
        Vertex { position: [3.0, -1.0, 0.0], texcoord: [2.0, 0.0], color: white },
    ];
    (vertices, vec![0, 1, 2])
}

pub fn checkerboard_rgba8(size: u32, cell: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            let value = if light { 230 } else { 40 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    pixels
}

/// Perspective projection for Vulkan clip space (y down, depth 0..1)
fn view_projection(aspect: f32) -> Mat4 {
    let mut projection = Mat4::perspective_rh(60f32.to_radians(), aspect, 0.1, 100.0);
    projection.y_axis.y *= -1.0;
    let view = Mat4::look_at_rh(Vec3::new(0.0, 1.2, 3.0), Vec3::ZERO, Vec3::Y);
    projection * view
}

impl Scene {
    pub fn new(
        renderer: &mut Renderer,
        config: &Config,
        shader_dir: &Path,
        texture_path: Option<&Path>,
    ) -> Result<Self> {
        let target_width = config.render_target_width;
        let target_height = config.render_target_height;
        let color_target = renderer.create_image(
            target_width,
            target_height,
            ImageFormat::Rgba8,
            ImageUsage::RENDER_TARGET | ImageUsage::SHADER,
        )?;
        let depth_target = renderer.create_image(
            target_width,
            target_height,
            ImageFormat::Depth32,
            ImageUsage::RENDER_TARGET,
        )?;

        let mesh_shader = renderer.load_shader_program(shader_dir, "mesh")?;
        let triangle_shader = renderer.load_shader_program(shader_dir, "triangle")?;

        let (vertices, indices) = cube_geometry();
        let cube = renderer.create_mesh(&vertices, &indices)?;
        let (vertices, indices) = fullscreen_triangle_geometry();
        let fullscreen_triangle = renderer.create_mesh(&vertices, &indices)?;

        let frame_buffer = renderer.create_buffer(BufferUsage::Uniform, size_of::<FrameUniforms>() as u64)?;
        let view_buffer = renderer.create_buffer_with_data(
            BufferUsage::Uniform,
            bytemuck::bytes_of(&ViewUniforms {
                view_proj: view_projection(target_width as f32 / target_height as f32).to_cols_array_2d(),
            }),
        )?;
        let cube_buffer = renderer.create_buffer(BufferUsage::Uniform, size_of::<ObjectUniforms>() as u64)?;
        let present_buffer = renderer.create_buffer_with_data(
            BufferUsage::Uniform,
            bytemuck::bytes_of(&ObjectUniforms {
                model: Mat4::IDENTITY.to_cols_array_2d(),
                tint: [1.0; 4],
            }),
        )?;

        // Texture uploads are recorded into a frame's staging window
        renderer.begin_frame()?;
        let texture = match texture_path {
            Some(path) => match renderer.create_image_from_file(path) {
                Ok(texture) => texture,
                Err(e) => {
                    igfx_warn!(SOURCE, "Falling back to checkerboard: {}", e);
                    Self::checkerboard(renderer)?
                }
            },
            None => Self::checkerboard(renderer)?,
        };
        renderer.end_frame()?;

        let frame_set = renderer.allocate_binding_set(BindingScope::Frame)?;
        renderer.set_uniform_buffer(frame_set, UNIFORM_BUFFER_SLOT, frame_buffer)?;

        let view_set = renderer.allocate_binding_set(BindingScope::View)?;
        renderer.set_uniform_buffer(view_set, UNIFORM_BUFFER_SLOT, view_buffer)?;

        let cube_set = renderer.allocate_binding_set(BindingScope::Object)?;
        renderer.set_uniform_buffer(cube_set, UNIFORM_BUFFER_SLOT, cube_buffer)?;
        renderer.set_image_sampler(cube_set, IMAGE_SAMPLER_SLOT, SamplerType::LinearRepeat, texture)?;

        let present_set = renderer.allocate_binding_set(BindingScope::Object)?;
        renderer.set_uniform_buffer(present_set, UNIFORM_BUFFER_SLOT, present_buffer)?;
        renderer.set_image_sampler(present_set, IMAGE_SAMPLER_SLOT, SamplerType::NearestClamp, color_target)?;

        igfx_info!(SOURCE, "Scene ready ({}x{} offscreen target)", target_width, target_height);

        Ok(Self {
            color_target,
            depth_target,
            target_width,
            target_height,
            mesh_shader,
            triangle_shader,
            cube,
            fullscreen_triangle,
            frame_buffer,
            cube_buffer,
            frame_set,
            view_set,
            cube_set,
            present_set,
        })
    }

    fn checkerboard(renderer: &mut Renderer) -> Result<ImageKey> {
        let pixels = checkerboard_rgba8(CHECKER_SIZE, CHECKER_CELL);
        renderer.create_image_from_rgba8(CHECKER_SIZE, CHECKER_SIZE, &pixels)
    }

    /// Record and submit one frame
    pub fn render(&self, renderer: &mut Renderer, seconds: f32) -> Result<()> {
        renderer.begin_frame()?;

        // The previous frame has completed: uniforms can be rewritten
        renderer.write_buffer(
            self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms { time: [seconds, 0.0, 0.0, 0.0] }),
        )?;
        let model = Mat4::from_rotation_y(seconds * 0.8) * Mat4::from_rotation_x(seconds * 0.5);
        renderer.write_buffer(
            self.cube_buffer,
            0,
            bytemuck::bytes_of(&ObjectUniforms { model: model.to_cols_array_2d(), tint: [1.0; 4] }),
        )?;

        // Offscreen pass
        renderer.pipeline_barrier(self.color_target, ImageLayout::ColorAttachment, BarrierFlags::DISCARD)?;
        renderer.pipeline_barrier(
            self.depth_target,
            ImageLayout::DepthStencilAttachment,
            BarrierFlags::DISCARD,
        )?;
        renderer.bind_resource_set(self.frame_set)?;
        renderer.bind_resource_set(self.view_set)?;
        renderer.set_render_targets(Some(self.color_target), Some(self.depth_target))?;
        renderer.set_viewport_and_scissor(self.target_width, self.target_height);
        renderer.clear(true, true, [0.05, 0.07, 0.12, 1.0], 1.0)?;
        renderer.bind_resource_set(self.cube_set)?;
        renderer.draw(self.cube, self.mesh_shader)?;

        // Present pass
        renderer.acquire_presentable_image()?;
        let swapchain = renderer.presentable_image();
        let (width, height) = {
            let image = renderer.objects().image(swapchain)?;
            (image.width(), image.height())
        };
        renderer.pipeline_barrier(self.color_target, ImageLayout::FragmentShaderRead, BarrierFlags::NONE)?;
        renderer.pipeline_barrier(swapchain, ImageLayout::ColorAttachment, BarrierFlags::DISCARD)?;
        renderer.set_render_targets(Some(swapchain), None)?;
        renderer.set_viewport_and_scissor(width, height);
        renderer.bind_resource_set(self.present_set)?;
        renderer.draw(self.fullscreen_triangle, self.triangle_shader)?;
        renderer.pipeline_barrier(swapchain, ImageLayout::Present, BarrierFlags::NONE)?;

        renderer.end_frame()
    }
}
