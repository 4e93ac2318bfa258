/// Shader - Vulkan implementation of NativeShader (vertex + fragment modules)

use ash::vk;
use immediate_gfx::igfx::device::{NativeShader, ShaderDesc};
use immediate_gfx::igfx::{Error, Result};
use immediate_gfx::igfx_err;
use std::any::Any;
use std::io::Cursor;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct Shader {
    ctx: Arc<GpuContext>,
    pub(crate) vertex: vk::ShaderModule,
    pub(crate) fragment: vk::ShaderModule,
    name: String,
}

fn create_module(ctx: &GpuContext, name: &str, stage: &str, code: &[u8]) -> Result<vk::ShaderModule> {
    // read_spv checks the length and copies into an aligned buffer
    let words = ash::util::read_spv(&mut Cursor::new(code)).map_err(|e| {
        Error::InvalidResource(format!("{} shader of '{}' is not valid SPIR-V: {}", stage, name, e))
    })?;
    let create_info = vk::ShaderModuleCreateInfo::default().code(&words);

    unsafe {
        ctx.device.create_shader_module(&create_info, None).map_err(|e| {
            igfx_err!(
                "igfx::vulkan",
                "Failed to create {} shader module '{}': {:?}",
                stage, name, e
            )
        })
    }
}

impl Shader {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &ShaderDesc) -> Result<Self> {
        let vertex = create_module(&ctx, desc.name, "vertex", desc.vertex_code)?;
        let fragment = match create_module(&ctx, desc.name, "fragment", desc.fragment_code) {
            Ok(module) => module,
            Err(e) => {
                unsafe { ctx.device.destroy_shader_module(vertex, None) };
                return Err(e);
            }
        };
        Ok(Self { ctx, vertex, fragment, name: desc.name.to_string() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NativeShader for Shader {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.vertex, None);
            self.ctx.device.destroy_shader_module(self.fragment, None);
        }
    }
}
