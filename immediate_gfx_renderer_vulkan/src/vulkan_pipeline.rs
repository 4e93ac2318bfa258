/// Pipeline - Vulkan implementation of NativePipeline
///
/// Every pipeline shares the fixed state below; only the render pass and the
/// shader program vary:
/// - triangle list, fill, back-face culling, counter-clockwise front faces
/// - depth test + write with ALWAYS when the pass has depth
/// - RGBA writes without blending when the pass has color
/// - dynamic viewport and scissor
/// - the interleaved [`Vertex`] layout and the unified three-set layout

use ash::vk;
use immediate_gfx::igfx::device::{NativePipeline, PipelineCreateInfo};
use immediate_gfx::igfx::resource::Vertex;
use immediate_gfx::igfx::Result;
use immediate_gfx::igfx_err;
use std::any::Any;
use std::sync::Arc;

use crate::downcast;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::attribute_format;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_shader::Shader;

pub struct Pipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
}

pub(crate) fn vertex_attributes() -> Vec<vk::VertexInputAttributeDescription> {
    Vertex::ATTRIBUTES
        .iter()
        .map(|attribute| vk::VertexInputAttributeDescription {
            location: attribute.location,
            binding: 0,
            format: attribute_format(attribute.components),
            offset: attribute.offset,
        })
        .collect()
}

impl Pipeline {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        info: &PipelineCreateInfo,
        layout: vk::PipelineLayout,
    ) -> Result<Self> {
        let render_pass = downcast::<RenderPass>(info.render_pass.as_any(), "render pass")?;
        let shader = downcast::<Shader>(info.shader.as_any(), "shader")?;
        let has_color = render_pass.desc.color.is_some();
        let has_depth = render_pass.desc.depth.is_some();

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(shader.vertex)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(shader.fragment)
                .name(c"main"),
        ];

        let vertex_bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: Vertex::STRIDE,
            input_rate: vk::VertexInputRate::VERTEX,
        }];
        let vertex_attributes = vertex_attributes();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Dynamic; counts still have to be declared
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(has_depth)
            .depth_write_enable(has_depth)
            .depth_compare_op(vk::CompareOp::ALWAYS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = if has_color {
            vec![vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false)]
        } else {
            Vec::new()
        };
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            ctx.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
                .map_err(|(_, e)| {
                    igfx_err!(
                        "igfx::vulkan",
                        "Failed to create graphics pipeline for shader '{}': {:?}",
                        shader.name(), e
                    )
                })?
        };

        let pipeline = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| igfx_err!("igfx::vulkan", "vkCreateGraphicsPipelines returned no pipeline"))?;

        Ok(Self { ctx, pipeline })
    }
}

impl NativePipeline for Pipeline {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
        }
    }
}
