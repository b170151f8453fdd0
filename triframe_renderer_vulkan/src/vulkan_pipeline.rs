/// Render pipeline - Vulkan implementation of RenderPipelineState
///
/// Pipelines are built for dynamic rendering: the attachment formats come
/// from the descriptor's render target instead of a VkRenderPass. Viewport,
/// scissor and primitive topology are dynamic state set by the encoder.

use ash::vk;
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;
use triframe_engine::triframe::render::{RenderPipelineDesc, RenderPipelineState, RenderTargetDesc};
use triframe_engine::triframe::Result;
use triframe_engine::{engine_bail, engine_debug, engine_err};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::texture_format_to_vk;
use crate::vulkan_shader::{compile_glsl, ShaderModule};

/// Vulkan render pipeline implementation
pub struct VulkanRenderPipelineState {
    pub(crate) pipeline: vk::Pipeline,
    pipeline_layout: vk::PipelineLayout,
    target: RenderTargetDesc,
    context: Arc<GpuContext>,
}

impl VulkanRenderPipelineState {
    pub(crate) fn new(context: &Arc<GpuContext>, desc: &RenderPipelineDesc) -> Result<Self> {
        let target = &desc.target;
        if target.color_formats.is_empty() {
            engine_bail!(InvalidResource, "triframe::vulkan", "Pipeline '{}' has no color slot", desc.debug_name);
        }
        if let Some(format) = target.color_formats.iter().flatten().find(|f| f.is_depth()) {
            engine_bail!(InvalidResource, "triframe::vulkan",
                "Pipeline '{}' uses depth format {:?} as a color target", desc.debug_name, format);
        }
        if let Some(format) = target.depth_format.filter(|f| !f.is_depth()) {
            engine_bail!(InvalidResource, "triframe::vulkan",
                "Pipeline '{}' uses color format {:?} as its depth target", desc.debug_name, format);
        }

        let stages = &desc.shader_stages;
        let vertex_code = compile_glsl(naga::ShaderStage::Vertex, &stages.vertex)?;
        let fragment_code = compile_glsl(naga::ShaderStage::Fragment, &stages.fragment)?;
        let vertex_module = ShaderModule::new(&context.device, &vertex_code)?;
        let fragment_module = ShaderModule::new(&context.device, &fragment_code)?;

        let entry_point_vert = CString::new(stages.vertex.entry_point)
            .map_err(|e| engine_err!(InvalidResource, "triframe::vulkan", "Invalid vertex entry point: {}", e))?;
        let entry_point_frag = CString::new(stages.fragment.entry_point)
            .map_err(|e| engine_err!(InvalidResource, "triframe::vulkan", "Invalid fragment entry point: {}", e))?;

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module.module)
                .name(&entry_point_vert),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module.module)
                .name(&entry_point_frag),
        ];

        // Vertices come from the shader, no vertex buffer
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default();

        // Topology class only; the exact topology is set per draw
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        // Depth is not loaded between passes, so it is never tested
        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(false)
            .depth_write_enable(false)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        // One blend state per color slot, empty slots included
        let color_blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = target
            .color_formats
            .iter()
            .map(|_| {
                vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .blend_enable(false)
            })
            .collect();
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [
            vk::DynamicState::VIEWPORT,
            vk::DynamicState::SCISSOR,
            vk::DynamicState::PRIMITIVE_TOPOLOGY,
        ];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // Attachment formats for dynamic rendering, UNDEFINED for empty slots
        let color_formats: Vec<vk::Format> = target
            .color_formats
            .iter()
            .map(|format| format.map_or(vk::Format::UNDEFINED, texture_format_to_vk))
            .collect();
        let depth_format = target.depth_format.map_or(vk::Format::UNDEFINED, texture_format_to_vk);
        let stencil_format = match target.depth_format {
            Some(format) if format.has_stencil() => texture_format_to_vk(format),
            _ => vk::Format::UNDEFINED,
        };
        let mut rendering_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&color_formats)
            .depth_attachment_format(depth_format)
            .stencil_attachment_format(stencil_format);

        let device = &context.device;
        unsafe {
            let pipeline_layout = device
                .create_pipeline_layout(&vk::PipelineLayoutCreateInfo::default(), None)
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to create pipeline layout: {:?}", e))?;

            let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
                .push_next(&mut rendering_info)
                .stages(&shader_stages)
                .vertex_input_state(&vertex_input_state)
                .input_assembly_state(&input_assembly_state)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization_state)
                .depth_stencil_state(&depth_stencil_state)
                .multisample_state(&multisample_state)
                .color_blend_state(&color_blend_state)
                .dynamic_state(&dynamic_state)
                .layout(pipeline_layout);

            let pipelines = match device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_create_info],
                None,
            ) {
                Ok(pipelines) => pipelines,
                Err((_, e)) => {
                    device.destroy_pipeline_layout(pipeline_layout, None);
                    engine_bail!("triframe::vulkan", "Failed to create graphics pipeline '{}': {:?}", desc.debug_name, e);
                }
            };
            let Some(&pipeline) = pipelines.first() else {
                device.destroy_pipeline_layout(pipeline_layout, None);
                engine_bail!("triframe::vulkan", "Driver returned no pipeline for '{}'", desc.debug_name);
            };

            context.set_object_name(pipeline, &desc.debug_name);
            engine_debug!("triframe::vulkan", "Pipeline '{}' created for {:?} (depth {:?})",
                desc.debug_name, target.color_formats, target.depth_format);

            Ok(Self {
                pipeline,
                pipeline_layout,
                target: target.clone(),
                context: Arc::clone(context),
            })
        }
    }
}

impl RenderPipelineState for VulkanRenderPipelineState {
    fn target(&self) -> &RenderTargetDesc {
        &self.target
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanRenderPipelineState {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_pipeline(self.pipeline, None);
            self.context.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}
