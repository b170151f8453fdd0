/// Shader compilation - GLSL source to Vulkan shader modules
///
/// Sources are parsed and validated by naga, then written out as SPIR-V.

use ash::vk;
use triframe_engine::triframe::render::ShaderStageDesc;
use triframe_engine::triframe::Result;
use triframe_engine::{engine_err, engine_trace};

/// Compile one GLSL stage to SPIR-V words
pub(crate) fn compile_glsl(stage: naga::ShaderStage, desc: &ShaderStageDesc) -> Result<Vec<u32>> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&naga::front::glsl::Options::from(stage), desc.source)
        .map_err(|e| engine_err!("triframe::vulkan", "Failed to parse {:?} shader: {}", stage, e))?;

    let info = naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
        .validate(&module)
        .map_err(|e| engine_err!("triframe::vulkan", "Invalid {:?} shader: {:?}", stage, e))?;

    // GLSL written for Vulkan already uses its clip space
    let options = naga::back::spv::Options {
        flags: naga::back::spv::WriterFlags::empty(),
        ..Default::default()
    };
    let pipeline_options = naga::back::spv::PipelineOptions {
        shader_stage: stage,
        entry_point: desc.entry_point.to_string(),
    };

    let words = naga::back::spv::write_vec(&module, &info, &options, Some(&pipeline_options))
        .map_err(|e| engine_err!("triframe::vulkan", "Failed to write {:?} shader as SPIR-V: {:?}", stage, e))?;
    engine_trace!("triframe::vulkan", "{:?} shader compiled ({} words)", stage, words.len());
    Ok(words)
}

/// Shader module, destroyed when dropped
///
/// Only needed while the pipeline using it is being created.
pub(crate) struct ShaderModule {
    device: ash::Device,
    pub(crate) module: vk::ShaderModule,
}

impl ShaderModule {
    pub(crate) fn new(device: &ash::Device, code: &[u32]) -> Result<Self> {
        let create_info = vk::ShaderModuleCreateInfo::default().code(code);
        let module = unsafe { device.create_shader_module(&create_info, None) }
            .map_err(|e| engine_err!("triframe::vulkan", "Failed to create shader module: {:?}", e))?;
        Ok(Self { device: device.clone(), module })
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}
