/// Pipeline Cache - builds the render pipeline once, on first use
///
/// The attachment formats of the first framebuffer are authoritative for the
/// whole session. Later calls check that the framebuffer still has those
/// formats and hand back the same pipeline object.

use std::cell::OnceCell;
use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    Framebuffer, GraphicsDevice, RenderPipelineDesc, RenderPipelineState,
    RenderTargetDesc, ShaderStagesDesc,
};
use crate::{engine_bail, engine_debug, engine_err};

pub struct PipelineCache {
    shader_stages: ShaderStagesDesc,
    pipeline: OnceCell<Arc<dyn RenderPipelineState>>,
    creations: u64,
}

impl PipelineCache {
    pub fn new(shader_stages: ShaderStagesDesc) -> Self {
        Self {
            shader_stages,
            pipeline: OnceCell::new(),
            creations: 0,
        }
    }

    /// Return the cached pipeline, building it against `framebuffer`'s
    /// formats if there is none yet
    ///
    /// Fails if the pipeline cannot be built, or if `framebuffer` no longer
    /// has the formats the cached pipeline was built for.
    pub fn get_or_create(
        &mut self,
        device: &dyn GraphicsDevice,
        framebuffer: &dyn Framebuffer,
    ) -> Result<&Arc<dyn RenderPipelineState>> {
        let target = RenderTargetDesc::from_framebuffer(framebuffer);

        if let Some(pipeline) = self.pipeline.get() {
            if *pipeline.target() != target {
                engine_bail!(
                    InvalidResource,
                    "triframe::PipelineCache",
                    "Framebuffer formats {:?} differ from the cached pipeline's {:?}",
                    target.color_formats, pipeline.target().color_formats
                );
            }
            return Ok(pipeline);
        }

        let desc = RenderPipelineDesc {
            target,
            shader_stages: self.shader_stages,
            debug_name: "Triangle Pipeline".to_string(),
        };
        let pipeline = device.create_render_pipeline(&desc).map_err(|e| {
            engine_err!("triframe::PipelineCache", "Failed to create '{}': {}", desc.debug_name, e)
        })?;
        self.creations += 1;
        engine_debug!(
            "triframe::PipelineCache",
            "Pipeline created for color formats {:?}, depth {:?}",
            desc.target.color_formats, desc.target.depth_format
        );
        Ok(self.pipeline.get_or_init(|| pipeline))
    }

    /// The cached pipeline, if built
    pub fn get(&self) -> Option<&Arc<dyn RenderPipelineState>> {
        self.pipeline.get()
    }

    /// How many times the device was asked for a pipeline
    pub fn creations(&self) -> u64 {
        self.creations
    }

    /// Drop the cached pipeline
    pub fn clear(&mut self) {
        if self.pipeline.take().is_some() {
            engine_debug!("triframe::PipelineCache", "Pipeline released");
        }
    }
}

#[cfg(test)]
#[path = "pipeline_cache_tests.rs"]
mod tests;
