/// Render pipeline state trait and descriptors

use std::any::Any;

use crate::graphics_device::{Framebuffer, TextureFormat};

/// Attachment formats a pipeline renders into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetDesc {
    /// One entry per color slot, None for slots left empty
    pub color_formats: Vec<Option<TextureFormat>>,
    /// Depth format, None when rendering without depth
    pub depth_format: Option<TextureFormat>,
}

impl RenderTargetDesc {
    /// Read the attachment formats off an existing framebuffer
    pub fn from_framebuffer(framebuffer: &dyn Framebuffer) -> Self {
        Self {
            color_formats: framebuffer.color_formats(),
            depth_format: framebuffer.depth_format(),
        }
    }
}

/// One shader stage given as GLSL source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderStageDesc {
    /// GLSL source text
    pub source: &'static str,
    /// Entry point name
    pub entry_point: &'static str,
}

/// The vertex and fragment stages of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderStagesDesc {
    pub vertex: ShaderStageDesc,
    pub fragment: ShaderStageDesc,
}

/// Descriptor for creating a render pipeline state
#[derive(Debug, Clone)]
pub struct RenderPipelineDesc {
    /// Attachment formats the pipeline is compiled against
    pub target: RenderTargetDesc,
    /// Shader stages
    pub shader_stages: ShaderStagesDesc,
    /// Name shown in log messages
    pub debug_name: String,
}

/// Compiled shader stages plus the attachment formats they were built for
///
/// Immutable once created. The GPU object is destroyed when dropped.
pub trait RenderPipelineState: Send + Sync {
    /// Attachment formats this pipeline was created with
    fn target(&self) -> &RenderTargetDesc;

    /// Backend downcasting hook
    fn as_any(&self) -> &dyn Any;
}
