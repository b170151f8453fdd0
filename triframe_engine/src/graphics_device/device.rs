/// GraphicsDevice trait - factory for GPU resources and owner of the swapchain

use std::sync::Arc;

use crate::engine_error;
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandQueue, CommandQueueDesc, Framebuffer, FramebufferDesc,
    RenderPipelineDesc, RenderPipelineState, Texture, TextureDesc,
};

/// Color space requested for the swapchain images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// sRGB encoded images (non-linear transfer)
    SrgbNonLinear,
    /// Linear values stored in sRGB-formatted images
    SrgbLinear,
}

/// Device creation options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Upper bound of sampled textures a pipeline may bind
    pub max_textures: u32,
    /// Upper bound of samplers a pipeline may bind
    pub max_samplers: u32,
    /// Abort the process when the validation layers report an error
    pub terminate_on_validation_error: bool,
    /// Color space requested for the swapchain
    pub swapchain_color_space: ColorSpace,
    /// Load the validation layers (only honored when compiled in)
    pub enable_validation: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            max_textures: 8,
            max_samplers: 8,
            terminate_on_validation_error: true,
            swapchain_color_space: ColorSpace::SrgbLinear,
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// Kind of physical GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwDeviceType {
    Discrete,
    Integrated,
    Virtual,
    Cpu,
    Other,
}

/// Properties of one physical GPU, as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwDeviceDesc {
    pub name: String,
    pub device_type: HwDeviceType,
}

/// Pick the GPU to render on
///
/// Discrete GPUs win over integrated ones; among devices of the same kind
/// the first one listed is taken. Virtual, CPU and unknown devices are never
/// chosen.
///
/// # Returns
///
/// The index of the chosen device in `devices`
pub fn select_hardware_device(devices: &[HwDeviceDesc]) -> Result<usize> {
    let find = |wanted: HwDeviceType| devices.iter().position(|d| d.device_type == wanted);

    match find(HwDeviceType::Discrete).or_else(|| find(HwDeviceType::Integrated)) {
        Some(index) => Ok(index),
        None => {
            let seen: Vec<String> = devices
                .iter()
                .map(|d| format!("{} ({:?})", d.name, d.device_type))
                .collect();
            engine_error!(
                "triframe::GraphicsDevice",
                "No discrete or integrated GPU among {} device(s): [{}]",
                devices.len(),
                seen.join(", ")
            );
            Err(Error::DeviceNotFound)
        }
    }
}

/// Main device trait
///
/// Central factory for GPU resources. Also owns the swapchain bound to the
/// surface the device was created for. Implemented by backend-specific
/// devices (e.g., VulkanGraphicsDevice).
pub trait GraphicsDevice: Send + Sync {
    /// The physical GPU this device runs on
    fn hw_device(&self) -> &HwDeviceDesc;

    /// Create a command queue
    fn create_command_queue(&self, desc: &CommandQueueDesc) -> Result<Box<dyn CommandQueue>>;

    /// Create a texture
    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a framebuffer from already created textures
    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Box<dyn Framebuffer>>;

    /// Compile a render pipeline against the given attachment formats
    fn create_render_pipeline(&self, desc: &RenderPipelineDesc) -> Result<Arc<dyn RenderPipelineState>>;

    /// Acquire the next presentable swapchain image
    ///
    /// Returns `Ok(None)` when the swapchain has no image to give.
    fn acquire_drawable(&mut self) -> Result<Option<Arc<dyn Texture>>>;

    /// Recreate the swapchain for a new surface size
    fn init_swapchain(&mut self, width: u32, height: u32) -> Result<()>;

    /// Block until the GPU has finished all submitted work
    fn wait_idle(&self) -> Result<()>;
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
