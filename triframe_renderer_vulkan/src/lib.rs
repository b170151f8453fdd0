/*!
# Triframe - Vulkan Backend

Vulkan implementation of the Triframe graphics device traits.

Built on ash (Vulkan 1.3 with dynamic rendering), ash-window for surface
creation and gpu-allocator for memory management. Shaders are compiled
from GLSL at pipeline creation time.

With the `vulkan-validation` feature, the Khronos validation layer can be
loaded (`DeviceConfig::enable_validation`) and its messages are forwarded to
the engine logger.

```no_run
use triframe_engine::triframe::config::{DeviceConfig, WindowConfig};
use triframe_engine::triframe::surface::{SurfaceProvider, WinitSurface};
use triframe_renderer_vulkan::VulkanGraphicsDevice;

let surface = WinitSurface::new(&WindowConfig::default())?;
let device = VulkanGraphicsDevice::new(&surface, surface.current_size(), DeviceConfig::default())?;
# Ok::<(), triframe_engine::triframe::Error>(())
```
*/

mod vulkan;
mod vulkan_context;
mod vulkan_format;
mod vulkan_texture;
mod vulkan_swapchain;
mod vulkan_frame_buffer;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_command_list;
mod vulkan_command_queue;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_texture::VulkanTexture;
pub use vulkan_frame_buffer::VulkanFramebuffer;
pub use vulkan_pipeline::VulkanRenderPipelineState;
pub use vulkan_command_queue::VulkanCommandQueue;
pub use vulkan_command_list::{VulkanCommandBuffer, VulkanRenderCommandEncoder};

// Validation reporting
#[cfg(feature = "vulkan-validation")]
pub use debug::{validation_stats, ValidationStats};
