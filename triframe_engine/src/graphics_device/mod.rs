/// Graphics device module - one trait per GPU capability
///
/// Core logic only talks to these traits; backends (e.g. Vulkan) implement them.

pub mod device;
pub mod texture;
pub mod frame_buffer;
pub mod pipeline;
pub mod render_pass;
pub mod command;

pub use device::*;
pub use texture::*;
pub use frame_buffer::*;
pub use pipeline::*;
pub use render_pass::*;
pub use command::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
