/*!
# Triframe Engine

Core of a minimal real-time rendering client: a resizable window, a GPU
context bound to it, and a frame loop that draws one triangle per frame.

## Architecture

- **GraphicsDevice**: factory for GPU resources, owner of the swapchain
- **CommandQueue / CommandBuffer / RenderCommandEncoder**: command recording and submission
- **Texture / Framebuffer / RenderPipelineState**: GPU resources
- **SurfaceProvider**: window size and events (`WinitSurface` for real windows)
- **FrameLoop**: drawable acquisition, framebuffer validation, pipeline caching, submission
- **Application**: owns the device and the frame loop, tears them down in order

Backend implementations (e.g. Vulkan) provide the concrete types behind the
graphics device traits.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod surface;
pub mod frame;
pub mod config;
pub mod application;

// Main triframe namespace module
pub mod triframe {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Top-level application
    pub use crate::application::Application;

    // Logging sub-module (types only; the engine_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module with the GPU capability traits and descriptors
    pub mod render {
        pub use crate::graphics_device::*;
    }

    // Surface sub-module
    pub mod surface {
        pub use crate::surface::*;
    }

    // Frame lifecycle sub-module
    pub mod frame {
        pub use crate::frame::*;
    }

    // Configuration sub-module
    pub mod config {
        pub use crate::config::*;
        pub use crate::graphics_device::{ColorSpace, DeviceConfig};
    }
}
