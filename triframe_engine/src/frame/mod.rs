/// Frame module - the per-frame lifecycle
///
/// Drawable acquisition, framebuffer validation, pipeline caching and the
/// loop tying them together.

pub mod drawable;
pub mod shaders;
mod framebuffer_manager;
mod pipeline_cache;
mod frame_loop;

pub use drawable::Drawable;
pub use framebuffer_manager::{EnsureOutcome, FramebufferManager};
pub use pipeline_cache::PipelineCache;
pub use frame_loop::{FrameLoop, FrameStats, LoopState};
