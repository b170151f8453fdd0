/// Framebuffer trait - the set of attachments a render pass renders into
///
/// Slot 0 always holds the drawable of the current frame. The other color
/// slots hold off-screen textures or stay empty, as configured by the
/// frame's attachment layout.

use std::any::Any;
use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{Texture, TextureFormat};

/// Framebuffer - groups color and depth attachments together
///
/// Created via `GraphicsDevice::create_framebuffer()`.
pub trait Framebuffer: Send + Sync {
    /// Number of color slots (populated or not)
    fn color_slot_count(&self) -> usize;

    /// Texture bound in a color slot, None if the slot is empty or out of range
    fn color_attachment(&self, slot: usize) -> Option<&Arc<dyn Texture>>;

    /// Optional depth attachment
    fn depth_attachment(&self) -> Option<&Arc<dyn Texture>>;

    /// Swap the texture bound in slot 0 without touching the other slots
    ///
    /// The new drawable must have the same format and size as the one it
    /// replaces.
    fn update_drawable(&mut self, drawable: Arc<dyn Texture>) -> Result<()>;

    /// Backend downcasting hook
    fn as_any(&self) -> &dyn Any;

    /// Formats of every color slot, None for empty slots
    fn color_formats(&self) -> Vec<Option<TextureFormat>> {
        (0..self.color_slot_count())
            .map(|slot| self.color_attachment(slot).map(|texture| texture.format()))
            .collect()
    }

    /// Format of the depth attachment, if any
    fn depth_format(&self) -> Option<TextureFormat> {
        self.depth_attachment().map(|texture| texture.format())
    }
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc {
    /// One entry per color slot; None leaves the slot empty
    pub color_attachments: Vec<Option<Arc<dyn Texture>>>,
    /// Optional depth attachment
    pub depth_attachment: Option<Arc<dyn Texture>>,
    /// Name shown in log messages
    pub debug_name: String,
}
