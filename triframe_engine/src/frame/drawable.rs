/// Drawable acquisition - the per-frame presentable image

use std::sync::Arc;

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, Texture, TextureDimensions, TextureFormat};

/// The swapchain image rendered into during one frame
///
/// Only valid until the frame's command buffer has been submitted; a new one
/// is acquired every frame.
#[derive(Clone)]
pub struct Drawable {
    texture: Arc<dyn Texture>,
}

impl Drawable {
    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    pub fn format(&self) -> TextureFormat {
        self.texture.format()
    }

    pub fn dimensions(&self) -> TextureDimensions {
        self.texture.dimensions()
    }
}

/// Request the next presentable image from the device
///
/// Both a device error and a missing image are fatal for the session.
pub fn acquire(device: &mut dyn GraphicsDevice) -> Result<Drawable> {
    match device.acquire_drawable()? {
        Some(texture) => Ok(Drawable { texture }),
        None => engine_bail!(
            DrawableUnavailable,
            "triframe::Drawable",
            "Swapchain returned no drawable on {}",
            device.hw_device().name
        ),
    }
}

#[cfg(test)]
#[path = "drawable_tests.rs"]
mod tests;
