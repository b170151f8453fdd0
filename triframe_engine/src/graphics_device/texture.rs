/// Texture trait, texture descriptor and texture formats

use std::any::Any;
use bitflags::bitflags;

use crate::surface::SurfaceSize;

/// Pixel format of a texture or attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    // Color formats
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,

    // Depth formats
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// Returns true for depth and depth/stencil formats
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM | TextureFormat::D32_FLOAT | TextureFormat::D24_UNORM_S8_UINT
        )
    }

    /// Returns true if the format carries a stencil aspect
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT)
    }
}

bitflags! {
    /// How a texture may be used by the GPU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be bound as a render pass attachment
        const ATTACHMENT = 1 << 0;
        /// Texture can be sampled in shaders
        const SAMPLED = 1 << 1;
    }
}

/// Width and height of a 2D texture in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureDimensions {
    pub width: u32,
    pub height: u32,
}

impl TextureDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if these dimensions equal the given surface size
    pub fn matches(&self, size: SurfaceSize) -> bool {
        self.width == size.width && self.height == size.height
    }
}

impl From<SurfaceSize> for TextureDimensions {
    fn from(size: SurfaceSize) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Size in pixels
    pub dimensions: TextureDimensions,
    /// Pixel format
    pub format: TextureFormat,
    /// Usage flags
    pub usage: TextureUsage,
    /// Name shown in GPU debuggers and in log messages
    pub debug_name: String,
}

impl TextureDesc {
    /// Descriptor for a single-layer 2D texture
    pub fn new_2d(
        format: TextureFormat,
        width: u32,
        height: u32,
        usage: TextureUsage,
        debug_name: &str,
    ) -> Self {
        Self {
            dimensions: TextureDimensions::new(width, height),
            format,
            usage,
            debug_name: debug_name.to_string(),
        }
    }
}

/// Texture resource trait
///
/// Implemented by backend-specific texture types (e.g., VulkanTexture).
/// Swapchain images are exposed through the same trait but are not owned
/// by the texture object. Everything else is destroyed when dropped.
pub trait Texture: Send + Sync {
    /// Pixel format
    fn format(&self) -> TextureFormat;

    /// Size in pixels
    fn dimensions(&self) -> TextureDimensions;

    /// Usage flags the texture was created with
    fn usage(&self) -> TextureUsage;

    /// Backend downcasting hook
    fn as_any(&self) -> &dyn Any;
}
