/// Framebuffer Manager - keeps the attachments in step with the surface size
///
/// Every frame the manager compares the size of the current primary color
/// attachment with the live surface size. On mismatch (or on the very first
/// frame) it rebuilds the whole framebuffer; otherwise it only swaps the
/// drawable in slot 0 and leaves the off-screen attachments alone.
///
/// A drawable that lags the surface (the swapchain not recreated yet) is
/// rebuilt for once. Later frames with the same drawable size and surface
/// size reuse that framebuffer until either of them changes.

use std::sync::Arc;

use crate::config::AttachmentLayout;
use crate::error::Result;
use crate::frame::Drawable;
use crate::graphics_device::{
    Framebuffer, FramebufferDesc, GraphicsDevice, Texture, TextureDesc, TextureDimensions,
    TextureUsage,
};
use crate::surface::SurfaceSize;
use crate::{engine_debug, engine_err, engine_trace};

/// What `ensure` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// All attachments were (re)created for a new size
    Rebuilt,
    /// Only slot 0 was swapped to the new drawable
    Updated,
}

pub struct FramebufferManager {
    layout: AttachmentLayout,
    framebuffer: Option<Box<dyn Framebuffer>>,
    // Drawable size and surface size the framebuffer was built for
    built_for: Option<(TextureDimensions, SurfaceSize)>,
    rebuilds: u64,
    secondary_allocations: u64,
}

impl FramebufferManager {
    /// The layout is expected to be validated already
    pub fn new(layout: AttachmentLayout) -> Self {
        Self {
            layout,
            framebuffer: None,
            built_for: None,
            rebuilds: 0,
            secondary_allocations: 0,
        }
    }

    /// Make the framebuffer valid for `drawable` at `size`
    ///
    /// After a successful return every populated attachment has the
    /// dimensions of `size`, provided the drawable has them too.
    pub fn ensure(
        &mut self,
        device: &dyn GraphicsDevice,
        drawable: &Drawable,
        size: SurfaceSize,
    ) -> Result<EnsureOutcome> {
        let current = self
            .framebuffer
            .as_ref()
            .and_then(|fb| fb.color_attachment(0))
            .map(|texture| texture.dimensions());

        let key = (drawable.dimensions(), size);
        let reusable = match current {
            Some(dimensions) if dimensions.matches(size) => true,
            Some(_) => self.built_for == Some(key),
            None => false,
        };

        if reusable {
            if let Some(framebuffer) = self.framebuffer.as_mut() {
                framebuffer.update_drawable(drawable.texture().clone())?;
                engine_trace!("triframe::FramebufferManager", "Drawable swapped into slot 0");
                return Ok(EnsureOutcome::Updated);
            }
        }

        self.rebuild(device, drawable, size, current.map(|d| (d.width, d.height)))?;
        Ok(EnsureOutcome::Rebuilt)
    }

    fn rebuild(
        &mut self,
        device: &dyn GraphicsDevice,
        drawable: &Drawable,
        size: SurfaceSize,
        previous: Option<(u32, u32)>,
    ) -> Result<()> {
        if !drawable.dimensions().matches(size) {
            // The swapchain has not caught up with the window yet; rebuilt
            // again once the drawable size changes
            let d = drawable.dimensions();
            engine_debug!(
                "triframe::FramebufferManager",
                "Drawable is {}x{} while the surface is {}x{}",
                d.width, d.height, size.width, size.height
            );
        }

        let mut color_attachments: Vec<Option<Arc<dyn Texture>>> =
            vec![None; self.layout.color_slot_count];
        color_attachments[0] = Some(drawable.texture().clone());

        for slot in self.layout.secondary_slots() {
            let desc = TextureDesc::new_2d(
                drawable.format(),
                size.width,
                size.height,
                TextureUsage::ATTACHMENT | TextureUsage::SAMPLED,
                &format!("Color Attachment {}", slot),
            );
            let texture = device.create_texture(&desc).map_err(|e| {
                engine_err!(
                    "triframe::FramebufferManager",
                    "Failed to create color attachment {} ({}x{}): {}",
                    slot, size.width, size.height, e
                )
            })?;
            color_attachments[slot] = Some(texture);
            self.secondary_allocations += 1;
        }

        let depth_attachment = match self.layout.depth_format {
            Some(format) => {
                let desc = TextureDesc::new_2d(
                    format,
                    size.width,
                    size.height,
                    TextureUsage::ATTACHMENT,
                    "Depth Attachment",
                );
                let texture = device.create_texture(&desc).map_err(|e| {
                    engine_err!("triframe::FramebufferManager", "Failed to create depth attachment: {}", e)
                })?;
                self.secondary_allocations += 1;
                Some(texture)
            }
            None => None,
        };

        let framebuffer = device
            .create_framebuffer(FramebufferDesc {
                color_attachments,
                depth_attachment,
                debug_name: "Main Framebuffer".to_string(),
            })
            .map_err(|e| engine_err!("triframe::FramebufferManager", "Failed to create framebuffer: {}", e))?;

        // Release the old attachments only once the new set exists
        self.framebuffer = Some(framebuffer);
        self.built_for = Some((drawable.dimensions(), size));
        self.rebuilds += 1;

        match previous {
            Some((w, h)) => engine_debug!(
                "triframe::FramebufferManager",
                "Framebuffer rebuilt {}x{} -> {}x{}",
                w, h, size.width, size.height
            ),
            None => engine_debug!(
                "triframe::FramebufferManager",
                "Framebuffer created at {}x{} ({} color slots)",
                size.width, size.height, self.layout.color_slot_count
            ),
        }
        Ok(())
    }

    /// The current framebuffer, once `ensure` has succeeded at least once
    pub fn framebuffer(&self) -> Option<&dyn Framebuffer> {
        self.framebuffer.as_deref()
    }

    /// Number of full rebuilds so far (the first creation included)
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Number of off-screen attachments allocated so far
    pub fn secondary_allocations(&self) -> u64 {
        self.secondary_allocations
    }

    /// Drop the framebuffer and its attachments
    pub fn release(&mut self) {
        self.built_for = None;
        if self.framebuffer.take().is_some() {
            engine_debug!("triframe::FramebufferManager", "Framebuffer released");
        }
    }
}

#[cfg(test)]
#[path = "framebuffer_manager_tests.rs"]
mod tests;
