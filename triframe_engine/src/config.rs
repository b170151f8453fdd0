/// Startup configuration for the frame loop and the window
///
/// Device options live with the device trait (`DeviceConfig`).

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::TextureFormat;
use crate::surface::Key;

/// Which color slots of the framebuffer exist and which carry a texture
///
/// Slot 0 is always the drawable. The other populated slots are backed by
/// off-screen textures matching the drawable; unlisted slots stay empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLayout {
    /// Total number of color slots
    pub color_slot_count: usize,
    /// Indices of the slots that receive a texture
    pub populated_color_slots: Vec<usize>,
    /// Depth attachment format, None for no depth attachment
    pub depth_format: Option<TextureFormat>,
}

impl Default for AttachmentLayout {
    fn default() -> Self {
        Self {
            color_slot_count: 1,
            populated_color_slots: vec![0],
            depth_format: None,
        }
    }
}

impl AttachmentLayout {
    /// Check the layout before any GPU resource is created
    pub fn validate(&self) -> Result<()> {
        if !self.populated_color_slots.contains(&0) {
            engine_bail!(InvalidResource, "triframe::AttachmentLayout", "Color slot 0 must be populated (it holds the drawable)");
        }
        for (i, &slot) in self.populated_color_slots.iter().enumerate() {
            if slot >= self.color_slot_count {
                engine_bail!(
                    InvalidResource,
                    "triframe::AttachmentLayout",
                    "Populated slot {} is out of range ({} color slots)",
                    slot, self.color_slot_count
                );
            }
            if self.populated_color_slots[..i].contains(&slot) {
                engine_bail!(InvalidResource, "triframe::AttachmentLayout", "Color slot {} is listed twice", slot);
            }
        }
        if let Some(format) = self.depth_format {
            if !format.is_depth() {
                engine_bail!(InvalidResource, "triframe::AttachmentLayout", "{:?} is not a depth format", format);
            }
        }
        Ok(())
    }

    /// Populated slots other than slot 0, in ascending order
    pub fn secondary_slots(&self) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .populated_color_slots
            .iter()
            .copied()
            .filter(|&slot| slot != 0)
            .collect();
        slots.sort_unstable();
        slots
    }

    pub fn is_populated(&self, slot: usize) -> bool {
        self.populated_color_slots.contains(&slot)
    }
}

/// Frame loop options
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    pub attachments: AttachmentLayout,
    /// RGBA clear color of every populated color slot
    pub clear_color: [f32; 4],
    /// Key that ends the loop, like closing the window
    pub cancel_key: Key,
    /// Debug group label wrapping the draw call
    pub debug_label: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            attachments: AttachmentLayout::default(),
            clear_color: [1.0, 1.0, 1.0, 1.0],
            cancel_key: Key::Escape,
            debug_label: "Render Triangle".to_string(),
        }
    }
}

/// Window options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Triframe - Vulkan Triangle".to_string(),
            width: 800,
            height: 600,
            resizable: true,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
