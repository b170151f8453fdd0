/// Framebuffer - Vulkan implementation of the Framebuffer trait
///
/// With dynamic rendering there is no VkFramebuffer object: the framebuffer
/// is the list of attachment textures, turned into rendering attachment
/// infos when a render pass begins.

use std::any::Any;
use std::sync::Arc;
use triframe_engine::triframe::render::{Framebuffer, FramebufferDesc, Texture, TextureUsage};
use triframe_engine::triframe::Result;
use triframe_engine::{engine_bail, engine_debug, engine_trace};

use crate::vulkan_texture::as_vulkan_texture;

/// Vulkan framebuffer implementation
///
/// Attachments may briefly differ in size while the swapchain catches up
/// with a resized window; render passes then cover the area common to all
/// of them.
pub struct VulkanFramebuffer {
    color_attachments: Vec<Option<Arc<dyn Texture>>>,
    depth_attachment: Option<Arc<dyn Texture>>,
    debug_name: String,
}

impl VulkanFramebuffer {
    /// Check the attachments and group them
    ///
    /// Every attachment must be a Vulkan texture created with
    /// `TextureUsage::ATTACHMENT` whose format suits its slot.
    pub(crate) fn new(desc: FramebufferDesc) -> Result<Self> {
        let FramebufferDesc { color_attachments, depth_attachment, debug_name } = desc;

        let mut size = None;
        let attachments = color_attachments
            .iter()
            .enumerate()
            .filter_map(|(slot, texture)| texture.as_ref().map(|t| (format!("color slot {}", slot), t)))
            .chain(depth_attachment.iter().map(|t| ("depth attachment".to_string(), t)));

        for (what, texture) in attachments {
            as_vulkan_texture(&**texture, &format!("'{}' {}", debug_name, what))?;

            if !texture.usage().contains(TextureUsage::ATTACHMENT) {
                engine_bail!(InvalidResource, "triframe::vulkan",
                    "'{}' {} was not created as an attachment", debug_name, what);
            }
            if what.starts_with("color") == texture.format().is_depth() {
                engine_bail!(InvalidResource, "triframe::vulkan",
                    "'{}' {} has the wrong kind of format {:?}", debug_name, what, texture.format());
            }

            let dimensions = texture.dimensions();
            match size {
                None => size = Some(dimensions),
                Some(expected) if expected != dimensions => {
                    engine_debug!("triframe::vulkan",
                        "'{}' {} is {}x{}, first attachment is {}x{}",
                        debug_name, what, dimensions.width, dimensions.height, expected.width, expected.height);
                }
                Some(_) => {}
            }
        }

        let Some(size) = size else {
            engine_bail!(InvalidResource, "triframe::vulkan", "Framebuffer '{}' has no attachments", debug_name);
        };
        engine_trace!("triframe::vulkan", "Framebuffer '{}' created ({}x{}, {} color slots)",
            debug_name, size.width, size.height, color_attachments.len());

        Ok(Self { color_attachments, depth_attachment, debug_name })
    }
}

impl Framebuffer for VulkanFramebuffer {
    fn color_slot_count(&self) -> usize {
        self.color_attachments.len()
    }

    fn color_attachment(&self, slot: usize) -> Option<&Arc<dyn Texture>> {
        self.color_attachments.get(slot).and_then(|texture| texture.as_ref())
    }

    fn depth_attachment(&self) -> Option<&Arc<dyn Texture>> {
        self.depth_attachment.as_ref()
    }

    fn update_drawable(&mut self, drawable: Arc<dyn Texture>) -> Result<()> {
        as_vulkan_texture(&*drawable, "Drawable")?;

        let Some(slot0) = self.color_attachments.get_mut(0) else {
            engine_bail!(InvalidResource, "triframe::vulkan", "Framebuffer '{}' has no color slot", self.debug_name);
        };
        if let Some(current) = slot0.as_ref() {
            if current.format() != drawable.format() {
                engine_bail!(InvalidResource, "triframe::vulkan",
                    "Drawable format {:?} does not fit '{}' slot 0 ({:?})",
                    drawable.format(), self.debug_name, current.format());
            }
        }
        *slot0 = Some(drawable);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
