/// Load/store actions and clear values for one render pass

/// What happens to an attachment's contents when the pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    DontCare,
    Load,
    Clear,
}

/// What happens to an attachment's contents when the pass ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    DontCare,
    Store,
}

/// Per color slot actions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAttachmentDesc {
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    /// RGBA clear value, used when load_action is Clear
    pub clear_color: [f32; 4],
}

/// Depth attachment actions, nothing kept across passes by default
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthAttachmentDesc {
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_depth: f32,
}

impl Default for DepthAttachmentDesc {
    fn default() -> Self {
        Self {
            load_action: LoadAction::DontCare,
            store_action: StoreAction::DontCare,
            clear_depth: 1.0,
        }
    }
}

/// Actions for every attachment of a framebuffer, for one pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDesc {
    /// One entry per color slot; None for empty slots
    pub color_attachments: Vec<Option<ColorAttachmentDesc>>,
    /// Ignored when the framebuffer has no depth attachment
    pub depth_attachment: DepthAttachmentDesc,
}

impl RenderPassDesc {
    /// Clear every populated color slot to `clear_color` and store the result
    pub fn clear_populated(slot_count: usize, populated: &[usize], clear_color: [f32; 4]) -> Self {
        let color_attachments = (0..slot_count)
            .map(|slot| {
                populated.contains(&slot).then_some(ColorAttachmentDesc {
                    load_action: LoadAction::Clear,
                    store_action: StoreAction::Store,
                    clear_color,
                })
            })
            .collect();

        Self {
            color_attachments,
            depth_attachment: DepthAttachmentDesc::default(),
        }
    }
}
