/// Command buffer and render command encoder - Vulkan implementations
///
/// A command buffer owns its command pool and starts recording as soon as
/// it is created. Render passes use dynamic rendering; the encoder records
/// the layout transitions around them.

use ash::vk;
use std::any::Any;
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use triframe_engine::triframe::render::{
    CommandBuffer, Framebuffer, LoadAction, PrimitiveType, RenderCommandEncoder, RenderPassDesc,
    RenderPipelineState, ScissorRect, Texture, TextureDimensions, Viewport,
};
use triframe_engine::triframe::{Error, Result};
use triframe_engine::{engine_bail, engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_mask, load_action_to_vk, primitive_type_to_vk, store_action_to_vk};
use crate::vulkan_pipeline::VulkanRenderPipelineState;
use crate::vulkan_swapchain::SwapchainImages;
use crate::vulkan_texture::{as_vulkan_texture, VulkanTexture};

/// Vulkan command buffer implementation
///
/// Records rendering commands for one frame. Consumed by
/// `VulkanCommandQueue::submit()`.
pub struct VulkanCommandBuffer {
    context: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    /// Whether recording is still open
    is_recording: bool,
    /// Set while an encoder has a render pass open
    in_render_pass: Arc<AtomicBool>,
    /// Drawable to present after execution
    present: Option<(Arc<SwapchainImages>, u32)>,
}

impl VulkanCommandBuffer {
    /// Create a command pool, allocate one primary buffer and begin recording
    pub(crate) fn new(context: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(context.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT);

            let command_pool = context.device.create_command_pool(&pool_info, None).map_err(|e| {
                engine_error!("triframe::vulkan", "Failed to create command pool: {:?}", e);
                Error::BackendError(format!("Failed to create command pool: {:?}", e))
            })?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            // From here on, Drop releases the pool
            let mut buffer = Self {
                context,
                command_pool,
                command_buffer: vk::CommandBuffer::null(),
                is_recording: false,
                in_render_pass: Arc::new(AtomicBool::new(false)),
                present: None,
            };

            let command_buffers = buffer.context.device.allocate_command_buffers(&allocate_info).map_err(|e| {
                engine_error!("triframe::vulkan", "Failed to allocate command buffer: {:?}", e);
                Error::BackendError(format!("Failed to allocate command buffers: {:?}", e))
            })?;
            let Some(&command_buffer) = command_buffers.first() else {
                engine_bail!("triframe::vulkan", "Driver returned no command buffer");
            };
            buffer.command_buffer = command_buffer;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            buffer
                .context
                .device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to begin command buffer: {:?}", e))?;
            buffer.is_recording = true;

            Ok(buffer)
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Close recording; called by the queue right before submission
    pub(crate) fn finish(&mut self) -> Result<()> {
        if !self.is_recording {
            engine_bail!(InvalidResource, "triframe::vulkan", "Command buffer was already submitted");
        }
        if self.in_render_pass.load(Ordering::Acquire) {
            engine_bail!(InvalidResource, "triframe::vulkan", "Render pass not ended before submission");
        }

        unsafe {
            self.context
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    /// Drawable scheduled with `present()`, taken by the queue
    pub(crate) fn take_present(&mut self) -> Option<(Arc<SwapchainImages>, u32)> {
        self.present.take()
    }
}

/// Record a single image layout transition
fn image_barrier(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    texture: &VulkanTexture,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    let is_depth = texture.format().is_depth();
    let (src_stage, src_access, dst_stage, dst_access) = match (is_depth, new_layout) {
        (_, vk::ImageLayout::PRESENT_SRC_KHR) => (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
            vk::AccessFlags::empty(),
        ),
        (true, _) => (
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),
        (false, _) => (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::empty(),
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        ),
    };

    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(texture.image())
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect_mask(texture.format()),
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
        .src_access_mask(src_access)
        .dst_access_mask(dst_access);

    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            src_stage,
            dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
}

impl CommandBuffer for VulkanCommandBuffer {
    fn create_render_command_encoder(
        &mut self,
        pass: &RenderPassDesc,
        framebuffer: &dyn Framebuffer,
    ) -> Result<Box<dyn RenderCommandEncoder>> {
        if !self.is_recording {
            engine_bail!(InvalidResource, "triframe::vulkan", "Command buffer not recording");
        }
        if self.in_render_pass.load(Ordering::Acquire) {
            engine_bail!(InvalidResource, "triframe::vulkan", "Already inside a render pass");
        }
        if pass.color_attachments.len() != framebuffer.color_slot_count() {
            engine_bail!(InvalidResource, "triframe::vulkan",
                "Render pass describes {} color slots, framebuffer has {}",
                pass.color_attachments.len(), framebuffer.color_slot_count());
        }

        let device = &self.context.device;
        let mut extent: Option<vk::Extent2D> = None;
        let mut cover = |dimensions: TextureDimensions| {
            let next = match extent {
                Some(e) => vk::Extent2D { width: e.width.min(dimensions.width), height: e.height.min(dimensions.height) },
                None => vk::Extent2D { width: dimensions.width, height: dimensions.height },
            };
            extent = Some(next);
        };
        let mut present_images = Vec::new();
        let mut color_infos = Vec::with_capacity(pass.color_attachments.len());

        for (slot, actions) in pass.color_attachments.iter().enumerate() {
            let (Some(texture), Some(actions)) = (framebuffer.color_attachment(slot), actions) else {
                if framebuffer.color_attachment(slot).is_some() {
                    engine_bail!(InvalidResource, "triframe::vulkan",
                        "Color slot {} is populated but the render pass has no actions for it", slot);
                }
                // Empty slot: writes to it are discarded
                color_infos.push(vk::RenderingAttachmentInfo::default().image_view(vk::ImageView::null()));
                continue;
            };
            let texture = as_vulkan_texture(&**texture, &format!("Color slot {}", slot))?;
            cover(texture.dimensions());

            let old_layout = match actions.load_action {
                LoadAction::Load => texture.settled_layout(),
                _ => vk::ImageLayout::UNDEFINED,
            };
            image_barrier(device, self.command_buffer, texture, old_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
            if texture.swapchain_image().is_some() {
                present_images.push(texture.image());
            }

            color_infos.push(
                vk::RenderingAttachmentInfo::default()
                    .image_view(texture.view())
                    .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .load_op(load_action_to_vk(actions.load_action))
                    .store_op(store_action_to_vk(actions.store_action))
                    .clear_value(vk::ClearValue {
                        color: vk::ClearColorValue { float32: actions.clear_color },
                    }),
            );
        }

        let mut depth_info = None;
        let mut has_stencil = false;
        if let Some(texture) = framebuffer.depth_attachment() {
            let texture = as_vulkan_texture(&**texture, "Depth attachment")?;
            let actions = &pass.depth_attachment;
            cover(texture.dimensions());

            let old_layout = match actions.load_action {
                LoadAction::Load => texture.settled_layout(),
                _ => vk::ImageLayout::UNDEFINED,
            };
            image_barrier(device, self.command_buffer, texture, old_layout,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
            has_stencil = texture.format().has_stencil();

            depth_info = Some(
                vk::RenderingAttachmentInfo::default()
                    .image_view(texture.view())
                    .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    .load_op(load_action_to_vk(actions.load_action))
                    .store_op(store_action_to_vk(actions.store_action))
                    .clear_value(vk::ClearValue {
                        depth_stencil: vk::ClearDepthStencilValue { depth: actions.clear_depth, stencil: 0 },
                    }),
            );
        }

        let Some(extent) = extent else {
            engine_bail!(InvalidResource, "triframe::vulkan", "Render pass on a framebuffer without attachments");
        };

        let mut rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D { offset: vk::Offset2D { x: 0, y: 0 }, extent })
            .layer_count(1)
            .color_attachments(&color_infos);
        if let Some(depth_info) = depth_info.as_ref() {
            rendering_info = rendering_info.depth_attachment(depth_info);
            if has_stencil {
                rendering_info = rendering_info.stencil_attachment(depth_info);
            }
        }

        unsafe {
            device.cmd_begin_rendering(self.command_buffer, &rendering_info);
        }
        self.in_render_pass.store(true, Ordering::Release);

        Ok(Box::new(VulkanRenderCommandEncoder {
            context: Arc::clone(&self.context),
            command_buffer: self.command_buffer,
            in_render_pass: Arc::clone(&self.in_render_pass),
            render_area: extent,
            present_images,
            pipeline_bound: false,
            label_depth: 0,
        }))
    }

    fn present(&mut self, drawable: &dyn Texture) -> Result<()> {
        let texture = as_vulkan_texture(drawable, "Drawable")?;
        let Some((chain, index)) = texture.swapchain_image() else {
            engine_bail!(InvalidResource, "triframe::vulkan", "Only swapchain images can be presented");
        };
        if self.present.is_some() {
            engine_bail!(InvalidResource, "triframe::vulkan", "A drawable is already scheduled for presentation");
        }
        self.present = Some((Arc::clone(chain), index));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for VulkanCommandBuffer {
    fn drop(&mut self) {
        unsafe {
            // Frees the command buffer along with the pool
            self.context.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Vulkan render command encoder implementation
///
/// Records into the command buffer that created it, between
/// `vkCmdBeginRendering` and `vkCmdEndRendering`.
pub struct VulkanRenderCommandEncoder {
    context: Arc<GpuContext>,
    command_buffer: vk::CommandBuffer,
    in_render_pass: Arc<AtomicBool>,
    /// Area covered by every attachment of the pass
    render_area: vk::Extent2D,
    /// Swapchain images to transition for presentation once the pass ends
    present_images: Vec<vk::Image>,
    pipeline_bound: bool,
    label_depth: u32,
}

impl VulkanRenderCommandEncoder {
    fn ensure_open(&self) -> Result<()> {
        if !self.in_render_pass.load(Ordering::Acquire) {
            engine_bail!(InvalidResource, "triframe::vulkan", "Render pass already ended");
        }
        Ok(())
    }
}

impl RenderCommandEncoder for VulkanRenderCommandEncoder {
    fn bind_render_pipeline_state(&mut self, pipeline: &dyn RenderPipelineState) -> Result<()> {
        self.ensure_open()?;
        let Some(pipeline) = pipeline.as_any().downcast_ref::<VulkanRenderPipelineState>() else {
            engine_bail!(InvalidResource, "triframe::vulkan", "Pipeline is not a Vulkan pipeline");
        };

        unsafe {
            self.context.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.pipeline,
            );
        }
        self.pipeline_bound = true;
        Ok(())
    }

    fn bind_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_open()?;
        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        unsafe {
            self.context.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn bind_scissor_rect(&mut self, rect: ScissorRect) -> Result<()> {
        self.ensure_open()?;
        // Never reach past the render area
        let x = rect.x.max(0);
        let y = rect.y.max(0);
        let width = rect.width.min(self.render_area.width.saturating_sub(x as u32));
        let height = rect.height.min(self.render_area.height.saturating_sub(y as u32));
        let vk_scissor = vk::Rect2D::default()
            .offset(vk::Offset2D { x, y })
            .extent(vk::Extent2D { width, height });

        unsafe {
            self.context.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn push_debug_group_label(&mut self, label: &str) -> Result<()> {
        self.ensure_open()?;
        let name = CString::new(label)
            .map_err(|e| engine_err!(InvalidResource, "triframe::vulkan", "Invalid debug label '{}': {}", label, e))?;

        if let Some(debug_labels) = &self.context.debug_labels {
            let label_info = vk::DebugUtilsLabelEXT::default()
                .label_name(&name)
                .color([1.0, 1.0, 1.0, 1.0]);
            unsafe {
                debug_labels.cmd_begin_debug_utils_label(self.command_buffer, &label_info);
            }
        }
        self.label_depth += 1;
        Ok(())
    }

    fn pop_debug_group_label(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.label_depth == 0 {
            engine_bail!(InvalidResource, "triframe::vulkan", "No debug label to pop");
        }

        if let Some(debug_labels) = &self.context.debug_labels {
            unsafe {
                debug_labels.cmd_end_debug_utils_label(self.command_buffer);
            }
        }
        self.label_depth -= 1;
        Ok(())
    }

    fn draw(&mut self, primitive: PrimitiveType, first_vertex: u32, vertex_count: u32) -> Result<()> {
        self.ensure_open()?;
        if !self.pipeline_bound {
            engine_bail!(InvalidResource, "triframe::vulkan", "Draw without a bound pipeline");
        }

        unsafe {
            let device = &self.context.device;
            device.cmd_set_primitive_topology(self.command_buffer, primitive_type_to_vk(primitive));
            device.cmd_draw(
                self.command_buffer,
                vertex_count,
                1, // instance_count
                first_vertex,
                0, // first_instance
            );
        }
        Ok(())
    }

    fn end_encoding(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.label_depth != 0 {
            engine_bail!(InvalidResource, "triframe::vulkan",
                "{} debug label(s) still open at the end of the pass", self.label_depth);
        }

        let device = &self.context.device;
        unsafe {
            device.cmd_end_rendering(self.command_buffer);

            // Drawables: COLOR_ATTACHMENT_OPTIMAL -> PRESENT_SRC_KHR
            let barriers: Vec<vk::ImageMemoryBarrier> = self
                .present_images
                .iter()
                .map(|&image| {
                    vk::ImageMemoryBarrier::default()
                        .old_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                        .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
                        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .image(image)
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: vk::ImageAspectFlags::COLOR,
                            base_mip_level: 0,
                            level_count: 1,
                            base_array_layer: 0,
                            layer_count: 1,
                        })
                        .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                        .dst_access_mask(vk::AccessFlags::empty())
                })
                .collect();
            if !barriers.is_empty() {
                device.cmd_pipeline_barrier(
                    self.command_buffer,
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                    vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &barriers,
                );
            }
        }

        self.in_render_pass.store(false, Ordering::Release);
        Ok(())
    }
}
