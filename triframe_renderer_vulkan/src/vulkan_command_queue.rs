/// Command queue - Vulkan implementation of CommandQueue
///
/// Submits onto the device's graphics queue and presents onto its present
/// queue. One frame is in flight at a time: each submission waits for the
/// previous one's fence, and only then releases that frame's command buffer.

use ash::vk;
use std::any::Any;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use triframe_engine::triframe::render::{CommandBuffer, CommandQueue};
use triframe_engine::triframe::Result;
use triframe_engine::{engine_bail, engine_debug, engine_err, engine_trace};

use crate::vulkan_command_list::VulkanCommandBuffer;
use crate::vulkan_context::GpuContext;

/// Vulkan command queue implementation
pub struct VulkanCommandQueue {
    context: Arc<GpuContext>,
    /// Command buffers the GPU may still be executing
    in_flight: Mutex<Vec<Box<dyn CommandBuffer>>>,
}

impl VulkanCommandQueue {
    pub(crate) fn new(context: Arc<GpuContext>) -> Self {
        Self { context, in_flight: Mutex::new(Vec::new()) }
    }
}

impl CommandQueue for VulkanCommandQueue {
    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer>> {
        Ok(Box::new(VulkanCommandBuffer::new(Arc::clone(&self.context))?))
    }

    fn submit(&self, mut command_buffer: Box<dyn CommandBuffer>) -> Result<()> {
        let Some(vk_buffer) = command_buffer.as_any_mut().downcast_mut::<VulkanCommandBuffer>() else {
            engine_bail!(InvalidResource, "triframe::vulkan", "Command buffer is not a Vulkan command buffer");
        };
        vk_buffer.finish()?;
        let present = vk_buffer.take_present();
        let handle = vk_buffer.command_buffer();

        let context = &self.context;
        let device = &context.device;
        let sync = &context.frame_sync;

        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| engine_err!("triframe::vulkan", "Command queue lock poisoned"))?;

        unsafe {
            device
                .wait_for_fences(&[sync.in_flight], true, u64::MAX)
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to wait for fence: {:?}", e))?;
            in_flight.clear();
            device
                .reset_fences(&[sync.in_flight])
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to reset fence: {:?}", e))?;

            // The rendering targets the acquired image: wait for it
            let waits_on_drawable = sync.acquire_pending.swap(false, Ordering::AcqRel);
            let wait_semaphores = [sync.image_available];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let signal_semaphores: Vec<vk::Semaphore> = present
                .iter()
                .map(|(chain, index)| chain.render_finished(*index))
                .collect();
            let command_buffers = [handle];

            let mut submit_info = vk::SubmitInfo::default()
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);
            if waits_on_drawable {
                submit_info = submit_info
                    .wait_semaphores(&wait_semaphores)
                    .wait_dst_stage_mask(&wait_stages);
            }

            device
                .queue_submit(context.graphics_queue, &[submit_info], sync.in_flight)
                .map_err(|e| engine_err!("triframe::vulkan", "Failed to submit command buffer: {:?}", e))?;

            if let Some((chain, index)) = present {
                let swapchains = [chain.handle()];
                let image_indices = [index];
                let present_info = vk::PresentInfoKHR::default()
                    .wait_semaphores(&signal_semaphores)
                    .swapchains(&swapchains)
                    .image_indices(&image_indices);

                // An out-of-date swapchain is recreated on the next resize or acquire
                match context.swapchain_loader.queue_present(context.present_queue, &present_info) {
                    Ok(false) => {}
                    Ok(true) => {
                        engine_trace!("triframe::vulkan", "Swapchain suboptimal on present");
                    }
                    Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                        engine_debug!("triframe::vulkan", "Swapchain out of date on present");
                    }
                    Err(e) => {
                        in_flight.push(command_buffer);
                        return Err(engine_err!("triframe::vulkan", "Failed to present: {:?}", e));
                    }
                }
            }
        }

        in_flight.push(command_buffer);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanCommandQueue {
    fn drop(&mut self) {
        unsafe {
            self.context.device.device_wait_idle().ok();
        }
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.clear();
        }
    }
}
