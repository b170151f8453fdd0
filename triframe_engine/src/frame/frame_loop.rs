/// Frame Loop - acquire, validate, encode, submit, poll
///
/// One iteration per call to `run_frame()`:
///
/// 1. acquire the drawable
/// 2. make the framebuffer valid for the current surface size
/// 3. get (or build, the first time) the pipeline
/// 4. encode the triangle pass, present, submit
/// 5. drain surface events: Closed or the cancel key end the loop, Resized
///    recreates the swapchain (the framebuffer follows on the next frame)
///
/// Nothing is rendered while the surface is zero-sized (minimized window);
/// events are still drained.

use std::sync::Arc;

use crate::config::FrameConfig;
use crate::error::Result;
use crate::frame::shaders::triangle_shader_stages;
use crate::frame::{drawable, EnsureOutcome, FramebufferManager, PipelineCache};
use crate::graphics_device::{
    CommandQueue, CommandQueueDesc, GraphicsDevice, PrimitiveType, RenderPassDesc,
    RenderPipelineState, ScissorRect, Viewport,
};
use crate::surface::{SurfaceEvent, SurfaceProvider, SurfaceSize};
use crate::{engine_debug, engine_err, engine_info, engine_trace};

/// Loop state; Closing is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closing,
}

/// Counters kept over the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frames_submitted: u64,
    pub framebuffer_rebuilds: u64,
    pub secondary_allocations: u64,
    pub draw_calls: u64,
}

pub struct FrameLoop {
    config: FrameConfig,
    state: LoopState,
    render_pass: RenderPassDesc,
    // Teardown order: pipeline, framebuffer, queue
    pipelines: PipelineCache,
    framebuffers: FramebufferManager,
    queue: Option<Box<dyn CommandQueue>>,
    stats: FrameStats,
}

impl FrameLoop {
    /// Validate the configuration and create the graphics queue
    pub fn new(device: &dyn GraphicsDevice, config: FrameConfig) -> Result<Self> {
        config.attachments.validate()?;

        let queue = device.create_command_queue(&CommandQueueDesc::graphics())?;
        let render_pass = RenderPassDesc::clear_populated(
            config.attachments.color_slot_count,
            &config.attachments.populated_color_slots,
            config.clear_color,
        );

        engine_debug!(
            "triframe::FrameLoop",
            "Frame loop ready on {} ({} color slots, populated {:?})",
            device.hw_device().name,
            config.attachments.color_slot_count,
            config.attachments.populated_color_slots
        );

        Ok(Self {
            framebuffers: FramebufferManager::new(config.attachments.clone()),
            pipelines: PipelineCache::new(triangle_shader_stages()),
            queue: Some(queue),
            render_pass,
            state: LoopState::Running,
            stats: FrameStats::default(),
            config,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn framebuffers(&self) -> &FramebufferManager {
        &self.framebuffers
    }

    pub fn pipelines(&self) -> &PipelineCache {
        &self.pipelines
    }

    /// Run iterations until the loop is Closing
    ///
    /// Any error stops the loop; the state is Closing afterwards either way.
    pub fn run(
        &mut self,
        device: &mut dyn GraphicsDevice,
        surface: &mut dyn SurfaceProvider,
    ) -> Result<FrameStats> {
        engine_info!("triframe::FrameLoop", "Frame loop started");
        while self.run_frame(device, surface)? == LoopState::Running {}
        engine_info!("triframe::FrameLoop", "Frame loop stopped after {} frames", self.stats.frames_submitted);
        Ok(self.stats)
    }

    /// One iteration; returns the state reached at its end
    pub fn run_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        surface: &mut dyn SurfaceProvider,
    ) -> Result<LoopState> {
        if self.state == LoopState::Closing {
            return Ok(LoopState::Closing);
        }

        let size = surface.current_size();
        let rendered = if size.is_empty() {
            engine_trace!("triframe::FrameLoop", "Surface is empty, frame skipped");
            Ok(())
        } else {
            self.render(device, size)
        };
        if let Err(e) = rendered {
            self.state = LoopState::Closing;
            return Err(e);
        }

        if let Err(e) = self.dispatch_events(device, surface) {
            self.state = LoopState::Closing;
            return Err(e);
        }
        Ok(self.state)
    }

    fn render(&mut self, device: &mut dyn GraphicsDevice, size: SurfaceSize) -> Result<()> {
        let drawable = drawable::acquire(device)?;
        let device: &dyn GraphicsDevice = device;

        if self.framebuffers.ensure(device, &drawable, size)? == EnsureOutcome::Rebuilt {
            self.stats.framebuffer_rebuilds = self.framebuffers.rebuilds();
            self.stats.secondary_allocations = self.framebuffers.secondary_allocations();
        }
        let Some(framebuffer) = self.framebuffers.framebuffer() else {
            return Err(engine_err!(InvalidResource, "triframe::FrameLoop", "No framebuffer after ensure"));
        };
        let pipeline: Arc<dyn RenderPipelineState> =
            self.pipelines.get_or_create(device, framebuffer)?.clone();

        let Some(queue) = self.queue.as_ref() else {
            return Err(engine_err!(InvalidResource, "triframe::FrameLoop", "Command queue already released"));
        };
        let mut command_buffer = queue.create_command_buffer()?;
        {
            let mut encoder = command_buffer.create_render_command_encoder(&self.render_pass, framebuffer)?;
            encoder.bind_render_pipeline_state(&*pipeline)?;
            encoder.bind_viewport(Viewport::covering(size))?;
            encoder.bind_scissor_rect(ScissorRect::covering(size))?;
            encoder.push_debug_group_label(&self.config.debug_label)?;
            encoder.draw(PrimitiveType::Triangle, 0, 3)?;
            encoder.pop_debug_group_label()?;
            encoder.end_encoding()?;
        }
        command_buffer.present(&**drawable.texture())?;
        queue.submit(command_buffer)?;

        self.stats.frames_submitted += 1;
        self.stats.draw_calls += 1;
        engine_trace!(
            "triframe::FrameLoop",
            "Frame {} submitted at {}x{}",
            self.stats.frames_submitted, size.width, size.height
        );
        Ok(())
    }

    fn dispatch_events(
        &mut self,
        device: &mut dyn GraphicsDevice,
        surface: &mut dyn SurfaceProvider,
    ) -> Result<()> {
        while let Some(event) = surface.poll_event() {
            match event {
                SurfaceEvent::Closed => {
                    engine_info!("triframe::FrameLoop", "Window closed");
                    self.state = LoopState::Closing;
                }
                SurfaceEvent::KeyPressed(key) if key == self.config.cancel_key => {
                    engine_info!("triframe::FrameLoop", "{:?} pressed, closing", key);
                    self.state = LoopState::Closing;
                }
                SurfaceEvent::KeyPressed(key) => {
                    engine_trace!("triframe::FrameLoop", "{:?} pressed", key);
                }
                SurfaceEvent::Resized(width, height) => {
                    if self.state == LoopState::Closing {
                        continue;
                    }
                    engine_debug!("triframe::FrameLoop", "Surface resized to {}x{}", width, height);
                    device.init_swapchain(width, height)?;
                }
            }
        }
        Ok(())
    }

    /// Release the session's GPU objects: pipeline, then framebuffer, then
    /// the queue. Idempotent.
    pub fn teardown(&mut self) {
        self.state = LoopState::Closing;
        self.pipelines.clear();
        self.framebuffers.release();
        if self.queue.take().is_some() {
            let stats = self.stats;
            engine_info!(
                "triframe::FrameLoop",
                "Session stats: {} frames, {} draw calls, {} framebuffer builds, {} attachment allocations",
                stats.frames_submitted, stats.draw_calls, stats.framebuffer_rebuilds, stats.secondary_allocations
            );
        }
    }
}

#[cfg(test)]
#[path = "frame_loop_tests.rs"]
mod tests;
