/// Application - owns the graphics device and the frame loop
///
/// The device is the last thing released: the frame loop's pipeline,
/// framebuffer and queue go first, once the GPU is idle.

use crate::config::FrameConfig;
use crate::error::Result;
use crate::frame::{FrameLoop, FrameStats};
use crate::graphics_device::GraphicsDevice;
use crate::surface::SurfaceProvider;
use crate::{engine_info, engine_warn};

pub struct Application {
    frame_loop: FrameLoop,
    // Declared last so it drops after the frame loop
    device: Box<dyn GraphicsDevice>,
}

impl Application {
    pub fn new(device: Box<dyn GraphicsDevice>, config: FrameConfig) -> Result<Self> {
        let frame_loop = FrameLoop::new(&*device, config)?;
        engine_info!("triframe::Application", "Rendering on {}", device.hw_device().name);
        Ok(Self { frame_loop, device })
    }

    /// Render until the surface is closed or a fatal error occurs
    pub fn run(&mut self, surface: &mut dyn SurfaceProvider) -> Result<FrameStats> {
        self.frame_loop.run(&mut *self.device, surface)
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        &*self.device
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_warn!("triframe::Application", "GPU did not go idle before teardown: {}", e);
        }
        self.frame_loop.teardown();
    }
}

#[cfg(test)]
#[path = "application_tests.rs"]
mod tests;
