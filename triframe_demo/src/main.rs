//! Triframe demo - one triangle on a white background
//!
//! Opens the window, creates the Vulkan device on it and renders until the
//! window is closed or Escape is pressed.

use std::process::ExitCode;

use triframe_engine::triframe::config::{DeviceConfig, FrameConfig, WindowConfig};
use triframe_engine::triframe::surface::{SurfaceProvider, WinitSurface};
use triframe_engine::triframe::{Application, Result};
use triframe_engine::{engine_error, engine_info};
use triframe_renderer_vulkan::VulkanGraphicsDevice;

fn run() -> Result<()> {
    let mut surface = WinitSurface::new(&WindowConfig::default())?;
    let device = VulkanGraphicsDevice::new(&surface, surface.current_size(), DeviceConfig::default())?;

    // Declared after the surface: the device goes first, the window last
    let mut application = Application::new(Box::new(device), FrameConfig::default())?;
    let stats = application.run(&mut surface)?;

    engine_info!("triframe::demo", "Exiting after {} frames", stats.frames_submitted);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            engine_error!("triframe::demo", "Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
