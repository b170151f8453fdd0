/// winit-backed surface provider
///
/// The window is created up front on the event loop, then events are pulled
/// on demand with `pump_app_events` instead of handing control to `run_app`,
/// so the frame loop stays in charge of the thread.

use std::collections::VecDeque;
use std::time::Duration;

use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key as WinitKey, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::config::WindowConfig;
use crate::error::Result;
use crate::surface::{Key, SurfaceEvent, SurfaceProvider, SurfaceSize};
use crate::{engine_debug, engine_err, engine_info};

/// Translate a winit logical key
pub(crate) fn translate_key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(NamedKey::Escape) => Key::Escape,
        WinitKey::Named(NamedKey::Enter) => Key::Enter,
        WinitKey::Named(NamedKey::Space) => Key::Space,
        WinitKey::Character(text) => text.chars().next().map(Key::Character).unwrap_or(Key::Other),
        _ => Key::Other,
    }
}

/// Translated events waiting to be polled, and the size they have reported
///
/// The size only moves when a Resized event is handed out, so the frame loop
/// never sees a size the graphics device has not been told about.
pub(crate) struct PendingEvents {
    queue: VecDeque<SurfaceEvent>,
    size: SurfaceSize,
}

impl PendingEvents {
    pub(crate) fn new(size: SurfaceSize) -> Self {
        Self {
            queue: VecDeque::new(),
            size,
        }
    }

    pub(crate) fn push(&mut self, event: SurfaceEvent) {
        self.queue.push_back(event);
    }

    pub(crate) fn pop(&mut self) -> Option<SurfaceEvent> {
        let event = self.queue.pop_front();
        if let Some(SurfaceEvent::Resized(width, height)) = event {
            self.size = SurfaceSize::new(width, height);
        }
        event
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn size(&self) -> SurfaceSize {
        self.size
    }
}

/// Receives winit callbacks during a pump and queues translated events
struct EventCollector {
    window_id: WindowId,
    pending: PendingEvents,
    exited: bool,
}

impl ApplicationHandler for EventCollector {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if window_id != self.window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.pending.push(SurfaceEvent::Closed);
            }
            WindowEvent::Resized(size) => {
                self.pending.push(SurfaceEvent::Resized(size.width, size.height));
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                self.pending.push(SurfaceEvent::KeyPressed(translate_key(&event.logical_key)));
            }
            _ => {}
        }
    }
}

/// Surface provider owning a winit window and its event loop
///
/// Hands out the window's native handles, so a graphics device can be
/// created directly on it.
pub struct WinitSurface {
    // Dropped before the event loop
    window: Window,
    collector: EventCollector,
    event_loop: EventLoop<()>,
}

impl WinitSurface {
    /// Open a window as described by `config`
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let event_loop = EventLoop::new()
            .map_err(|e| engine_err!(InitializationFailed, "triframe::WinitSurface", "Failed to create event loop: {}", e))?;

        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        #[allow(deprecated)]
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| engine_err!(InitializationFailed, "triframe::WinitSurface", "Failed to create window: {}", e))?;

        let size = window.inner_size();
        engine_info!(
            "triframe::WinitSurface",
            "Window '{}' opened ({}x{} physical pixels)",
            config.title, size.width, size.height
        );

        Ok(Self {
            collector: EventCollector {
                window_id: window.id(),
                pending: PendingEvents::new(SurfaceSize::new(size.width, size.height)),
                exited: false,
            },
            window,
            event_loop,
        })
    }

    /// Pull every event the OS has for us without blocking
    fn pump(&mut self) {
        if self.collector.exited {
            return;
        }
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.collector);
        if let PumpStatus::Exit(code) = status {
            engine_debug!("triframe::WinitSurface", "Event loop exited with code {}", code);
            self.collector.exited = true;
            self.collector.pending.push(SurfaceEvent::Closed);
        }
    }
}

impl SurfaceProvider for WinitSurface {
    fn current_size(&self) -> SurfaceSize {
        self.collector.pending.size()
    }

    fn poll_event(&mut self) -> Option<SurfaceEvent> {
        if self.collector.pending.is_empty() {
            self.pump();
        }
        self.collector.pending.pop()
    }
}

impl HasWindowHandle for WinitSurface {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for WinitSurface {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}
