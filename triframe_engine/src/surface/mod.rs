/// Surface module - the on-screen window the frame loop renders into
///
/// The frame loop only sees the `SurfaceProvider` trait: the current pixel
/// size and a queue of translated events. `WinitSurface` is the provider used
/// by applications; tests use their own.

mod winit_surface;

pub use winit_surface::WinitSurface;

#[cfg(test)]
pub mod mock_surface;

/// Width and height of the surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero-sized surface
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Keys the engine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Character(char),
    Other,
}

/// Input and lifecycle events delivered by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The user asked to close the window
    Closed,
    /// A key went down (repeats are not reported)
    KeyPressed(Key),
    /// The drawable area changed size
    Resized(u32, u32),
}

/// Source of surface size and events
pub trait SurfaceProvider {
    /// Current drawable area in pixels, as of the last polled Resized event
    fn current_size(&self) -> SurfaceSize;

    /// Next pending event, None once the queue is drained
    fn poll_event(&mut self) -> Option<SurfaceEvent>;
}

#[cfg(test)]
#[path = "surface_tests.rs"]
mod tests;
