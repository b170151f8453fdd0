/// Scripted surface for unit tests

use std::collections::VecDeque;

use crate::surface::{Key, SurfaceEvent, SurfaceProvider, SurfaceSize};

pub struct MockSurface {
    size: SurfaceSize,
    events: VecDeque<SurfaceEvent>,
    /// Number of poll_event() calls
    pub polls: usize,
}

impl MockSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { size: SurfaceSize::new(width, height), events: VecDeque::new(), polls: 0 }
    }

    /// Queue a Resized event; the reported size changes once it is polled
    pub fn resize(&mut self, width: u32, height: u32) {
        self.events.push_back(SurfaceEvent::Resized(width, height));
    }

    pub fn close(&mut self) {
        self.events.push_back(SurfaceEvent::Closed);
    }

    pub fn press(&mut self, key: Key) {
        self.events.push_back(SurfaceEvent::KeyPressed(key));
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

impl SurfaceProvider for MockSurface {
    fn current_size(&self) -> SurfaceSize {
        self.size
    }

    fn poll_event(&mut self) -> Option<SurfaceEvent> {
        self.polls += 1;
        let event = self.events.pop_front();
        if let Some(SurfaceEvent::Resized(width, height)) = event {
            self.size = SurfaceSize::new(width, height);
        }
        event
    }
}
