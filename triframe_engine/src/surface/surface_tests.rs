//! Unit tests for the surface module

use crate::surface::mock_surface::MockSurface;
use crate::surface::winit_surface::{translate_key, PendingEvents};
use crate::surface::{Key, SurfaceEvent, SurfaceProvider, SurfaceSize};
use winit::keyboard::{Key as WinitKey, NamedKey};

#[test]
fn test_surface_size_is_empty() {
    assert!(!SurfaceSize::new(800, 600).is_empty());
    assert!(SurfaceSize::new(0, 600).is_empty());
    assert!(SurfaceSize::new(800, 0).is_empty());
    assert!(SurfaceSize::default().is_empty());
}

#[test]
fn test_translate_named_keys() {
    assert_eq!(translate_key(&WinitKey::Named(NamedKey::Escape)), Key::Escape);
    assert_eq!(translate_key(&WinitKey::Named(NamedKey::Enter)), Key::Enter);
    assert_eq!(translate_key(&WinitKey::Named(NamedKey::Space)), Key::Space);
    assert_eq!(translate_key(&WinitKey::Named(NamedKey::F1)), Key::Other);
}

#[test]
fn test_translate_character_keys() {
    assert_eq!(translate_key(&WinitKey::Character("q".into())), Key::Character('q'));
    assert_eq!(translate_key(&WinitKey::Character("".into())), Key::Other);
}

#[test]
fn test_mock_surface_size_changes_when_resize_is_polled() {
    let mut surface = MockSurface::new(800, 600);
    surface.resize(1024, 768);
    assert_eq!(surface.current_size(), SurfaceSize::new(800, 600));

    assert_eq!(surface.poll_event(), Some(SurfaceEvent::Resized(1024, 768)));
    assert_eq!(surface.current_size(), SurfaceSize::new(1024, 768));
    assert_eq!(surface.poll_event(), None);
}

#[test]
fn test_mock_surface_events_keep_order() {
    let mut surface = MockSurface::new(800, 600);
    surface.press(Key::Space);
    surface.close();

    assert_eq!(surface.poll_event(), Some(SurfaceEvent::KeyPressed(Key::Space)));
    assert_eq!(surface.poll_event(), Some(SurfaceEvent::Closed));
    assert_eq!(surface.pending(), 0);
}

#[test]
fn test_winit_size_changes_only_when_resize_is_polled() {
    let mut pending = PendingEvents::new(SurfaceSize::new(800, 600));
    pending.push(SurfaceEvent::KeyPressed(Key::Space));
    pending.push(SurfaceEvent::Resized(1024, 768));
    assert_eq!(pending.size(), SurfaceSize::new(800, 600));

    assert_eq!(pending.pop(), Some(SurfaceEvent::KeyPressed(Key::Space)));
    assert_eq!(pending.size(), SurfaceSize::new(800, 600));

    assert_eq!(pending.pop(), Some(SurfaceEvent::Resized(1024, 768)));
    assert_eq!(pending.size(), SurfaceSize::new(1024, 768));
    assert!(pending.is_empty());
    assert_eq!(pending.pop(), None);
}
