//! Event system
//!
//! Window and input events are delivered to layers and to the editor camera.
//! Key principles:
//! - Events are a closed, typed enum (no order-dependent arguments)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Dispatch only reaches handlers registered for the event's kind

use crate::input::{KeyCode, MouseButton};

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Window framebuffer was resized
    WindowResize,
    /// Window close was requested
    WindowClose,
    /// Keyboard key was pressed (or repeated)
    KeyPressed,
    /// Keyboard key was released
    KeyReleased,
    /// Mouse button was pressed
    MouseButtonPressed,
    /// Mouse button was released
    MouseButtonReleased,
    /// Mouse cursor moved
    MouseMoved,
    /// Mouse wheel scrolled
    MouseScrolled,
}

/// Window and input events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Window framebuffer was resized
    WindowResize {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// Window close was requested
    WindowClose,
    /// Keyboard key was pressed
    KeyPressed {
        /// Key that went down
        key: KeyCode,
        /// Whether this is an auto-repeat
        repeat: bool,
    },
    /// Keyboard key was released
    KeyReleased {
        /// Key that went up
        key: KeyCode,
    },
    /// Mouse button was pressed
    MouseButtonPressed(MouseButton),
    /// Mouse button was released
    MouseButtonReleased(MouseButton),
    /// Mouse cursor moved, screen coordinates with origin top-left
    MouseMoved {
        /// Cursor X in pixels
        x: f32,
        /// Cursor Y in pixels
        y: f32,
    },
    /// Mouse wheel scrolled
    MouseScrolled {
        /// Horizontal scroll amount
        x_offset: f32,
        /// Vertical scroll amount
        y_offset: f32,
    },
}

impl Event {
    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WindowResize { .. } => EventKind::WindowResize,
            Self::WindowClose => EventKind::WindowClose,
            Self::KeyPressed { .. } => EventKind::KeyPressed,
            Self::KeyReleased { .. } => EventKind::KeyReleased,
            Self::MouseButtonPressed(_) => EventKind::MouseButtonPressed,
            Self::MouseButtonReleased(_) => EventKind::MouseButtonReleased,
            Self::MouseMoved { .. } => EventKind::MouseMoved,
            Self::MouseScrolled { .. } => EventKind::MouseScrolled,
        }
    }
}

/// Routes one event to the handler registered for its kind
///
/// Once a handler consumes the event, later dispatches are skipped.
pub struct EventDispatcher<'a> {
    event: &'a Event,
    handled: bool,
}

impl<'a> EventDispatcher<'a> {
    /// Wrap an event for dispatch
    pub fn new(event: &'a Event) -> Self {
        Self { event, handled: false }
    }

    /// Invoke `handler` when the event has the given kind and is not yet consumed
    ///
    /// Returns whether the handler ran.
    pub fn dispatch<F>(&mut self, kind: EventKind, handler: F) -> bool
    where
        F: FnOnce(&Event) -> bool,
    {
        if self.handled || self.event.kind() != kind {
            return false;
        }
        self.handled = handler(self.event);
        true
    }

    /// Whether a handler consumed the event
    pub fn handled(&self) -> bool {
        self.handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_matches_kind_only() {
        let event = Event::WindowResize { width: 800, height: 600 };
        let mut dispatcher = EventDispatcher::new(&event);

        assert!(!dispatcher.dispatch(EventKind::KeyPressed, |_| true));
        assert!(dispatcher.dispatch(EventKind::WindowResize, |e| {
            matches!(e, Event::WindowResize { width: 800, height: 600 })
        }));
        assert!(dispatcher.handled());
    }

    #[test]
    fn test_consumed_event_stops_forwarding() {
        let event = Event::MouseScrolled { x_offset: 0.0, y_offset: 1.0 };
        let mut dispatcher = EventDispatcher::new(&event);

        dispatcher.dispatch(EventKind::MouseScrolled, |_| true);
        let mut second_ran = false;
        dispatcher.dispatch(EventKind::MouseScrolled, |_| {
            second_ran = true;
            false
        });

        assert!(!second_ran);
    }
}
