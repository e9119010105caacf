//! Viewport panel state
//!
//! The GUI reports the panel's screen position, content size and
//! focus/hover each frame. A size change is latched until the editor layer
//! applies it to the camera and framebuffer.

use light_engine::foundation::math::Vec2;

/// Screen-space state of the viewport panel
#[derive(Debug, Clone, Default)]
pub struct ViewportPanel {
    position: Vec2,
    size: Vec2,
    focused: bool,
    hovered: bool,
    resize_pending: bool,
}

impl ViewportPanel {
    /// Empty, unfocused panel
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this frame's panel state
    pub fn set_state(&mut self, position: Vec2, size: Vec2, focused: bool, hovered: bool) {
        if size != self.size {
            self.size = size;
            self.resize_pending = true;
        }
        self.position = position;
        self.focused = focused;
        self.hovered = hovered;
    }

    /// Take a latched resize, in whole pixels
    ///
    /// Sizes that round to zero are dropped.
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        if !std::mem::take(&mut self.resize_pending) {
            return None;
        }
        let width = self.size.x.max(0.0) as u32;
        let height = self.size.y.max(0.0) as u32;
        (width > 0 && height > 0).then_some((width, height))
    }

    /// Framebuffer pixel under a screen position, origin bottom-left
    ///
    /// `None` when the position is outside the panel.
    pub fn to_framebuffer_coords(&self, screen: Vec2) -> Option<(i32, i32)> {
        let local = screen - self.position;
        if local.x < 0.0 || local.y < 0.0 || local.x >= self.size.x || local.y >= self.size.y {
            return None;
        }
        let x = local.x as i32;
        let y = (self.size.y as i32 - 1) - local.y as i32;
        Some((x, y))
    }

    /// Top-left corner in screen pixels
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Content size in pixels
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Panel has keyboard focus
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Cursor is over the panel
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }
}
