//! Performance statistics for the viewport HUD
//!
//! Frame times are accumulated over 500 ms windows; the HUD shows the
//! averages of the last completed window.

use light_engine::foundation::math::Vec2;
use light_engine::foundation::time::Timestep;

/// Length of one averaging window in milliseconds
pub const STATS_WINDOW_MS: f32 = 500.0;

/// HUD padding from the viewport edge in pixels
const HUD_PADDING: f32 = 10.0;

/// Averages of one completed window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTimings {
    /// Milliseconds per frame
    pub mspf: f32,
    /// Seconds per frame
    pub spf: f32,
    /// Frames per second
    pub fps: u32,
}

/// Viewport corner the HUD is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsCorner {
    /// HUD not shown
    Hidden,
    /// Top-left corner
    #[default]
    TopLeft,
    /// Top-right corner
    TopRight,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom-right corner
    BottomRight,
}

impl StatsCorner {
    /// HUD window position and pivot for a viewport at `origin` with `size`
    ///
    /// The pivot is the fraction of the HUD's own size to offset by, so the
    /// window hugs the chosen corner. `None` when hidden.
    pub fn anchor(self, origin: Vec2, size: Vec2) -> Option<(Vec2, Vec2)> {
        let (right, bottom) = match self {
            Self::Hidden => return None,
            Self::TopLeft => (false, false),
            Self::TopRight => (true, false),
            Self::BottomLeft => (false, true),
            Self::BottomRight => (true, true),
        };

        let x = if right { origin.x + size.x - HUD_PADDING } else { origin.x + HUD_PADDING };
        let y = if bottom { origin.y + size.y - HUD_PADDING } else { origin.y + HUD_PADDING };
        let pivot = Vec2::new(f32::from(u8::from(right)), f32::from(u8::from(bottom)));
        Some((Vec2::new(x, y), pivot))
    }
}

/// Rolling frame statistics
#[derive(Debug, Clone, Default)]
pub struct PerfStats {
    window_ms: f32,
    window_frames: u32,
    last: Option<FrameTimings>,
    corner: StatsCorner,
}

impl PerfStats {
    /// Create empty statistics anchored top-left
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one frame
    pub fn on_frame(&mut self, ts: Timestep) {
        self.window_frames += 1;
        self.window_ms += ts.millis();

        if self.window_ms >= STATS_WINDOW_MS {
            let frames = self.window_frames as f32;
            self.last = Some(FrameTimings {
                mspf: self.window_ms / frames,
                spf: self.window_ms * 0.001 / frames,
                fps: (frames * 1000.0 / self.window_ms).round() as u32,
            });
            self.window_ms = 0.0;
            self.window_frames = 0;
        }
    }

    /// Averages of the last completed window, if one has completed
    pub fn timings(&self) -> Option<FrameTimings> {
        self.last
    }

    /// HUD text for the last completed window
    pub fn hud_text(&self) -> Option<String> {
        self.last
            .map(|t| format!("MSPF: {:.2}\nSPF: {:.4}\nFPS: {}", t.mspf, t.spf, t.fps))
    }

    /// Current HUD corner
    pub fn corner(&self) -> StatsCorner {
        self.corner
    }

    /// Move or hide the HUD
    pub fn set_corner(&mut self, corner: StatsCorner) {
        self.corner = corner;
    }

    /// Toggle between hidden and top-left
    pub fn toggle_visible(&mut self) {
        self.corner = match self.corner {
            StatsCorner::Hidden => StatsCorner::TopLeft,
            _ => StatsCorner::Hidden,
        };
    }
}
