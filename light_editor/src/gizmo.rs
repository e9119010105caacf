//! Transform gizmo state
//!
//! The gizmo widget itself lives in the GUI layer. This module keeps the
//! selected operation, whether the cursor is over or dragging the gizmo, and
//! writes a manipulated matrix back into the selected entity's transform.

use light_engine::ecs::TransformComponent;
use light_engine::foundation::math::{decompose_transform, utils, Mat4, Vec3};
use light_engine::input::KeyCode;

/// Translation and scale snap step in world units
pub const TRANSLATE_SNAP: f32 = 0.5;
/// Rotation snap step in degrees
pub const ROTATE_SNAP_DEG: f32 = 15.0;

/// Gizmo manipulation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoOperation {
    /// Move along axes (W)
    #[default]
    Translate,
    /// Rotate around axes (E)
    Rotate,
    /// Scale along axes (R)
    Scale,
    /// All of the above (T)
    Universal,
}

impl GizmoOperation {
    /// Operation bound to an editor shortcut key
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::W => Some(Self::Translate),
            KeyCode::E => Some(Self::Rotate),
            KeyCode::R => Some(Self::Scale),
            KeyCode::T => Some(Self::Universal),
            _ => None,
        }
    }

    /// Snap step the widget is given while snapping is held
    ///
    /// Degrees for [`Rotate`](Self::Rotate), world units otherwise.
    pub fn snap_value(self) -> f32 {
        match self {
            Self::Rotate => ROTATE_SNAP_DEG,
            _ => TRANSLATE_SNAP,
        }
    }
}

/// Gizmo interaction state for the current frame
#[derive(Debug, Clone, Copy, Default)]
pub struct GizmoState {
    operation: GizmoOperation,
    hovered: bool,
    using: bool,
}

impl GizmoState {
    /// Translate mode, idle
    pub fn new() -> Self {
        Self::default()
    }

    /// Current operation
    pub fn operation(&self) -> GizmoOperation {
        self.operation
    }

    /// Switch operation
    pub fn set_operation(&mut self, operation: GizmoOperation) {
        self.operation = operation;
    }

    /// Record what the widget reported this frame
    pub fn set_interaction(&mut self, hovered: bool, using: bool) {
        self.hovered = hovered;
        self.using = using;
    }

    /// Cursor is over a gizmo handle
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// A handle is being dragged
    pub fn is_using(&self) -> bool {
        self.using
    }

    /// Hovered or dragging; the camera and click selection stand down
    pub fn is_active(&self) -> bool {
        self.hovered || self.using
    }

    /// Write a manipulated world matrix back into `transform`
    ///
    /// `start` is the transform at the beginning of the drag. With `snap`,
    /// the change since `start` is rounded to the snap grid for the
    /// components the operation edits: position and rotation by their
    /// difference, scale by its ratio. A scale component never becomes zero
    /// or negative. Returns false and leaves `transform` untouched when the
    /// matrix has a degenerate axis.
    pub fn apply_manipulation(
        &self,
        transform: &mut TransformComponent,
        start: &TransformComponent,
        matrix: &Mat4,
        snap: bool,
    ) -> bool {
        let Some((mut position, mut rotation, mut scale)) = decompose_transform(matrix) else {
            log::warn!("Gizmo produced a degenerate transform");
            return false;
        };

        if snap {
            let op = self.operation;
            if matches!(op, GizmoOperation::Translate | GizmoOperation::Universal) {
                position = start.position + snap_vec(position - start.position, TRANSLATE_SNAP);
            }
            if matches!(op, GizmoOperation::Rotate | GizmoOperation::Universal) {
                let delta = (rotation - start.rotation).map(utils::rad_to_deg);
                rotation = start.rotation + snap_vec(delta, ROTATE_SNAP_DEG).map(utils::deg_to_rad);
            }
            if matches!(op, GizmoOperation::Scale | GizmoOperation::Universal) {
                scale = start.scale.zip_map(&scale, snap_scale);
            }
        }

        transform.position = position;
        transform.rotation = rotation;
        transform.scale = scale;
        true
    }
}

fn snap_vec(v: Vec3, step: f32) -> Vec3 {
    v.map(|c| snap_to(c, step))
}

fn snap_to(value: f32, step: f32) -> f32 {
    (value / step).round() * step
}

/// Snap one scale axis by its ratio to the drag start
fn snap_scale(start: f32, current: f32) -> f32 {
    if start.abs() <= f32::EPSILON {
        return current;
    }
    let ratio = current / start;
    let snapped = snap_to(ratio, TRANSLATE_SNAP);
    // Below half the grid the ratio would round to zero
    let ratio = if snapped > 0.0 { snapped } else { ratio.max(TRANSLATE_SNAP) };
    start * ratio
}
