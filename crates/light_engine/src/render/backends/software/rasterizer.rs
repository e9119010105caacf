//! Triangle setup and scan conversion
//!
//! Triangles are clipped against the near plane in clip space, projected
//! through the viewport, and scanned over pixel centers with edge
//! functions. Both windings are filled. Varyings are interpolated
//! perspective-correctly; depth is interpolated linearly in screen space.

use crate::foundation::math::{Vec3, Vec4};

const W_EPSILON: f32 = 1e-6;
const DEPTH_EPSILON: f32 = 1e-5;

/// Per-vertex outputs interpolated across a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Varyings {
    /// Lit color
    pub color: Vec4,
    /// Contribution that a shadow test may remove
    pub shadowable: Vec3,
    /// World (or direction) position
    pub world: Vec3,
}

impl Default for Varyings {
    fn default() -> Self {
        Self {
            color: Vec4::zeros(),
            shadowable: Vec3::zeros(),
            world: Vec3::zeros(),
        }
    }
}

impl Varyings {
    fn scaled(&self, s: f32) -> Self {
        Self {
            color: self.color * s,
            shadowable: self.shadowable * s,
            world: self.world * s,
        }
    }

    fn plus(&self, other: &Self) -> Self {
        Self {
            color: self.color + other.color,
            shadowable: self.shadowable + other.shadowable,
            world: self.world + other.world,
        }
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        self.scaled(1.0 - t).plus(&other.scaled(t))
    }
}

/// Post-vertex-shader vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClipVertex {
    pub clip: Vec4,
    pub varyings: Varyings,
}

/// Viewport rectangle, origin bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One covered pixel
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fragment {
    pub x: u32,
    pub y: u32,
    /// Window depth in [0, 1]
    pub depth: f32,
    pub varyings: Varyings,
}

/// Clip, project and scan one triangle, calling `fragment` per covered pixel
pub(crate) fn draw_triangle<F>(triangle: [ClipVertex; 3], viewport: Viewport, target: (u32, u32), mut fragment: F)
where
    F: FnMut(&Fragment),
{
    for clipped in clip_near(triangle) {
        rasterize(&clipped, viewport, target, &mut fragment);
    }
}

/// Sutherland-Hodgman against the near plane `z >= -w`
fn clip_near(triangle: [ClipVertex; 3]) -> Vec<[ClipVertex; 3]> {
    let distance = |v: &ClipVertex| v.clip.z + v.clip.w;

    if triangle.iter().all(|v| distance(v) >= 0.0) {
        return vec![triangle];
    }

    let mut polygon: Vec<ClipVertex> = Vec::with_capacity(4);
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let (da, db) = (distance(&a), distance(&b));

        if da >= 0.0 {
            polygon.push(a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            let t = da / (da - db);
            polygon.push(ClipVertex {
                clip: a.clip + (b.clip - a.clip) * t,
                varyings: a.varyings.lerp(&b.varyings, t),
            });
        }
    }

    if polygon.len() < 3 {
        return Vec::new();
    }
    (1..polygon.len() - 1)
        .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
        .collect()
}

struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
}

fn edge(ax: f32, ay: f32, bx: f32, by: f32, px: f32, py: f32) -> f32 {
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

fn rasterize<F>(triangle: &[ClipVertex; 3], viewport: Viewport, target: (u32, u32), fragment: &mut F)
where
    F: FnMut(&Fragment),
{
    if triangle.iter().any(|v| v.clip.w <= W_EPSILON) {
        return;
    }

    let (vx, vy) = (viewport.x as f32, viewport.y as f32);
    let (vw, vh) = (viewport.width as f32, viewport.height as f32);
    let screen = triangle.map(|v| {
        let inv_w = 1.0 / v.clip.w;
        ScreenVertex {
            x: vx + (v.clip.x * inv_w * 0.5 + 0.5) * vw,
            y: vy + (v.clip.y * inv_w * 0.5 + 0.5) * vh,
            z: v.clip.z * inv_w * 0.5 + 0.5,
            inv_w,
        }
    });
    let [s0, s1, s2] = &screen;

    let area = edge(s0.x, s0.y, s1.x, s1.y, s2.x, s2.y);
    if area.abs() <= f32::EPSILON {
        return;
    }

    // Scissor to the viewport and the target
    let clamp_x = |v: f32| v.clamp(viewport.x.max(0) as f32, (viewport.x + viewport.width as i32).min(target.0 as i32).max(0) as f32);
    let clamp_y = |v: f32| v.clamp(viewport.y.max(0) as f32, (viewport.y + viewport.height as i32).min(target.1 as i32).max(0) as f32);
    let min_x = clamp_x(s0.x.min(s1.x).min(s2.x).floor()) as u32;
    let max_x = clamp_x(s0.x.max(s1.x).max(s2.x).ceil()) as u32;
    let min_y = clamp_y(s0.y.min(s1.y).min(s2.y).floor()) as u32;
    let max_y = clamp_y(s0.y.max(s1.y).max(s2.y).ceil()) as u32;

    for py in min_y..max_y {
        for px in min_x..max_x {
            let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
            let b0 = edge(s1.x, s1.y, s2.x, s2.y, cx, cy) / area;
            let b1 = edge(s2.x, s2.y, s0.x, s0.y, cx, cy) / area;
            let b2 = edge(s0.x, s0.y, s1.x, s1.y, cx, cy) / area;
            if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                continue;
            }

            let depth = b0 * s0.z + b1 * s1.z + b2 * s2.z;
            if !(-DEPTH_EPSILON..=1.0 + DEPTH_EPSILON).contains(&depth) {
                continue;
            }

            let (w0, w1, w2) = (b0 * s0.inv_w, b1 * s1.inv_w, b2 * s2.inv_w);
            let inv_sum = 1.0 / (w0 + w1 + w2);
            let varyings = triangle[0]
                .varyings
                .scaled(w0 * inv_sum)
                .plus(&triangle[1].varyings.scaled(w1 * inv_sum))
                .plus(&triangle[2].varyings.scaled(w2 * inv_sum));

            fragment(&Fragment {
                x: px,
                y: py,
                depth: depth.clamp(0.0, 1.0),
                varyings,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32, w: f32) -> ClipVertex {
        ClipVertex { clip: Vec4::new(x, y, z, w), varyings: Varyings::default() }
    }

    fn full_quad_viewport() -> Viewport {
        Viewport { x: 0, y: 0, width: 8, height: 8 }
    }

    #[test]
    fn test_covers_lower_left_half() {
        let triangle = [vertex(-1.0, -1.0, 0.0, 1.0), vertex(1.0, -1.0, 0.0, 1.0), vertex(-1.0, 1.0, 0.0, 1.0)];
        let mut covered = Vec::new();
        draw_triangle(triangle, full_quad_viewport(), (8, 8), |f| covered.push((f.x, f.y)));

        assert!(covered.contains(&(0, 0)));
        assert!(!covered.contains(&(7, 7)));
        // Half the 8x8 grid plus the diagonal
        assert_eq!(covered.len(), 36);
    }

    #[test]
    fn test_both_windings_fill() {
        let ccw = [vertex(-1.0, -1.0, 0.0, 1.0), vertex(1.0, -1.0, 0.0, 1.0), vertex(0.0, 1.0, 0.0, 1.0)];
        let cw = [ccw[0], ccw[2], ccw[1]];

        let mut a = 0;
        let mut b = 0;
        draw_triangle(ccw, full_quad_viewport(), (8, 8), |_| a += 1);
        draw_triangle(cw, full_quad_viewport(), (8, 8), |_| b += 1);
        assert!(a > 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_triangle_behind_near_plane_is_dropped() {
        let behind = [vertex(-1.0, -1.0, -2.0, 1.0), vertex(1.0, -1.0, -2.0, 1.0), vertex(0.0, 1.0, -2.0, 1.0)];
        let mut count = 0;
        draw_triangle(behind, full_quad_viewport(), (8, 8), |_| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_near_clip_splits_crossing_triangle() {
        let crossing = [vertex(-1.0, -1.0, -2.0, 1.0), vertex(1.0, -1.0, 0.0, 1.0), vertex(0.0, 1.0, 0.0, 1.0)];
        let pieces = clip_near(crossing);
        assert_eq!(pieces.len(), 2);
        for piece in pieces {
            assert!(piece.iter().all(|v| v.clip.z + v.clip.w >= -1e-6));
        }
    }

    #[test]
    fn test_scissor_to_target() {
        let triangle = [vertex(-1.0, -1.0, 0.0, 1.0), vertex(3.0, -1.0, 0.0, 1.0), vertex(-1.0, 3.0, 0.0, 1.0)];
        let mut max_x = 0;
        draw_triangle(triangle, full_quad_viewport(), (4, 4), |f| max_x = max_x.max(f.x));
        assert_eq!(max_x, 3);
    }
}
