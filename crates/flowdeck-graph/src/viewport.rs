use crate::geometry::Vec2;

/// Allowed zoom range for the canvas.
pub const MIN_SCALE: f32 = 0.45;
pub const MAX_SCALE: f32 = 3.2;

/// The 2D affine view transform: uniform scale plus translate, mapping graph
/// space to screen space (`screen = graph * scale + translate`).
///
/// Ephemeral per canvas session — reset whenever the displayed plan changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn graph_to_screen(&self, graph: Vec2) -> Vec2 {
        Vec2::new(graph.x * self.scale + self.x, graph.y * self.scale + self.y)
    }

    /// Invert the transform. Required before any hit test or drag delta
    /// computation, which all happen in graph space.
    pub fn screen_to_graph(&self, screen: Vec2) -> Vec2 {
        Vec2::new((screen.x - self.x) / self.scale, (screen.y - self.y) / self.scale)
    }

    /// Zoom by `factor`, keeping the graph-space point under `anchor`
    /// stationary on screen. Solves for the translate after applying the new
    /// clamped scale.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let pinned = self.screen_to_graph(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.x = anchor.x - pinned.x * self.scale;
        self.y = anchor.y - pinned.y * self.scale;
    }

    /// Pan by a raw screen-space delta. No scale correction is needed here;
    /// only zoom requires the anchor-preserving solve.
    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let viewport = Viewport {
            x: 40.0,
            y: -12.0,
            scale: 1.5,
        };
        let graph = Vec2::new(123.0, 456.0);
        let back = viewport.screen_to_graph(viewport.graph_to_screen(graph));
        assert!((back.x - graph.x).abs() < 1e-3);
        assert!((back.y - graph.y).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_keeps_anchor_point_fixed() {
        // Scenario: zooming 1x -> 2x at screen (100,100) must leave the
        // graph point that was under the pointer still under the pointer.
        let mut viewport = Viewport::default();
        let anchor = Vec2::new(100.0, 100.0);
        let before = viewport.screen_to_graph(anchor);

        viewport.zoom_at(anchor, 2.0);
        assert_eq!(viewport.scale, 2.0);

        let after = viewport.screen_to_graph(anchor);
        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_clamped_to_range() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(Vec2::new(0.0, 0.0), 100.0);
        assert_eq!(viewport.scale, MAX_SCALE);
        viewport.zoom_at(Vec2::new(0.0, 0.0), 1e-6);
        assert_eq!(viewport.scale, MIN_SCALE);
    }

    #[test]
    fn test_zoom_ignores_degenerate_factor() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(Vec2::new(10.0, 10.0), f32::NAN);
        viewport.zoom_at(Vec2::new(10.0, 10.0), -1.0);
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn test_pan_is_raw_screen_delta() {
        let mut viewport = Viewport {
            x: 0.0,
            y: 0.0,
            scale: 2.0,
        };
        viewport.pan(Vec2::new(10.0, -5.0));
        assert_eq!(viewport.x, 10.0);
        assert_eq!(viewport.y, -5.0);
    }

    #[test]
    fn test_reset() {
        let mut viewport = Viewport {
            x: 99.0,
            y: 1.0,
            scale: 3.0,
        };
        viewport.reset();
        assert_eq!(viewport, Viewport::default());
    }
}
