use crate::geometry::{Rect, Vec2};

/// A cubic bezier curve segment defined by four control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub start: Vec2,
    pub control1: Vec2,
    pub control2: Vec2,
    pub end: Vec2,
}

impl CubicBezier {
    /// Sample the curve at parameter t [0, 1]
    pub fn sample(&self, t: f32) -> Vec2 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = self.start.x * mt3
            + 3.0 * self.control1.x * mt2 * t
            + 3.0 * self.control2.x * mt * t2
            + self.end.x * t3;
        let y = self.start.y * mt3
            + 3.0 * self.control1.y * mt2 * t
            + 3.0 * self.control2.y * mt * t2
            + self.end.y * t3;

        Vec2::new(x, y)
    }

    /// Midpoint of the curve, used to place the handoff label.
    pub fn midpoint(&self) -> Vec2 {
        self.sample(0.5)
    }

    /// Minimum distance from a point to this curve via uniform sampling.
    /// `num_samples` controls accuracy (higher = more precise but slower).
    pub fn point_distance(&self, point: Vec2, num_samples: usize) -> f32 {
        let mut min_dist_sq = f32::INFINITY;
        let samples = num_samples.max(2);

        for i in 0..=samples {
            let t = i as f32 / samples as f32;
            let curve_point = self.sample(t);
            let dx = curve_point.x - point.x;
            let dy = curve_point.y - point.y;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq < min_dist_sq {
                min_dist_sq = dist_sq;
            }
        }

        min_dist_sq.sqrt()
    }

    /// The three corner points of the arrowhead at the curve's end, aligned
    /// with the curve's incoming tangent.
    pub fn arrow_head(&self, size: f32) -> [Vec2; 3] {
        // Approximate the end tangent with a short backwards sample.
        let near_end = self.sample(0.96);
        let mut dx = self.end.x - near_end.x;
        let mut dy = self.end.y - near_end.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < f32::EPSILON {
            dx = 1.0;
            dy = 0.0;
        } else {
            dx /= len;
            dy /= len;
        }
        let base = Vec2::new(self.end.x - dx * size, self.end.y - dy * size);
        let half = size * 0.5;
        [
            self.end,
            Vec2::new(base.x - dy * half, base.y + dx * half),
            Vec2::new(base.x + dy * half, base.y - dx * half),
        ]
    }
}

/// Router for handoff edges in a left-to-right layered layout: edges leave a
/// node's right edge and enter the target's left edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRouter {
    /// Curvature factor applied to the horizontal span.
    pub curvature: f32,
    /// Minimum horizontal reach of the control points.
    pub min_control: f32,
}

impl Default for EdgeRouter {
    fn default() -> Self {
        Self {
            curvature: 0.5,
            min_control: 24.0,
        }
    }
}

impl EdgeRouter {
    // Unbounded control points make long edges swing far outside the
    // viewport, so their reach is capped.
    const MAX_CONTROL_LEN: f32 = 220.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Route from a source rect to a target rect.
    pub fn route_edge(&self, source_rect: Rect, target_rect: Rect) -> CubicBezier {
        self.route_points(source_rect.right_center(), target_rect.left_center())
    }

    /// Route from a source rect to a free point (the live pointer position
    /// during a connect/rewire drag).
    pub fn route_preview(&self, source_rect: Rect, pointer: Vec2) -> CubicBezier {
        self.route_points(source_rect.right_center(), pointer)
    }

    fn route_points(&self, start: Vec2, end: Vec2) -> CubicBezier {
        let span = (end.x - start.x).abs().max((end.y - start.y).abs() * 0.5);
        let reach = (span * self.curvature)
            .max(self.min_control)
            .min(Self::MAX_CONTROL_LEN);

        CubicBezier {
            start,
            control1: Vec2::new(start.x + reach, start.y),
            control2: Vec2::new(end.x - reach, end.y),
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_pos_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_sample_endpoints() {
        let curve = CubicBezier {
            start: Vec2::new(0.0, 0.0),
            control1: Vec2::new(30.0, 10.0),
            control2: Vec2::new(70.0, -10.0),
            end: Vec2::new(100.0, 0.0),
        };
        assert_eq!(curve.sample(0.0), curve.start);
        assert_eq!(curve.sample(1.0), curve.end);
    }

    #[test]
    fn test_point_distance_straightish_line() {
        let curve = CubicBezier {
            start: Vec2::new(0.0, 0.0),
            control1: Vec2::new(33.0, 0.0),
            control2: Vec2::new(66.0, 0.0),
            end: Vec2::new(100.0, 0.0),
        };
        assert!(curve.point_distance(Vec2::new(50.0, 3.0), 48) < 3.5);
        assert!(curve.point_distance(Vec2::new(50.0, 50.0), 48) > 40.0);
    }

    #[test]
    fn test_route_anchors_on_facing_edges() {
        let router = EdgeRouter::new();
        let curve = router.route_edge(rect(0.0, 0.0, 100.0, 40.0), rect(200.0, 60.0, 100.0, 40.0));
        assert_eq!(curve.start, Vec2::new(100.0, 20.0));
        assert_eq!(curve.end, Vec2::new(200.0, 80.0));
        assert!(curve.control1.x > curve.start.x);
        assert!(curve.control2.x < curve.end.x);
    }

    #[test]
    fn test_control_reach_is_capped() {
        let router = EdgeRouter::new();
        let curve = router.route_edge(rect(0.0, 0.0, 100.0, 40.0), rect(5000.0, 0.0, 100.0, 40.0));
        assert!(curve.control1.x - curve.start.x <= EdgeRouter::MAX_CONTROL_LEN);
    }

    #[test]
    fn test_arrow_head_points_along_travel() {
        let curve = CubicBezier {
            start: Vec2::new(0.0, 0.0),
            control1: Vec2::new(33.0, 0.0),
            control2: Vec2::new(66.0, 0.0),
            end: Vec2::new(100.0, 0.0),
        };
        let [tip, left, right] = curve.arrow_head(8.0);
        assert_eq!(tip, curve.end);
        assert!(left.x < tip.x && right.x < tip.x);
        assert!((left.y + right.y).abs() < 1e-3, "wings are symmetric");
    }

    #[test]
    fn test_preview_ends_at_pointer() {
        let router = EdgeRouter::new();
        let pointer = Vec2::new(321.0, 99.0);
        let curve = router.route_preview(rect(0.0, 0.0, 100.0, 40.0), pointer);
        assert_eq!(curve.end, pointer);
    }
}
