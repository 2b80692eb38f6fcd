use crate::geometry::{Rect, Vec2};
use crate::route::CubicBezier;
use flowdeck_core::NodeId;

/// Radius (graph px) of the clickable handle markers on node edges.
pub const HANDLE_RADIUS: f32 = 7.0;

/// What a pointer position resolves to on the canvas.
///
/// Priority order: EdgeEndpoint > OutputHandle > Node > Edge > Background.
/// Handles win over the node bodies they sit on, and node bodies win over
/// edges passing underneath them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    /// The draggable target-side handle of an existing edge (grab to rewire).
    EdgeEndpoint(usize),
    /// A node's output handle (grab to drag out a new edge).
    OutputHandle(NodeId),
    /// A node body.
    Node(NodeId),
    /// An edge's hit path — a wide invisible stroke around the visible curve
    /// so the thin line stays clickable.
    Edge(usize),
    /// Empty canvas.
    Background,
}

/// Hit tester for the canvas, rebuilt each frame from the current layout
/// (draft positions included) so hits always match what is on screen.
/// All tests run in graph space; callers invert the viewport first.
#[derive(Debug, Clone, Default)]
pub struct HitTester {
    /// Node rects in draw order; later entries render on top.
    node_rects: Vec<(NodeId, Rect)>,
    /// Edge curves indexed by edge position in the committed edge list.
    edge_curves: Vec<CubicBezier>,
    edge_tolerance: f32,
    bezier_samples: usize,
}

impl HitTester {
    pub fn new() -> Self {
        Self {
            node_rects: Vec::new(),
            edge_curves: Vec::new(),
            edge_tolerance: 8.0,
            bezier_samples: 48,
        }
    }

    pub fn update(&mut self, node_rects: Vec<(NodeId, Rect)>, edge_curves: Vec<CubicBezier>) {
        self.node_rects = node_rects;
        self.edge_curves = edge_curves;
    }

    pub fn node_rect(&self, id: &NodeId) -> Option<Rect> {
        self.node_rects
            .iter()
            .find(|(node_id, _)| node_id == id)
            .map(|(_, rect)| *rect)
    }

    pub fn hit_test(&self, pos: Vec2) -> HitTarget {
        if let Some(index) = self.hit_test_edge_endpoint(pos) {
            return HitTarget::EdgeEndpoint(index);
        }
        if let Some(id) = self.hit_test_output_handle(pos) {
            return HitTarget::OutputHandle(id);
        }
        if let Some(id) = self.hit_test_node(pos) {
            return HitTarget::Node(id);
        }
        if let Some(index) = self.hit_test_edge(pos) {
            return HitTarget::Edge(index);
        }
        HitTarget::Background
    }

    /// Topmost node under the pointer. Reverse iteration makes the
    /// most-recently-drawn node win ties between overlapping cards.
    pub fn hit_test_node(&self, pos: Vec2) -> Option<NodeId> {
        self.node_rects
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(id, _)| id.clone())
    }

    /// Topmost node under the pointer, excluding `skip`. Used while a
    /// connect/rewire drag looks for a drop candidate: the gesture's own
    /// source never counts.
    pub fn hit_test_node_excluding(&self, pos: Vec2, skip: &NodeId) -> Option<NodeId> {
        self.node_rects
            .iter()
            .rev()
            .find(|(id, rect)| id != skip && rect.contains(pos))
            .map(|(id, _)| id.clone())
    }

    fn hit_test_output_handle(&self, pos: Vec2) -> Option<NodeId> {
        self.node_rects
            .iter()
            .rev()
            .find(|(_, rect)| rect.right_center().distance(pos) <= HANDLE_RADIUS)
            .map(|(id, _)| id.clone())
    }

    fn hit_test_edge_endpoint(&self, pos: Vec2) -> Option<usize> {
        self.edge_curves
            .iter()
            .position(|curve| curve.end.distance(pos) <= HANDLE_RADIUS)
    }

    /// Closest edge within tolerance, if any.
    pub fn hit_test_edge(&self, pos: Vec2) -> Option<usize> {
        let mut best_index = None;
        let mut best_dist = self.edge_tolerance;
        for (index, curve) in self.edge_curves.iter().enumerate() {
            let dist = curve.point_distance(pos, self.bezier_samples);
            if dist < best_dist {
                best_dist = dist;
                best_index = Some(index);
            }
        }
        best_index
    }
}
