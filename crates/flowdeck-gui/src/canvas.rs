use eframe::egui;
use egui::epaint::CubicBezierShape;
use flowdeck_core::{NodeId, Violation};
use flowdeck_graph::layout::MIN_ORIGIN_MARGIN;
use flowdeck_graph::{
    CubicBezier, EdgeRouter, HitTarget, HitTester, Layout, LayeredLayout, Rect, Vec2, Viewport,
    WorkflowGraph,
};

/// Wheel-to-zoom sensitivity. A full notch (~120 units) is roughly a 20% step.
const ZOOM_WHEEL_RATE: f32 = 0.0015;
const ARROW_SIZE: f32 = 9.0;
const HANDLE_DRAW_RADIUS: f32 = 5.0;

/// Drafts obey the same origin clamp as committed overrides, so a dragged
/// card never renders past the margin and then jumps back on release.
fn clamp_to_margin(pos: Vec2) -> Vec2 {
    Vec2::new(pos.x.max(MIN_ORIGIN_MARGIN), pos.y.max(MIN_ORIGIN_MARGIN))
}

/// One in-flight pointer drag. Exactly one gesture can be active at a time;
/// which one starts is decided by the hit target under the pointer on
/// press. All positions here are graph-space except the pan anchor, which
/// tracks the raw pointer.
#[derive(Debug, Clone)]
pub enum DragGesture {
    Pan {
        last_pointer: egui::Pos2,
    },
    NodeDrag {
        id: NodeId,
        grab_offset: Vec2,
        draft: Vec2,
    },
    Connect {
        source: NodeId,
        pointer: Vec2,
        candidate: Option<NodeId>,
    },
    Rewire {
        edge_index: usize,
        source: NodeId,
        pointer: Vec2,
        candidate: Option<NodeId>,
    },
}

/// What the canvas wants the surrounding app to know about this frame.
#[derive(Debug, Default)]
pub struct CanvasOutput {
    /// A mutation was rejected; the message should reach the status line.
    pub violation: Option<Violation>,
    pub node_clicked: Option<NodeId>,
    pub background_clicked: bool,
}

/// The interactive workflow canvas: owns the view transform, the active
/// gesture, and edge selection. Committed graph state lives in
/// [`WorkflowGraph`]; the canvas only proposes mutations and shows the
/// result.
pub struct FlowCanvas {
    viewport: Viewport,
    gesture: Option<DragGesture>,
    selected_edge: Option<usize>,
    router: EdgeRouter,
    tester: HitTester,
    plan_signature: Option<(Option<NodeId>, usize)>,
}

impl FlowCanvas {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::default(),
            gesture: None,
            selected_edge: None,
            router: EdgeRouter::new(),
            tester: HitTester::new(),
            plan_signature: None,
        }
    }

    pub fn selected_edge(&self) -> Option<usize> {
        self.selected_edge
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        graph: &mut WorkflowGraph,
        layouter: &LayeredLayout,
    ) -> CanvasOutput {
        let mut output = CanvasOutput::default();
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);

        // A different plan on screen means the old view transform, drag, and
        // selection are meaningless.
        let signature = (
            graph.nodes().first().map(|n| n.id.clone()),
            graph.nodes().len(),
        );
        if self.plan_signature.as_ref() != Some(&signature) {
            self.plan_signature = Some(signature);
            self.viewport.reset();
            self.gesture = None;
            self.selected_edge = None;
        }

        let Some(layout) = layouter.compute(graph.nodes(), graph.edges(), graph.overrides())
        else {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No agents in this workflow yet",
                egui::FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
            return output;
        };

        let (node_rects, edge_curves) = self.build_geometry(graph, &layout);
        self.tester.update(node_rects, edge_curves);

        self.handle_input(ui, &response, rect, graph, &mut output);

        // Gesture updates may have moved a draft node or the viewport, so the
        // frame is drawn from freshly built geometry.
        let (node_rects, edge_curves) = self.build_geometry(graph, &layout);
        self.tester.update(node_rects, edge_curves);
        self.paint(ui, &painter, rect, graph);

        if self.gesture.is_some() {
            ui.ctx().request_repaint();
        }
        output
    }

    /// Graph-space node rects (drafts win over layout) and the routed curve
    /// for every committed edge, in edge-list order.
    fn build_geometry(
        &self,
        graph: &WorkflowGraph,
        layout: &Layout,
    ) -> (Vec<(NodeId, Rect)>, Vec<CubicBezier>) {
        let size = Vec2::new(layout.node_width, layout.node_height);
        let mut rects = Vec::with_capacity(graph.nodes().len());
        for node in graph.nodes() {
            let Some(mut pos) = layout.positions.get(&node.id).copied() else {
                continue;
            };
            if let Some(DragGesture::NodeDrag { id, draft, .. }) = &self.gesture {
                if id == &node.id {
                    pos = *draft;
                }
            }
            rects.push((node.id.clone(), Rect::from_pos_size(pos, size)));
        }

        let rect_of = |id: &NodeId| {
            rects
                .iter()
                .find(|(node_id, _)| node_id == id)
                .map(|(_, r)| *r)
        };
        let curves = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let source = rect_of(&edge.source)?;
                let target = rect_of(&edge.target)?;
                Some(self.router.route_edge(source, target))
            })
            .collect();
        (rects, curves)
    }

    fn handle_input(
        &mut self,
        ui: &mut egui::Ui,
        response: &egui::Response,
        rect: egui::Rect,
        graph: &mut WorkflowGraph,
        output: &mut CanvasOutput,
    ) {
        let to_local = |pos: egui::Pos2| Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y);

        // Zoom anchored at the pointer, from wheel or pinch.
        if response.hovered() {
            if let Some(pointer) = response.hover_pos() {
                let scroll = ui.input(|i| i.raw_scroll_delta);
                if scroll.y.abs() > f32::EPSILON {
                    let factor = (scroll.y * ZOOM_WHEEL_RATE).exp();
                    self.viewport.zoom_at(to_local(pointer), factor);
                }
                let pinch = ui.input(|i| i.zoom_delta());
                if (pinch - 1.0).abs() > f32::EPSILON {
                    self.viewport.zoom_at(to_local(pointer), pinch);
                }
            }
        }

        if response.drag_started() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let graph_pos = self.viewport.screen_to_graph(to_local(pointer));
                self.gesture = Some(self.gesture_for(graph, graph_pos, pointer));
            }
        }

        if response.dragged() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let graph_pos = self.viewport.screen_to_graph(to_local(pointer));
                match &mut self.gesture {
                    Some(DragGesture::Pan { last_pointer }) => {
                        let delta = pointer - *last_pointer;
                        self.viewport.pan(Vec2::new(delta.x, delta.y));
                        *last_pointer = pointer;
                    }
                    Some(DragGesture::NodeDrag {
                        grab_offset, draft, ..
                    }) => {
                        *draft = clamp_to_margin(graph_pos - *grab_offset);
                    }
                    Some(DragGesture::Connect {
                        source,
                        pointer: p,
                        candidate,
                    })
                    | Some(DragGesture::Rewire {
                        source,
                        pointer: p,
                        candidate,
                        ..
                    }) => {
                        *p = graph_pos;
                        *candidate = self.tester.hit_test_node_excluding(graph_pos, source);
                    }
                    None => {}
                }
            }
        }

        if response.drag_stopped() {
            if let Some(gesture) = self.gesture.take() {
                self.finish_gesture(gesture, graph, output);
            }
        }

        // Escape cancels the gesture. A cancelled node drag still keeps its
        // last draft position; everything else is discarded.
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            if let Some(gesture) = self.gesture.take() {
                if let DragGesture::NodeDrag { id, draft, .. } = gesture {
                    graph.set_node_position(&id, draft);
                }
            }
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let graph_pos = self.viewport.screen_to_graph(to_local(pointer));
                match self.tester.hit_test(graph_pos) {
                    HitTarget::Edge(index) | HitTarget::EdgeEndpoint(index) => {
                        self.selected_edge =
                            (self.selected_edge != Some(index)).then_some(index);
                    }
                    HitTarget::Node(id) | HitTarget::OutputHandle(id) => {
                        output.node_clicked = Some(id);
                        self.selected_edge = None;
                    }
                    HitTarget::Background => {
                        output.background_clicked = true;
                        self.selected_edge = None;
                    }
                }
            }
        }

        if response.double_clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let graph_pos = self.viewport.screen_to_graph(to_local(pointer));
                if self.tester.hit_test(graph_pos) == HitTarget::Background {
                    self.viewport.reset();
                }
            }
        }

        // Keyboard delete only acts when no text field holds focus.
        let delete_pressed = ui.input(|i| {
            i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
        });
        if delete_pressed && !ui.ctx().wants_keyboard_input() {
            if let Some(index) = self.selected_edge.take() {
                if let Err(violation) = graph.delete_edge(index) {
                    output.violation = Some(violation);
                }
            }
        }
    }

    fn gesture_for(
        &self,
        graph: &WorkflowGraph,
        graph_pos: Vec2,
        pointer: egui::Pos2,
    ) -> DragGesture {
        match self.tester.hit_test(graph_pos) {
            HitTarget::EdgeEndpoint(edge_index) => {
                if let Some(edge) = graph.edges().get(edge_index) {
                    DragGesture::Rewire {
                        edge_index,
                        source: edge.source.clone(),
                        pointer: graph_pos,
                        candidate: None,
                    }
                } else {
                    DragGesture::Pan {
                        last_pointer: pointer,
                    }
                }
            }
            HitTarget::OutputHandle(source) => DragGesture::Connect {
                source,
                pointer: graph_pos,
                candidate: None,
            },
            HitTarget::Node(id) => {
                let min = self
                    .tester
                    .node_rect(&id)
                    .map(|r| r.min)
                    .unwrap_or(graph_pos);
                DragGesture::NodeDrag {
                    id,
                    grab_offset: graph_pos - min,
                    draft: min,
                }
            }
            HitTarget::Edge(_) | HitTarget::Background => DragGesture::Pan {
                last_pointer: pointer,
            },
        }
    }

    fn finish_gesture(
        &mut self,
        gesture: DragGesture,
        graph: &mut WorkflowGraph,
        output: &mut CanvasOutput,
    ) {
        match gesture {
            DragGesture::Pan { .. } => {}
            DragGesture::NodeDrag { id, draft, .. } => {
                graph.set_node_position(&id, draft);
            }
            DragGesture::Connect {
                source, candidate, ..
            } => {
                if let Some(target) = candidate {
                    if let Err(violation) = graph.add_edge(source, target, "handoff") {
                        output.violation = Some(violation);
                    }
                }
            }
            DragGesture::Rewire {
                edge_index,
                candidate,
                ..
            } => {
                let result = match candidate {
                    Some(target) => graph.update_edge(
                        edge_index,
                        flowdeck_graph::EdgePatch::retarget(target),
                    ),
                    // Dropping an endpoint on empty canvas removes the edge.
                    None => {
                        let result = graph.delete_edge(edge_index);
                        if result.is_ok() {
                            self.selected_edge = match self.selected_edge {
                                Some(i) if i == edge_index => None,
                                Some(i) if i > edge_index => Some(i - 1),
                                other => other,
                            };
                        }
                        result
                    }
                };
                if let Err(violation) = result {
                    output.violation = Some(violation);
                }
            }
        }
    }

    fn paint(
        &self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        rect: egui::Rect,
        graph: &WorkflowGraph,
    ) {
        let visuals = ui.visuals();
        let to_screen = |g: Vec2| {
            let s = self.viewport.graph_to_screen(g);
            egui::pos2(rect.min.x + s.x, rect.min.y + s.y)
        };
        let scale = self.viewport.scale;

        let edge_color = visuals.widgets.noninteractive.fg_stroke.color;
        let selected_color = visuals.selection.stroke.color;

        let rewiring_edge = match &self.gesture {
            Some(DragGesture::Rewire { edge_index, .. }) => Some(*edge_index),
            _ => None,
        };

        // Edges underneath, nodes on top.
        for (index, edge) in graph.edges().iter().enumerate() {
            if rewiring_edge == Some(index) {
                continue;
            }
            let (Some(source), Some(target)) = (
                self.tester.node_rect(&edge.source),
                self.tester.node_rect(&edge.target),
            ) else {
                continue;
            };
            let curve = self.router.route_edge(source, target);
            let selected = self.selected_edge == Some(index);
            let color = if selected { selected_color } else { edge_color };
            let width = if selected { 2.5 } else { 1.5 };
            self.paint_curve(painter, &curve, egui::Stroke::new(width, color), &to_screen);

            if !edge.label.is_empty() {
                let mid = to_screen(curve.midpoint());
                painter.text(
                    mid - egui::vec2(0.0, 10.0 * scale),
                    egui::Align2::CENTER_BOTTOM,
                    &edge.label,
                    egui::FontId::proportional(11.0 * scale.clamp(0.7, 1.4)),
                    visuals.weak_text_color(),
                );
            }

            // Target-side endpoint handle, the grab point for rewiring.
            painter.circle_filled(
                to_screen(curve.end),
                HANDLE_DRAW_RADIUS * scale,
                if selected { selected_color } else { edge_color },
            );
        }

        // Preview curve for an in-flight connect or rewire.
        if let Some(DragGesture::Connect {
            source,
            pointer,
            candidate,
        })
        | Some(DragGesture::Rewire {
            source,
            pointer,
            candidate,
            ..
        }) = &self.gesture
        {
            if let Some(source_rect) = self.tester.node_rect(source) {
                let curve = self.router.route_preview(source_rect, *pointer);
                self.paint_curve(
                    painter,
                    &curve,
                    egui::Stroke::new(1.5, selected_color),
                    &to_screen,
                );
            }
            if let Some(candidate) = candidate {
                if let Some(target_rect) = self.tester.node_rect(candidate) {
                    self.paint_node_outline(painter, target_rect, selected_color, &to_screen);
                }
            }
        }

        for node in graph.nodes() {
            let Some(node_rect) = self.tester.node_rect(&node.id) else {
                continue;
            };
            let screen_rect =
                egui::Rect::from_min_max(to_screen(node_rect.min), to_screen(node_rect.max));
            if !rect.intersects(screen_rect) {
                continue;
            }
            let radius = 8.0 * scale;
            painter.rect_filled(screen_rect, radius, visuals.widgets.inactive.weak_bg_fill);
            painter.rect_stroke(
                screen_rect,
                radius,
                egui::Stroke::new(1.0, visuals.widgets.inactive.bg_stroke.color),
                egui::StrokeKind::Middle,
            );

            painter.text(
                egui::pos2(
                    screen_rect.min.x + 12.0 * scale,
                    screen_rect.min.y + 16.0 * scale,
                ),
                egui::Align2::LEFT_CENTER,
                &node.name,
                egui::FontId::proportional(14.0 * scale.clamp(0.7, 1.6)),
                visuals.strong_text_color(),
            );
            if !node.role.is_empty() {
                painter.text(
                    egui::pos2(
                        screen_rect.min.x + 12.0 * scale,
                        screen_rect.min.y + 36.0 * scale,
                    ),
                    egui::Align2::LEFT_CENTER,
                    &node.role,
                    egui::FontId::proportional(11.0 * scale.clamp(0.7, 1.4)),
                    visuals.weak_text_color(),
                );
            }

            // Output handle on the right edge.
            painter.circle_filled(
                to_screen(node_rect.right_center()),
                HANDLE_DRAW_RADIUS * scale,
                visuals.widgets.active.bg_fill,
            );
        }
    }

    fn paint_curve(
        &self,
        painter: &egui::Painter,
        curve: &CubicBezier,
        stroke: egui::Stroke,
        to_screen: &impl Fn(Vec2) -> egui::Pos2,
    ) {
        let shape = CubicBezierShape::from_points_stroke(
            [
                to_screen(curve.start),
                to_screen(curve.control1),
                to_screen(curve.control2),
                to_screen(curve.end),
            ],
            false,
            egui::Color32::TRANSPARENT,
            stroke,
        );
        painter.add(shape);

        let head = curve.arrow_head(ARROW_SIZE);
        painter.add(egui::Shape::convex_polygon(
            head.iter().map(|p| to_screen(*p)).collect(),
            stroke.color,
            egui::Stroke::NONE,
        ));
    }

    fn paint_node_outline(
        &self,
        painter: &egui::Painter,
        node_rect: Rect,
        color: egui::Color32,
        to_screen: &impl Fn(Vec2) -> egui::Pos2,
    ) {
        let screen_rect =
            egui::Rect::from_min_max(to_screen(node_rect.min), to_screen(node_rect.max));
        painter.rect_stroke(
            screen_rect.expand(3.0),
            8.0 * self.viewport.scale,
            egui::Stroke::new(2.0, color),
            egui::StrokeKind::Outside,
        );
    }
}

impl Default for FlowCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_draft_is_clamped_while_in_flight() {
        // Grabbed 5px inside the card, pointer dragged to the graph origin:
        // the draft must already sit at the margin, not at (-5, -5).
        let grab_offset = Vec2::new(5.0, 5.0);
        let draft = clamp_to_margin(Vec2::new(0.0, 0.0) - grab_offset);
        assert_eq!(draft, Vec2::new(MIN_ORIGIN_MARGIN, MIN_ORIGIN_MARGIN));
    }

    #[test]
    fn test_drag_draft_unclamped_away_from_origin() {
        let draft = clamp_to_margin(Vec2::new(240.0, 96.0));
        assert_eq!(draft, Vec2::new(240.0, 96.0));
    }
}
