use crate::geometry::{Rect, Vec2};
use flowdeck_core::{AgentNode, HandoffEdge, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Manual node placements, sparse: only nodes the user has dragged.
pub type PositionOverrides = HashMap<NodeId, Vec2>;

/// Nodes may never be placed closer than this to the canvas origin.
pub const MIN_ORIGIN_MARGIN: f32 = 12.0;

/// Tunables for the layered layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub node_width: f32,
    pub node_height: f32,
    /// Gap between adjacent columns.
    pub horizontal_gap: f32,
    /// Gap between stacked nodes within a column.
    pub vertical_gap: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub min_width: f32,
    pub min_height: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            node_width: 168.0,
            node_height: 84.0,
            horizontal_gap: 72.0,
            vertical_gap: 36.0,
            padding_x: 32.0,
            padding_y: 32.0,
            min_width: 640.0,
            min_height: 360.0,
        }
    }
}

/// Computed layout: a pure function of the node/edge/override input, fully
/// recomputed on every change and never mutated independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub positions: HashMap<NodeId, Vec2>,
}

impl Layout {
    pub fn node_rect(&self, id: &NodeId) -> Option<Rect> {
        self.positions.get(id).map(|&pos| {
            Rect::from_pos_size(pos, Vec2::new(self.node_width, self.node_height))
        })
    }
}

/// Layered (Sugiyama-style, single ordering pass) layout for handoff DAGs.
///
/// Tolerates transiently-invalid input: duplicate nodes, dangling edges, and
/// residual cycles all degrade to a best-effort placement instead of failing.
/// The validator, not the layouter, is the authority on rejecting commits.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayout {
    pub options: LayoutOptions,
}

impl LayeredLayout {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// Compute positions for every node. Returns `None` only for an empty
    /// node list. Identical input yields bit-identical output, which makes
    /// the auto-layout reset idempotent.
    pub fn compute(
        &self,
        nodes: &[AgentNode],
        edges: &[HandoffEdge],
        overrides: &PositionOverrides,
    ) -> Option<Layout> {
        let opts = &self.options;

        // Dedupe by id, first occurrence wins.
        let mut index_of: HashMap<&NodeId, usize> = HashMap::with_capacity(nodes.len());
        let mut unique: Vec<&AgentNode> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if !index_of.contains_key(&node.id) {
                index_of.insert(&node.id, unique.len());
                unique.push(node);
            }
        }
        if unique.is_empty() {
            return None;
        }

        // Keep only edges between known, distinct endpoints.
        let usable: Vec<(usize, usize)> = edges
            .iter()
            .filter_map(|edge| {
                let (Some(&src), Some(&tgt)) =
                    (index_of.get(&edge.source), index_of.get(&edge.target))
                else {
                    tracing::warn!(
                        source = %edge.source,
                        target = %edge.target,
                        "dropping edge with unknown endpoint from layout"
                    );
                    return None;
                };
                if src == tgt {
                    tracing::warn!(node = %edge.source, "dropping self-loop from layout");
                    return None;
                }
                Some((src, tgt))
            })
            .collect();

        let order = topo_order(unique.len(), &usable);
        let layers = assign_layers(unique.len(), &usable, &order);

        // Columns keyed by layer, rows in topological-discovery order.
        let mut columns: HashMap<usize, Vec<usize>> = HashMap::new();
        for &idx in &order {
            columns.entry(layers[idx]).or_default().push(idx);
        }
        let mut sorted_layers: Vec<usize> = columns.keys().copied().collect();
        sorted_layers.sort_unstable();

        let column_height = |rows: usize| -> f32 {
            rows as f32 * opts.node_height + rows.saturating_sub(1) as f32 * opts.vertical_gap
        };
        let tallest = sorted_layers
            .iter()
            .map(|layer| column_height(columns[layer].len()))
            .fold(0.0f32, f32::max);

        let mut positions: HashMap<NodeId, Vec2> = HashMap::with_capacity(unique.len());
        for (column_index, layer) in sorted_layers.iter().enumerate() {
            let rows = &columns[layer];
            let x = opts.padding_x + column_index as f32 * (opts.node_width + opts.horizontal_gap);
            let y_start = opts.padding_y + (tallest - column_height(rows.len())) * 0.5;
            for (row, &idx) in rows.iter().enumerate() {
                let y = y_start + row as f32 * (opts.node_height + opts.vertical_gap);
                positions.insert(unique[idx].id.clone(), Vec2::new(x, y));
            }
        }

        // Manual placement always wins, clamped away from the origin.
        for node in &unique {
            if let Some(&manual) = overrides.get(&node.id) {
                positions.insert(
                    node.id.clone(),
                    Vec2::new(
                        manual.x.max(MIN_ORIGIN_MARGIN),
                        manual.y.max(MIN_ORIGIN_MARGIN),
                    ),
                );
            }
        }

        // Grow the canvas to contain every node plus padding.
        let mut width = opts.min_width;
        let mut height = opts.min_height;
        for pos in positions.values() {
            width = width.max(pos.x + opts.node_width + opts.padding_x);
            height = height.max(pos.y + opts.node_height + opts.padding_y);
        }

        Some(Layout {
            width,
            height,
            node_width: opts.node_width,
            node_height: opts.node_height,
            positions,
        })
    }
}

/// Kahn's algorithm seeded in node-list order; any remainder (residual
/// cycles) is appended in node-list order so every node still gets a slot.
fn topo_order(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indegree = vec![0usize; node_count];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(src, tgt) in edges {
        adjacency[src].push(tgt);
        indegree[tgt] += 1;
    }

    let mut queue: VecDeque<usize> = (0..node_count).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(node_count);
    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        for &next in &adjacency[idx] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < node_count {
        let placed: HashSet<usize> = order.iter().copied().collect();
        order.extend((0..node_count).filter(|i| !placed.contains(i)));
    }
    order
}

/// Layer per node: one past the deepest predecessor, zero for roots. A node
/// whose predecessors carry no layer yet (only possible inside a residual
/// cycle) falls back to its topological-order index so assignment terminates.
fn assign_layers(node_count: usize, edges: &[(usize, usize)], order: &[usize]) -> Vec<usize> {
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(src, tgt) in edges {
        predecessors[tgt].push(src);
    }

    let mut layers = vec![usize::MAX; node_count];
    for (topo_index, &idx) in order.iter().enumerate() {
        if predecessors[idx].is_empty() {
            layers[idx] = 0;
            continue;
        }
        let deepest = predecessors[idx]
            .iter()
            .filter_map(|&pred| (layers[pred] != usize::MAX).then_some(layers[pred]))
            .max();
        layers[idx] = match deepest {
            Some(layer) => layer + 1,
            None => topo_index,
        };
    }
    layers
}
