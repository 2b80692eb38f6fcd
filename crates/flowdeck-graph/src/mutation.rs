use crate::geometry::Vec2;
use crate::layout::{MIN_ORIGIN_MARGIN, PositionOverrides};
use crate::validate::validate;
use flowdeck_core::{AgentNode, HandoffContract, HandoffEdge, NodeId, Violation, WorkflowPlan};

/// Partial update for an existing edge.
#[derive(Debug, Clone, Default)]
pub struct EdgePatch {
    pub target: Option<NodeId>,
    pub label: Option<String>,
}

impl EdgePatch {
    pub fn retarget(target: NodeId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn relabel(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }
}

/// Borrowed view over the editable display fields of one node.
#[derive(Debug)]
pub struct NodeDisplayMut<'a> {
    pub name: &'a mut String,
    pub role: &'a mut String,
    pub objective: &'a mut String,
}

/// The committed node/edge/override state plus its mutation boundary.
///
/// Every edge mutation builds the candidate next edge list and re-runs the
/// validator before accepting it; on violation the message is returned and
/// the committed state is left untouched. The canvas controller never edits
/// this state directly — it only proposes these mutations.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    nodes: Vec<AgentNode>,
    edges: Vec<HandoffEdge>,
    overrides: PositionOverrides,
}

impl WorkflowGraph {
    pub fn from_plan(plan: WorkflowPlan) -> Self {
        Self {
            nodes: plan.nodes,
            edges: plan.edges,
            overrides: PositionOverrides::new(),
        }
    }

    pub fn nodes(&self) -> &[AgentNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[HandoffEdge] {
        &self.edges
    }

    pub fn overrides(&self) -> &PositionOverrides {
        &self.overrides
    }

    pub fn node(&self, id: &NodeId) -> Option<&AgentNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Mutable access to a node's display fields. The id stays private;
    /// renames cannot invalidate the graph structure, so no validation pass
    /// is needed here.
    pub fn node_display_mut(&mut self, id: &NodeId) -> Option<NodeDisplayMut<'_>> {
        self.nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .map(|node| NodeDisplayMut {
                name: &mut node.name,
                role: &mut node.role,
                objective: &mut node.objective,
            })
    }

    pub fn validate(&self) -> Result<(), Violation> {
        validate(&self.nodes, &self.edges)
    }

    /// Add a node. Rejects empty or duplicate ids; never touches edges.
    pub fn add_node(&mut self, node: AgentNode) -> Result<(), Violation> {
        if node.id.is_empty() {
            return Err(Violation::MissingId);
        }
        if self.nodes.iter().any(|n| n.id == node.id) {
            return Err(Violation::DuplicateId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Propose a new directed handoff. The candidate edge list is validated
    /// as a whole, so cycles, duplicates, self-loops, and unknown endpoints
    /// all come back as the violation the user should see.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        label: impl Into<String>,
    ) -> Result<(), Violation> {
        let label = label.into();
        let mut candidate = self.edges.clone();
        candidate.push(HandoffEdge {
            source,
            target,
            handoff_contract: Some(HandoffContract::default_for(&label)),
            label,
        });
        validate(&self.nodes, &candidate)?;
        self.edges = candidate;
        Ok(())
    }

    /// Retarget and/or relabel the edge at `index`.
    pub fn update_edge(&mut self, index: usize, patch: EdgePatch) -> Result<(), Violation> {
        if index >= self.edges.len() {
            return Err(Violation::UnknownEndpoint);
        }
        let mut candidate = self.edges.clone();
        {
            let edge = &mut candidate[index];
            if let Some(target) = patch.target {
                edge.target = target;
            }
            if let Some(label) = patch.label {
                edge.label = label;
            }
        }
        validate(&self.nodes, &candidate)?;
        self.edges = candidate;
        Ok(())
    }

    pub fn delete_edge(&mut self, index: usize) -> Result<(), Violation> {
        if index >= self.edges.len() {
            return Err(Violation::UnknownEndpoint);
        }
        self.edges.remove(index);
        Ok(())
    }

    /// Delete a node, cascading removal of every referencing edge and the
    /// node's position override. Deleting an unknown id is a no-op.
    pub fn delete_node(&mut self, id: &NodeId) {
        let before = self.nodes.len();
        self.nodes.retain(|n| &n.id != id);
        if self.nodes.len() == before {
            tracing::warn!(node = %id, "delete_node: unknown id ignored");
            return;
        }
        self.edges.retain(|e| &e.source != id && &e.target != id);
        self.overrides.remove(id);
    }

    /// Pin a node at a manual position (clamped away from the origin).
    /// Unknown ids are ignored; position changes can never fail validation.
    pub fn set_node_position(&mut self, id: &NodeId, pos: Vec2) {
        if self.node(id).is_none() {
            tracing::warn!(node = %id, "set_node_position: unknown id ignored");
            return;
        }
        self.overrides.insert(
            id.clone(),
            Vec2::new(pos.x.max(MIN_ORIGIN_MARGIN), pos.y.max(MIN_ORIGIN_MARGIN)),
        );
    }

    /// Drop every manual placement so the next layout pass is fully
    /// automatic. Idempotent: the layouter is a pure function of
    /// nodes/edges once overrides are gone.
    pub fn auto_layout(&mut self) {
        self.overrides.clear();
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        AddEdge(usize, usize),
        RetargetEdge(usize, usize),
        DeleteEdge(usize),
        DeleteNode(usize),
    }

    fn arb_ops(node_count: usize) -> impl Strategy<Value = Vec<Op>> {
        let op = prop_oneof![
            (0..node_count, 0..node_count).prop_map(|(a, b)| Op::AddEdge(a, b)),
            (0..16usize, 0..node_count).prop_map(|(e, t)| Op::RetargetEdge(e, t)),
            (0..16usize).prop_map(Op::DeleteEdge),
            (0..node_count).prop_map(Op::DeleteNode),
        ];
        proptest::collection::vec(op, 0..40)
    }

    proptest! {
        /// Every committed state validates, whatever mutation sequence the
        /// user throws at the graph. Rejected mutations leave it unchanged.
        #[test]
        fn prop_committed_state_always_validates(ops in arb_ops(6)) {
            let mut graph = WorkflowGraph::default();
            for i in 0..6 {
                graph.add_node(AgentNode::new(format!("n{i}"), format!("N{i}"))).unwrap();
            }

            for op in ops {
                match op {
                    Op::AddEdge(a, b) => {
                        let _ = graph.add_edge(
                            NodeId::new(format!("n{a}")),
                            NodeId::new(format!("n{b}")),
                            "",
                        );
                    }
                    Op::RetargetEdge(index, t) => {
                        let _ = graph.update_edge(
                            index,
                            EdgePatch::retarget(NodeId::new(format!("n{t}"))),
                        );
                    }
                    Op::DeleteEdge(index) => {
                        let _ = graph.delete_edge(index);
                    }
                    Op::DeleteNode(i) => {
                        graph.delete_node(&NodeId::new(format!("n{i}")));
                    }
                }
                if graph.nodes().is_empty() {
                    // An emptied graph trivially fails the non-empty check;
                    // nothing further to assert.
                    break;
                }
                prop_assert_eq!(graph.validate(), Ok(()));
            }
        }
    }
}
