use flowdeck_core::{AgentNode, HandoffEdge, NodeId, Violation};
use std::collections::{HashMap, HashSet, VecDeque};

/// Check every structural invariant of a workflow graph, in order,
/// short-circuiting on the first failure.
///
/// Order matters for the messages the user sees: id problems are reported
/// before edge problems, and a cycle is only reported once every edge is
/// individually well-formed. Pure and deterministic — the same input always
/// yields the same violation (or none).
pub fn validate(nodes: &[AgentNode], edges: &[HandoffEdge]) -> Result<(), Violation> {
    if nodes.is_empty() {
        return Err(Violation::Empty);
    }

    let mut ids: HashSet<&NodeId> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if node.id.is_empty() {
            return Err(Violation::MissingId);
        }
        if !ids.insert(&node.id) {
            return Err(Violation::DuplicateId(node.id.clone()));
        }
    }

    for edge in edges {
        if !ids.contains(&edge.source) || !ids.contains(&edge.target) {
            return Err(Violation::UnknownEndpoint);
        }
    }

    let mut seen: HashSet<(&NodeId, &NodeId)> = HashSet::with_capacity(edges.len());
    for edge in edges {
        if edge.source == edge.target {
            return Err(Violation::SelfLoop);
        }
        if !seen.insert((&edge.source, &edge.target)) {
            return Err(Violation::DuplicateEdge(
                edge.source.clone(),
                edge.target.clone(),
            ));
        }
    }

    // Kahn's algorithm: if anything is left unordered, a cycle exists.
    let mut indegree: HashMap<&NodeId, usize> = nodes.iter().map(|n| (&n.id, 0)).collect();
    let mut adjacency: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for edge in edges {
        adjacency.entry(&edge.source).or_default().push(&edge.target);
        if let Some(count) = indegree.get_mut(&edge.target) {
            *count += 1;
        }
    }

    let mut queue: VecDeque<&NodeId> = nodes
        .iter()
        .map(|n| &n.id)
        .filter(|id| indegree[id] == 0)
        .collect();
    let mut ordered = 0usize;
    while let Some(id) = queue.pop_front() {
        ordered += 1;
        for &next in adjacency.get(id).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(count) = indegree.get_mut(next) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if ordered < nodes.len() {
        return Err(Violation::Cycle);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_core::AgentNode;

    fn nodes(ids: &[&str]) -> Vec<AgentNode> {
        ids.iter().map(|id| AgentNode::new(*id, *id)).collect()
    }

    #[test]
    fn test_empty_graph_rejected() {
        assert_eq!(validate(&[], &[]), Err(Violation::Empty));
    }

    #[test]
    fn test_missing_id_rejected() {
        let nodes = vec![AgentNode::new("", "nameless")];
        assert_eq!(validate(&nodes, &[]), Err(Violation::MissingId));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let nodes = nodes(&["a", "a"]);
        assert_eq!(
            validate(&nodes, &[]),
            Err(Violation::DuplicateId(NodeId::new("a")))
        );
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let nodes = nodes(&["a"]);
        let edges = vec![HandoffEdge::new("a", "ghost")];
        assert_eq!(validate(&nodes, &edges), Err(Violation::UnknownEndpoint));
    }

    #[test]
    fn test_self_loop_rejected() {
        let nodes = nodes(&["a", "b"]);
        let edges = vec![HandoffEdge::new("a", "a")];
        assert_eq!(validate(&nodes, &edges), Err(Violation::SelfLoop));
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let nodes = nodes(&["a", "b"]);
        let edges = vec![HandoffEdge::new("a", "b"), HandoffEdge::new("a", "b")];
        assert_eq!(
            validate(&nodes, &edges),
            Err(Violation::DuplicateEdge(NodeId::new("a"), NodeId::new("b")))
        );
    }

    #[test]
    fn test_opposite_direction_is_a_cycle_not_a_duplicate() {
        let nodes = nodes(&["a", "b"]);
        let edges = vec![HandoffEdge::new("a", "b"), HandoffEdge::new("b", "a")];
        assert_eq!(validate(&nodes, &edges), Err(Violation::Cycle));
    }

    #[test]
    fn test_cycle_rejected() {
        let nodes = nodes(&["a", "b", "c"]);
        let edges = vec![
            HandoffEdge::new("a", "b"),
            HandoffEdge::new("b", "c"),
            HandoffEdge::new("c", "a"),
        ];
        assert_eq!(validate(&nodes, &edges), Err(Violation::Cycle));
    }

    #[test]
    fn test_valid_dag_accepted() {
        let nodes = nodes(&["a", "b", "c"]);
        let edges = vec![
            HandoffEdge::new("a", "b"),
            HandoffEdge::new("a", "c"),
            HandoffEdge::new("b", "c"),
        ];
        assert_eq!(validate(&nodes, &edges), Ok(()));
    }

    #[test]
    fn test_single_node_no_edges_accepted() {
        assert_eq!(validate(&nodes(&["solo"]), &[]), Ok(()));
    }

    #[test]
    fn test_deterministic_first_violation() {
        // Duplicate id and a self-loop both present: id check wins.
        let nodes = nodes(&["a", "a"]);
        let edges = vec![HandoffEdge::new("a", "a")];
        assert_eq!(
            validate(&nodes, &edges),
            Err(Violation::DuplicateId(NodeId::new("a")))
        );
    }
}
