//! Plan normalization.
//!
//! Planner output is best-effort LLM JSON: ids may be missing, colliding, or
//! over-long, and the edge set may be dangling or cyclic. Normalization turns
//! any such plan into one the validator accepts, falling back to a linear
//! agent chain when the edges cannot be salvaged.

use crate::{AgentNode, HandoffContract, HandoffEdge, NodeId, WorkflowPlan};
use std::collections::{HashMap, HashSet, VecDeque};

const MAX_NODES: usize = 8;
const MAX_NAME_LEN: usize = 48;
const MAX_ROLE_LEN: usize = 120;
const MAX_OBJECTIVE_LEN: usize = 180;
const MAX_LABEL_LEN: usize = 80;
const MAX_SUMMARY_LEN: usize = 320;

/// Lowercase snake_case form of `value`, or `None` when nothing survives.
pub fn slugify(value: &str) -> Option<String> {
    let mut slug = String::with_capacity(value.len());
    let mut last_was_sep = true;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() { None } else { Some(slug) }
}

fn truncate(value: &str, max: usize) -> String {
    let trimmed = value.trim();
    trimmed.chars().take(max).collect()
}

/// Normalize a raw plan into a valid DAG.
///
/// Node ids are slugified and uniquified; field lengths are clamped; edges
/// with missing endpoints, self-loops, or duplicate direction are dropped.
/// If no usable edges remain, or the surviving set still contains a cycle,
/// the edges are replaced with the linear chain n0->n1->... so the result
/// always validates.
pub fn normalize_plan(plan: WorkflowPlan) -> WorkflowPlan {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut id_remap: HashMap<String, String> = HashMap::new();
    let mut nodes: Vec<AgentNode> = Vec::new();

    for (index, node) in plan.nodes.into_iter().take(MAX_NODES).enumerate() {
        let fallback = format!("agent_{}", index + 1);
        let base = slugify(node.id.as_str())
            .or_else(|| slugify(&node.name))
            .unwrap_or(fallback);

        let mut id = base.clone();
        if seen_ids.contains(&id) {
            let mut suffix = 2;
            while seen_ids.contains(&format!("{base}_{suffix}")) {
                suffix += 1;
            }
            id = format!("{base}_{suffix}");
        }
        seen_ids.insert(id.clone());
        id_remap.insert(node.id.0.clone(), id.clone());

        let name = if node.name.trim().is_empty() {
            id.replace('_', " ")
        } else {
            node.name
        };
        nodes.push(AgentNode {
            id: NodeId::new(id),
            name: truncate(&name, MAX_NAME_LEN),
            role: truncate(&node.role, MAX_ROLE_LEN),
            objective: truncate(&node.objective, MAX_OBJECTIVE_LEN),
        });
    }

    if nodes.is_empty() {
        return sample_plan();
    }

    let valid_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let remapped = |raw: &NodeId| -> Option<String> {
        id_remap
            .get(raw.as_str())
            .cloned()
            .or_else(|| slugify(raw.as_str()))
    };

    let mut edges: Vec<HandoffEdge> = Vec::new();
    let mut seen_edges: HashSet<(String, String)> = HashSet::new();
    for edge in plan.edges {
        let (Some(source), Some(target)) = (remapped(&edge.source), remapped(&edge.target)) else {
            continue;
        };
        if source == target {
            continue;
        }
        if !valid_ids.contains(source.as_str()) || !valid_ids.contains(target.as_str()) {
            continue;
        }
        if !seen_edges.insert((source.clone(), target.clone())) {
            continue;
        }
        edges.push(HandoffEdge {
            source: NodeId::new(source),
            target: NodeId::new(target),
            label: truncate(&edge.label, MAX_LABEL_LEN),
            handoff_contract: edge.handoff_contract,
        });
    }

    if edges.is_empty() || !is_acyclic(&nodes, &edges) {
        edges = chain_edges(&nodes);
    }

    // Every edge carries a contract; explicit ones are kept as-is.
    for edge in &mut edges {
        if edge.handoff_contract.is_none() {
            edge.handoff_contract = Some(HandoffContract::default_for(&edge.label));
        }
    }

    WorkflowPlan {
        summary: truncate(&plan.summary, MAX_SUMMARY_LEN),
        nodes,
        edges,
    }
}

fn chain_edges(nodes: &[AgentNode]) -> Vec<HandoffEdge> {
    nodes
        .windows(2)
        .map(|pair| HandoffEdge::new(pair[0].id.as_str(), pair[1].id.as_str()))
        .collect()
}

fn is_acyclic(nodes: &[AgentNode], edges: &[HandoffEdge]) -> bool {
    let mut indegree: HashMap<&str, usize> =
        nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        if let Some(count) = indegree.get_mut(edge.target.as_str()) {
            *count += 1;
        }
    }

    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| indegree[id] == 0)
        .collect();
    let mut ordered = 0;
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
    ordered == nodes.len()
}

/// The built-in five-agent plan used when a planner response is unusable.
pub fn sample_plan() -> WorkflowPlan {
    let node = |id: &str, name: &str, role: &str, objective: &str| AgentNode {
        id: NodeId::new(id),
        name: name.to_string(),
        role: role.to_string(),
        objective: objective.to_string(),
    };

    WorkflowPlan {
        summary: "Intake, plan, research, build, review".to_string(),
        nodes: vec![
            node(
                "intake_agent",
                "Intake Agent",
                "Clarifies the incoming request",
                "Produce a task brief the planner can act on",
            ),
            node(
                "planner_agent",
                "Planner Agent",
                "Breaks the brief into an execution plan",
                "Emit research questions and an execution plan",
            ),
            node(
                "research_agent",
                "Research Agent",
                "Gathers supporting context",
                "Answer the planner's research questions",
            ),
            node(
                "builder_agent",
                "Builder Agent",
                "Produces the deliverable",
                "Draft the output from the plan and findings",
            ),
            node(
                "review_agent",
                "Review Agent",
                "Checks the draft against the brief",
                "Approve or flag the draft output",
            ),
        ],
        edges: vec![
            sample_edge("intake_agent", "planner_agent", "task brief"),
            sample_edge("planner_agent", "research_agent", "research questions"),
            sample_edge("planner_agent", "builder_agent", "execution plan"),
            sample_edge("research_agent", "builder_agent", "findings"),
            sample_edge("builder_agent", "review_agent", "draft output"),
        ],
    }
}

fn sample_edge(source: &str, target: &str, label: &str) -> HandoffEdge {
    let mut edge = HandoffEdge::with_label(source, target, label);
    edge.handoff_contract = Some(HandoffContract::default_for(label));
    edge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Intake Agent!"), Some("intake_agent".to_string()));
        assert_eq!(slugify("  --  "), None);
        assert_eq!(slugify("A__B"), Some("a_b".to_string()));
    }

    #[test]
    fn test_normalize_uniquifies_colliding_ids() {
        let plan = WorkflowPlan::new(
            vec![
                AgentNode::new("worker", "Worker One"),
                AgentNode::new("worker", "Worker Two"),
                AgentNode::new("Worker!", "Worker Three"),
            ],
            vec![],
        );
        let normalized = normalize_plan(plan);
        let ids: Vec<&str> = normalized.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["worker", "worker_2", "worker_3"]);
    }

    #[test]
    fn test_normalize_drops_bad_edges_and_falls_back_to_chain() {
        let plan = WorkflowPlan::new(
            vec![AgentNode::new("a", "A"), AgentNode::new("b", "B")],
            vec![
                HandoffEdge::new("a", "a"),
                HandoffEdge::new("a", "missing"),
            ],
        );
        let normalized = normalize_plan(plan);
        assert_eq!(normalized.edges.len(), 1);
        assert_eq!(normalized.edges[0].source.as_str(), "a");
        assert_eq!(normalized.edges[0].target.as_str(), "b");
    }

    #[test]
    fn test_normalize_replaces_cyclic_edges_with_chain() {
        let plan = WorkflowPlan::new(
            vec![
                AgentNode::new("a", "A"),
                AgentNode::new("b", "B"),
                AgentNode::new("c", "C"),
            ],
            vec![
                HandoffEdge::new("a", "b"),
                HandoffEdge::new("b", "c"),
                HandoffEdge::new("c", "a"),
            ],
        );
        let normalized = normalize_plan(plan);
        let pairs: Vec<(&str, &str)> = normalized
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn test_normalize_dedupes_parallel_edges() {
        let plan = WorkflowPlan::new(
            vec![AgentNode::new("a", "A"), AgentNode::new("b", "B")],
            vec![
                HandoffEdge::with_label("a", "b", "first"),
                HandoffEdge::with_label("a", "b", "second"),
            ],
        );
        let normalized = normalize_plan(plan);
        assert_eq!(normalized.edges.len(), 1);
        assert_eq!(normalized.edges[0].label, "first");
    }

    #[test]
    fn test_normalize_clamps_lengths() {
        let plan = WorkflowPlan::new(
            vec![AgentNode {
                id: NodeId::new("a"),
                name: "x".repeat(100),
                role: "r".repeat(300),
                objective: "o".repeat(300),
            }],
            vec![],
        );
        let normalized = normalize_plan(plan);
        assert_eq!(normalized.nodes[0].name.len(), 48);
        assert_eq!(normalized.nodes[0].role.len(), 120);
        assert_eq!(normalized.nodes[0].objective.len(), 180);
    }

    #[test]
    fn test_empty_plan_becomes_sample() {
        let normalized = normalize_plan(WorkflowPlan::default());
        assert_eq!(normalized.nodes.len(), 5);
        assert_eq!(normalized.edges.len(), 5);
    }

    #[test]
    fn test_sample_plan_shape() {
        let plan = sample_plan();
        assert_eq!(plan.nodes.len(), 5);
        assert!(plan.edges.iter().all(|e| e.source != e.target));
        assert!(plan.edges.iter().all(|e| e.handoff_contract.is_some()));
    }

    #[test]
    fn test_contractless_edge_gets_default_contract() {
        let plan = WorkflowPlan::new(
            vec![AgentNode::new("a", "A"), AgentNode::new("b", "B")],
            vec![HandoffEdge::with_label("a", "b", "task brief")],
        );
        let normalized = normalize_plan(plan);
        let contract = normalized.edges[0].handoff_contract.as_ref().unwrap();
        assert_eq!(contract.packet_type, "task_brief");
    }

    #[test]
    fn test_explicit_contract_is_preserved() {
        let mut edge = HandoffEdge::with_label("a", "b", "brief");
        let mut custom = HandoffContract::default_for("brief");
        custom.packet_type = "custom_packet".to_string();
        edge.handoff_contract = Some(custom);

        let plan = WorkflowPlan::new(
            vec![AgentNode::new("a", "A"), AgentNode::new("b", "B")],
            vec![edge],
        );
        let normalized = normalize_plan(plan);
        assert_eq!(
            normalized.edges[0]
                .handoff_contract
                .as_ref()
                .unwrap()
                .packet_type,
            "custom_packet"
        );
    }

    #[test]
    fn test_fallback_chain_edges_carry_contracts() {
        let plan = WorkflowPlan::new(
            vec![AgentNode::new("a", "A"), AgentNode::new("b", "B")],
            vec![HandoffEdge::new("a", "a")],
        );
        let normalized = normalize_plan(plan);
        assert!(normalized.edges[0].handoff_contract.is_some());
    }
}
