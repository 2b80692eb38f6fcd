use serde::{Deserialize, Serialize};
use std::fmt;

pub mod contract;
pub mod error;
pub mod normalize;

pub use contract::{HandoffContract, HandoffField};
pub use error::Violation;
pub use normalize::{normalize_plan, sample_plan, slugify};

/// Stable identifier for an agent node.
///
/// Ids come from the planner as short snake_case strings ("intake_agent");
/// they stay unique within a plan and survive renames of the display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One agent in a workflow plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub objective: String,
}

impl AgentNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            name: name.into(),
            role: String::new(),
            objective: String::new(),
        }
    }
}

/// A directed handoff between two agents.
///
/// The label is the short human description of what is passed ("task brief");
/// the optional contract pins down the packet shape field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, rename = "handoff")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff_contract: Option<HandoffContract>,
}

impl HandoffEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: NodeId::new(source),
            target: NodeId::new(target),
            label: String::new(),
            handoff_contract: None,
        }
    }

    pub fn with_label(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: NodeId::new(source),
            target: NodeId::new(target),
            label: label.into(),
            handoff_contract: None,
        }
    }
}

/// A planner-produced workflow: agent nodes plus directed handoff edges.
///
/// The plan itself carries no positions; layout is derived downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    #[serde(default)]
    pub summary: String,
    pub nodes: Vec<AgentNode>,
    #[serde(default)]
    pub edges: Vec<HandoffEdge>,
}

impl WorkflowPlan {
    pub fn new(nodes: Vec<AgentNode>, edges: Vec<HandoffEdge>) -> Self {
        Self {
            summary: String::new(),
            nodes,
            edges,
        }
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }
}
