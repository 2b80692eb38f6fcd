use crate::NodeId;
use thiserror::Error;

/// Why a proposed graph state was rejected.
///
/// Each variant's display string is the user-facing message; the canvas shows
/// it verbatim when a commit is refused. Violations are ordinary values, never
/// panics — a rejected edit leaves the committed graph untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("workflow needs at least one node")]
    Empty,

    #[error("every node requires a stable id")]
    MissingId,

    #[error("duplicate id: {0}")]
    DuplicateId(NodeId),

    #[error("edges must connect existing nodes")]
    UnknownEndpoint,

    #[error("self-loops are not allowed")]
    SelfLoop,

    #[error("duplicate edge: {0}->{1}")]
    DuplicateEdge(NodeId, NodeId),

    #[error("graph contains a cycle; remove or re-route an edge")]
    Cycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_messages() {
        assert_eq!(
            Violation::DuplicateEdge(NodeId::new("a"), NodeId::new("b")).to_string(),
            "duplicate edge: a->b"
        );
        assert_eq!(
            Violation::Cycle.to_string(),
            "graph contains a cycle; remove or re-route an edge"
        );
        assert_eq!(
            Violation::DuplicateId(NodeId::new("x")).to_string(),
            "duplicate id: x"
        );
    }
}
