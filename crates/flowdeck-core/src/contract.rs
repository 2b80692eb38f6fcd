use crate::normalize::slugify;
use serde::{Deserialize, Serialize};

/// One field of a handoff packet: where the value lands in the packet
/// (`target_key`) and where it is read from in the producing agent's output
/// (`source_path`, dot-separated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffField {
    pub target_key: String,
    pub source_path: String,
    #[serde(default = "HandoffField::default_type", rename = "type")]
    pub field_type: String,
    #[serde(default = "HandoffField::default_required")]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl HandoffField {
    pub fn new(target_key: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            target_key: target_key.into(),
            source_path: source_path.into(),
            field_type: Self::default_type(),
            required: true,
            description: String::new(),
        }
    }

    fn default_type() -> String {
        "any".to_string()
    }

    fn default_required() -> bool {
        true
    }
}

/// The typed shape of the packet passed along a handoff edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffContract {
    pub packet_type: String,
    #[serde(default)]
    pub fields: Vec<HandoffField>,
}

impl HandoffContract {
    /// The canonical contract assigned to an edge that never got an explicit
    /// one: a packet named after the edge label carrying a summary, the full
    /// details, and any workspace refs.
    pub fn default_for(label: &str) -> Self {
        let packet_type = slugify(label).unwrap_or_else(|| "handoff_packet".to_string());
        Self {
            packet_type,
            fields: vec![
                HandoffField {
                    target_key: "summary".to_string(),
                    source_path: "summary".to_string(),
                    field_type: "string".to_string(),
                    required: true,
                    description: "Short recap of what the upstream agent produced".to_string(),
                },
                HandoffField {
                    target_key: "details".to_string(),
                    source_path: "details".to_string(),
                    field_type: "object".to_string(),
                    required: false,
                    description: "Full upstream output".to_string(),
                },
                HandoffField {
                    target_key: "workspaceRefs".to_string(),
                    source_path: "data.workspaceRefs".to_string(),
                    field_type: "array".to_string(),
                    required: false,
                    description: "Paths of workspace files touched upstream".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contract_slugifies_label() {
        let contract = HandoffContract::default_for("Task Brief!");
        assert_eq!(contract.packet_type, "task_brief");
        assert_eq!(contract.fields.len(), 3);
        assert!(contract.fields[0].required);
    }

    #[test]
    fn test_default_contract_field_shapes() {
        let contract = HandoffContract::default_for("findings");
        assert_eq!(contract.fields[0].source_path, "summary");
        assert_eq!(contract.fields[1].source_path, "details");
        assert_eq!(contract.fields[1].field_type, "object");
        assert_eq!(contract.fields[2].source_path, "data.workspaceRefs");
        assert_eq!(contract.fields[2].field_type, "array");
    }

    #[test]
    fn test_default_contract_empty_label() {
        let contract = HandoffContract::default_for("");
        assert_eq!(contract.packet_type, "handoff_packet");
    }

    #[test]
    fn test_field_type_serializes_as_type() {
        let field = HandoffField::new("summary", "output.summary");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "any");
        assert_eq!(json["targetKey"], "summary");
    }
}
