use serde::{Deserialize, Serialize};

/// One entry of the knowledge base given to the model as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub title: String,
    pub content: String,
}

impl KnowledgeItem {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Renders the knowledge-base block appended to the system instruction.
pub fn knowledge_context(items: &[KnowledgeItem]) -> String {
    if items.is_empty() {
        return "\nNeural Knowledge Base is empty.".to_string();
    }

    let entries = items
        .iter()
        .map(|item| format!("[{}]: {}", item.title, item.content))
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!("\nAccessing Neural Knowledge Base:\n{entries}")
}
