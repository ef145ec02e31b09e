//! Content items returned by tool calls.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Content item.
///
/// Command output is always text, so no other kind is modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Content {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

impl Content {
    /// Create text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_content_wire_format() {
        let text = Content::text("Hello, world!");
        assert_eq!(text.as_text(), Some("Hello, world!"));
        assert_eq!(
            serde_json::to_value(&text).unwrap(),
            json!({"type": "text", "text": "Hello, world!"})
        );
    }
}
