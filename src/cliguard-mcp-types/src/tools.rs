//! Tool types for MCP protocol.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::content::Content;

/// MCP tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Unique name for the tool.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

impl Tool {
    /// Create a tool that takes no arguments.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: empty_object_schema(),
        }
    }

    /// Create a tool whose input schema is derived from `T`.
    pub fn from_args<T: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description).with_schema(input_schema_for::<T>())
    }

    /// Set the input schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// JSON Schema for an argument struct, without the `$schema` marker.
pub fn input_schema_for<T: JsonSchema>() -> Value {
    let root = schemars::schema_for!(T);
    let mut schema = serde_json::to_value(root).unwrap_or_else(|_| empty_object_schema());
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }
    schema
}

/// List tools result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    /// Available tools.
    pub tools: Vec<Tool>,
    /// Next page cursor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ListToolsResult {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self {
            tools,
            next_cursor: None,
        }
    }
}

/// Call tool request parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CallToolParams {
    /// Tool name to call.
    pub name: String,
    /// Tool arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl CallToolParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, args: Value) -> Self {
        self.arguments = Some(args);
        self
    }
}

/// Call tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Result content.
    pub content: Vec<Content>,
    /// Whether the result is an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// Create a success result with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(vec![Content::text(text)])
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: Some(true),
        }
    }

    /// Create a result with multiple content items.
    pub fn with_content(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of every content item, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.content.iter().filter_map(Content::as_text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct EchoArgs {
        /// Text to echo back.
        message: String,
        #[serde(default)]
        loud: Option<bool>,
    }

    #[test]
    fn test_tool_without_arguments() {
        let tool = Tool::new("status", "Show status");
        assert_eq!(tool.description.as_deref(), Some("Show status"));
        assert_eq!(tool.input_schema, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_tool_schema_from_args() {
        let tool = Tool::from_args::<EchoArgs>("echo", "Echo text");
        let schema = &tool.input_schema;

        assert_eq!(schema["type"], "object");
        assert!(schema.get("$schema").is_none());
        assert_eq!(schema["required"], json!(["message"]));
        assert_eq!(schema["properties"]["message"]["type"], "string");
        assert_eq!(
            schema["properties"]["message"]["description"],
            "Text to echo back."
        );
        assert!(schema["properties"].get("loud").is_some());
    }

    #[test]
    fn test_tool_wire_format() {
        let value = serde_json::to_value(Tool::new("status", "Show status")).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn test_call_tool_result() {
        let success = CallToolResult::text("Success!");
        assert!(!success.is_error());
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({"content": [{"type": "text", "text": "Success!"}]})
        );

        let error = CallToolResult::error("Something went wrong");
        assert!(error.is_error());
        assert_eq!(error.texts(), vec!["Something went wrong"]);
        assert_eq!(serde_json::to_value(&error).unwrap()["isError"], true);
    }

    #[test]
    fn test_call_params_without_arguments() {
        let params: CallToolParams = serde_json::from_value(json!({"name": "status"})).unwrap();
        assert_eq!(params.name, "status");
        assert!(params.arguments.is_none());
    }
}
