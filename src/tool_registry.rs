use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Handlers take the parsed argument object and always return observation
/// text; tool failures are part of the conversation, not of the call stack.
pub type ToolHandler = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Maps tool names to handlers with an explicitly declared schema. Adding a
/// tool is one `register` call; dispatch is a lookup, and unknown names come
/// back as an error observation instead of being skipped.
#[derive(Clone)]
pub struct ToolRegistry {
    schemas: Value,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            schemas: json!([]),
            handlers: HashMap::new(),
        }
    }

    /// The registry Nexus ships with: `read_project_document`, scoped to the
    /// configured documents directory.
    pub fn with_project_tools(docs_dir: PathBuf) -> Self {
        let mut registry = Self::new();
        registry.register(
            "read_project_document",
            "Reads the content of a project document from the local file system. \
             Returns the content as a string.",
            json!({
                "type": "object",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Name of the document, relative to the project directory"
                    }
                },
                "required": ["filename"]
            }),
            Arc::new(move |args| match args.get("filename").and_then(Value::as_str) {
                Some(filename) => crate::tools::read_project_document(&docs_dir, filename),
                None => "Error: missing required argument 'filename'.".to_string(),
            }),
        );
        registry
    }

    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        parameters: Value,
        handler: ToolHandler,
    ) {
        let schema = json!({
            "type": "function",
            "function": {
                "name": name,
                "description": description,
                "parameters": parameters
            }
        });
        if let Value::Array(entries) = &mut self.schemas {
            entries.push(schema);
        }
        self.handlers.insert(name.to_string(), handler);
    }

    /// The "tools" array the LLM sees.
    pub fn schemas(&self) -> &Value {
        &self.schemas
    }

    pub fn dispatch(&self, name: &str, args: &Value) -> String {
        match self.handlers.get(name) {
            Some(handler) => handler(args),
            None => format!("Error: unknown tool '{}'", name),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_registry_declares_read_project_document() {
        let registry = ToolRegistry::with_project_tools(PathBuf::from("."));
        let schemas = registry.schemas();

        assert!(schemas.is_array());
        let names: Vec<&str> = schemas
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|tool| tool["function"]["name"].as_str())
            .collect();
        assert_eq!(names, vec!["read_project_document"]);

        let params = &schemas[0]["function"]["parameters"];
        assert_eq!(params["required"][0], "filename");
    }

    #[test]
    fn dispatch_unknown_tool_reports_the_name() {
        let registry = ToolRegistry::with_project_tools(PathBuf::from("."));
        let result = registry.dispatch("send_email", &json!({}));
        assert!(result.contains("unknown tool"));
        assert!(result.contains("send_email"));
    }

    #[test]
    fn dispatch_without_filename_reports_missing_argument() {
        let registry = ToolRegistry::with_project_tools(PathBuf::from("."));
        let result = registry.dispatch("read_project_document", &json!({}));
        assert!(result.contains("missing required argument"));
    }
}
