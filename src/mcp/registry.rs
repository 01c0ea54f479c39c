//! Tool registry: tool name to handler.
//!
//! The registry is filled once at start-up and is read-only afterwards. Tool
//! failures never escape as JSON-RPC errors: [`ToolRegistry::call`] logs the
//! full error to stderr and hands the client an `isError` result carrying a
//! user-facing message.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::cache::CacheError;
use crate::youtube::TranscriptError;
use crate::BoxFuture;

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // skip_serializing_if passes a reference
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(message)
        }
    }

    /// Text of the first content item.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|ToolContent::Text { text }| text.as_str())
    }
}

/// Errors a tool handler can return.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A required argument was absent or empty.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// An argument had the wrong type or value.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Transcript retrieval failed.
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    /// The cache could not be used.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ToolError {
    /// The text shown to the client.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transcript(e) => e.user_message(),
            Self::Cache(e) => e.user_message(),
            Self::MissingParameter(_) | Self::InvalidArguments(_) => self.to_string(),
        }
    }
}

/// Errors from building the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("Tool already registered: {0}")]
    Duplicate(String),
}

/// A callable tool.
pub trait Tool: Send + Sync {
    /// Name, description and input schema.
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool with the client's arguments.
    fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<String, ToolError>>;
}

/// Registered tools, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<(ToolDefinition, Box<dyn Tool>)>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is taken.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let definition = tool.definition();
        if self.by_name.contains_key(&definition.name) {
            return Err(RegistryError::Duplicate(definition.name));
        }
        self.by_name.insert(definition.name.clone(), self.tools.len());
        self.tools.push((definition, Box::new(tool)));
        Ok(())
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for tools/list.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter().map(|(definition, _)| definition)
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.by_name.get(name).map(|&i| self.tools[i].1.as_ref())
    }

    /// Invokes a tool and converts the outcome into tool content.
    pub async fn call(&self, name: &str, arguments: &Value) -> ToolCallResult {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, "Call to unknown tool");
            return ToolCallResult::error(format!("Unknown tool: {name}"));
        };

        tracing::debug!(tool = name, "Calling tool");
        match tool.call(arguments).await {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                tracing::error!(tool = name, error = ?e, "Tool call failed");
                ToolCallResult::error(e.user_message())
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.definitions().map(|d| &d.name))
            .finish()
    }
}
