use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Something the Brain can ask us to run.
///
/// `arguments` is the JSON object the model produced for the call, already
/// decoded. The returned string is handed back to the model verbatim.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Value) -> Result<String>;
}

// The shape of our "Passport": everything the Brain needs to know about a tool,
// plus the handler the Runtime dispatches to.
#[derive(Clone)]
pub struct ToolRecord {
    pub name: String,
    pub description: String,

    // JSON Schema for the arguments. Sent to the model as-is.
    pub parameters: Value,

    handler: Arc<dyn ToolHandler>,
}

impl ToolRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler,
        }
    }

    pub async fn invoke(&self, arguments: Value) -> Result<String> {
        self.handler.call(arguments).await
    }
}

impl fmt::Debug for ToolRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRecord")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Name -> tool table. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tools: Vec<ToolRecord>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool. A record with the same name replaces the earlier one.
    pub fn register(&mut self, record: ToolRecord) {
        match self.index.get(&record.name) {
            Some(&slot) => {
                tracing::warn!("Tool '{}' registered twice, replacing", record.name);
                self.tools[slot] = record;
            }
            None => {
                self.index.insert(record.name.clone(), self.tools.len());
                self.tools.push(record);
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<&ToolRecord> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    /// Records in registration order.
    pub fn records(&self) -> &[ToolRecord] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
