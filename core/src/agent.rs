use crate::registry::{Registry, ToolRecord};

/// A named bundle of instructions and tools handed to the Runner.
///
/// Constructed once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    instructions: String,
    tools: Registry,
}

impl Agent {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            tools: Registry::new(),
        }
    }

    pub fn with_tool(mut self, record: ToolRecord) -> Self {
        self.tools.register(record);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &Registry {
        &self.tools
    }
}
