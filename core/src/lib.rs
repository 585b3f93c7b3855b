//! Agent plumbing: the tool registry, agent configuration, the Brain that
//! talks to the chat-completions backend and the Runner that drives it.

pub mod agent;
pub mod llm;
pub mod registry;
pub mod runtime;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::Agent;
pub use llm::{Brain, BrainConfig, Step};
pub use registry::{Registry, ToolHandler, ToolRecord};
pub use runtime::{RunResult, Runner, DEFAULT_MAX_TURNS};
