use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_openai::types::ChatCompletionMessageToolCall;
use serde_json::Value;
use tracing::{debug, info};

use crate::agent::Agent;
use crate::llm::{assistant_tool_calls, tool_result, user_message, Brain, Step};

pub const DEFAULT_MAX_TURNS: usize = 10;

/// Outcome of a single agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub final_output: String,
    /// Model round trips, including the one that produced the answer.
    pub turns: usize,
    pub tool_calls: usize,
}

// The Runner drives the think/act loop: it asks the Brain what to do, executes
// the requested tools against the agent's registry and feeds their output back
// until the model answers in plain text.
#[derive(Clone)]
pub struct Runner {
    brain: Arc<Brain>,
    max_turns: usize,
}

impl Runner {
    pub fn new(brain: Arc<Brain>) -> Self {
        Self {
            brain,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Runs `agent` on a single user message. Stateless between calls.
    ///
    /// Tool failures are not shown to the model: the first one aborts the run
    /// and comes back as the error, with the tool's own error as its source.
    pub async fn run(&self, agent: &Agent, input: &str) -> Result<RunResult> {
        let mut history = vec![user_message(input)?];
        let mut executed = 0;

        for turn in 1..=self.max_turns {
            debug!("Agent '{}' turn {}", agent.name(), turn);

            match self
                .brain
                .next_step(agent.instructions(), &history, agent.tools())
                .await?
            {
                Step::Reply(final_output) => {
                    info!(
                        "Agent '{}' answered after {} turn(s), {} tool call(s)",
                        agent.name(),
                        turn,
                        executed
                    );
                    return Ok(RunResult {
                        final_output,
                        turns: turn,
                        tool_calls: executed,
                    });
                }
                Step::CallTools { content, calls } => {
                    history.push(assistant_tool_calls(content, calls.clone())?);
                    for call in &calls {
                        let output = self.run_tool(agent, call).await?;
                        history.push(tool_result(&call.id, output)?);
                        executed += 1;
                    }
                }
            }
        }

        bail!(
            "Agent '{}' gave no final answer within {} turns",
            agent.name(),
            self.max_turns
        )
    }

    async fn run_tool(&self, agent: &Agent, call: &ChatCompletionMessageToolCall) -> Result<String> {
        let name = call.function.name.as_str();
        let tool = agent.tools().find(name).ok_or_else(|| {
            anyhow!("Brain requested a tool that does not exist in registry: {name}")
        })?;

        let raw = call.function.arguments.trim();
        let arguments: Value = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(raw)
                .with_context(|| format!("Tool '{name}' called with malformed arguments: {raw}"))?
        };

        info!("Brain decided to call tool: '{}'", name);
        debug!("Arguments: {}", arguments);

        let output = tool
            .invoke(arguments)
            .await
            .with_context(|| format!("Tool '{name}' failed"))?;
        info!("Tool '{}' succeeded. Output size: {} bytes", name, output.len());

        Ok(output)
    }
}
