use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionResponseMessage, ChatCompletionTool, ChatCompletionToolArgs,
        ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObjectArgs,
    },
    Client,
};
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::registry::Registry;

const DEFAULT_MODEL: &str = "gpt-4o";

/// Connection settings for the chat-completions backend.
#[derive(Debug, Clone)]
pub struct BrainConfig {
    pub api_key: String,
    pub model: String,
    /// Overrides the OpenAI endpoint, e.g. for a compatible gateway.
    pub api_base: Option<String>,
}

impl BrainConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY must be set in the environment or .env")?;
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_base = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|base| !base.trim().is_empty());

        Ok(Self {
            api_key,
            model,
            api_base,
        })
    }
}

/// What the model wants to do next.
#[derive(Debug, Clone)]
pub enum Step {
    /// Final answer for the user.
    Reply(String),
    /// Run these tools and come back with their output.
    CallTools {
        content: Option<String>,
        calls: Vec<ChatCompletionMessageToolCall>,
    },
}

pub struct Brain {
    client: Client<OpenAIConfig>,
    model: String,
}

impl Brain {
    pub fn new(config: BrainConfig) -> Self {
        let mut openai = OpenAIConfig::new().with_api_key(config.api_key);
        if let Some(base) = config.api_base {
            openai = openai.with_api_base(base);
        }
        let client = Client::with_config(openai);

        info!("Brain connected. Model: {}", config.model);
        Self {
            client,
            model: config.model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn say_hello(&self) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([user_message("Hello! Reply with 'System Online'.")?])
            .build()?;

        let response = self.client.chat().create(request).await?;
        let reply = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(reply)
    }

    /// Asks the model for its next move given the conversation so far.
    ///
    /// `instructions` goes in as the system message ahead of `history`. Every
    /// tool in `tools` is offered as a function; when there are none the
    /// request carries no tool list at all.
    pub async fn next_step(
        &self,
        instructions: &str,
        history: &[ChatCompletionRequestMessage],
        tools: &Registry,
    ) -> Result<Step> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 1);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions)
                .build()?
                .into(),
        );
        messages.extend_from_slice(history);

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.model).messages(messages);
        if !tools.is_empty() {
            request.tools(function_tools(tools)?);
        }
        let request = request.build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("chat completion request failed")?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("chat completion returned no choices")?;

        Ok(interpret(choice.message))
    }
}

fn interpret(message: ChatCompletionResponseMessage) -> Step {
    match message.tool_calls {
        Some(calls) if !calls.is_empty() => {
            debug!("Model requested {} tool call(s)", calls.len());
            Step::CallTools {
                content: message.content,
                calls,
            }
        }
        _ => Step::Reply(message.content.unwrap_or_default()),
    }
}

// Registry Tools -> OpenAI Tools
fn function_tools(tools: &Registry) -> Result<Vec<ChatCompletionTool>> {
    tools
        .records()
        .iter()
        .map(|t| {
            let function = FunctionObjectArgs::default()
                .name(&t.name)
                .description(&t.description)
                .parameters(t.parameters.clone())
                .build()?;
            let tool = ChatCompletionToolArgs::default()
                .r#type(ChatCompletionToolType::Function)
                .function(function)
                .build()?;
            Ok(tool)
        })
        .collect()
}

pub fn user_message(text: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(text)
        .build()?
        .into())
}

/// The assistant turn that requested `calls`, replayed so tool results line up.
pub fn assistant_tool_calls(
    content: Option<String>,
    calls: Vec<ChatCompletionMessageToolCall>,
) -> Result<ChatCompletionRequestMessage> {
    let mut message = ChatCompletionRequestAssistantMessageArgs::default();
    message.tool_calls(calls);
    if let Some(text) = content {
        message.content(text);
    }
    Ok(message.build()?.into())
}

pub fn tool_result(call_id: &str, output: String) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestToolMessageArgs::default()
        .tool_call_id(call_id)
        .content(output)
        .build()?
        .into())
}
