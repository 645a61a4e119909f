use crate::llm_client::{ChunkSink, LlmClient};
use crate::session::Session;
use crate::tool_registry::ToolRegistry;
use crate::types::Message;
use crate::utils::clip;
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

/// Client seam so turns can run against a scripted model in tests.
#[async_trait]
pub trait LlmClientTrait: Send + Sync {
    async fn chat(&self, messages: &[Message], tools: &Value) -> anyhow::Result<Message>;
    async fn chat_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> anyhow::Result<Message>;
}

#[async_trait]
impl LlmClientTrait for LlmClient {
    async fn chat(&self, messages: &[Message], tools: &Value) -> anyhow::Result<Message> {
        self.chat(messages, tools).await
    }

    async fn chat_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> anyhow::Result<Message> {
        self.chat_streaming(messages, on_chunk).await
    }
}

#[derive(Clone)]
pub struct AgentOptions {
    /// Model steps allowed within one user turn before the turn is aborted.
    pub max_tool_rounds: usize,
    pub step_timeout: Duration,
    /// Chars kept per tool observation before it is stored in history.
    pub observation_clip: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: 8,
            step_timeout: Duration::from_secs(60),
            observation_clip: 8000,
        }
    }
}

pub struct Agent {
    llm: Box<dyn LlmClientTrait>,
    tools: ToolRegistry,
    opts: AgentOptions,
}

impl Agent {
    pub fn new(llm: Box<dyn LlmClientTrait>, tools: ToolRegistry, opts: AgentOptions) -> Self {
        Self { llm, tools, opts }
    }

    /// Drives one user turn to completion: send the message, execute any
    /// requested tools, resend the results, and repeat until the model
    /// answers with plain text.
    ///
    /// The turn is staged in a scratch buffer and committed to the session
    /// only when it finishes, so a transport failure or an exhausted round
    /// budget leaves the stored history exactly as it was.
    pub async fn run_user_turn(
        &self,
        user_input: &str,
        session: &mut Session,
    ) -> anyhow::Result<String> {
        let mut staged = vec![Message::user(user_input)];

        for _round in 0..self.opts.max_tool_rounds {
            let mut wire = session.messages.clone();
            wire.extend_from_slice(&staged);

            let reply = timeout(
                self.opts.step_timeout,
                self.llm.chat(&wire, self.tools.schemas()),
            )
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "model step timed out after {}s",
                    self.opts.step_timeout.as_secs()
                )
            })??;

            let tool_calls = reply.tool_calls.clone();
            staged.push(reply.clone());

            match tool_calls.as_deref() {
                None | Some([]) => {
                    let text = reply
                        .content
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    for msg in staged {
                        session.add_message(msg);
                    }
                    return Ok(text);
                }
                Some(calls) => {
                    // Execute in the order received; unknown names come back
                    // from the registry as explicit error observations.
                    for call in calls {
                        let observation =
                            match serde_json::from_str::<Value>(&call.function.arguments) {
                                Ok(args) => self.tools.dispatch(&call.function.name, &args),
                                Err(e) => {
                                    warn!(tool = %call.function.name, error = %e, "bad tool arguments");
                                    format!(
                                        "Error: could not parse arguments for tool '{}': {}",
                                        call.function.name, e
                                    )
                                }
                            };
                        debug!(tool = %call.function.name, "executed tool call");
                        staged.push(Message::tool(
                            clip(&observation, self.opts.observation_clip),
                            call.id.clone(),
                        ));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "model kept requesting tools after {} rounds; aborting turn",
            self.opts.max_tool_rounds
        ))
    }

    /// The no-tools streaming variant used by the chat surface. Chunks are
    /// forwarded as they arrive; user and assistant messages are committed
    /// only once the stream completes.
    pub async fn run_streaming_turn(
        &self,
        user_input: &str,
        session: &mut Session,
        on_chunk: ChunkSink<'_>,
    ) -> anyhow::Result<String> {
        let staged_user = Message::user(user_input);
        let mut wire = session.messages.clone();
        wire.push(staged_user.clone());

        let reply = timeout(
            self.opts.step_timeout,
            self.llm.chat_streaming(&wire, on_chunk),
        )
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "model step timed out after {}s",
                self.opts.step_timeout.as_secs()
            )
        })??;

        let text = reply.content.unwrap_or_default().trim().to_string();
        session.add_message(staged_user);
        session.add_message(Message::assistant(text.clone()));
        Ok(text)
    }
}
