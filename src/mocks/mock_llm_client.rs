use crate::agent::LlmClientTrait;
use crate::llm_client::ChunkSink;
use crate::types::{FunctionCall, Message, ToolCall};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

enum ScriptedReply {
    Message(Message),
    Failure(String),
}

/// Scripted stand-in for the model: replies are served in the order they
/// were queued, and every request's message list is recorded for inspection.
#[derive(Clone)]
pub struct MockLlmClient {
    replies: Arc<Mutex<Vec<ScriptedReply>>>,
    call_history: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_text_response(&mut self, content: &str) {
        self.replies
            .lock()
            .unwrap()
            .push(ScriptedReply::Message(Message::assistant(content)));
    }

    pub fn add_tool_call_response(&mut self, tool_name: &str, args: &str) {
        let tool_call = ToolCall {
            id: format!("call-{}", self.replies.lock().unwrap().len()),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: tool_name.to_string(),
                arguments: args.to_string(),
            },
        };
        self.replies.lock().unwrap().push(ScriptedReply::Message(Message {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![tool_call]),
            tool_call_id: None,
        }));
    }

    pub fn add_failure(&mut self, error_msg: &str) {
        self.replies
            .lock()
            .unwrap()
            .push(ScriptedReply::Failure(error_msg.to_string()));
    }

    pub fn call_history(&self) -> Vec<Vec<Message>> {
        self.call_history.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &[Message]) -> Result<Message> {
        self.call_history.lock().unwrap().push(request.to_vec());

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(Message::assistant("No more mock responses configured"));
        }
        match replies.remove(0) {
            ScriptedReply::Message(msg) => Ok(msg),
            ScriptedReply::Failure(err) => Err(anyhow::anyhow!(err)),
        }
    }
}

#[async_trait]
impl LlmClientTrait for MockLlmClient {
    async fn chat(&self, messages: &[Message], _tools: &Value) -> Result<Message> {
        self.next_reply(messages)
    }

    async fn chat_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> Result<Message> {
        let reply = self.next_reply(messages)?;
        if let Some(content) = &reply.content {
            // Feed the content in two fragments to exercise accumulation.
            let mid = content.len() / 2;
            let mut split = mid;
            while !content.is_char_boundary(split) {
                split += 1;
            }
            on_chunk(&content[..split]);
            if split < content.len() {
                on_chunk(&content[split..]);
            }
        }
        Ok(reply)
    }
}
