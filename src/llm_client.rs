use crate::types::{FunctionCall, Message, ToolCall};
use serde_json::{Value, json};
use tokio::time::Duration;
use tracing::debug;

/// Chunk callback invoked for every streamed content fragment.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(&str) + Send);

#[derive(Clone)]
pub struct LlmClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        temperature: f64,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(8)
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            base_url,
            api_key,
            model,
            temperature,
            http,
        })
    }

    /// One non-streaming completion. The reply may carry tool calls.
    pub async fn chat(&self, messages: &[Message], tools: &Value) -> anyhow::Result<Message> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut req = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": false
        });
        if tools.as_array().is_some_and(|t| !t.is_empty()) {
            req["tools"] = tools.clone();
        }

        debug!(model = %self.model, messages = messages.len(), "sending chat request");

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let response_json: Value = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse model response: {}", e))?;

        if let Some(error) = response_json.get("error") {
            return Err(anyhow::anyhow!("API error: {}", error));
        }

        let assistant_message = response_json["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .map(|choice| &choice["message"])
            .ok_or_else(|| anyhow::anyhow!("No choices in model response"))?;

        let parsed: Message = serde_json::from_value(assistant_message.clone())
            .map_err(|e| anyhow::anyhow!("Failed to parse assistant message: {}", e))?;

        Ok(parsed)
    }

    /// One streaming completion without a tool list. Content fragments are
    /// handed to `on_chunk` as they arrive; the assembled assistant message
    /// is returned once the stream finishes.
    pub async fn chat_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> anyhow::Result<Message> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": true
        });

        debug!(model = %self.model, messages = messages.len(), "sending streaming chat request");

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let mut stream = resp.bytes_stream();
        let mut accumulated = Message {
            role: "assistant".to_string(),
            content: Some(String::new()),
            tool_calls: None,
            tool_call_id: None,
        };
        let mut tool_calls_map: std::collections::HashMap<usize, ToolCall> =
            std::collections::HashMap::new();

        use futures::StreamExt;

        'outer: while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            let text = String::from_utf8_lossy(&bytes);

            for line in text.lines() {
                let Some(json_str) = line.strip_prefix("data: ").map(str::trim) else {
                    continue;
                };
                if json_str == "[DONE]" || json_str.is_empty() {
                    break 'outer;
                }

                // Skip malformed fragments; a chunk boundary can split a line.
                let delta: Value = match serde_json::from_str(json_str) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                let choice = &delta["choices"][0];
                let delta_obj = &choice["delta"];

                if let Some(content) = delta_obj["content"].as_str() {
                    on_chunk(content);
                    if let Some(acc) = accumulated.content.as_mut() {
                        acc.push_str(content);
                    }
                }

                // Tool-call deltas arrive as indexed fragments.
                if let Some(tool_calls_arr) = delta_obj["tool_calls"].as_array() {
                    for tc_delta in tool_calls_arr {
                        let index = tc_delta["index"].as_u64().unwrap_or(0) as usize;
                        let entry = tool_calls_map.entry(index).or_insert_with(|| ToolCall {
                            id: String::new(),
                            call_type: "function".to_string(),
                            function: FunctionCall {
                                name: String::new(),
                                arguments: String::new(),
                            },
                        });

                        if let Some(id) = tc_delta["id"].as_str() {
                            entry.id = id.to_string();
                        }
                        if let Some(name) = tc_delta["function"]["name"].as_str() {
                            entry.function.name = name.to_string();
                        }
                        if let Some(args) = tc_delta["function"]["arguments"].as_str() {
                            entry.function.arguments.push_str(args);
                        }
                    }
                }

                if let Some(finish) = choice["finish_reason"].as_str() {
                    if finish == "stop" || finish == "tool_calls" {
                        break 'outer;
                    }
                }
            }
        }

        if !tool_calls_map.is_empty() {
            let mut calls: Vec<_> = tool_calls_map.into_iter().collect();
            calls.sort_by_key(|(idx, _)| *idx);
            accumulated.tool_calls = Some(calls.into_iter().map(|(_, tc)| tc).collect());
        }

        Ok(accumulated)
    }
}
