//! OpenRouter 스트리밍 클라이언트
//!
//! OpenAI 호환 `chat/completions`를 `stream: true`로 호출하고 SSE 청크를
//! 텍스트 델타와 도구 호출로 풀어낸다. 재시도는 하지 않는다.

use std::collections::BTreeMap;

use futures::StreamExt;
use reqwest_eventsource::{retry, Event, EventSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use super::stream::{StreamPart, Usage};
use crate::config::non_empty_var;
use crate::error::TransdocError;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
const SERVICE: &str = "OpenRouter";

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 2000;

/// 요청 시점에 키를 읽는다
pub fn api_key() -> Result<String, TransdocError> {
    non_empty_var(API_KEY_VAR).ok_or(TransdocError::MissingApiKey(API_KEY_VAR))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    pub temperature: f32,
    pub max_tokens: u32,
    stream: bool,
    stream_options: StreamOptions,
}

impl CompletionRequest {
    pub fn new(model: &str, messages: Vec<WireMessage>, tools: Option<Vec<Value>>) -> Self {
        Self {
            model: model.to_string(),
            messages,
            tools,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: true,
            stream_options: StreamOptions { include_usage: true },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    pub usage: Option<ChunkUsage>,
    pub error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    pub id: Option<String>,
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

impl From<ChunkUsage> for Usage {
    fn from(u: ChunkUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChunkError {
    pub message: Option<String>,
}

/// 스트림에서 조각조각 도착하는 도구 호출을 index별로 모은다
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, PendingCall>,
}

#[derive(Debug, Default)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, delta: ToolCallDelta) {
        let call = self.calls.entry(delta.index).or_default();
        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            call.id = id;
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name {
                call.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                call.arguments.push_str(&arguments);
            }
        }
    }

    /// 이름이 없는 조각은 버린다. id가 없으면 새로 붙인다.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_values()
            .filter(|c| !c.name.is_empty())
            .map(|c| ToolCall {
                id: if c.id.is_empty() {
                    format!("call_{}", uuid::Uuid::new_v4().simple())
                } else {
                    c.id
                },
                name: c.name,
                arguments: if c.arguments.trim().is_empty() {
                    "{}".to_string()
                } else {
                    c.arguments
                },
            })
            .collect()
    }
}

/// 한 번의 모델 턴에서 받은 결과
#[derive(Debug, Default)]
pub struct TurnSummary {
    pub finish_reason: Option<String>,
    pub usage: Usage,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn open(&self, request: &CompletionRequest) -> Result<EventSource, TransdocError> {
        let builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request);

        let mut es = EventSource::new(builder).map_err(|e| upstream(format!("failed to open stream: {e}")))?;
        es.set_retry_policy(Box::new(retry::Never));
        Ok(es)
    }

    /// 스트림을 끝까지 읽는다. 텍스트 델타는 도착하는 대로 `0:` 파트로 내보낸다.
    /// 수신 측이 닫히면 (클라이언트 연결 끊김) 즉시 중단하고 `None`을 돌려준다.
    pub async fn stream_turn(
        &self,
        request: &CompletionRequest,
        out: &mpsc::Sender<String>,
    ) -> Result<Option<TurnSummary>, TransdocError> {
        let mut es = self.open(request)?;
        let mut tools = ToolCallAccumulator::default();
        let mut summary = TurnSummary::default();

        while let Some(event) = es.next().await {
            let message = match event {
                Ok(Event::Open) => continue,
                Ok(Event::Message(message)) => message,
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(e) => {
                    es.close();
                    return Err(describe_stream_error(e).await);
                }
            };

            let data = message.data.trim();
            if data == "[DONE]" {
                break;
            }

            let chunk: CompletionChunk = match serde_json::from_str(data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unparseable completion chunk");
                    continue;
                }
            };

            if let Some(error) = chunk.error {
                es.close();
                return Err(upstream(error.message.unwrap_or_else(|| "unknown error".into())));
            }
            if let Some(usage) = chunk.usage {
                summary.usage = usage.into();
            }

            for choice in chunk.choices {
                if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                    if out.send(StreamPart::Text(text).encode()).await.is_err() {
                        es.close();
                        return Ok(None);
                    }
                }
                for delta in choice.delta.tool_calls.unwrap_or_default() {
                    tools.push(delta);
                }
                if choice.finish_reason.is_some() {
                    summary.finish_reason = choice.finish_reason;
                }
            }
        }

        es.close();
        summary.tool_calls = tools.finish();
        Ok(Some(summary))
    }
}

fn upstream(message: String) -> TransdocError {
    TransdocError::Upstream { service: SERVICE, message }
}

async fn describe_stream_error(error: reqwest_eventsource::Error) -> TransdocError {
    match error {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "model provider rejected request");
            upstream(format!("API error {}", status.as_u16()))
        }
        other => upstream(other.to_string()),
    }
}
