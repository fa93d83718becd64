//! AI 데이터 스트림 프레이밍
//!
//! 각 파트는 `<code>:<json>\n` 한 줄이다. 채팅 클라이언트는 응답 헤더
//! `x-vercel-ai-data-stream: v1`을 보고 이 형식으로 파싱한다.

use serde::Serialize;
use serde_json::{json, Value};

pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";
pub const DATA_STREAM_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    Start { message_id: String },
    Text(String),
    ToolCall { tool_call_id: String, tool_name: String, args: Value },
    ToolResult { tool_call_id: String, result: Value },
    Error(String),
    FinishStep { finish_reason: &'static str, usage: Usage, is_continued: bool },
    FinishMessage { finish_reason: &'static str, usage: Usage },
}

impl StreamPart {
    fn code(&self) -> char {
        match self {
            StreamPart::Start { .. } => 'f',
            StreamPart::Text(_) => '0',
            StreamPart::ToolCall { .. } => '9',
            StreamPart::ToolResult { .. } => 'a',
            StreamPart::Error(_) => '3',
            StreamPart::FinishStep { .. } => 'e',
            StreamPart::FinishMessage { .. } => 'd',
        }
    }

    fn payload(&self) -> Value {
        match self {
            StreamPart::Start { message_id } => json!({ "messageId": message_id }),
            StreamPart::Text(text) => json!(text),
            StreamPart::ToolCall { tool_call_id, tool_name, args } => {
                json!({ "toolCallId": tool_call_id, "toolName": tool_name, "args": args })
            }
            StreamPart::ToolResult { tool_call_id, result } => {
                json!({ "toolCallId": tool_call_id, "result": result })
            }
            StreamPart::Error(message) => json!(message),
            StreamPart::FinishStep { finish_reason, usage, is_continued } => json!({
                "finishReason": finish_reason,
                "usage": usage,
                "isContinued": is_continued,
            }),
            StreamPart::FinishMessage { finish_reason, usage } => {
                json!({ "finishReason": finish_reason, "usage": usage })
            }
        }
    }

    pub fn encode(&self) -> String {
        format!("{}:{}\n", self.code(), self.payload())
    }
}

/// OpenAI 호환 finish_reason → 데이터 스트림 표기
pub fn map_finish_reason(reason: Option<&str>) -> &'static str {
    match reason {
        Some("stop") => "stop",
        Some("length") => "length",
        Some("tool_calls") | Some("function_call") => "tool-calls",
        Some("content_filter") => "content-filter",
        Some(_) => "other",
        None => "unknown",
    }
}
