//! AI 채팅 프록시
//!
//! 요청마다 OpenRouter에 스트리밍 호출을 하나 열고, 받은 텍스트와 도구 호출을
//! AI 데이터 스트림 파트로 바꿔 클라이언트에 흘려보낸다.
//! 도구는 모델 턴이 끝난 뒤 실행하며 결과를 다시 모델에 보내지 않는다 (단일 스텝).

pub mod catalog;
pub mod openrouter;
pub mod prompt;
pub mod search;
pub mod stream;
pub mod tools;

use futures::future::join_all;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::ServerConfig;
use crate::error::TransdocError;
use catalog::AiModel;
use openrouter::{CompletionRequest, OpenRouterClient, TurnSummary, WireMessage};
use prompt::ChatContext;
use search::PerplexityClient;
use stream::{map_finish_reason, StreamPart};
use tools::ToolInvocation;

/// 스트림 버퍼 (파트 단위)
const STREAM_BUFFER: usize = 64;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub context: Option<ChatContext>,
    pub model: Option<String>,
}

/// 검증을 마친 채팅 요청
pub struct PreparedChat {
    pub model: &'static AiModel,
    request: CompletionRequest,
}

impl PreparedChat {
    pub fn new(chat: ChatRequest) -> Result<Self, TransdocError> {
        if chat.messages.is_empty() {
            return Err(TransdocError::InvalidInput("messages must not be empty".into()));
        }

        let mut messages = Vec::with_capacity(chat.messages.len() + 1);
        messages.push(WireMessage {
            role: "system".into(),
            content: prompt::build_system_prompt(chat.context.as_ref()),
        });
        for message in chat.messages {
            match message.role.as_str() {
                "system" | "user" | "assistant" => messages.push(WireMessage {
                    role: message.role,
                    content: message.content,
                }),
                other => {
                    return Err(TransdocError::InvalidInput(format!(
                        "unsupported message role '{other}'"
                    )))
                }
            }
        }

        let model = catalog::resolve_model(chat.model.as_deref());
        let tools = model.supports_tools.then(tools::tool_definitions);

        Ok(Self {
            model,
            request: CompletionRequest::new(model.id, messages, tools),
        })
    }
}

/// 채팅 스트림 시작. 키가 없으면 스트림을 열기 전에 실패한다.
pub fn start_chat(
    http: reqwest::Client,
    config: &ServerConfig,
    chat: PreparedChat,
) -> Result<ReceiverStream<String>, TransdocError> {
    let api_key = openrouter::api_key()?;
    let client = OpenRouterClient::new(http.clone(), &config.openrouter_base_url, api_key);
    let search = PerplexityClient::new(http, &config.perplexity_base_url);

    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(async move {
        drive(client, search, chat, tx).await;
    });
    Ok(ReceiverStream::new(rx))
}

async fn drive(client: OpenRouterClient, search: PerplexityClient, chat: PreparedChat, tx: mpsc::Sender<String>) {
    let message_id = format!("msg-{}", uuid::Uuid::new_v4().simple());
    tracing::info!(model = chat.model.id, message_id = %message_id, "chat stream started");

    if tx.send(StreamPart::Start { message_id }.encode()).await.is_err() {
        return;
    }

    let summary = match client.stream_turn(&chat.request, &tx).await {
        Ok(Some(summary)) => summary,
        Ok(None) => {
            tracing::debug!("chat client disconnected");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, model = chat.model.id, "chat stream failed");
            let _ = tx.send(StreamPart::Error(e.to_string()).encode()).await;
            return;
        }
    };

    if finish(summary, &search, &tx).await.is_err() {
        tracing::debug!("chat client disconnected");
    }
}

/// 도구 실행 후 스텝/메시지 종료 파트 전송
async fn finish(
    summary: TurnSummary,
    search: &PerplexityClient,
    tx: &mpsc::Sender<String>,
) -> Result<(), mpsc::error::SendError<String>> {
    let mut pending = Vec::new();
    for call in &summary.tool_calls {
        match ToolInvocation::parse(call) {
            Ok((invocation, args)) => {
                tx.send(
                    StreamPart::ToolCall {
                        tool_call_id: call.id.clone(),
                        tool_name: call.name.clone(),
                        args,
                    }
                    .encode(),
                )
                .await?;
                pending.push((call.id.clone(), invocation));
            }
            Err(message) => {
                tracing::warn!(tool = %call.name, error = %message, "rejected tool call");
                tx.send(StreamPart::Error(message).encode()).await?;
            }
        }
    }

    let results = join_all(pending.into_iter().map(|(id, invocation)| async move {
        tracing::debug!(tool_call_id = %id, "executing tool");
        (id, invocation.execute(search).await)
    }))
    .await;

    for (tool_call_id, result) in results {
        tx.send(StreamPart::ToolResult { tool_call_id, result }.encode()).await?;
    }

    let finish_reason = map_finish_reason(summary.finish_reason.as_deref());
    tx.send(
        StreamPart::FinishStep {
            finish_reason,
            usage: summary.usage,
            is_continued: false,
        }
        .encode(),
    )
    .await?;
    tx.send(
        StreamPart::FinishMessage {
            finish_reason,
            usage: summary.usage,
        }
        .encode(),
    )
    .await?;

    tracing::info!(
        finish_reason,
        prompt_tokens = summary.usage.prompt_tokens,
        completion_tokens = summary.usage.completion_tokens,
        "chat stream finished"
    );
    Ok(())
}
