//! Perplexity 검색 (searchWeb 도구)
//!
//! 결과는 도구 결과 JSON으로 모델/클라이언트에 그대로 전달된다.
//! 실패해도 에러로 올리지 않고 `{ success: false, error }`로 돌려준다.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::non_empty_var;

pub const API_KEY_VAR: &str = "PERPLEXITY_API_KEY";
pub const SEARCH_MODEL: &str = "llama-3.1-sonar-small-128k-online";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    model: &'static str,
    messages: Vec<SearchMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    return_citations: bool,
}

#[derive(Debug, Serialize)]
struct SearchMessage<'a> {
    role: &'static str,
    content: std::borrow::Cow<'a, str>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    choices: Vec<SearchChoice>,
    #[serde(default)]
    citations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchChoice {
    message: Option<SearchChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct SearchChoiceMessage {
    content: Option<String>,
}

fn system_prompt(focus: Option<&str>) -> String {
    match focus {
        Some(focus) => format!("You are a helpful research assistant. Focus on {focus} topics."),
        None => "You are a helpful research assistant.".to_string(),
    }
}

#[derive(Clone)]
pub struct PerplexityClient {
    http: reqwest::Client,
    base_url: String,
}

impl PerplexityClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// 검색 후 도구 결과 JSON 반환
    pub async fn search(&self, query: &str, focus: Option<&str>) -> Value {
        match self.request(query, focus).await {
            Ok((result, citations)) => json!({
                "success": true,
                "result": result,
                "citations": citations,
            }),
            Err(error) => {
                tracing::warn!(error = %error, "web search failed");
                json!({ "success": false, "error": error })
            }
        }
    }

    async fn request(&self, query: &str, focus: Option<&str>) -> Result<(String, Vec<Value>), String> {
        // 키는 호출할 때마다 읽는다
        let api_key = non_empty_var(API_KEY_VAR).ok_or_else(|| format!("{API_KEY_VAR} is not set"))?;

        let body = SearchRequest {
            model: SEARCH_MODEL,
            messages: vec![
                SearchMessage { role: "system", content: system_prompt(focus).into() },
                SearchMessage { role: "user", content: query.into() },
            ],
            max_tokens: 1000,
            temperature: 0.2,
            return_citations: true,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Perplexity request failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("Perplexity API error: {}", resp.status().as_u16()));
        }

        let data: SearchResponse = resp
            .json()
            .await
            .map_err(|e| format!("Failed to parse Perplexity response: {e}"))?;

        let result = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "No results found".to_string());

        Ok((result, data.citations))
    }
}
