//! 채팅에서 선택 가능한 모델 목록
//!
//! 모든 모델은 OpenRouter를 경유한다. 목록에 없는 id는 기본 모델로 대체된다.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-2024-11-20";

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pricing {
    /// 1M 토큰당 USD
    pub input: f64,
    pub output: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiModel {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: &'static str,
    pub context_window: u32,
    pub supports_tools: bool,
    pub supports_search: bool,
    pub description: &'static str,
    pub pricing: Option<Pricing>,
}

const fn model(
    id: &'static str,
    name: &'static str,
    context_window: u32,
    supports_tools: bool,
    description: &'static str,
    input: f64,
    output: f64,
) -> AiModel {
    AiModel {
        id,
        name,
        provider: "openrouter",
        context_window,
        supports_tools,
        // 검색 내장 모델은 도구를 받지 않는다
        supports_search: !supports_tools,
        description,
        pricing: Some(Pricing { input, output }),
    }
}

pub static AI_MODELS: &[AiModel] = &[
    // OpenAI
    model("openai/o3", "OpenAI o3", 200_000, true, "Latest OpenAI reasoning model with advanced problem-solving", 10.0, 40.0),
    model("openai/o3-mini", "OpenAI o3 Mini", 200_000, true, "Efficient reasoning model for complex tasks", 1.1, 4.4),
    model("openai/o1", "OpenAI o1", 200_000, true, "Advanced reasoning model for complex problem solving", 15.0, 60.0),
    model("openai/o1-mini", "OpenAI o1 Mini", 128_000, true, "Efficient reasoning model for most tasks", 1.1, 4.4),
    model("openai/gpt-4o-2024-11-20", "GPT-4o (2024-11-20)", 128_000, true, "Latest GPT-4o with improved creative writing and file processing", 2.5, 10.0),
    model("openai/gpt-4o-mini", "GPT-4o Mini", 128_000, true, "Fast and efficient model for most tasks", 0.15, 0.6),
    // Anthropic
    model("anthropic/claude-sonnet-4", "Claude Sonnet 4", 200_000, true, "Latest Claude model with enhanced capabilities", 3.0, 15.0),
    model("anthropic/claude-opus-4", "Claude Opus 4", 200_000, true, "Most capable Claude model for complex tasks", 15.0, 75.0),
    model("anthropic/claude-3.7-sonnet", "Claude 3.7 Sonnet", 200_000, true, "Enhanced Claude 3.5 with larger output capacity", 3.0, 15.0),
    model("anthropic/claude-3.5-sonnet", "Claude 3.5 Sonnet", 200_000, true, "Balanced performance and speed for most tasks", 3.0, 15.0),
    model("anthropic/claude-3.5-haiku", "Claude 3.5 Haiku", 200_000, true, "Fast Claude model for simple tasks", 0.8, 4.0),
    // Google
    model("google/gemini-2.5-pro-preview", "Gemini 2.5 Pro Preview", 1_048_576, true, "Google's state-of-the-art model with advanced reasoning", 1.25, 10.0),
    model("google/gemini-2.5-flash-preview-05-20", "Gemini 2.5 Flash Preview", 1_048_576, true, "Fast Gemini model with thinking capabilities", 0.15, 0.6),
    model("google/gemini-2.0-flash-001", "Gemini 2.0 Flash", 1_048_576, true, "Latest Gemini 2.0 model with multimodal capabilities", 0.1, 0.4),
    // Meta
    model("meta-llama/llama-4-maverick", "Llama 4 Maverick", 1_048_576, true, "Latest Llama 4 model with enhanced capabilities", 0.15, 0.6),
    model("meta-llama/llama-4-scout", "Llama 4 Scout", 1_048_576, true, "Efficient Llama 4 model for general tasks", 0.08, 0.3),
    model("meta-llama/llama-3.3-70b-instruct", "Llama 3.3 70B Instruct", 131_072, true, "Latest Llama 3.3 model with improved performance", 0.07, 0.25),
    // DeepSeek
    model("deepseek/deepseek-r1", "DeepSeek R1", 128_000, true, "Advanced reasoning model with strong performance", 0.45, 2.15),
    model("deepseek/deepseek-chat", "DeepSeek V3", 163_840, true, "Latest DeepSeek model with enhanced capabilities", 0.38, 0.89),
    // Qwen
    model("qwen/qwen3-32b", "Qwen3 32B", 40_960, true, "Latest Qwen model with thinking capabilities", 0.1, 0.3),
    model("qwen/qwq-32b", "QwQ 32B", 131_072, true, "Qwen reasoning model for complex problem solving", 0.15, 0.2),
    // Microsoft
    model("microsoft/phi-4", "Phi 4", 16_384, true, "Microsoft's latest small language model", 0.07, 0.14),
    // xAI
    model("x-ai/grok-3-beta", "Grok 3 Beta", 131_072, true, "Latest Grok model with enhanced capabilities", 3.0, 15.0),
    model("x-ai/grok-3-mini-beta", "Grok 3 Mini Beta", 131_072, true, "Efficient Grok model for most tasks", 0.3, 0.5),
    // Perplexity (검색 내장)
    model("perplexity/sonar-reasoning", "Perplexity Sonar Reasoning", 127_000, false, "Advanced reasoning model with real-time web search", 1.0, 5.0),
    model("perplexity/sonar", "Perplexity Sonar", 127_072, false, "Fast model with real-time web search capabilities", 1.0, 1.0),
];

static BY_ID: Lazy<HashMap<&'static str, &'static AiModel>> =
    Lazy::new(|| AI_MODELS.iter().map(|m| (m.id, m)).collect());

pub fn get_model_by_id(id: &str) -> Option<&'static AiModel> {
    BY_ID.get(id).copied()
}

/// 선택한 모델을 찾고, 없으면 기본 모델을 돌려준다.
pub fn resolve_model(id: Option<&str>) -> &'static AiModel {
    id.and_then(get_model_by_id)
        .or_else(|| get_model_by_id(DEFAULT_MODEL))
        .unwrap_or(&AI_MODELS[4])
}

pub fn models_with_tools() -> impl Iterator<Item = &'static AiModel> {
    AI_MODELS.iter().filter(|m| m.supports_tools)
}

pub fn models_with_search() -> impl Iterator<Item = &'static AiModel> {
    AI_MODELS.iter().filter(|m| m.supports_search)
}
