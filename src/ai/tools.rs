//! 채팅 도구 정의와 실행
//!
//! editDocument / addDictionaryEntry / translateText 는 저장하지 않고 결과만 돌려준다.
//! 실제 반영은 클라이언트가 도구 결과를 보고 API를 호출해서 한다.

use serde::Deserialize;
use serde_json::{json, Value};

use super::openrouter::ToolCall;
use super::search::PerplexityClient;

pub const EDIT_DOCUMENT: &str = "editDocument";
pub const SEARCH_WEB: &str = "searchWeb";
pub const ADD_DICTIONARY_ENTRY: &str = "addDictionaryEntry";
pub const TRANSLATE_TEXT: &str = "translateText";

fn function(name: &str, description: &str, parameters: Value) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters,
        }
    })
}

/// OpenAI 호환 `tools` 배열
pub fn tool_definitions() -> Vec<Value> {
    vec![
        function(
            EDIT_DOCUMENT,
            "Edit the current document content or translation",
            json!({
                "type": "object",
                "properties": {
                    "type": { "type": "string", "enum": ["source", "translation"], "description": "Which part to edit" },
                    "content": { "type": "string", "description": "The new content" },
                    "reason": { "type": "string", "description": "Explanation of the changes made" }
                },
                "required": ["type", "content", "reason"],
                "additionalProperties": false
            }),
        ),
        function(
            SEARCH_WEB,
            "Search the web for current information using Perplexity API",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query" },
                    "focus": {
                        "type": "string",
                        "enum": ["academic", "writing", "math", "programming", "finance"],
                        "description": "Search focus area"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        ),
        function(
            ADD_DICTIONARY_ENTRY,
            "Add a new entry to the project dictionary",
            json!({
                "type": "object",
                "properties": {
                    "source": { "type": "string", "description": "Source language term" },
                    "target": { "type": "string", "description": "Target language translation" },
                    "context": { "type": "string", "description": "Usage context or notes" }
                },
                "required": ["source", "target"],
                "additionalProperties": false
            }),
        ),
        function(
            TRANSLATE_TEXT,
            "Translate text using the project context and dictionary",
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Text to translate" },
                    "sourceLanguage": { "type": "string", "description": "Source language" },
                    "targetLanguage": { "type": "string", "description": "Target language" },
                    "style": {
                        "type": "string",
                        "enum": ["formal", "informal", "technical", "creative"],
                        "description": "Translation style"
                    }
                },
                "required": ["text"],
                "additionalProperties": false
            }),
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditTarget {
    Source,
    Translation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFocus {
    Academic,
    Writing,
    Math,
    Programming,
    Finance,
}

impl SearchFocus {
    fn as_str(&self) -> &'static str {
        match self {
            SearchFocus::Academic => "academic",
            SearchFocus::Writing => "writing",
            SearchFocus::Math => "math",
            SearchFocus::Programming => "programming",
            SearchFocus::Finance => "finance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStyle {
    Formal,
    Informal,
    Technical,
    Creative,
}

/// 모델이 요청한 도구 호출 (인자 검증 완료)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "tool", content = "args")]
pub enum ToolInvocation {
    #[serde(rename = "editDocument")]
    EditDocument {
        #[serde(rename = "type")]
        target: EditTarget,
        content: String,
        reason: String,
    },
    #[serde(rename = "searchWeb")]
    SearchWeb { query: String, focus: Option<SearchFocus> },
    #[serde(rename = "addDictionaryEntry")]
    AddDictionaryEntry {
        source: String,
        target: String,
        context: Option<String>,
    },
    #[serde(rename = "translateText", rename_all = "camelCase")]
    TranslateText {
        text: String,
        #[allow(dead_code)]
        source_language: Option<String>,
        #[allow(dead_code)]
        target_language: Option<String>,
        style: Option<TranslationStyle>,
    },
}

impl ToolInvocation {
    /// 이름과 JSON 인자 문자열을 검증해 호출로 만든다
    pub fn parse(call: &ToolCall) -> Result<(Self, Value), String> {
        let args: Value = serde_json::from_str(&call.arguments)
            .map_err(|e| format!("Invalid arguments for tool {}: {e}", call.name))?;

        if ![EDIT_DOCUMENT, SEARCH_WEB, ADD_DICTIONARY_ENTRY, TRANSLATE_TEXT].contains(&call.name.as_str()) {
            return Err(format!("Model tried to call unavailable tool '{}'", call.name));
        }

        let invocation = serde_json::from_value(json!({ "tool": call.name, "args": args }))
            .map_err(|e| format!("Invalid arguments for tool {}: {e}", call.name))?;
        Ok((invocation, args))
    }

    pub async fn execute(self, search: &PerplexityClient) -> Value {
        match self {
            ToolInvocation::EditDocument { target, content, reason } => {
                let part = match target {
                    EditTarget::Source => "Source",
                    EditTarget::Translation => "Translation",
                };
                json!({
                    "success": true,
                    "message": format!("{part} updated: {reason}"),
                    "content": content,
                })
            }
            ToolInvocation::SearchWeb { query, focus } => {
                search.search(&query, focus.as_ref().map(SearchFocus::as_str)).await
            }
            ToolInvocation::AddDictionaryEntry { source, target, context } => json!({
                "success": true,
                "message": format!("Added dictionary entry: {source} → {target}"),
                "entry": { "source": source, "target": target, "context": context },
            }),
            ToolInvocation::TranslateText { text, style, .. } => {
                let style = match style {
                    Some(TranslationStyle::Formal) => "formal",
                    Some(TranslationStyle::Informal) => "informal",
                    Some(TranslationStyle::Technical) => "technical",
                    Some(TranslationStyle::Creative) => "creative",
                    None => "neutral",
                };
                json!({
                    "success": true,
                    "translation": format!("[Translated: {text}]"),
                    "confidence": 0.95,
                    "style": style,
                })
            }
        }
    }
}
