//! 채팅 시스템 프롬프트

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub document: Option<ContextDocument>,
    pub dictionary: Option<Vec<ContextDictionaryEntry>>,
    pub project: Option<ContextProject>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDocument {
    pub title: String,
    pub content: Option<String>,
    pub translated_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextDictionaryEntry {
    pub source: String,
    pub target: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextProject {
    pub name: String,
    pub source_language: String,
    pub target_language: String,
}

const INTRO: &str = "You are a helpful translation and writing assistant with access to powerful tools. You can:\n\
\n\
1. Edit documents directly using the editDocument tool\n\
2. Search the web for current information using searchWeb tool  \n\
3. Add entries to the project dictionary using addDictionaryEntry tool\n\
4. Translate text using translateText tool";

const OUTRO: &str = "Use tools when appropriate to help with translation work, research, and document editing. Always explain what you're doing when using tools.";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn document_section(doc: &ContextDocument) -> String {
    let translation = non_empty(doc.translated_content.as_deref())
        .map(|t| format!("Translation: {t}"))
        .unwrap_or_default();
    format!(
        "Current Document:\nTitle: {}\nContent: {}\n{}",
        doc.title,
        non_empty(doc.content.as_deref()).unwrap_or("No content yet"),
        translation
    )
}

fn dictionary_section(entries: &[ContextDictionaryEntry]) -> String {
    let lines = entries
        .iter()
        .map(|e| match non_empty(e.context.as_deref()) {
            Some(ctx) => format!("{} → {} ({ctx})", e.source, e.target),
            None => format!("{} → {}", e.source, e.target),
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Project Dictionary:\n{lines}")
}

fn project_section(project: &ContextProject) -> String {
    format!(
        "Project Info:\nName: {}\nLanguages: {} → {}",
        project.name, project.source_language, project.target_language
    )
}

/// 현재 문서/사전/프로젝트 정보를 담은 시스템 프롬프트.
/// 빠진 섹션은 빈 줄로 남는다.
pub fn build_system_prompt(context: Option<&ChatContext>) -> String {
    let document = context
        .and_then(|c| c.document.as_ref())
        .map(document_section)
        .unwrap_or_default();
    let dictionary = context
        .and_then(|c| c.dictionary.as_deref())
        .filter(|entries| !entries.is_empty())
        .map(dictionary_section)
        .unwrap_or_default();
    let project = context
        .and_then(|c| c.project.as_ref())
        .map(project_section)
        .unwrap_or_default();

    format!("{INTRO}\n\nCurrent Context:\n{document}\n\n{dictionary}\n\n{project}\n\n{OUTRO}")
}
