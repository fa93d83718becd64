//! Transdoc Data Models
//!
//! 프론트엔드(TypeScript) 타입과 매핑되는 Rust 데이터 모델.
//! 모든 id는 UUID v4 문자열, 모든 시각은 Unix millis.

use serde::{Deserialize, Serialize};

/// 번역 프로젝트 (원문/번역 언어 쌍 고정)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub source_language: String,
    pub target_language: String,
    pub owner_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub source_language: String,
    pub target_language: String,
}

/// 프로젝트 부분 수정. `None` 필드는 건드리지 않는다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
}

/// 프로젝트 안의 문서
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub project_id: String,
    pub owner_id: String,
    pub current_version_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub title: String,
    /// 비어있지 않으면 버전 1로 저장된다
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    pub title: Option<String>,
}

/// 문서 + 현재 버전
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentWithVersion {
    #[serde(flatten)]
    pub document: Document,
    pub current_version: Option<Version>,
}

/// 문서 내용 스냅샷. `translated_content`/`ai_model` 외에는 생성 후 불변.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub translated_content: Option<String>,
    pub version_number: i64,
    pub comment: Option<String>,
    pub instructions: Option<String>,
    pub ai_model: Option<String>,
    pub created_at: i64,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    pub content: String,
    pub translated_content: Option<String>,
    pub comment: Option<String>,
    pub instructions: Option<String>,
    pub ai_model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationPatch {
    pub translated_content: String,
    pub ai_model: Option<String>,
}

/// 버전 검색 결과 (소유 문서 포함)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSearchHit {
    #[serde(flatten)]
    pub version: Version,
    pub document: Document,
}

/// 프로젝트 용어 사전 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub id: String,
    pub source: String,
    pub target: String,
    pub context: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntryInput {
    pub source: String,
    pub target: String,
    pub context: Option<String>,
}

/// 프로젝트별 용어 사전. 아직 항목이 없으면 시각 필드는 비어있다.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dictionary {
    pub project_id: String,
    pub entries: Vec<DictionaryEntry>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}
