//! 변경 피드
//!
//! 저장소 변경을 `tokio::sync::broadcast`로 퍼뜨리고, `/api/events` SSE가
//! 호출자 소유 이벤트만 골라 클라이언트에 밀어준다.

use serde::Serialize;
use tokio::sync::broadcast;

/// 채널 버퍼. 가득 차면 느린 구독자는 오래된 이벤트를 건너뛴다.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    DocumentCreated,
    DocumentUpdated,
    DocumentDeleted,
    VersionCreated,
    TranslationUpdated,
    DictionaryChanged,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::ProjectCreated => "project_created",
            ChangeKind::ProjectUpdated => "project_updated",
            ChangeKind::ProjectDeleted => "project_deleted",
            ChangeKind::DocumentCreated => "document_created",
            ChangeKind::DocumentUpdated => "document_updated",
            ChangeKind::DocumentDeleted => "document_deleted",
            ChangeKind::VersionCreated => "version_created",
            ChangeKind::TranslationUpdated => "translation_updated",
            ChangeKind::DictionaryChanged => "dictionary_changed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub owner_id: String,
    pub project_id: String,
    pub document_id: Option<String>,
    pub entity_id: String,
    pub timestamp: i64,
}

impl ChangeEvent {
    pub fn new(
        kind: ChangeKind,
        owner_id: impl Into<String>,
        project_id: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            owner_id: owner_id.into(),
            project_id: project_id.into(),
            document_id: None,
            entity_id: entity_id.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }
}

pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 구독자가 없으면 조용히 버린다
    pub fn publish(&self, event: ChangeEvent) {
        tracing::debug!(kind = event.kind.as_str(), entity_id = %event.entity_id, "change published");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
