//! Database Module
//!
//! SQLite 데이터베이스 관리. 모든 조회/변경은 호출자(owner_id) 범위로 제한되며,
//! 다른 사용자의 레코드는 존재하지 않는 것과 똑같이 `NotFound`로 보인다.

mod dictionary;
mod documents;
mod projects;
mod schema;
mod versions;

pub use versions::DEFAULT_SEARCH_LIMIT;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::TransdocError;
use crate::models::{Document, Project, Version};

/// 데이터베이스 상태 (AppState로 공유)
pub struct DbState(pub Mutex<Database>);

impl DbState {
    pub fn new(db: Database) -> Self {
        Self(Mutex::new(db))
    }

    /// 연결 잠금. `.await` 지점을 넘겨 들고 있으면 안 된다.
    pub fn lock(&self) -> Result<MutexGuard<'_, Database>, TransdocError> {
        self.0.lock().map_err(|_| TransdocError::LockPoisoned)
    }
}

/// 데이터베이스 래퍼
pub struct Database {
    conn: Connection,
}

impl Database {
    /// 새 데이터베이스 연결 생성
    pub fn new(path: &Path) -> Result<Self, TransdocError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// 테스트/임시용 메모리 DB
    pub fn open_in_memory() -> Result<Self, TransdocError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// 데이터베이스 스키마 초기화
    pub fn initialize(&self) -> Result<(), TransdocError> {
        self.conn.execute_batch(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    /// 헬스체크용 단순 쿼리
    pub fn ping(&self) -> bool {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 대소문자 무시 부분 일치용 LIKE 패턴 (`ESCAPE '\'`와 함께 사용)
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// 필수 텍스트 필드 검증 (trim 후 비어있으면 거부)
pub(crate) fn required(field: &str, value: &str) -> Result<String, TransdocError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TransdocError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// 선택 텍스트 필드 정규화 (trim 후 비어있으면 None)
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) const PROJECT_COLUMNS: &str =
    "id, name, description, source_language, target_language, owner_id, created_at, updated_at";

pub(crate) const DOCUMENT_COLUMNS: &str =
    "id, title, project_id, owner_id, current_version_id, created_at, updated_at";

pub(crate) const VERSION_COLUMNS: &str = "id, document_id, content, translated_content, \
     version_number, comment, instructions, ai_model, created_at, created_by";

pub(crate) fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        source_language: row.get(3)?,
        target_language: row.get(4)?,
        owner_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// `offset`부터 DOCUMENT_COLUMNS 순서로 읽는다 (JOIN 결과용)
pub(crate) fn document_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        project_id: row.get(offset + 2)?,
        owner_id: row.get(offset + 3)?,
        current_version_id: row.get(offset + 4)?,
        created_at: row.get(offset + 5)?,
        updated_at: row.get(offset + 6)?,
    })
}

pub(crate) fn version_from_row(row: &Row<'_>) -> rusqlite::Result<Version> {
    Ok(Version {
        id: row.get(0)?,
        document_id: row.get(1)?,
        content: row.get(2)?,
        translated_content: row.get(3)?,
        version_number: row.get(4)?,
        comment: row.get(5)?,
        instructions: row.get(6)?,
        ai_model: row.get(7)?,
        created_at: row.get(8)?,
        created_by: row.get(9)?,
    })
}

/// 소유자 범위 프로젝트 로드
pub(crate) fn owned_project(
    conn: &Connection,
    owner_id: &str,
    project_id: &str,
) -> Result<Project, TransdocError> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1 AND owner_id = ?2"),
        [project_id, owner_id],
        project_from_row,
    )
    .optional()?
    .ok_or(TransdocError::NotFound("Project"))
}

/// 소유자 범위 문서 로드
pub(crate) fn owned_document(
    conn: &Connection,
    owner_id: &str,
    document_id: &str,
) -> Result<Document, TransdocError> {
    conn.query_row(
        &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1 AND owner_id = ?2"),
        [document_id, owner_id],
        |row| document_from_row(row, 0),
    )
    .optional()?
    .ok_or(TransdocError::NotFound("Document"))
}

#[cfg(test)]
pub(crate) fn test_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent() {
        let db = test_db();
        db.initialize().unwrap();
        assert!(db.ping());
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = test_db();
        let enabled: i64 = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn file_backed_database_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("transdoc.db");

        {
            let db = Database::new(&path).unwrap();
            db.initialize().unwrap();
            db.create_project("alice", &crate::db::projects::tests::sample_project())
                .unwrap();
        }

        let db = Database::new(&path).unwrap();
        db.initialize().unwrap();
        assert_eq!(db.list_projects("alice").unwrap().len(), 1);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("cat"), "%cat%");
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    #[test]
    fn text_normalisation() {
        assert_eq!(required("name", "  Spec ").unwrap(), "Spec");
        assert!(matches!(
            required("name", "   "),
            Err(TransdocError::InvalidInput(_))
        ));
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" formal ")).as_deref(), Some("formal"));
        assert_eq!(optional(None), None);
    }
}
