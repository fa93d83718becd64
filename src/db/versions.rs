//! 문서 버전 저장소
//!
//! 버전 번호는 문서별로 1부터 단조 증가한다. 번호 계산, INSERT, 현재 버전 포인터
//! 갱신은 하나의 트랜잭션에서 수행되고 `(document_id, version_number)` 유니크
//! 인덱스가 중복 번호를 막는다.

use rusqlite::{params, Connection, OptionalExtension};

use super::{
    document_from_row, like_pattern, new_id, now_millis, owned_document, version_from_row, Database,
};
use crate::error::TransdocError;
use crate::models::{NewVersion, TranslationPatch, Version, VersionSearchHit};

const JOINED_VERSION_COLUMNS: &str = "v.id, v.document_id, v.content, v.translated_content, \
     v.version_number, v.comment, v.instructions, v.ai_model, v.created_at, v.created_by";

const JOINED_DOCUMENT_COLUMNS: &str =
    "d.id, d.title, d.project_id, d.owner_id, d.current_version_id, d.created_at, d.updated_at";

/// 검색 결과 기본 상한
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

fn owned_version(conn: &Connection, owner_id: &str, version_id: &str) -> Result<Version, TransdocError> {
    conn.query_row(
        &format!(
            "SELECT {JOINED_VERSION_COLUMNS} FROM document_versions v
             JOIN documents d ON d.id = v.document_id
             WHERE v.id = ?1 AND d.owner_id = ?2"
        ),
        [version_id, owner_id],
        version_from_row,
    )
    .optional()?
    .ok_or(TransdocError::NotFound("Version"))
}

impl Database {
    /// 새 버전 저장 후 문서의 현재 버전을 새 버전으로 옮긴다.
    pub fn create_version(
        &self,
        owner_id: &str,
        document_id: &str,
        input: &NewVersion,
    ) -> Result<Version, TransdocError> {
        let tx = self.conn.unchecked_transaction()?;
        owned_document(&tx, owner_id, document_id)?;

        // 버전은 개별 삭제되지 않으므로 MAX + 1 == COUNT + 1
        let version_number: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM document_versions WHERE document_id = ?1",
            [document_id],
            |row| row.get(0),
        )?;

        let now = now_millis();
        let version = Version {
            id: new_id(),
            document_id: document_id.to_string(),
            content: input.content.clone(),
            translated_content: input.translated_content.clone(),
            version_number,
            comment: input.comment.clone(),
            instructions: input.instructions.clone(),
            ai_model: input.ai_model.clone(),
            created_at: now,
            created_by: owner_id.to_string(),
        };

        tx.execute(
            "INSERT INTO document_versions
                (id, document_id, content, translated_content, version_number, comment, instructions, ai_model, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                version.id,
                version.document_id,
                version.content,
                version.translated_content,
                version.version_number,
                version.comment,
                version.instructions,
                version.ai_model,
                version.created_at,
                version.created_by,
            ],
        )?;

        tx.execute(
            "UPDATE documents SET current_version_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![version.id, now, document_id],
        )?;

        tx.commit()?;
        Ok(version)
    }

    /// 문서의 버전 목록 (최신 번호 우선). 소유하지 않은 문서는 빈 목록.
    pub fn list_versions(&self, owner_id: &str, document_id: &str) -> Result<Vec<Version>, TransdocError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {JOINED_VERSION_COLUMNS} FROM document_versions v
             JOIN documents d ON d.id = v.document_id
             WHERE v.document_id = ?1 AND d.owner_id = ?2
             ORDER BY v.version_number DESC"
        ))?;
        let rows = stmt.query_map([document_id, owner_id], version_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_version(&self, owner_id: &str, version_id: &str) -> Result<Version, TransdocError> {
        owned_version(&self.conn, owner_id, version_id)
    }

    /// 번역 결과만 제자리 갱신한다. 원문 내용과 번호는 바뀌지 않는다.
    pub fn update_translation(
        &self,
        owner_id: &str,
        version_id: &str,
        patch: &TranslationPatch,
    ) -> Result<Version, TransdocError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut version = owned_version(&tx, owner_id, version_id)?;

        tx.execute(
            "UPDATE document_versions SET translated_content = ?1, ai_model = ?2 WHERE id = ?3",
            params![patch.translated_content, patch.ai_model, version_id],
        )?;
        tx.commit()?;

        version.translated_content = Some(patch.translated_content.clone());
        version.ai_model = patch.ai_model.clone();
        Ok(version)
    }

    /// 원문/번역문 내용 검색. 소유 범위는 JOIN으로 한 번에 거르고, 한 버전은 한 번만 나온다.
    pub fn search_versions(
        &self,
        owner_id: &str,
        query: &str,
        document_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<VersionSearchHit>, TransdocError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {JOINED_VERSION_COLUMNS}, {JOINED_DOCUMENT_COLUMNS}
             FROM document_versions v
             JOIN documents d ON d.id = v.document_id
             WHERE d.owner_id = ?1
               AND (v.content LIKE ?2 ESCAPE '\\' OR v.translated_content LIKE ?2 ESCAPE '\\')
               AND (?3 IS NULL OR v.document_id = ?3)
             ORDER BY v.created_at DESC, v.version_number DESC
             LIMIT ?4"
        ))?;
        let rows = stmt.query_map(
            params![owner_id, like_pattern(query), document_id, limit],
            |row| {
                Ok(VersionSearchHit {
                    version: version_from_row(row)?,
                    document: document_from_row(row, 10)?,
                })
            },
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    #[cfg(test)]
    fn raw_version_count(&self, document_id: &str) -> i64 {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM document_versions WHERE document_id = ?1",
                [document_id],
                |row| row.get(0),
            )
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::projects::tests::sample_project;
    use crate::db::{test_db, DbState};
    use crate::models::{Document, NewDocument};

    fn setup(db: &Database, owner: &str) -> Document {
        let project = db.create_project(owner, &sample_project()).unwrap();
        db.create_document(
            owner,
            &project.id,
            &NewDocument {
                title: "Doc1".into(),
                content: None,
            },
        )
        .unwrap()
    }

    fn content(text: &str) -> NewVersion {
        NewVersion {
            content: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn sequential_saves_are_numbered_and_repoint_current() {
        let db = test_db();
        let document = setup(&db, "alice");

        let mut created = Vec::new();
        for n in 1..=5 {
            let version = db
                .create_version("alice", &document.id, &content(&format!("rev {n}")))
                .unwrap();
            assert_eq!(version.version_number, n);
            let current = db.get_document("alice", &document.id).unwrap();
            assert_eq!(current.document.current_version_id.as_ref(), Some(&version.id));
            created.push(version);
        }

        let listed = db.list_versions("alice", &document.id).unwrap();
        let numbers: Vec<_> = listed.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![5, 4, 3, 2, 1]);
        assert_eq!(db.raw_version_count(&document.id), 5);
    }

    #[test]
    fn second_save_supersedes_without_changing_first() {
        let db = test_db();
        let project = db.create_project("alice", &sample_project()).unwrap();
        let document = db
            .create_document(
                "alice",
                &project.id,
                &NewDocument {
                    title: "Doc1".into(),
                    content: Some("# Doc1\n...".into()),
                },
            )
            .unwrap();
        let first_id = document.current_version_id.clone().unwrap();
        let first = db.get_version("alice", &first_id).unwrap();

        let second = db
            .create_version("alice", &document.id, &content("# Doc1\nedited"))
            .unwrap();

        assert_eq!(second.version_number, 2);
        let loaded = db.get_document("alice", &document.id).unwrap();
        assert_eq!(loaded.document.current_version_id, Some(second.id.clone()));
        assert_eq!(loaded.current_version.unwrap().content, "# Doc1\nedited");
        assert_eq!(db.get_version("alice", &first_id).unwrap(), first);
    }

    #[test]
    fn concurrent_saves_never_share_a_number() {
        let db = test_db();
        let document = setup(&db, "alice");
        let state = Arc::new(DbState::new(db));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = Arc::clone(&state);
                let document_id = document.id.clone();
                std::thread::spawn(move || {
                    let db = state.lock().unwrap();
                    db.create_version("alice", &document_id, &content(&format!("writer {i}")))
                        .unwrap()
                        .version_number
                })
            })
            .collect();

        let mut numbers: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=8).collect::<Vec<_>>());

        let db = state.lock().unwrap();
        let latest = db.list_versions("alice", &document.id).unwrap().remove(0);
        let current = db.get_document("alice", &document.id).unwrap();
        assert_eq!(current.document.current_version_id, Some(latest.id));
    }

    #[test]
    fn storage_rejects_duplicate_version_numbers() {
        let db = test_db();
        let document = setup(&db, "alice");
        db.create_version("alice", &document.id, &content("v1")).unwrap();

        let duplicate = db.conn.execute(
            "INSERT INTO document_versions (id, document_id, content, version_number, created_at, created_by)
             VALUES ('dup', ?1, 'racing writer', 1, 0, 'alice')",
            [&document.id],
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn foreign_owner_cannot_create_or_read() {
        let db = test_db();
        let document = setup(&db, "alice");
        let version = db.create_version("alice", &document.id, &content("v1")).unwrap();

        assert!(matches!(
            db.create_version("bob", &document.id, &content("hijack")),
            Err(TransdocError::NotFound("Document"))
        ));
        assert!(db.list_versions("bob", &document.id).unwrap().is_empty());

        let foreign = db.get_version("bob", &version.id).unwrap_err();
        let missing = db.get_version("bob", "missing").unwrap_err();
        assert_eq!(foreign.to_string(), missing.to_string());
        assert_eq!(db.raw_version_count(&document.id), 1);
    }

    #[test]
    fn update_translation_patches_only_translation_fields() {
        let db = test_db();
        let document = setup(&db, "alice");
        let version = db
            .create_version(
                "alice",
                &document.id,
                &NewVersion {
                    content: "Hello".into(),
                    comment: Some("first draft".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let patched = db
            .update_translation(
                "alice",
                &version.id,
                &TranslationPatch {
                    translated_content: "Bonjour".into(),
                    ai_model: Some("openai/gpt-4o-mini".into()),
                },
            )
            .unwrap();

        let stored = db.get_version("alice", &version.id).unwrap();
        assert_eq!(stored, patched);
        assert_eq!(stored.content, "Hello");
        assert_eq!(stored.version_number, 1);
        assert_eq!(stored.comment.as_deref(), Some("first draft"));
        assert_eq!(stored.translated_content.as_deref(), Some("Bonjour"));

        assert!(db
            .update_translation(
                "bob",
                &version.id,
                &TranslationPatch {
                    translated_content: "x".into(),
                    ai_model: None,
                },
            )
            .is_err());
    }

    #[test]
    fn search_covers_content_and_translation_once_per_version() {
        let db = test_db();
        let document = setup(&db, "alice");
        let other = setup(&db, "alice");
        let foreign = setup(&db, "bob");

        let both = db
            .create_version(
                "alice",
                &document.id,
                &NewVersion {
                    content: "The cat sleeps".into(),
                    translated_content: Some("Le chat dort (cat)".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let translated_only = db
            .create_version(
                "alice",
                &other.id,
                &NewVersion {
                    content: "Le chien".into(),
                    translated_content: Some("The CAT and the dog".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        db.create_version("bob", &foreign.id, &content("cat")).unwrap();

        let hits = db.search_versions("alice", "cat", None, DEFAULT_SEARCH_LIMIT).unwrap();
        let mut ids: Vec<_> = hits.iter().map(|h| h.version.id.clone()).collect();
        ids.sort();
        let mut expected = vec![both.id.clone(), translated_only.id.clone()];
        expected.sort();
        assert_eq!(ids, expected);
        assert!(hits.iter().all(|h| h.document.owner_id == "alice"));

        let scoped = db
            .search_versions("alice", "cat", Some(&document.id), DEFAULT_SEARCH_LIMIT)
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].document.id, document.id);

        assert!(db.search_versions("alice", "  ", None, DEFAULT_SEARCH_LIMIT).unwrap().is_empty());
    }
}
