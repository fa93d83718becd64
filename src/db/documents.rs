//! 문서 저장소

use rusqlite::{params, OptionalExtension};

use super::{
    document_from_row, like_pattern, new_id, now_millis, owned_document, owned_project, required,
    version_from_row, Database, DOCUMENT_COLUMNS, VERSION_COLUMNS,
};
use crate::error::TransdocError;
use crate::models::{Document, DocumentPatch, DocumentWithVersion, NewDocument};

impl Database {
    /// 문서 생성. 내용이 있으면 같은 트랜잭션에서 버전 1을 만들고 현재 버전으로 지정한다.
    pub fn create_document(
        &self,
        owner_id: &str,
        project_id: &str,
        input: &NewDocument,
    ) -> Result<Document, TransdocError> {
        let title = required("title", &input.title)?;

        let tx = self.conn.unchecked_transaction()?;
        owned_project(&tx, owner_id, project_id)?;

        let now = now_millis();
        let mut document = Document {
            id: new_id(),
            title,
            project_id: project_id.to_string(),
            owner_id: owner_id.to_string(),
            current_version_id: None,
            created_at: now,
            updated_at: now,
        };

        tx.execute(
            "INSERT INTO documents (id, title, project_id, owner_id, current_version_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)",
            params![
                document.id,
                document.title,
                document.project_id,
                document.owner_id,
                document.created_at,
                document.updated_at,
            ],
        )?;

        if let Some(content) = input.content.as_deref().filter(|c| !c.is_empty()) {
            let version_id = new_id();
            tx.execute(
                "INSERT INTO document_versions (id, document_id, content, version_number, created_at, created_by)
                 VALUES (?1, ?2, ?3, 1, ?4, ?5)",
                params![version_id, document.id, content, now, owner_id],
            )?;
            tx.execute(
                "UPDATE documents SET current_version_id = ?1 WHERE id = ?2",
                [&version_id, &document.id],
            )?;
            document.current_version_id = Some(version_id);
        }

        tx.commit()?;
        Ok(document)
    }

    /// 프로젝트의 문서 목록 (최신순). 소유하지 않은 프로젝트는 빈 목록.
    pub fn list_documents(&self, owner_id: &str, project_id: &str) -> Result<Vec<Document>, TransdocError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE project_id = ?1 AND owner_id = ?2
               AND EXISTS (SELECT 1 FROM projects p WHERE p.id = ?1 AND p.owner_id = ?2)
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([project_id, owner_id], |row| document_from_row(row, 0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 문서 + 현재 버전 조회
    pub fn get_document(&self, owner_id: &str, document_id: &str) -> Result<DocumentWithVersion, TransdocError> {
        let document = owned_document(&self.conn, owner_id, document_id)?;

        let current_version = match &document.current_version_id {
            Some(version_id) => self
                .conn
                .query_row(
                    &format!("SELECT {VERSION_COLUMNS} FROM document_versions WHERE id = ?1"),
                    [version_id],
                    version_from_row,
                )
                .optional()?,
            None => None,
        };

        Ok(DocumentWithVersion {
            document,
            current_version,
        })
    }

    pub fn update_document(
        &self,
        owner_id: &str,
        document_id: &str,
        patch: &DocumentPatch,
    ) -> Result<Document, TransdocError> {
        let mut document = owned_document(&self.conn, owner_id, document_id)?;

        if let Some(title) = &patch.title {
            document.title = required("title", title)?;
        }
        document.updated_at = now_millis();

        self.conn.execute(
            "UPDATE documents SET title = ?1, updated_at = ?2 WHERE id = ?3 AND owner_id = ?4",
            params![document.title, document.updated_at, document.id, owner_id],
        )?;

        Ok(document)
    }

    /// 문서 삭제. 버전 전체 삭제 후 문서 삭제를 하나의 트랜잭션으로 처리한다.
    pub fn delete_document(&self, owner_id: &str, document_id: &str) -> Result<Document, TransdocError> {
        let tx = self.conn.unchecked_transaction()?;
        let document = owned_document(&tx, owner_id, document_id)?;

        let removed = tx.execute(
            "DELETE FROM document_versions WHERE document_id = ?1",
            [document_id],
        )?;
        tx.execute("DELETE FROM documents WHERE id = ?1", [document_id])?;
        tx.commit()?;

        tracing::debug!(document_id, versions = removed, "document versions removed");
        Ok(document)
    }

    /// 문서 제목 검색 (프로젝트 필터 선택)
    pub fn search_documents(
        &self,
        owner_id: &str,
        query: &str,
        project_id: Option<&str>,
    ) -> Result<Vec<Document>, TransdocError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE owner_id = ?1 AND title LIKE ?2 ESCAPE '\\'
               AND (?3 IS NULL OR project_id = ?3)
             ORDER BY updated_at DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id, like_pattern(query), project_id], |row| {
            document_from_row(row, 0)
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
