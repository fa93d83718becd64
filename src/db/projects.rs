//! 프로젝트 저장소

use rusqlite::params;

use super::{
    like_pattern, new_id, now_millis, optional, owned_project, project_from_row, required,
    Database, PROJECT_COLUMNS,
};
use crate::error::TransdocError;
use crate::models::{NewProject, Project, ProjectPatch};

impl Database {
    /// 프로젝트 생성
    pub fn create_project(&self, owner_id: &str, input: &NewProject) -> Result<Project, TransdocError> {
        let now = now_millis();
        let project = Project {
            id: new_id(),
            name: required("name", &input.name)?,
            description: optional(input.description.as_deref()),
            source_language: required("sourceLanguage", &input.source_language)?,
            target_language: required("targetLanguage", &input.target_language)?,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO projects (id, name, description, source_language, target_language, owner_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                project.id,
                project.name,
                project.description,
                project.source_language,
                project.target_language,
                project.owner_id,
                project.created_at,
                project.updated_at,
            ],
        )?;

        Ok(project)
    }

    /// 소유 프로젝트 목록 (최신순)
    pub fn list_projects(&self, owner_id: &str) -> Result<Vec<Project>, TransdocError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([owner_id], project_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_project(&self, owner_id: &str, project_id: &str) -> Result<Project, TransdocError> {
        owned_project(&self.conn, owner_id, project_id)
    }

    /// 프로젝트 수정. owner_id는 바뀌지 않는다.
    pub fn update_project(
        &self,
        owner_id: &str,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> Result<Project, TransdocError> {
        let mut project = owned_project(&self.conn, owner_id, project_id)?;

        if let Some(name) = &patch.name {
            project.name = required("name", name)?;
        }
        if let Some(description) = &patch.description {
            project.description = optional(Some(description));
        }
        if let Some(source_language) = &patch.source_language {
            project.source_language = required("sourceLanguage", source_language)?;
        }
        if let Some(target_language) = &patch.target_language {
            project.target_language = required("targetLanguage", target_language)?;
        }
        project.updated_at = now_millis();

        self.conn.execute(
            "UPDATE projects
             SET name = ?1, description = ?2, source_language = ?3, target_language = ?4, updated_at = ?5
             WHERE id = ?6 AND owner_id = ?7",
            params![
                project.name,
                project.description,
                project.source_language,
                project.target_language,
                project.updated_at,
                project.id,
                owner_id,
            ],
        )?;

        Ok(project)
    }

    /// 프로젝트 삭제. 문서/버전/용어 사전은 FK CASCADE로 함께 지워진다.
    pub fn delete_project(&self, owner_id: &str, project_id: &str) -> Result<Project, TransdocError> {
        let tx = self.conn.unchecked_transaction()?;
        let project = owned_project(&tx, owner_id, project_id)?;
        tx.execute(
            "DELETE FROM projects WHERE id = ?1 AND owner_id = ?2",
            [project_id, owner_id],
        )?;
        tx.commit()?;
        Ok(project)
    }

    /// 프로젝트 이름 검색
    pub fn search_projects(&self, owner_id: &str, query: &str) -> Result<Vec<Project>, TransdocError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE owner_id = ?1 AND name LIKE ?2 ESCAPE '\\'
             ORDER BY updated_at DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id, like_pattern(query)], project_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
