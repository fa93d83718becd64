//! 프로젝트 용어 사전 저장소
//!
//! 항목마다 고정 id를 부여하고 id 기준으로 수정/삭제한다. 위치(index) 기준 API도
//! 남아있지만, 조회 후 다른 세션이 항목을 지우면 index가 다른 항목을 가리킬 수 있다.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{new_id, now_millis, optional, owned_project, required, Database};
use crate::error::TransdocError;
use crate::models::{Dictionary, DictionaryEntry, DictionaryEntryInput};

const ENTRY_COLUMNS: &str = "id, source, target, context, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<DictionaryEntry> {
    Ok(DictionaryEntry {
        id: row.get(0)?,
        source: row.get(1)?,
        target: row.get(2)?,
        context: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

struct NormalizedEntry {
    source: String,
    target: String,
    context: Option<String>,
}

fn normalize(input: &DictionaryEntryInput) -> Result<NormalizedEntry, TransdocError> {
    Ok(NormalizedEntry {
        source: required("source", &input.source)?,
        target: required("target", &input.target)?,
        context: optional(input.context.as_deref()),
    })
}

fn touch_dictionary(conn: &Connection, project_id: &str, now: i64) -> Result<(), TransdocError> {
    conn.execute(
        "UPDATE project_dictionaries SET updated_at = ?1 WHERE project_id = ?2",
        params![now, project_id],
    )?;
    Ok(())
}

/// 현재 순서에서 `index`번째 항목의 id
fn entry_id_at(conn: &Connection, project_id: &str, index: i64) -> Result<String, TransdocError> {
    if index < 0 {
        return Err(TransdocError::NotFound("Dictionary entry"));
    }
    conn.query_row(
        "SELECT id FROM dictionary_entries WHERE project_id = ?1
         ORDER BY position LIMIT 1 OFFSET ?2",
        params![project_id, index],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(TransdocError::NotFound("Dictionary entry"))
}

fn update_entry_in(
    conn: &Connection,
    project_id: &str,
    entry_id: &str,
    input: &NormalizedEntry,
) -> Result<DictionaryEntry, TransdocError> {
    let now = now_millis();
    let changed = conn.execute(
        "UPDATE dictionary_entries SET source = ?1, target = ?2, context = ?3, updated_at = ?4
         WHERE id = ?5 AND project_id = ?6",
        params![input.source, input.target, input.context, now, entry_id, project_id],
    )?;
    if changed == 0 {
        return Err(TransdocError::NotFound("Dictionary entry"));
    }
    touch_dictionary(conn, project_id, now)?;

    Ok(conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM dictionary_entries WHERE id = ?1"),
        [entry_id],
        entry_from_row,
    )?)
}

fn remove_entry_in(conn: &Connection, project_id: &str, entry_id: &str) -> Result<(), TransdocError> {
    let removed = conn.execute(
        "DELETE FROM dictionary_entries WHERE id = ?1 AND project_id = ?2",
        [entry_id, project_id],
    )?;
    if removed == 0 {
        return Err(TransdocError::NotFound("Dictionary entry"));
    }
    touch_dictionary(conn, project_id, now_millis())
}

impl Database {
    /// 프로젝트 용어 사전 조회. 아직 없으면 빈 사전.
    pub fn get_dictionary(&self, owner_id: &str, project_id: &str) -> Result<Dictionary, TransdocError> {
        owned_project(&self.conn, owner_id, project_id)?;

        let stamps: Option<(i64, i64)> = self
            .conn
            .query_row(
                "SELECT created_at, updated_at FROM project_dictionaries WHERE project_id = ?1",
                [project_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM dictionary_entries WHERE project_id = ?1 ORDER BY position"
        ))?;
        let entries = stmt
            .query_map([project_id], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dictionary {
            project_id: project_id.to_string(),
            entries,
            created_at: stamps.map(|(created, _)| created),
            updated_at: stamps.map(|(_, updated)| updated),
        })
    }

    /// 항목을 사전 끝에 추가한다 (사전이 없으면 생성)
    pub fn add_dictionary_entry(
        &self,
        owner_id: &str,
        project_id: &str,
        input: &DictionaryEntryInput,
    ) -> Result<DictionaryEntry, TransdocError> {
        let input = normalize(input)?;

        let tx = self.conn.unchecked_transaction()?;
        owned_project(&tx, owner_id, project_id)?;

        let now = now_millis();
        tx.execute(
            "INSERT OR IGNORE INTO project_dictionaries (project_id, created_at, updated_at)
             VALUES (?1, ?2, ?2)",
            params![project_id, now],
        )?;
        touch_dictionary(&tx, project_id, now)?;

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM dictionary_entries WHERE project_id = ?1",
            [project_id],
            |row| row.get(0),
        )?;

        let entry = DictionaryEntry {
            id: new_id(),
            source: input.source,
            target: input.target,
            context: input.context,
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO dictionary_entries (id, project_id, position, source, target, context, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                project_id,
                position,
                entry.source,
                entry.target,
                entry.context,
                entry.created_at,
                entry.updated_at,
            ],
        )?;

        tx.commit()?;
        Ok(entry)
    }

    /// id 기준 수정
    pub fn update_dictionary_entry(
        &self,
        owner_id: &str,
        project_id: &str,
        entry_id: &str,
        input: &DictionaryEntryInput,
    ) -> Result<DictionaryEntry, TransdocError> {
        let input = normalize(input)?;
        let tx = self.conn.unchecked_transaction()?;
        owned_project(&tx, owner_id, project_id)?;
        let entry = update_entry_in(&tx, project_id, entry_id, &input)?;
        tx.commit()?;
        Ok(entry)
    }

    /// id 기준 삭제
    pub fn remove_dictionary_entry(
        &self,
        owner_id: &str,
        project_id: &str,
        entry_id: &str,
    ) -> Result<(), TransdocError> {
        let tx = self.conn.unchecked_transaction()?;
        owned_project(&tx, owner_id, project_id)?;
        remove_entry_in(&tx, project_id, entry_id)?;
        tx.commit()?;
        Ok(())
    }

    /// 위치 기준 수정 (호출 시점의 순서 기준으로 bounds 검사)
    pub fn update_dictionary_entry_at(
        &self,
        owner_id: &str,
        project_id: &str,
        index: i64,
        input: &DictionaryEntryInput,
    ) -> Result<DictionaryEntry, TransdocError> {
        let input = normalize(input)?;
        let tx = self.conn.unchecked_transaction()?;
        owned_project(&tx, owner_id, project_id)?;
        let entry_id = entry_id_at(&tx, project_id, index)?;
        let entry = update_entry_in(&tx, project_id, &entry_id, &input)?;
        tx.commit()?;
        Ok(entry)
    }

    /// 위치 기준 삭제. 뒤 항목들의 index가 하나씩 당겨진다.
    pub fn remove_dictionary_entry_at(
        &self,
        owner_id: &str,
        project_id: &str,
        index: i64,
    ) -> Result<DictionaryEntry, TransdocError> {
        let tx = self.conn.unchecked_transaction()?;
        owned_project(&tx, owner_id, project_id)?;
        let entry_id = entry_id_at(&tx, project_id, index)?;
        let entry = tx.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM dictionary_entries WHERE id = ?1"),
            [&entry_id],
            entry_from_row,
        )?;
        remove_entry_in(&tx, project_id, &entry_id)?;
        tx.commit()?;
        Ok(entry)
    }
}
