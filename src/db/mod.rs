//! Database Module
//!
//! SQLite 데이터베이스 관리
//!
//! 수집 파이프라인은 terms / term_fields / harvest_runs에만 씁니다.
//! translations / appeals / users는 다운스트림 번역 워크플로우 소유이며,
//! 여기서는 워크플로우 측 최소 표면(사용자 등록, 번역 초안 추가)만 노출합니다.

mod schema;

use std::path::Path;

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Transaction};
use uuid::Uuid;

use crate::error::HarvestResult;
use crate::models::{
    HarvestSummary, TargetLanguage, Term, TermField, Translation, TranslationStatus,
};

/// 데이터베이스 래퍼
pub struct Database {
    conn: Connection,
}

impl Database {
    /// 새 데이터베이스 연결 생성
    pub fn new(path: &Path) -> HarvestResult<Self> {
        let conn = Connection::open(path)?;
        // SQLite는 FK 강제가 기본 off - 연결마다 켜야 CASCADE가 동작함
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    /// 데이터베이스 스키마 초기화
    pub fn initialize(&self) -> HarvestResult<()> {
        self.conn.execute_batch(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    /// 페이지 단위 쓰기 트랜잭션 시작
    ///
    /// 한 페이지의 반영은 전부 커밋되거나 전부 버려집니다.
    pub fn page_writer(&self) -> HarvestResult<PageWriter<'_>> {
        Ok(PageWriter {
            tx: self.conn.unchecked_transaction()?,
        })
    }

    /// 저장된 Term 수
    pub fn term_count(&self) -> HarvestResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM terms", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// 저장된 TermField 수
    pub fn term_field_count(&self) -> HarvestResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM term_fields", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// URI로 Term 조회
    pub fn term_by_uri(&self, uri: &str) -> HarvestResult<Option<Term>> {
        let term = self
            .conn
            .query_row(
                "SELECT id, uri, created_at, updated_at FROM terms WHERE uri = ?1",
                [uri],
                |row| {
                    Ok(Term {
                        id: row.get(0)?,
                        uri: row.get(1)?,
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(term)
    }

    /// Term에 저장된 필드 목록 (field_uri, original_value 순 정렬)
    pub fn fields_for_term(&self, term_id: i64) -> HarvestResult<Vec<TermField>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, term_id, field_uri, field_term, original_value, created_at
             FROM term_fields WHERE term_id = ?1 ORDER BY field_uri, original_value",
        )?;

        let iter = stmt.query_map([term_id], |row| {
            Ok(TermField {
                id: row.get(0)?,
                term_id: row.get(1)?,
                field_uri: row.get(2)?,
                field_term: row.get(3)?,
                original_value: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut out = Vec::new();
        for field in iter {
            out.push(field?);
        }
        Ok(out)
    }

    /// 완료된 수집 실행을 이력 테이블에 기록
    pub fn record_harvest_run(&self, summary: &HarvestSummary) -> HarvestResult<()> {
        self.conn.execute(
            "INSERT INTO harvest_runs
             (collection_uri, harvested_at, member_count, terms_inserted, terms_updated, fields_inserted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &summary.collection_uri,
                Utc::now().timestamp_millis(),
                summary.member_count as i64,
                summary.terms_inserted,
                summary.terms_updated,
                summary.fields_inserted,
            ),
        )?;
        Ok(())
    }

    /// 기록된 수집 실행 수
    pub fn harvest_run_count(&self) -> HarvestResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM harvest_runs", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    // ---- 워크플로우 측 표면 (수집 파이프라인은 호출하지 않음) ----

    /// 워크플로우 사용자 등록, id 반환 (email 기준 upsert)
    pub fn upsert_user(&self, name: &str, email: &str, role: &str) -> HarvestResult<String> {
        let existing: Option<String> = self
            .conn
            .query_row("SELECT id FROM users WHERE email = ?1", [email], |row| row.get(0))
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO users (id, name, email, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            (&id, name, email, role, Utc::now().timestamp_millis()),
        )?;
        Ok(id)
    }

    /// 번역 초안 추가, id 반환
    ///
    /// (term_field_id, language) 중복이면 UNIQUE 제약 위반으로 실패합니다.
    pub fn insert_translation(
        &self,
        term_field_id: i64,
        language: TargetLanguage,
        value: &str,
        created_by: &str,
    ) -> HarvestResult<i64> {
        let now = Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO translations
             (term_field_id, language, value, status, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            (
                term_field_id,
                language.as_str(),
                value,
                TranslationStatus::Draft.as_str(),
                created_by,
                now,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// TermField에 달린 번역 목록
    pub fn translations_for_field(&self, term_field_id: i64) -> HarvestResult<Vec<Translation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, term_field_id, language, value, status, created_by, reviewed_by,
                    created_at, updated_at
             FROM translations WHERE term_field_id = ?1 ORDER BY language",
        )?;

        let iter = stmt.query_map([term_field_id], |row| {
            let language: String = row.get(2)?;
            let status: String = row.get(4)?;
            Ok(Translation {
                id: row.get(0)?,
                term_field_id: row.get(1)?,
                language: TargetLanguage::parse(&language).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        Type::Text,
                        format!("unknown language: {language}").into(),
                    )
                })?,
                value: row.get(3)?,
                status: TranslationStatus::parse(&status).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        Type::Text,
                        format!("unknown status: {status}").into(),
                    )
                })?,
                created_by: row.get(5)?,
                reviewed_by: row.get(6)?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
            })
        })?;

        let mut out = Vec::new();
        for translation in iter {
            out.push(translation?);
        }
        Ok(out)
    }
}

/// 페이지 하나의 쓰기 트랜잭션
///
/// Reconciler가 사용하는 저장 프리미티브를 담습니다.
/// commit 없이 drop되면 페이지 전체가 롤백됩니다.
pub struct PageWriter<'conn> {
    tx: Transaction<'conn>,
}

impl PageWriter<'_> {
    /// Term insert-or-get-id 프리미티브
    ///
    /// 반환: (term id, 새로 삽입되었는지). 기존 행이면 updated_at만 갱신하고
    /// uri는 절대 바꾸지 않습니다.
    pub fn insert_or_get_term(&self, uri: &str, now: i64) -> HarvestResult<(i64, bool)> {
        let existing: Option<i64> = self
            .tx
            .query_row("SELECT id FROM terms WHERE uri = ?1", [uri], |row| row.get(0))
            .optional()?;

        match existing {
            Some(id) => {
                self.tx
                    .execute("UPDATE terms SET updated_at = ?1 WHERE id = ?2", (now, id))?;
                Ok((id, false))
            }
            None => {
                self.tx.execute(
                    "INSERT INTO terms (uri, created_at, updated_at) VALUES (?1, ?2, ?2)",
                    (uri, now),
                )?;
                Ok((self.tx.last_insert_rowid(), true))
            }
        }
    }

    /// TermField 삽입 시도
    ///
    /// 동일한 (term, field_uri, original_value) 사실이 이미 있으면 no-op이며
    /// false를 반환합니다. 기존 행과 거기 달린 번역은 건드리지 않습니다.
    pub fn insert_term_field(
        &self,
        term_id: i64,
        field_uri: &str,
        field_term: &str,
        original_value: &str,
        now: i64,
    ) -> HarvestResult<bool> {
        let changed = self.tx.execute(
            "INSERT OR IGNORE INTO term_fields
             (term_id, field_uri, field_term, original_value, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (term_id, field_uri, field_term, original_value, now),
        )?;
        Ok(changed == 1)
    }

    /// 페이지 커밋
    pub fn commit(self) -> HarvestResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_test_db(dir: &tempfile::TempDir) -> Database {
        let db = Database::new(&dir.path().join("test.db")).unwrap();
        db.initialize().unwrap();
        db
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);
        // CREATE TABLE IF NOT EXISTS이므로 재초기화는 안전해야 함
        db.initialize().unwrap();
        assert_eq!(db.term_count().unwrap(), 0);
    }

    #[test]
    fn test_insert_or_get_term() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let writer = db.page_writer().unwrap();
        let (id, created) = writer.insert_or_get_term("https://example.org/c/1", 1000).unwrap();
        assert!(created);

        // 같은 URI 재삽입: 같은 id, created=false, updated_at만 갱신
        let (id2, created2) = writer.insert_or_get_term("https://example.org/c/1", 2000).unwrap();
        assert_eq!(id, id2);
        assert!(!created2);
        writer.commit().unwrap();

        let term = db.term_by_uri("https://example.org/c/1").unwrap().unwrap();
        assert_eq!(term.id, id);
        assert_eq!(term.created_at, 1000);
        assert_eq!(term.updated_at, 2000);
    }

    #[test]
    fn test_duplicate_fact_is_noop() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let writer = db.page_writer().unwrap();
        let (term_id, _) = writer.insert_or_get_term("https://example.org/c/1", 1000).unwrap();

        let skos_pref = "http://www.w3.org/2004/02/skos/core#prefLabel";
        assert!(writer
            .insert_term_field(term_id, skos_pref, "preferred label", "Foo", 1000)
            .unwrap());
        // 동일 사실 재삽입은 에러 없이 false
        assert!(!writer
            .insert_term_field(term_id, skos_pref, "preferred label", "Foo", 2000)
            .unwrap());
        writer.commit().unwrap();

        assert_eq!(db.term_field_count().unwrap(), 1);
    }

    #[test]
    fn test_changed_literal_is_new_fact() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let writer = db.page_writer().unwrap();
        let (term_id, _) = writer.insert_or_get_term("https://example.org/c/1", 1000).unwrap();

        let skos_pref = "http://www.w3.org/2004/02/skos/core#prefLabel";
        writer
            .insert_term_field(term_id, skos_pref, "preferred label", "Foo", 1000)
            .unwrap();
        // 원격 리터럴이 바뀌면 기존 행 덮어쓰기가 아니라 새 행
        assert!(writer
            .insert_term_field(term_id, skos_pref, "preferred label", "Bar", 2000)
            .unwrap());
        writer.commit().unwrap();

        let fields = db.fields_for_term(term_id).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().any(|f| f.original_value == "Foo"));
        assert!(fields.iter().any(|f| f.original_value == "Bar"));
    }

    #[test]
    fn test_translation_unique_per_field_and_language() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let writer = db.page_writer().unwrap();
        let (term_id, _) = writer.insert_or_get_term("https://example.org/c/1", 1000).unwrap();
        writer
            .insert_term_field(term_id, "f", "field", "Foo", 1000)
            .unwrap();
        writer.commit().unwrap();

        let field_id = db.fields_for_term(term_id).unwrap()[0].id;
        let user = db.upsert_user("Ana", "ana@example.org", "translator").unwrap();

        db.insert_translation(field_id, TargetLanguage::Nl, "Foe", &user).unwrap();
        // (field, language) 쌍은 최대 1건
        assert!(db
            .insert_translation(field_id, TargetLanguage::Nl, "Foei", &user)
            .is_err());
        // 다른 언어는 허용
        db.insert_translation(field_id, TargetLanguage::De, "Fuu", &user).unwrap();

        let translations = db.translations_for_field(field_id).unwrap();
        assert_eq!(translations.len(), 2);
        assert_eq!(translations[0].status, TranslationStatus::Draft);
    }

    #[test]
    fn test_cascade_from_term_to_translations() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let writer = db.page_writer().unwrap();
        let (term_id, _) = writer.insert_or_get_term("https://example.org/c/1", 1000).unwrap();
        writer
            .insert_term_field(term_id, "f", "field", "Foo", 1000)
            .unwrap();
        writer.commit().unwrap();

        let field_id = db.fields_for_term(term_id).unwrap()[0].id;
        let user = db.upsert_user("Ana", "ana@example.org", "translator").unwrap();
        db.insert_translation(field_id, TargetLanguage::Fr, "Fou", &user).unwrap();

        // Term 삭제 시 필드와 번역까지 연쇄 삭제 (스키마 무결성 확인용 -
        // 수집 파이프라인 자체는 삭제를 수행하지 않음)
        db.conn.execute("DELETE FROM terms WHERE id = ?1", [term_id]).unwrap();
        assert_eq!(db.term_field_count().unwrap(), 0);
        let n: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_record_harvest_run_appends_history() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let summary = crate::models::HarvestSummary {
            collection_uri: "https://example.org/collection/".to_string(),
            member_count: 10,
            pages_committed: 1,
            terms_inserted: 10,
            terms_updated: 0,
            fields_inserted: 12,
        };
        db.record_harvest_run(&summary).unwrap();
        db.record_harvest_run(&summary).unwrap();

        // 실행당 1행 append (upsert 아님)
        assert_eq!(db.harvest_run_count().unwrap(), 2);
    }

    #[test]
    fn test_dropped_page_writer_rolls_back() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        {
            let writer = db.page_writer().unwrap();
            writer.insert_or_get_term("https://example.org/c/1", 1000).unwrap();
            // commit 없이 drop
        }

        assert_eq!(db.term_count().unwrap(), 0);
    }
}
