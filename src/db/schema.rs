//! Database Schema
//!
//! SQLite 테이블 스키마 정의

/// 데이터베이스 스키마 생성 SQL
pub const CREATE_SCHEMA: &str = r#"
-- 수집된 개념 테이블
CREATE TABLE IF NOT EXISTS terms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uri TEXT UNIQUE NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- 개념별 수집 사실 테이블
-- original_value는 불변: 원격 리터럴이 바뀌면 새 행으로 들어온다
CREATE TABLE IF NOT EXISTS term_fields (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    term_id INTEGER NOT NULL,
    field_uri TEXT NOT NULL,
    field_term TEXT NOT NULL,
    original_value TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (term_id, field_uri, original_value),
    FOREIGN KEY (term_id) REFERENCES terms(id) ON DELETE CASCADE
);

-- 필드 인덱스
CREATE INDEX IF NOT EXISTS idx_term_fields_term ON term_fields(term_id);
CREATE INDEX IF NOT EXISTS idx_term_fields_field ON term_fields(field_uri);

-- 워크플로우 사용자 테이블
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('translator', 'reviewer', 'admin')),
    created_at INTEGER NOT NULL
);

-- 번역 테이블 (TermField당 언어별 최대 1건)
CREATE TABLE IF NOT EXISTS translations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    term_field_id INTEGER NOT NULL,
    language TEXT NOT NULL CHECK (language IN ('nl', 'fr', 'de', 'es', 'it', 'pt')),
    value TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('draft', 'review', 'approved', 'rejected', 'merged')),
    created_by TEXT NOT NULL,
    reviewed_by TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (term_field_id, language),
    FOREIGN KEY (term_field_id) REFERENCES term_fields(id) ON DELETE CASCADE,
    FOREIGN KEY (created_by) REFERENCES users(id),
    FOREIGN KEY (reviewed_by) REFERENCES users(id)
);

-- 번역 인덱스
CREATE INDEX IF NOT EXISTS idx_translations_field ON translations(term_field_id);
CREATE INDEX IF NOT EXISTS idx_translations_status ON translations(status);

-- 이의 제기 테이블 (수집 파이프라인은 읽기/쓰기 금지)
CREATE TABLE IF NOT EXISTS appeals (
    id TEXT PRIMARY KEY,
    translation_id INTEGER NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('open', 'under_review', 'resolved', 'dismissed')),
    opened_by TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (translation_id) REFERENCES translations(id) ON DELETE CASCADE,
    FOREIGN KEY (opened_by) REFERENCES users(id)
);

-- 이의 제기 메시지 테이블
CREATE TABLE IF NOT EXISTS appeal_messages (
    id TEXT PRIMARY KEY,
    appeal_id TEXT NOT NULL,
    author TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (appeal_id) REFERENCES appeals(id) ON DELETE CASCADE,
    FOREIGN KEY (author) REFERENCES users(id)
);

-- 이의 제기 인덱스
CREATE INDEX IF NOT EXISTS idx_appeals_translation ON appeals(translation_id);
CREATE INDEX IF NOT EXISTS idx_appeal_messages_appeal ON appeal_messages(appeal_id);

-- 수집 실행 이력 테이블 (실행당 1행 append)
CREATE TABLE IF NOT EXISTS harvest_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_uri TEXT NOT NULL,
    harvested_at INTEGER NOT NULL,
    member_count INTEGER NOT NULL,
    terms_inserted INTEGER NOT NULL,
    terms_updated INTEGER NOT NULL,
    fields_inserted INTEGER NOT NULL
);

-- 수집 이력 인덱스
CREATE INDEX IF NOT EXISTS idx_harvest_runs_collection ON harvest_runs(collection_uri);
"#;
