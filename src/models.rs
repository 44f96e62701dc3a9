//! Harvester Data Models
//!
//! SQLite 테이블과 매핑되는 Rust 데이터 모델

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 수집된 개념 (로컬 표현)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    pub id: i64,
    pub uri: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

/// 개념에 대해 수집된 사실 하나 (속성 + 원문 리터럴)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermField {
    pub id: i64,
    #[serde(rename = "termId")]
    pub term_id: i64,
    #[serde(rename = "fieldUri")]
    pub field_uri: String,
    #[serde(rename = "fieldTerm")]
    pub field_term: String,
    #[serde(rename = "originalValue")]
    pub original_value: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

/// 번역 대상 언어 (고정 집합)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    Nl,
    Fr,
    De,
    Es,
    It,
    Pt,
}

impl TargetLanguage {
    /// DB 컬럼 값 파싱 (CHECK 제약으로 저장 시점에 이미 검증됨)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nl" => Some(TargetLanguage::Nl),
            "fr" => Some(TargetLanguage::Fr),
            "de" => Some(TargetLanguage::De),
            "es" => Some(TargetLanguage::Es),
            "it" => Some(TargetLanguage::It),
            "pt" => Some(TargetLanguage::Pt),
            _ => None,
        }
    }

    /// DB 컬럼 값
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetLanguage::Nl => "nl",
            TargetLanguage::Fr => "fr",
            TargetLanguage::De => "de",
            TargetLanguage::Es => "es",
            TargetLanguage::It => "it",
            TargetLanguage::Pt => "pt",
        }
    }
}

/// 번역 워크플로우 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Draft,
    Review,
    Approved,
    Rejected,
    Merged,
}

impl TranslationStatus {
    /// DB 컬럼 값 파싱
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(TranslationStatus::Draft),
            "review" => Some(TranslationStatus::Review),
            "approved" => Some(TranslationStatus::Approved),
            "rejected" => Some(TranslationStatus::Rejected),
            "merged" => Some(TranslationStatus::Merged),
            _ => None,
        }
    }

    /// DB 컬럼 값
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationStatus::Draft => "draft",
            TranslationStatus::Review => "review",
            TranslationStatus::Approved => "approved",
            TranslationStatus::Rejected => "rejected",
            TranslationStatus::Merged => "merged",
        }
    }
}

/// TermField 하나에 대한 사람 번역
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub id: i64,
    #[serde(rename = "termFieldId")]
    pub term_field_id: i64,
    pub language: TargetLanguage,
    pub value: String,
    pub status: TranslationStatus,
    #[serde(rename = "createdBy")]
    pub created_by: String,
    #[serde(rename = "reviewedBy")]
    pub reviewed_by: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

/// SPARQL 결과 바인딩 한 줄을 평탄화한 레코드
///
/// `concept_uri`가 비어 있으면 해당 레코드는 스킵 대상입니다.
/// `values`는 변수명 → 리터럴 값 맵이며, OPTIONAL 절에 바인딩이 없던
/// 속성은 키 자체가 존재하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct ConceptRecord {
    pub concept_uri: Option<String>,
    pub values: HashMap<String, String>,
}

impl ConceptRecord {
    /// 변수명으로 속성 값 조회
    pub fn value(&self, var: &str) -> Option<&str> {
        self.values.get(var).map(|s| s.as_str())
    }
}

/// 레코드/페이지 단위 반영 결과 카운트
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileCounts {
    pub terms_inserted: u32,
    pub terms_updated: u32,
    pub fields_inserted: u32,
}

impl ReconcileCounts {
    /// 다른 카운트를 누적
    pub fn merge(&mut self, other: ReconcileCounts) {
        self.terms_inserted += other.terms_inserted;
        self.terms_updated += other.terms_updated;
        self.fields_inserted += other.fields_inserted;
    }
}

/// 전체 수집 실행 요약
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestSummary {
    pub collection_uri: String,
    pub member_count: u64,
    pub pages_committed: u32,
    pub terms_inserted: u32,
    pub terms_updated: u32,
    pub fields_inserted: u32,
}
