//! SPARQL JSON 응답 타입 정의
//!
//! 엔드포인트의 flat binding 구조만 다룹니다:
//! `{ results: { bindings: [ { var: { value: ... } } ] } }`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::ConceptRecord;
use crate::sparql::CONCEPT_VAR;

/// SPARQL JSON 응답 전체
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparqlResponse {
    #[serde(default)]
    pub results: SparqlResults,
}

/// results 블록
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub bindings: Vec<SparqlBinding>,
}

/// 바인딩 한 줄: 변수명 → 값
pub type SparqlBinding = HashMap<String, BindingValue>;

/// 바인딩 값 하나
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingValue {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl BindingValue {
    /// 리터럴 값 생성 (테스트/픽스처용)
    pub fn literal(value: &str) -> Self {
        Self {
            value_type: Some("literal".to_string()),
            value: value.to_string(),
            lang: None,
        }
    }

    /// URI 값 생성 (테스트/픽스처용)
    pub fn uri(value: &str) -> Self {
        Self {
            value_type: Some("uri".to_string()),
            value: value.to_string(),
            lang: None,
        }
    }
}

impl SparqlResponse {
    /// 바인딩들을 평탄화된 레코드로 변환
    ///
    /// `concept` 변수가 없거나 빈 문자열이면 `concept_uri`는 None으로 남고,
    /// 그 외 변수는 변수명 → 값 맵으로 들어갑니다.
    pub fn into_records(self) -> Vec<ConceptRecord> {
        self.results
            .bindings
            .into_iter()
            .map(|binding| {
                let mut record = ConceptRecord::default();
                for (var, value) in binding {
                    if var == CONCEPT_VAR {
                        if !value.value.is_empty() {
                            record.concept_uri = Some(value.value);
                        }
                    } else {
                        record.values.insert(var, value.value);
                    }
                }
                record
            })
            .collect()
    }
}
