//! SPARQL Query Builder
//!
//! 컬렉션 멤버 카운트/페이지 조회 쿼리 텍스트를 생성합니다.
//! 페이지 쿼리는 ?concept 기준 정렬이 고정되어 있어, 원격 데이터가
//! 변하지 않는 한 LIMIT/OFFSET 페이징이 겹침·누락 없는 분할이 됩니다.

use std::fmt::Write as _;

use url::Url;

use crate::config::FieldSpec;
use crate::error::{HarvestError, HarvestResult};

const SKOS_PREFIX: &str = "PREFIX skos: <http://www.w3.org/2004/02/skos/core#>";

/// 컬렉션 URI 검증 - 절대 http(s) URI에 호스트가 있어야 함
pub fn validate_collection_uri(uri: &str) -> HarvestResult<()> {
    let parsed = Url::parse(uri)
        .map_err(|e| HarvestError::InvalidInput(format!("{uri} ({e})")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(HarvestError::InvalidInput(format!(
                "{uri} (scheme '{other}' is not http/https)"
            )));
        }
    }

    if parsed.host_str().is_none() {
        return Err(HarvestError::InvalidInput(format!("{uri} (missing host)")));
    }

    Ok(())
}

/// 기대 호스트 불일치 경고 메시지
///
/// 검증 실패가 아니라 advisory입니다 - 형식이 올바른 다른 호스트의
/// URI는 그대로 통과시키되, 호출자가 경고만 출력합니다.
pub fn host_warning(uri: &str, expected_host: &str) -> Option<String> {
    if uri.contains(expected_host) {
        None
    } else {
        Some(format!(
            "Collection URI does not contain '{expected_host}': {uri}"
        ))
    }
}

/// 쿼리 생성기
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    fields: Vec<FieldSpec>,
}

impl QueryBuilder {
    pub fn new(fields: &[FieldSpec]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }

    /// 컬렉션의 distinct 멤버 수를 세는 쿼리
    pub fn build_count_query(&self, collection_uri: &str) -> HarvestResult<String> {
        validate_collection_uri(collection_uri)?;

        Ok(format!(
            "{SKOS_PREFIX}\n\n\
             SELECT (COUNT(DISTINCT ?concept) AS ?count)\n\
             WHERE {{\n\
             \x20   ?concept skos:inScheme <{collection_uri}> .\n\
             }}\n"
        ))
    }

    /// 멤버 한 페이지를 속성과 함께 가져오는 쿼리
    ///
    /// OPTIONAL 속성은 설정의 필드 매핑 테이블을 따릅니다.
    pub fn build_page_query(
        &self,
        collection_uri: &str,
        limit: u64,
        offset: u64,
    ) -> HarvestResult<String> {
        validate_collection_uri(collection_uri)?;

        let mut query = String::new();
        let _ = write!(query, "{SKOS_PREFIX}\n\nSELECT DISTINCT ?concept");
        for field in &self.fields {
            let _ = write!(query, " ?{}", field.var);
        }

        let _ = write!(
            query,
            "\nWHERE {{\n    ?concept skos:inScheme <{collection_uri}> .\n"
        );
        for field in &self.fields {
            let _ = write!(
                query,
                "    OPTIONAL {{ ?concept <{}> ?{} }}\n",
                field.uri, field.var
            );
        }

        let _ = write!(
            query,
            "}}\nORDER BY ?concept\nLIMIT {limit}\nOFFSET {offset}\n"
        );

        Ok(query)
    }
}
