//! Harvester Configuration
//!
//! 엔드포인트/필드 매핑/재시도 정책을 불변 설정으로 모아서
//! Fetcher·QueryBuilder·Reconciler 생성 시 주입합니다.
//! (전역 가변 상태 금지 - 테스트에서 가짜 엔드포인트와 축소된
//! 필드 집합으로 대체할 수 있어야 함)

use std::time::Duration;

/// 기본 SPARQL 엔드포인트
pub const DEFAULT_SPARQL_ENDPOINT: &str = "http://vocab.nerc.ac.uk/sparql/";

/// 엔드포인트 오버라이드용 환경변수 (.env 지원)
pub const ENV_SPARQL_ENDPOINT: &str = "HARVESTER_SPARQL_ENDPOINT";

/// 컬렉션 URI에 기대되는 호스트 (불일치는 경고일 뿐, 검증 실패가 아님)
pub const EXPECTED_VOCAB_HOST: &str = "vocab.nerc.ac.uk";

/// 페이지당 기본 멤버 수
pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// SPARQL 변수 ↔ 로컬 필드 매핑 한 건
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// SELECT 절 변수명 (? 제외)
    pub var: String,
    /// 필드 식별자 URI
    pub uri: String,
    /// 사람이 읽는 필드명
    pub label: String,
}

impl FieldSpec {
    pub fn new(var: &str, uri: &str, label: &str) -> Self {
        Self {
            var: var.to_string(),
            uri: uri.to_string(),
            label: label.to_string(),
        }
    }
}

/// SKOS 기본/확장 필드 매핑 테이블
pub fn skos_field_specs(extended: bool) -> Vec<FieldSpec> {
    const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";

    let mut specs = vec![
        FieldSpec::new("prefLabel", &format!("{SKOS}prefLabel"), "preferred label"),
        FieldSpec::new("altLabel", &format!("{SKOS}altLabel"), "alternate label"),
        FieldSpec::new("definition", &format!("{SKOS}definition"), "definition"),
    ];

    if extended {
        specs.push(FieldSpec::new("notation", &format!("{SKOS}notation"), "notation"));
        specs.push(FieldSpec::new("broader", &format!("{SKOS}broader"), "broader concept"));
        specs.push(FieldSpec::new("narrower", &format!("{SKOS}narrower"), "narrower concept"));
        specs.push(FieldSpec::new("related", &format!("{SKOS}related"), "related concept"));
    }

    specs
}

/// 일시 장애 재시도 정책
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 호출당 총 시도 횟수 (마지막 시도 실패 시 RemoteQuery로 승격)
    pub max_retries: u32,
    /// 지수 백오프 기준 지연 (delay = base_delay * 2^attempt)
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// 수집 실행 설정
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub endpoint: String,
    pub expected_host: String,
    pub batch_size: u64,
    pub retry: RetryPolicy,
    pub fields: Vec<FieldSpec>,
}

impl HarvestConfig {
    /// 확장 필드 포함 여부만 지정하는 기본 설정
    pub fn new(extended: bool) -> Self {
        Self {
            endpoint: DEFAULT_SPARQL_ENDPOINT.to_string(),
            expected_host: EXPECTED_VOCAB_HOST.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            fields: skos_field_specs(extended),
        }
    }

    /// 환경변수 오버라이드를 반영한 설정
    pub fn from_env(extended: bool) -> Self {
        let mut config = Self::new(extended);
        if let Ok(v) = std::env::var(ENV_SPARQL_ENDPOINT) {
            if !v.trim().is_empty() {
                config.endpoint = v.trim().to_string();
            }
        }
        config
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_field_specs() {
        let specs = skos_field_specs(false);
        let vars: Vec<&str> = specs.iter().map(|s| s.var.as_str()).collect();
        assert_eq!(vars, ["prefLabel", "altLabel", "definition"]);
    }

    #[test]
    fn test_extended_field_specs() {
        let specs = skos_field_specs(true);
        assert_eq!(specs.len(), 7);
        assert!(specs.iter().any(|s| s.var == "broader"));
        // 필드 URI는 SKOS 네임스페이스를 가리켜야 함
        assert!(specs
            .iter()
            .all(|s| s.uri.starts_with("http://www.w3.org/2004/02/skos/core#")));
    }
}
