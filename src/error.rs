//! Harvester Error Types
//!
//! 수집 파이프라인 전역 에러 타입 정의

use thiserror::Error;

/// 수집 파이프라인 에러
#[derive(Error, Debug)]
pub enum HarvestError {
    /// 컬렉션 URI가 절대 http(s) 형식이 아닌 경우
    #[error("Invalid collection URI: {0}")]
    InvalidInput(String),

    /// 재시도 소진 후의 전송 실패, 또는 기대한 바인딩이 없는 응답
    #[error("SPARQL query failed: {0}")]
    RemoteQuery(String),

    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HarvestError {
    /// 운영자용 에러 코드 (exit 직전 진단 라인에 사용)
    pub fn code(&self) -> &'static str {
        match self {
            HarvestError::InvalidInput(_) => "INVALID_INPUT",
            HarvestError::RemoteQuery(_) => "REMOTE_QUERY_ERROR",
            HarvestError::Store(_) => "DB_ERROR",
            HarvestError::Io(_) | HarvestError::Serialization(_) => "UNCLASSIFIED",
        }
    }

    /// 분류되지 않은 에러인지 (진단 시 debug 상세를 함께 출력)
    pub fn is_unclassified(&self) -> bool {
        matches!(self, HarvestError::Io(_) | HarvestError::Serialization(_))
    }
}

/// 수집 파이프라인 결과 타입
pub type HarvestResult<T> = Result<T, HarvestError>;
