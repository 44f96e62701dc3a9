//! SPARQL Remote Fetcher
//!
//! 엔드포인트에 쿼리를 전송하고, 게이트웨이류 일시 장애에 대해
//! 지수 백오프로 재시도합니다. 전송 계층은 trait로 분리되어 있어
//! 테스트에서 실제 네트워크 없이 합성 장애를 주입할 수 있습니다.

use reqwest::StatusCode;

use crate::config::{FieldSpec, RetryPolicy};
use crate::error::{HarvestError, HarvestResult};
use crate::models::ConceptRecord;
use crate::sparql::query::QueryBuilder;
use crate::sparql::types::SparqlResponse;

/// 전송 계층 실패
#[derive(Debug, Clone)]
pub struct TransportError {
    pub message: String,
    /// 일시 장애 여부 - true면 재시도 대상
    pub transient: bool,
}

impl TransportError {
    pub fn transient(message: String) -> Self {
        Self { message, transient: true }
    }

    pub fn permanent(message: String) -> Self {
        Self { message, transient: false }
    }
}

/// 쿼리 전송 계층
pub trait Transport {
    fn execute(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<SparqlResponse, TransportError>> + Send;
}

/// 게이트웨이/프록시류 일시 장애 판별
///
/// 502 계열만 재시도합니다. 4xx·연결 거부·파싱 실패는 즉시 실패.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// reqwest 기반 실제 전송 계층
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, query: &str) -> Result<SparqlResponse, TransportError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("query", query)])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await
            .map_err(|e| TransportError::permanent(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = format!("endpoint returned {}: {}", status.as_u16(), body);
            return if is_transient_status(status) {
                Err(TransportError::transient(message))
            } else {
                Err(TransportError::permanent(message))
            };
        }

        resp.json::<SparqlResponse>()
            .await
            .map_err(|e| TransportError::permanent(format!("malformed response body: {e}")))
    }
}

/// 원격 Fetcher
///
/// 호출 한 번이 자기만의 재시도 예산을 가집니다 - 페이지 간에
/// 백오프 카운터가 공유되거나 리셋되지 않습니다.
pub struct SparqlFetcher<T: Transport> {
    transport: T,
    retry: RetryPolicy,
    queries: QueryBuilder,
}

impl<T: Transport> SparqlFetcher<T> {
    pub fn new(transport: T, retry: RetryPolicy, fields: &[FieldSpec]) -> Self {
        Self {
            transport,
            retry,
            queries: QueryBuilder::new(fields),
        }
    }

    /// 컬렉션의 distinct 멤버 수 조회
    pub async fn count_members(&self, collection_uri: &str) -> HarvestResult<u64> {
        let query = self.queries.build_count_query(collection_uri)?;
        let resp = self.execute_with_retry(&query).await?;

        let binding = resp
            .results
            .bindings
            .first()
            .ok_or_else(|| HarvestError::RemoteQuery("count query returned no bindings".to_string()))?;
        let value = binding
            .get("count")
            .ok_or_else(|| HarvestError::RemoteQuery("count binding missing from response".to_string()))?;

        value.value.parse::<u64>().map_err(|_| {
            HarvestError::RemoteQuery(format!("count is not an integer: '{}'", value.value))
        })
    }

    /// 멤버 한 페이지 조회
    pub async fn fetch_page(
        &self,
        collection_uri: &str,
        limit: u64,
        offset: u64,
    ) -> HarvestResult<Vec<ConceptRecord>> {
        let query = self.queries.build_page_query(collection_uri, limit, offset)?;
        let resp = self.execute_with_retry(&query).await?;
        Ok(resp.into_records())
    }

    /// 재시도 루프
    ///
    /// 일시 장애는 max_retries - 1번까지 재시도하고, 마지막 시도 실패는
    /// RemoteQuery로 승격합니다. 영구 장애는 즉시 실패합니다.
    async fn execute_with_retry(&self, query: &str) -> HarvestResult<SparqlResponse> {
        let mut attempt = 0u32;
        loop {
            match self.transport.execute(query).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.transient && attempt + 1 < self.retry.max_retries => {
                    // Exponential backoff: base, base*2, base*4 ...
                    let delay = self.retry.base_delay * (1u32 << attempt);
                    println!(
                        "[SPARQL] Transient failure (attempt {}): {}. Retrying in {:?}...",
                        attempt + 1,
                        e.message,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.transient => {
                    return Err(HarvestError::RemoteQuery(format!(
                        "giving up after {} attempts: {}",
                        attempt + 1,
                        e.message
                    )));
                }
                Err(e) => return Err(HarvestError::RemoteQuery(e.message)),
            }
        }
    }
}
