//! Pipeline Driver
//!
//! 수집 실행 오케스트레이션: 검증 → 카운트 → 페이지 루프 → 요약.
//! 페이지 하나가 완전히 fetch·반영·커밋된 뒤에야 다음 페이지를
//! 시작합니다. 뒤 페이지가 실패해도 이미 커밋된 앞 페이지는
//! 롤백하지 않으며, 복구 경로는 재실행입니다 (반영이 멱등이라 안전).

use crate::config::HarvestConfig;
use crate::db::Database;
use crate::error::HarvestResult;
use crate::harvest::reconciler::Reconciler;
use crate::models::{HarvestSummary, ReconcileCounts};
use crate::sparql::client::{SparqlFetcher, Transport};
use crate::sparql::query::{host_warning, validate_collection_uri};

/// 수집 실행기
pub struct Harvester<T: Transport> {
    config: HarvestConfig,
    fetcher: SparqlFetcher<T>,
    reconciler: Reconciler,
}

impl<T: Transport> Harvester<T> {
    pub fn new(config: HarvestConfig, transport: T) -> Self {
        let fetcher = SparqlFetcher::new(transport, config.retry, &config.fields);
        let reconciler = Reconciler::new(&config.fields);
        Self {
            config,
            fetcher,
            reconciler,
        }
    }

    /// 전체 수집 실행
    pub async fn run(&self, collection_uri: &str, db: &Database) -> HarvestResult<HarvestSummary> {
        // 검증 - 실패하면 아무것도 건드리지 않고 종료
        validate_collection_uri(collection_uri)?;
        if let Some(warning) = host_warning(collection_uri, &self.config.expected_host) {
            eprintln!("[HARVEST] Warning: {warning}");
        }

        // 멤버 카운트
        let member_count = self.fetcher.count_members(collection_uri).await?;
        println!("[HARVEST] Collection {collection_uri}: {member_count} members");

        // 페이지 루프: [offset, offset+batch)가 [0, member_count)를 빈틈·겹침 없이 덮음
        let batch_size = self.config.batch_size.max(1);
        let mut totals = ReconcileCounts::default();
        let mut pages_committed = 0u32;
        let mut offset = 0u64;
        while offset < member_count {
            let records = self
                .fetcher
                .fetch_page(collection_uri, batch_size, offset)
                .await?;

            let writer = db.page_writer()?;
            let counts = self.reconciler.reconcile_page(&writer, &records)?;
            writer.commit()?;

            println!(
                "[HARVEST] Page at offset {offset}: {} records, +{} terms, +{} fields",
                records.len(),
                counts.terms_inserted,
                counts.fields_inserted
            );

            totals.merge(counts);
            pages_committed += 1;
            offset += batch_size;
        }

        let summary = HarvestSummary {
            collection_uri: collection_uri.to_string(),
            member_count,
            pages_committed,
            terms_inserted: totals.terms_inserted,
            terms_updated: totals.terms_updated,
            fields_inserted: totals.fields_inserted,
        };
        db.record_harvest_run(&summary)?;

        println!(
            "[HARVEST] Done: {} terms inserted, {} updated, {} fields inserted over {} page(s)",
            summary.terms_inserted, summary.terms_updated, summary.fields_inserted, summary.pages_committed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tempfile::tempdir;

    use crate::config::{skos_field_specs, HarvestConfig, RetryPolicy};
    use crate::models::TargetLanguage;
    use crate::sparql::client::TransportError;
    use crate::sparql::types::{BindingValue, SparqlBinding, SparqlResponse, SparqlResults};

    const COLLECTION: &str = "http://vocab.nerc.ac.uk/collection/P07/current/";

    /// 정렬된 가짜 데이터셋을 LIMIT/OFFSET 규약대로 서빙하는 전송 계층
    struct FakeDataset {
        concepts: Vec<(String, Vec<(String, String)>)>,
        fail_at_offset: Option<u64>,
        offsets: Arc<Mutex<Vec<u64>>>,
    }

    impl FakeDataset {
        fn new(concepts: Vec<(String, Vec<(String, String)>)>) -> Self {
            Self {
                concepts,
                fail_at_offset: None,
                offsets: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn of_size(n: usize) -> Self {
            Self::new(
                (0..n)
                    .map(|i| {
                        (
                            format!("https://example.org/c/{i:05}"),
                            vec![("prefLabel".to_string(), format!("Concept {i}"))],
                        )
                    })
                    .collect(),
            )
        }
    }

    fn parse_clause(query: &str, keyword: &str) -> Option<u64> {
        query
            .lines()
            .find_map(|line| line.trim().strip_prefix(keyword))
            .and_then(|rest| rest.trim().parse().ok())
    }

    impl Transport for FakeDataset {
        async fn execute(&self, query: &str) -> Result<SparqlResponse, TransportError> {
            if query.contains("COUNT(") {
                let mut binding = SparqlBinding::new();
                binding.insert(
                    "count".to_string(),
                    BindingValue::literal(&self.concepts.len().to_string()),
                );
                return Ok(SparqlResponse {
                    results: SparqlResults { bindings: vec![binding] },
                });
            }

            let limit = parse_clause(query, "LIMIT").expect("page query without LIMIT");
            let offset = parse_clause(query, "OFFSET").expect("page query without OFFSET");
            self.offsets.lock().unwrap().push(offset);

            if self.fail_at_offset == Some(offset) {
                return Err(TransportError::permanent("400 malformed query".to_string()));
            }

            let start = (offset as usize).min(self.concepts.len());
            let end = (start + limit as usize).min(self.concepts.len());
            let bindings = self.concepts[start..end]
                .iter()
                .map(|(uri, attrs)| {
                    let mut binding = SparqlBinding::new();
                    binding.insert("concept".to_string(), BindingValue::uri(uri));
                    for (var, value) in attrs {
                        binding.insert(var.clone(), BindingValue::literal(value));
                    }
                    binding
                })
                .collect();

            Ok(SparqlResponse {
                results: SparqlResults { bindings },
            })
        }
    }

    fn test_config(batch_size: u64) -> HarvestConfig {
        HarvestConfig {
            endpoint: "http://localhost/unused".to_string(),
            expected_host: "vocab.nerc.ac.uk".to_string(),
            batch_size,
            retry: RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(1),
            },
            fields: skos_field_specs(false),
        }
    }

    fn open_test_db(dir: &tempfile::TempDir) -> Database {
        let db = Database::new(&dir.path().join("test.db")).unwrap();
        db.initialize().unwrap();
        db
    }

    #[tokio::test]
    async fn test_pages_partition_the_collection() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let dataset = FakeDataset::of_size(2500);
        let offsets = dataset.offsets.clone();
        let harvester = Harvester::new(test_config(1000), dataset);

        let summary = harvester.run(COLLECTION, &db).await.unwrap();

        // 오프셋이 [0, 2500)을 빈틈·겹침 없이 덮어야 함
        assert_eq!(*offsets.lock().unwrap(), vec![0, 1000, 2000]);
        assert_eq!(summary.member_count, 2500);
        assert_eq!(summary.pages_committed, 3);
        assert_eq!(summary.terms_inserted, 2500);
        assert_eq!(db.term_count().unwrap(), 2500);
        assert_eq!(db.term_field_count().unwrap(), 2500);
    }

    #[tokio::test]
    async fn test_small_collection_is_a_single_page() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let dataset = FakeDataset::of_size(2);
        let offsets = dataset.offsets.clone();
        let harvester = Harvester::new(test_config(1000), dataset);

        let summary = harvester.run(COLLECTION, &db).await.unwrap();
        assert_eq!(*offsets.lock().unwrap(), vec![0]);
        assert_eq!(summary.pages_committed, 1);
        assert_eq!(summary.terms_inserted, 2);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let harvester = Harvester::new(test_config(1000), FakeDataset::of_size(3));
        let first = harvester.run(COLLECTION, &db).await.unwrap();
        assert_eq!(first.terms_inserted, 3);
        assert_eq!(first.fields_inserted, 3);

        let second = harvester.run(COLLECTION, &db).await.unwrap();
        assert_eq!(second.terms_inserted, 0);
        assert_eq!(second.fields_inserted, 0);
        assert_eq!(second.terms_updated, 3);

        // 저장소 내용도 그대로
        assert_eq!(db.term_count().unwrap(), 3);
        assert_eq!(db.term_field_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reharvest_preserves_existing_translations() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let harvester = Harvester::new(test_config(1000), FakeDataset::of_size(3));
        harvester.run(COLLECTION, &db).await.unwrap();

        // 워크플로우 측에서 번역이 달림
        let term = db.term_by_uri("https://example.org/c/00001").unwrap().unwrap();
        let field_id = db.fields_for_term(term.id).unwrap()[0].id;
        let user = db.upsert_user("Ana", "ana@example.org", "translator").unwrap();
        db.insert_translation(field_id, TargetLanguage::Nl, "Begrip 1", &user).unwrap();

        // 다른 페이지 분할(batch 1)로 재수집해도 번역은 살아 있어야 함
        let harvester = Harvester::new(test_config(1), FakeDataset::of_size(3));
        let summary = harvester.run(COLLECTION, &db).await.unwrap();
        assert_eq!(summary.pages_committed, 3);
        assert_eq!(summary.terms_inserted, 0);

        let translations = db.translations_for_field(field_id).unwrap();
        assert_eq!(translations.len(), 1);
        assert_eq!(translations[0].value, "Begrip 1");
        assert_eq!(db.term_field_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_page_keeps_already_committed_pages() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let mut dataset = FakeDataset::of_size(2000);
        dataset.fail_at_offset = Some(1000);
        let harvester = Harvester::new(test_config(1000), dataset);

        let err = harvester.run(COLLECTION, &db).await.unwrap_err();
        assert_eq!(err.code(), "REMOTE_QUERY_ERROR");

        // 페이지 0은 커밋된 채로 남고, 실패한 페이지 1은 흔적이 없어야 함
        assert_eq!(db.term_count().unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_invalid_uri_fails_before_any_fetch() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let dataset = FakeDataset::of_size(3);
        let offsets = dataset.offsets.clone();
        let harvester = Harvester::new(test_config(1000), dataset);

        let err = harvester.run("ftp://example.org/x", &db).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
        assert!(offsets.lock().unwrap().is_empty());
        assert_eq!(db.term_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_collection_commits_no_pages() {
        let dir = tempdir().unwrap();
        let db = open_test_db(&dir);

        let harvester = Harvester::new(test_config(1000), FakeDataset::new(Vec::new()));
        let summary = harvester.run(COLLECTION, &db).await.unwrap();
        assert_eq!(summary.member_count, 0);
        assert_eq!(summary.pages_committed, 0);
        assert_eq!(db.term_count().unwrap(), 0);
    }
}
