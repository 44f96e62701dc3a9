//! Vocab Harvester - Library
//!
//! SPARQL 엔드포인트에서 SKOS 컬렉션을 수집해 번역 워크플로우용
//! SQLite 저장소에 반영하는 라이브러리입니다.

pub mod config;
pub mod db;
pub mod error;
pub mod harvest;
pub mod models;
pub mod sparql;

use std::path::Path;

use crate::config::HarvestConfig;
use crate::db::Database;
use crate::error::HarvestResult;
use crate::harvest::pipeline::Harvester;
use crate::models::HarvestSummary;
use crate::sparql::client::HttpTransport;

/// 수집 실행 진입점
///
/// 출력 경로의 DB를 열고(없으면 생성), 스키마를 초기화한 뒤
/// 파이프라인을 끝까지 돌립니다.
pub async fn run_harvest(
    config: HarvestConfig,
    collection_uri: &str,
    output_path: &Path,
) -> HarvestResult<HarvestSummary> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(output_path)?;
    db.initialize()?;

    let transport = HttpTransport::new(&config.endpoint);
    let harvester = Harvester::new(config, transport);
    harvester.run(collection_uri, &db).await
}
