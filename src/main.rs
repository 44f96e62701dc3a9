//! Vocab Harvester CLI
//!
//! `vocab-harvester <collection-uri> [output-path]`
//! 성공 시 exit 0, 검증/원격/DB 오류 시 카테고리를 출력하고 exit 1.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{value_parser, Arg, ArgAction, Command};

use harvester_lib::config::HarvestConfig;
use harvester_lib::error::HarvestError;

#[tokio::main]
async fn main() {
    // .env 지원 (HARVESTER_SPARQL_ENDPOINT 오버라이드 등). 파일이 없으면 무시.
    let _ = dotenvy::dotenv();

    let matches = Command::new("vocab-harvester")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Harvest a SKOS collection from a SPARQL endpoint into a local translation store")
        .arg(
            Arg::new("collection-uri")
                .required(true)
                .help("Collection URI to harvest"),
        )
        .arg(
            Arg::new("output")
                .default_value("harvest.db")
                .help("Output database path"),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .default_value("1000")
                .value_parser(value_parser!(u64).range(1..))
                .help("Members per page"),
        )
        .arg(
            Arg::new("basic")
                .long("basic")
                .action(ArgAction::SetTrue)
                .help("Fetch only prefLabel/altLabel/definition"),
        )
        .get_matches();

    let collection_uri = matches.get_one::<String>("collection-uri").unwrap();
    let output = PathBuf::from(matches.get_one::<String>("output").unwrap());
    let batch_size = *matches.get_one::<u64>("batch-size").unwrap();
    let extended = !matches.get_flag("basic");

    let mut config = HarvestConfig::from_env(extended);
    config.batch_size = batch_size;

    println!("[HARVEST] Starting harvest for collection: {collection_uri}");
    println!("[HARVEST] Output database: {}", output.display());

    match harvester_lib::run_harvest(config, collection_uri, &output).await {
        Ok(summary) => {
            println!(
                "[HARVEST] Harvest completed: {} member(s), database saved to {}",
                summary.member_count,
                output.display()
            );
            // CI 환경이면 결과 파일에 산출 경로를 알림
            if let Err(e) = append_results_file(&output) {
                eprintln!("[HARVEST] Failed to write results file: {e}");
            }
        }
        Err(error) => {
            report_failure(&error);
            std::process::exit(1);
        }
    }
}

/// 운영자용 한 줄 진단 (+ 분류되지 않은 에러는 상세까지)
fn report_failure(error: &HarvestError) {
    eprintln!("[{}] {error}", error.code());
    if error.is_unclassified() {
        eprintln!("{error:?}");
    }
}

/// GITHUB_OUTPUT이 설정된 경우 key=value 라인 추가
fn append_results_file(output: &Path) -> std::io::Result<()> {
    let Ok(results_path) = std::env::var("GITHUB_OUTPUT") else {
        return Ok(());
    };
    if results_path.trim().is_empty() {
        return Ok(());
    }

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(results_path)?;
    writeln!(file, "database-path={}", output.display())?;
    Ok(())
}
