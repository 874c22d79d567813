use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use cli::{CharacterConfig, PdfQaConfig, init_tracing, load_api_config};
use eval::{SKY_DOCUMENT, ScenarioReport, ScenarioRunner, get_test_set};
use llm::{ChatClient, CompletionClient, EmbeddingClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(report) if report.all_passed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ScenarioReport> {
    let api = load_api_config()?;
    let character = CharacterConfig::default();
    let qa = PdfQaConfig::default();

    let runner = ScenarioRunner::new(
        Arc::new(CompletionClient::new(
            api.clone(),
            character.completion,
            character.retry.policy(),
        )?),
        Arc::new(ChatClient::new(api.clone(), qa.chat, qa.retry.policy())?),
        Arc::new(EmbeddingClient::new(api, qa.embeddings, qa.retry.policy())?),
    );

    let test_set = get_test_set();
    println!("=== Scenarios: 1 character, {} questions ===\n", test_set.len());

    let mut results = vec![runner.run_character(&character.description).await];
    results.extend(runner.run_qa(SKY_DOCUMENT, &test_set).await?);

    let report = ScenarioReport::from_results(results);
    print_report(&report);
    println!("\n{}", serde_json::to_string_pretty(&report)?);

    Ok(report)
}

fn print_report(report: &ScenarioReport) {
    for result in &report.results {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        println!("[{}] {} ({:.0} ms)", mark, result.name, result.latency_ms);
        println!("       {}", result.output.replace('\n', "\n       "));
    }

    println!("\nPassed: {}/{}", report.passed, report.total);
    println!("Avg Latency: {:.0} ms", report.avg_latency_ms);
    println!("P50 Latency: {:.0} ms", report.p50_latency_ms);
    println!("P95 Latency: {:.0} ms", report.p95_latency_ms);
}
