use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use cli::{CharacterConfig, init_tracing, load_api_config};
use extract::CharacterGenerator;
use llm::{CompletionClient, CompletionModel, TracingObserver};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    match run(CharacterConfig::default()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: CharacterConfig) -> Result<()> {
    let api = load_api_config()?;
    let client = CompletionClient::new(api, config.completion, config.retry.policy())?
        .with_observer(Arc::new(TracingObserver));
    let client = Arc::new(client);
    let generator = CharacterGenerator::new(client.clone());

    let prompt = generator.build_prompt(&config.description)?;
    println!("prompt:: {}", prompt);

    let response = client.complete(&prompt).await?;
    println!("response:: {}", response);

    let profile = generator.parse(&response)?;
    println!("parsedOutput:: {}", serde_json::to_string_pretty(&profile)?);

    Ok(())
}
