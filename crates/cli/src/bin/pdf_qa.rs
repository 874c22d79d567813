use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};

use cli::{PdfQaConfig, init_tracing, load_api_config};
use index::{Retriever, build_store_from_directory};
use llm::{ChatClient, EmbeddingClient, TracingObserver};
use query::{InteractionLoop, RagChain};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    match run(PdfQaConfig::default()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: PdfQaConfig) -> Result<()> {
    let api = load_api_config()?;

    let embedder = Arc::new(EmbeddingClient::new(
        api.clone(),
        config.embeddings,
        config.retry.policy(),
    )?);
    let chat = ChatClient::new(api, config.chat, config.retry.policy())?
        .with_observer(Arc::new(TracingObserver));

    let store = build_store_from_directory(&config.pdf_dir, config.chunker, embedder.as_ref())
        .await
        .context(format!("Failed to index PDFs in {:?}", config.pdf_dir))?;
    info!(chunks = store.len(), "Index ready");

    let retriever = Retriever::new(Arc::new(store), embedder).with_k(config.top_k);
    let chain = RagChain::new(retriever, Arc::new(chat));

    println!("PDFs loaded! Ask me now.");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    InteractionLoop::new(Arc::new(chain))
        .run(stdin, &mut stdout)
        .await?;

    Ok(())
}
