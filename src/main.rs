use std::sync::Arc;
use anyhow::{Context, Result};
use clap::Parser;
use fenmove::config::{init_logging, Args};
use fenmove::engine::torch_scorer::TorchScorer;
use fenmove::engine::vocabulary::MoveVocabulary;
use fenmove::engine::Predictor;
use fenmove::server;
use tracing::{error, info};

fn load_predictor(args: &Args) -> Result<Predictor> {
    let vocabulary = MoveVocabulary::load(&args.vocabulary)
        .with_context(|| format!("failed to load move vocabulary from {}", args.vocabulary.display()))?;
    info!(path = %args.vocabulary.display(), moves = vocabulary.len(), "loaded move vocabulary");

    let scorer = TorchScorer::load(&args.model)
        .with_context(|| format!("failed to load model from {}", args.model.display()))?;
    info!(path = %args.model.display(), device = ?scorer.device(), "loaded model");

    Predictor::new(vocabulary, scorer).context("model output does not match the move vocabulary")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = run(args).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let predictor = Arc::new(load_predictor(&args)?);
    server::serve(args.bind_address(), predictor)
        .await
        .with_context(|| format!("server on {} failed", args.bind_address()))
}
