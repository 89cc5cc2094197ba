use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use fenmove::engine::vocabulary::MoveVocabulary;

/// Writes every geometrically possible UCI move as a move vocabulary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output file; `.bin`/`.bincode` selects bincode, `.pkl`/`.pickle` pickle, anything else JSON
    #[arg(short, long, default_value = "move_to_int.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let vocabulary = MoveVocabulary::exhaustive();
    vocabulary
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Wrote {} moves to {}", vocabulary.len(), args.output.display());
    Ok(())
}
