//! Embedding processor: reads a JSON array of strings on stdin, writes one
//! JSON line of unit-norm 384-dim embedding vectors to stdout. One batch per
//! invocation; exit 1 on the first error.

use std::io::Read;
use std::process;

use tracing_subscriber::EnvFilter;

use embedpipe_core::batch::{parse_batch, render_batch};
use embedpipe_core::Embedder;
use embedpipe_embed::get_default_embedder;

fn main() {
    // Diagnostics go to stderr; stdout carries only the output batch.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // The model loads before any input is read; a load failure must not
    // consume stdin.
    let embedder = match get_default_embedder() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error loading model: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(embedder.as_ref()) {
        eprintln!("Error processing: {}", e);
        process::exit(1);
    }
}

fn run(embedder: &dyn Embedder) -> anyhow::Result<()> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    // Absent input is a successful no-op, not an error.
    if input.is_empty() {
        return Ok(());
    }

    let texts = parse_batch(&input)?;
    let embeddings = embedder.embed_batch(&texts)?;
    println!("{}", render_batch(&embeddings)?);
    Ok(())
}
