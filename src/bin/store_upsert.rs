//! store_upsert - write one camera embedding into the store by hand.
//!
//! Performs the same keyed upsert the embedding workflow runs after inference
//! and prints the block output (`{"status": ...}`). Useful for checking store
//! credentials and table setup without going through the inference server.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use webcam_indexer::store::{StoreClient, DEFAULT_TABLE};
use webcam_indexer::transport::http_agent;
use webcam_indexer::{CameraId, EmbeddingRecord};

#[derive(Parser, Debug)]
#[command(author, version, about = "Upsert one camera embedding into the store")]
struct Args {
    /// Camera id (store key).
    #[arg(long)]
    camera_id: String,

    /// JSON file holding the embedding as an array of numbers.
    #[arg(long)]
    embedding: PathBuf,

    /// Store base URL.
    #[arg(long, env = "SUPABASE_URL")]
    store_url: String,

    /// Store API key, sent as `apikey` and as a bearer token.
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    store_key: String,

    /// Table holding one row per camera.
    #[arg(long, env = "INDEXER_STORE_TABLE", default_value = DEFAULT_TABLE)]
    table: String,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.timeout_secs == 0 {
        return Err(anyhow!("--timeout-secs must be greater than zero"));
    }

    let raw = std::fs::read_to_string(&args.embedding)
        .with_context(|| format!("read embedding file {}", args.embedding.display()))?;
    let embedding: Vec<f32> = serde_json::from_str(&raw)
        .with_context(|| format!("embedding file {} is not a number array", args.embedding.display()))?;

    let record = EmbeddingRecord::now(CameraId::new(args.camera_id), embedding);
    let client = StoreClient::new(
        http_agent(Duration::from_secs(args.timeout_secs)),
        args.store_url,
        args.store_key,
    )
    .with_table(args.table);

    log::info!(
        "upserting {}-dimension embedding for camera {} via {}",
        record.embedding.len(),
        record.camera_id,
        client.endpoint()
    );
    let status = client.upsert(&record)?;
    println!("{}", status.to_block_output());
    Ok(())
}
