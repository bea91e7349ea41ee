//! camera_search - find the cameras whose latest snapshot best matches a text query.
//!
//! Embeds the query with the hosted text workflow, ranks cameras through the
//! store's `match_cameras` RPC and prints `{"bestMatch": ..., "heatmapData": [...]}`
//! as JSON on stdout.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

use webcam_indexer::inference::{DEFAULT_INFERENCE_URL, DEFAULT_WORKSPACE};
use webcam_indexer::search::{
    SearchClient, DEFAULT_MATCH_COUNT, DEFAULT_MATCH_THRESHOLD, DEFAULT_REFERENCE_IMAGE_URL,
    DEFAULT_TEXT_WORKFLOW_ID,
};
use webcam_indexer::store::DEFAULT_TABLE;
use webcam_indexer::transport::http_agent;
use webcam_indexer::RemoteWorkflow;

#[derive(Parser, Debug)]
#[command(author, version, about = "Search camera embeddings with a text query")]
struct Args {
    /// Free-text query, e.g. "snow on the road".
    query: String,

    /// Inference server base URL.
    #[arg(long, env = "INFERENCE_API_URL", default_value = DEFAULT_INFERENCE_URL)]
    inference_url: String,

    /// Inference API key.
    #[arg(long, env = "ROBOFLOW_API_KEY", hide_env_values = true)]
    inference_key: Option<String>,

    /// Workspace that owns the text workflow.
    #[arg(long, env = "INDEXER_WORKSPACE", default_value = DEFAULT_WORKSPACE)]
    workspace: String,

    /// Workflow that embeds text.
    #[arg(long, default_value = DEFAULT_TEXT_WORKFLOW_ID)]
    workflow: String,

    /// Image URL the text workflow requires as a placeholder input.
    #[arg(long, default_value = DEFAULT_REFERENCE_IMAGE_URL)]
    reference_image: String,

    /// Store base URL.
    #[arg(long, env = "SUPABASE_URL")]
    store_url: String,

    /// Store API key. Read access is enough.
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    store_key: String,

    /// Table listed when nothing matches.
    #[arg(long, env = "INDEXER_STORE_TABLE", default_value = DEFAULT_TABLE)]
    table: String,

    /// Maximum number of ranked cameras.
    #[arg(long, default_value_t = DEFAULT_MATCH_COUNT)]
    match_count: usize,

    /// Similarity threshold passed to the ranking RPC.
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    match_threshold: f64,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.query.trim().is_empty() {
        return Err(anyhow!("query must not be empty"));
    }
    if args.timeout_secs == 0 {
        return Err(anyhow!("--timeout-secs must be greater than zero"));
    }

    let agent = http_agent(Duration::from_secs(args.timeout_secs));
    let workflow = RemoteWorkflow::new(
        agent.clone(),
        args.inference_url,
        args.inference_key,
        args.workspace,
        args.workflow,
    );
    let client = SearchClient::new(agent, workflow, args.store_url, args.store_key)
        .with_table(args.table)
        .with_reference_image(args.reference_image)
        .with_matching(args.match_count, args.match_threshold);

    let result = client.search(&args.query)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
