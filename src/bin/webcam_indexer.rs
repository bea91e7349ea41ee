//! webcam_indexer - round-robin camera poller
//!
//! This daemon:
//! 1. Loads the camera roster once (an unreadable roster counts as empty)
//! 2. Visits one camera per cycle, in roster order, wrapping around forever
//! 3. Fetches the camera's snapshot and runs the embedding workflow on it
//! 4. Lets the workflow upsert the embedding into the store
//! 5. Sleeps the pacing interval before the next camera

use anyhow::Result;

use webcam_indexer::config::IndexerConfig;
use webcam_indexer::transport::http_agent;
use webcam_indexer::{CameraPipeline, HttpSnapshotSource, RemoteWorkflow, Roster, Scheduler};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = IndexerConfig::load()?;

    let roster = Roster::load_or_empty(&cfg.roster_path);
    log::info!(
        "loaded {} camera ids from {}",
        roster.len(),
        cfg.roster_path.display()
    );

    let agent = http_agent(cfg.http_timeout);
    let source = HttpSnapshotSource::new(agent.clone(), cfg.snapshot_url_template.clone());
    let workflow = RemoteWorkflow::new(
        agent,
        cfg.inference.api_url.clone(),
        cfg.inference.api_key.clone(),
        cfg.inference.workspace.clone(),
        cfg.inference.workflow_id.clone(),
    );
    log::info!(
        "workflow endpoint {}, interval {:?}, scratch dir {}",
        workflow.endpoint(),
        cfg.interval,
        cfg.scratch_dir.display()
    );
    if cfg.inference.api_key.is_none() {
        log::warn!("ROBOFLOW_API_KEY is not set; workflow calls will be unauthenticated");
    }
    if cfg.store.url.is_none() || cfg.store.key.is_none() {
        log::warn!("SUPABASE_URL or SUPABASE_KEY is not set; store upserts will fail");
    }

    let mut pipeline = CameraPipeline::new(
        source,
        workflow,
        cfg.scratch_dir.clone(),
        cfg.store.credentials(),
    );

    let mut scheduler = Scheduler::new(roster, cfg.interval);
    scheduler.run(&mut pipeline);
    Ok(())
}
