use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::inference::{DEFAULT_INFERENCE_URL, DEFAULT_WORKFLOW_ID, DEFAULT_WORKSPACE};
use crate::ingest::DEFAULT_SNAPSHOT_URL_TEMPLATE;
use crate::pipeline::StoreCredentials;
use crate::scheduler::DEFAULT_INTERVAL;

const DEFAULT_ROSTER_PATH: &str = "cameras.json";
const DEFAULT_SCRATCH_DIR: &str = ".";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
struct IndexerConfigFile {
    roster_path: Option<PathBuf>,
    snapshot_url: Option<String>,
    interval_secs: Option<f64>,
    scratch_dir: Option<PathBuf>,
    http_timeout_secs: Option<u64>,
    inference: Option<InferenceConfigFile>,
    store: Option<StoreConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct InferenceConfigFile {
    api_url: Option<String>,
    api_key: Option<String>,
    workspace: Option<String>,
    workflow_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct StoreConfigFile {
    url: Option<String>,
    key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub roster_path: PathBuf,
    pub snapshot_url_template: String,
    pub interval: Duration,
    pub scratch_dir: PathBuf,
    pub http_timeout: Duration,
    pub inference: InferenceSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub workspace: String,
    pub workflow_id: String,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub url: Option<String>,
    pub key: Option<String>,
}

impl StoreSettings {
    pub fn credentials(&self) -> StoreCredentials {
        StoreCredentials {
            url: self.url.clone(),
            key: self.key.clone(),
        }
    }
}

impl IndexerConfig {
    /// Defaults, then the file named by `INDEXER_CONFIG`, then environment.
    ///
    /// Missing credentials are not an error here; they are forwarded as absent
    /// and the remote services reject them.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("INDEXER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: IndexerConfigFile) -> Result<Self> {
        let inference = file.inference.unwrap_or_default();
        let store = file.store.unwrap_or_default();
        let interval = match file.interval_secs {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|_| anyhow!("interval_secs must be a finite, non-negative number"))?,
            None => DEFAULT_INTERVAL,
        };
        Ok(Self {
            roster_path: file
                .roster_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROSTER_PATH)),
            snapshot_url_template: file
                .snapshot_url
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_URL_TEMPLATE.to_string()),
            interval,
            scratch_dir: file
                .scratch_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR)),
            http_timeout: Duration::from_secs(
                file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            inference: InferenceSettings {
                api_url: inference
                    .api_url
                    .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
                api_key: inference.api_key,
                workspace: inference
                    .workspace
                    .unwrap_or_else(|| DEFAULT_WORKSPACE.to_string()),
                workflow_id: inference
                    .workflow_id
                    .unwrap_or_else(|| DEFAULT_WORKFLOW_ID.to_string()),
            },
            store: StoreSettings {
                url: store.url,
                key: store.key,
            },
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(path) = non_empty_env("INDEXER_ROSTER_PATH") {
            self.roster_path = PathBuf::from(path);
        }
        if let Some(template) = non_empty_env("INDEXER_SNAPSHOT_URL") {
            self.snapshot_url_template = template;
        }
        if let Some(interval) = non_empty_env("INDEXER_INTERVAL_SECS") {
            let secs: f64 = interval
                .trim()
                .parse()
                .map_err(|_| anyhow!("INDEXER_INTERVAL_SECS must be a number of seconds"))?;
            self.interval = Duration::try_from_secs_f64(secs).map_err(|_| {
                anyhow!("INDEXER_INTERVAL_SECS must be a finite, non-negative number")
            })?;
        }
        if let Some(dir) = non_empty_env("INDEXER_SCRATCH_DIR") {
            self.scratch_dir = PathBuf::from(dir);
        }
        if let Some(timeout) = non_empty_env("INDEXER_HTTP_TIMEOUT_SECS") {
            let secs: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("INDEXER_HTTP_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.http_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = non_empty_env("INFERENCE_API_URL") {
            self.inference.api_url = url;
        }
        if let Some(key) = non_empty_env("ROBOFLOW_API_KEY") {
            self.inference.api_key = Some(key);
        }
        if let Some(workspace) = non_empty_env("INDEXER_WORKSPACE") {
            self.inference.workspace = workspace;
        }
        if let Some(workflow) = non_empty_env("INDEXER_WORKFLOW") {
            self.inference.workflow_id = workflow;
        }
        if let Some(url) = non_empty_env("SUPABASE_URL") {
            self.store.url = Some(url);
        }
        if let Some(key) = non_empty_env("SUPABASE_KEY") {
            self.store.key = Some(key);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.snapshot_url_template.contains("{}") {
            return Err(anyhow!(
                "snapshot url template '{}' has no '{{}}' placeholder for the camera id",
                self.snapshot_url_template
            ));
        }
        let inference_url = url::Url::parse(&self.inference.api_url)
            .with_context(|| format!("invalid inference api url '{}'", self.inference.api_url))?;
        if !matches!(inference_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "inference api url must be http(s), got '{}'",
                inference_url.scheme()
            ));
        }
        if self.http_timeout.is_zero() {
            return Err(anyhow!("http timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<IndexerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
