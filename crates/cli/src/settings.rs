//! Effective configuration: file (or built-in defaults) plus CLI/env overrides.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, IngestConfig};
use contracts::{SinkConfig, SinkType};
use tracing::info;

use crate::cli::ConfigArgs;

/// Sink name used when Supabase settings come from the environment
const SUPABASE_SINK_NAME: &str = "supabase";

/// Where the base configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Configuration after overrides, not yet validated
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: IngestConfig,
    pub source: ConfigSource,
}

/// Load the config file if present, then apply overrides
pub fn resolve(args: &ConfigArgs) -> Result<ResolvedConfig> {
    let (mut config, source) = if args.config.exists() {
        let config = ConfigLoader::parse_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
        (config, ConfigSource::File(args.config.clone()))
    } else {
        info!(
            path = %args.config.display(),
            "Configuration file not found, using built-in defaults"
        );
        (IngestConfig::default(), ConfigSource::Defaults)
    };

    apply_overrides(&mut config, args);
    Ok(ResolvedConfig { config, source })
}

/// Apply CLI/env overrides; empty values are ignored
pub fn apply_overrides(config: &mut IngestConfig, args: &ConfigArgs) {
    if let Some(mode) = args.mode {
        config.feed.mode = mode.into();
    }
    if let Some(url) = non_empty(&args.feed_url) {
        config.feed.url = url.to_string();
    }
    if let Some(key) = non_empty(&args.api_key) {
        config.feed.api_key = key.to_string();
    }

    let mmsi: Vec<String> = args
        .mmsi
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    if !mmsi.is_empty() {
        info!(count = mmsi.len(), "Overriding MMSI filter");
        config.feed.filter_mmsi = mmsi;
    }

    if let Some(url) = non_empty(&args.supabase_url) {
        if config.sink.sink_type != SinkType::Postgrest {
            info!("Switching sink to PostgREST from Supabase settings");
            config.sink = SinkConfig {
                name: SUPABASE_SINK_NAME.to_string(),
                sink_type: SinkType::Postgrest,
                params: HashMap::new(),
            };
        }
        config.sink.params.insert("url".to_string(), url.to_string());
    }
    if config.sink.sink_type == SinkType::Postgrest {
        if let Some(key) = non_empty(&args.supabase_key) {
            config.sink.params.insert("api_key".to_string(), key.to_string());
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
