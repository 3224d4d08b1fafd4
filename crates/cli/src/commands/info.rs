//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::IngestConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::settings;

/// Param names whose values are never printed
const SECRET_PARAMS: &[&str] = &["api_key", "key", "token", "password"];

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    source: String,
    version: String,
    feed: FeedInfo,
    supervisor: SupervisorInfo,
    sink: SinkInfo,
}

#[derive(Serialize)]
struct FeedInfo {
    mode: String,
    url: String,
    api_key_set: bool,
    bounding_boxes: Vec<[[f64; 2]; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    filter_mmsi: Vec<String>,
    poll_interval_secs: u64,
    connect_timeout_secs: u64,
}

#[derive(Serialize)]
struct SupervisorInfo {
    backoff_secs: u64,
    reconnect_delay_secs: u64,
    restart_delay_secs: u64,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Loading configuration info");

    let resolved = settings::resolve(&args.config)?;
    let info = build_config_info(&resolved.config, &resolved.source.to_string());

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &IngestConfig, source: &str) -> ConfigInfo {
    let request = config.subscription_request();
    let bounding_boxes = request
        .bounding_boxes
        .iter()
        .map(|bbox| {
            let [(lat1, lon1), (lat2, lon2)] = bbox.corners();
            [[lat1, lon1], [lat2, lon2]]
        })
        .collect();

    let params = config
        .sink
        .params
        .iter()
        .map(|(name, value)| {
            let shown = if SECRET_PARAMS.contains(&name.as_str()) {
                "<redacted>".to_string()
            } else {
                value.clone()
            };
            (name.clone(), shown)
        })
        .collect();

    ConfigInfo {
        source: source.to_string(),
        version: format!("{:?}", config.version),
        feed: FeedInfo {
            mode: format!("{:?}", config.feed.mode),
            url: config.feed.url.clone(),
            api_key_set: !config.feed.api_key.trim().is_empty(),
            bounding_boxes,
            filter_mmsi: config.feed.filter_mmsi.clone(),
            poll_interval_secs: config.feed.poll_interval_secs,
            connect_timeout_secs: config.feed.connect_timeout_secs,
        },
        supervisor: SupervisorInfo {
            backoff_secs: config.supervisor.backoff_secs,
            reconnect_delay_secs: config.supervisor.reconnect_delay_secs,
            restart_delay_secs: config.supervisor.restart_delay_secs,
        },
        sink: SinkInfo {
            name: config.sink.name.clone(),
            sink_type: format!("{:?}", config.sink.sink_type),
            params,
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 AIS Ingest Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📄 Source: {} ({})", info.source, info.version);

    let feed = &info.feed;
    println!("\n📡 Feed");
    println!("   ├─ Mode: {}", feed.mode);
    println!("   ├─ Endpoint: {}", feed.url);
    println!(
        "   ├─ API key: {}",
        if feed.api_key_set { "set" } else { "missing" }
    );
    println!("   ├─ Bounding boxes ({}):", feed.bounding_boxes.len());
    for [[lat1, lon1], [lat2, lon2]] in &feed.bounding_boxes {
        println!("   │   [{lat1}, {lon1}] → [{lat2}, {lon2}]");
    }
    if feed.filter_mmsi.is_empty() {
        println!("   ├─ MMSI filter: (none)");
    } else {
        println!("   ├─ MMSI filter: {}", feed.filter_mmsi.join(", "));
    }
    println!("   ├─ Poll interval: {}s", feed.poll_interval_secs);
    println!("   └─ Connect timeout: {}s", feed.connect_timeout_secs);

    let sup = &info.supervisor;
    println!("\n⚙️  Supervisor");
    println!("   ├─ Backoff: {}s", sup.backoff_secs);
    println!("   ├─ Reconnect delay: {}s", sup.reconnect_delay_secs);
    println!("   └─ Restart delay: {}s", sup.restart_delay_secs);

    println!("\n📤 Sink");
    println!("   └─ {} ({})", info.sink.name, info.sink.sink_type);
    for (i, (name, value)) in info.sink.params.iter().enumerate() {
        let prefix = if i == info.sink.params.len() - 1 { "└─" } else { "├─" };
        println!("       {} {} = {}", prefix, name, value);
    }

    println!();
}
