//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{FeedMode, IngestConfig, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::settings::{self, ConfigSource};

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    mode: String,
    endpoint: String,
    bounding_box_count: usize,
    mmsi_filter_count: usize,
    sink: String,
    sink_type: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let resolved = match settings::resolve(&args.config) {
        Ok(resolved) => resolved,
        Err(e) => {
            return ValidationResult {
                valid: false,
                config_source: args.config.config.display().to_string(),
                error: Some(format!("{e:#}")),
                warnings: None,
                summary: None,
            }
        }
    };

    let config_source = resolved.source.to_string();
    let config = &resolved.config;

    match config_loader::validate(config) {
        Ok(()) => {
            let warnings = collect_warnings(config, &resolved.source);
            ValidationResult {
                valid: true,
                config_source,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    mode: format!("{:?}", config.feed.mode),
                    endpoint: config.feed.url.clone(),
                    bounding_box_count: config.feed.bounding_boxes.len(),
                    mmsi_filter_count: config.feed.filter_mmsi.len(),
                    sink: config.sink.name.clone(),
                    sink_type: format!("{:?}", config.sink.sink_type),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_source,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &IngestConfig, source: &ConfigSource) -> Vec<String> {
    let mut warnings = Vec::new();

    if *source == ConfigSource::Defaults {
        warnings.push("No configuration file found - using built-in defaults".to_string());
    }

    if config.sink.sink_type == SinkType::Log {
        warnings.push("Log sink configured - records will not be persisted".to_string());
    }

    if config.feed.bounding_boxes.is_empty() {
        warnings.push("No bounding boxes configured - subscribing to the whole world".to_string());
    }

    if config.feed.mode == FeedMode::Stream && config.feed.filter_mmsi.is_empty() {
        warnings.push("No MMSI filter - expect the full global message rate".to_string());
    }

    if config.supervisor.backoff_secs < 5 {
        warnings.push(format!(
            "Backoff of {}s may hammer the feed during outages",
            config.supervisor.backoff_secs
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✅ Configuration is valid: {}", result.config_source);

        if let Some(ref summary) = result.summary {
            println!("\n📋 Summary:");
            println!("   Version: {}", summary.version);
            println!("   Mode: {}", summary.mode);
            println!("   Endpoint: {}", summary.endpoint);
            println!("   Bounding boxes: {}", summary.bounding_box_count);
            println!("   MMSI filters: {}", summary.mmsi_filter_count);
            println!("   Sink: {} ({})", summary.sink, summary.sink_type);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠️  Warnings:");
            for warning in warnings {
                println!("   - {}", warning);
            }
        }
    } else {
        println!("❌ Configuration is invalid: {}", result.config_source);
        if let Some(ref error) = result.error {
            println!("\n   Error: {}", error);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConfigArgs;
    use std::path::PathBuf;

    fn args(api_key: Option<&str>) -> ValidateArgs {
        ValidateArgs {
            config: ConfigArgs {
                config: PathBuf::from("/nonexistent/config.toml"),
                api_key: api_key.map(str::to_string),
                ..Default::default()
            },
            json: true,
        }
    }

    #[test]
    fn test_defaults_without_key_are_invalid() {
        let result = validate_config(&args(None));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("api_key"));
    }

    #[test]
    fn test_defaults_with_key_are_valid_with_warnings() {
        let result = validate_config(&args(Some("key")));
        assert!(result.valid);
        assert_eq!(result.config_source, "built-in defaults");
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("built-in defaults")));
        assert!(warnings.iter().any(|w| w.contains("Log sink")));
        assert_eq!(result.summary.unwrap().mode, "Stream");
    }
}
