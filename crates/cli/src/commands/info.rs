//! `info` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::InfoArgs;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Reading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let redacted = redact_credentials(blueprint);
        let json = serde_json::to_string_pretty(&redacted)
            .context("Failed to serialize configuration")?;
        println!("{}", json);
        return Ok(());
    }

    println!("\n=== Relay Configuration ===\n");
    println!("Config: {}", args.config.display());
    println!("Version: {:?}", blueprint.version);
    println!("Source bind: {}", blueprint.source.bind);

    println!("\nDestinations ({}):", blueprint.destinations.len());
    for destination in &blueprint.destinations {
        println!("\n  {} ({:?})", destination.name, destination.strategy);
        println!(
            "    Buffer: {:?}, capacity {}",
            destination.buffer.backend, destination.buffer.capacity
        );
        if let Some(ref path) = destination.buffer.path {
            println!("    Snapshot: {}", path.display());
        }
        println!("    Queue capacity: {}", destination.queue_capacity);

        if args.settings && !destination.settings.is_empty() {
            println!("    Settings:");
            let mut keys: Vec<_> = destination.settings.keys().collect();
            keys.sort();
            for key in keys {
                if is_credential_key(key) {
                    println!("      {} = <redacted>", key);
                } else {
                    println!("      {} = {}", key, destination.settings[key]);
                }
            }
        }
    }

    println!();
    Ok(())
}

/// Settings keys whose values must never be printed
fn is_credential_key(key: &str) -> bool {
    key == "apikey"
}

/// Mask credential values before structured output
fn redact_credentials(mut blueprint: contracts::RelayBlueprint) -> contracts::RelayBlueprint {
    for destination in &mut blueprint.destinations {
        for (key, value) in destination.settings.iter_mut() {
            if is_credential_key(key) {
                *value = "<redacted>".to_string();
            }
        }
    }
    blueprint
}
