//! Configuration validation
//!
//! Rules:
//! - destination names unique and non-empty
//! - queue and buffer capacities > 0
//! - file buffer backend requires a path
//! - numeric settings values must parse
//! - source bind address must be a valid socket address

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{BufferBackend, DestinationConfig, RelayBlueprint, RelayError};

/// Settings keys whose values must parse as integers when present
const NUMERIC_SETTINGS: &[&str] = &["interval", "max_items_per_post", "announce_interval"];

/// Validate a RelayBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    validate_source(blueprint)?;
    validate_destination_names(blueprint)?;
    for destination in &blueprint.destinations {
        validate_capacities(destination)?;
        validate_buffer_backend(destination)?;
        validate_numeric_settings(destination)?;
    }
    Ok(())
}

/// Validate the source bind address
fn validate_source(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    blueprint
        .source
        .bind
        .parse::<SocketAddr>()
        .map_err(|e| {
            RelayError::config_validation(
                "source.bind",
                format!("invalid socket address '{}': {e}", blueprint.source.bind),
            )
        })?;
    Ok(())
}

/// Validate destination name uniqueness
fn validate_destination_names(blueprint: &RelayBlueprint) -> Result<(), RelayError> {
    let mut seen = HashSet::new();
    for (idx, destination) in blueprint.destinations.iter().enumerate() {
        if destination.name.is_empty() {
            return Err(RelayError::config_validation(
                format!("destinations[{idx}].name"),
                "destination name cannot be empty",
            ));
        }
        if !seen.insert(&destination.name) {
            return Err(RelayError::config_validation(
                format!("destinations[name={}]", destination.name),
                "duplicate destination name",
            ));
        }
    }
    Ok(())
}

/// Validate queue and buffer capacities
fn validate_capacities(destination: &DestinationConfig) -> Result<(), RelayError> {
    if destination.queue_capacity == 0 {
        return Err(RelayError::config_validation(
            format!("destinations[{}].queue_capacity", destination.name),
            "queue_capacity must be > 0",
        ));
    }
    if destination.buffer.capacity == 0 {
        return Err(RelayError::config_validation(
            format!("destinations[{}].buffer.capacity", destination.name),
            "buffer capacity must be > 0",
        ));
    }
    Ok(())
}

/// Validate backend-specific buffer options
fn validate_buffer_backend(destination: &DestinationConfig) -> Result<(), RelayError> {
    if destination.buffer.backend == BufferBackend::File && destination.buffer.path.is_none() {
        return Err(RelayError::config_validation(
            format!("destinations[{}].buffer.path", destination.name),
            "file buffer backend requires a path",
        ));
    }
    Ok(())
}

/// Validate numeric settings values
fn validate_numeric_settings(destination: &DestinationConfig) -> Result<(), RelayError> {
    for key in NUMERIC_SETTINGS {
        if let Some(value) = destination.settings.get(*key) {
            if value.parse::<i64>().is_err() {
                return Err(RelayError::config_validation(
                    format!("destinations[{}].settings.{key}", destination.name),
                    format!("expected an integer, got '{value}'"),
                ));
            }
        }
    }
    Ok(())
}
