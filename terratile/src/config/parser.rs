//! INI parsing logic for converting `Ini` → `TerraTileConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigError;
use super::settings::TerraTileConfig;
use crate::coord::MAX_LEVEL;
use crate::elevation::GroupingStrategy;

/// Parse an `Ini` object into a `TerraTileConfig`.
///
/// Starts from `TerraTileConfig::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<TerraTileConfig, ConfigError> {
    let mut config = TerraTileConfig::default();

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        let mut store = config.store.clone();
        if let Some(v) = non_empty(section, "directory") {
            store = store.with_root(expand_tilde(v));
        }
        if let Some(v) = section.get("read_only") {
            store = store.with_read_only(parse_bool(v));
        }
        if let Some(v) = section.get("max_concurrent_io") {
            let n: usize = parse_number("store", "max_concurrent_io", v)?;
            if n == 0 {
                return Err(invalid("store", "max_concurrent_io", v, "must be at least 1"));
            }
            store = store.with_max_concurrent_io(n);
        }
        config.store = store;
    }

    // [network] section
    if let Some(section) = ini.section(Some("network")) {
        let mut network = config.network.clone();
        if let Some(v) = section.get("timeout") {
            let secs: u64 = parse_number("network", "timeout", v)?;
            if secs == 0 {
                return Err(invalid("network", "timeout", v, "must be at least 1 second"));
            }
            network = network.with_timeout_secs(secs);
        }
        if let Some(v) = non_empty(section, "imagery_url") {
            network = network.with_imagery_url(parse_url("imagery_url", v)?);
        }
        if let Some(v) = non_empty(section, "heightmap_url") {
            network = network.with_heightmap_url(parse_url("heightmap_url", v)?);
        }
        if let Some(v) = non_empty(section, "mask_url") {
            network = network.with_mask_url(parse_url("mask_url", v)?);
        }
        if let Some(v) = non_empty(section, "mesh_url") {
            network = network.with_mesh_url(parse_url("mesh_url", v)?);
        }
        config.network = network;
    }

    // [elevation] section
    if let Some(section) = ini.section(Some("elevation")) {
        let mut elevation = config.elevation;
        if let Some(v) = section.get("default_level") {
            let level: u8 = parse_number("elevation", "default_level", v)?;
            if level > MAX_LEVEL {
                return Err(invalid(
                    "elevation",
                    "default_level",
                    v,
                    &format!("must be between 0 and {}", MAX_LEVEL),
                ));
            }
            elevation = elevation.with_default_level(level);
        }
        if let Some(v) = section.get("strategy") {
            let strategy = GroupingStrategy::parse(v).ok_or_else(|| {
                invalid("elevation", "strategy", v, "must be one of: per_tile, fewest_tiles")
            })?;
            elevation = elevation.with_strategy(strategy);
        }
        if let Some(v) = section.get("scratch_buffers") {
            let n: usize = parse_number("elevation", "scratch_buffers", v)?;
            if n == 0 {
                return Err(invalid("elevation", "scratch_buffers", v, "must be at least 1"));
            }
            elevation = elevation.with_scratch_buffers(n);
        }
        config.elevation = elevation;
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn parse_url<'a>(key: &str, value: &'a str) -> Result<&'a str, ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value)
    } else {
        Err(invalid("network", key, value, "must be an http:// or https:// URL template"))
    }
}

pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
