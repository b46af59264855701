//! INI serialization logic for converting `TerraTileConfig` → INI string.

use std::path::Path;

use super::settings::TerraTileConfig;

/// Convert a `TerraTileConfig` to a commented INI string for saving.
pub(super) fn to_config_string(config: &TerraTileConfig) -> String {
    let read_only = if config.store.read_only() {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[store]
; Directory holding the tile tables
directory = {}
; Serve existing rows only; never write fallback results back
read_only = {}
; Concurrent store operations (1 = single writer)
max_concurrent_io = {}

[network]
; Request timeout in seconds
timeout = {}
; URL templates for remote tile sources. Placeholders:
;   {{quadkey}} {{z}} {{x}} {{y}}
; Leave empty to disable the network fallback for that table.
imagery_url = {}
heightmap_url = {}
mask_url = {}
mesh_url = {}

[elevation]
; Level elevation queries group at
default_level = {}
; per_tile or fewest_tiles
strategy = {}
; Pooled heightmap decode buffers
scratch_buffers = {}
"#,
        path_to_string(config.store.root()),
        read_only,
        config.store.max_concurrent_io(),
        config.network.timeout_secs(),
        config.network.imagery_url().unwrap_or(""),
        config.network.heightmap_url().unwrap_or(""),
        config.network.mask_url().unwrap_or(""),
        config.network.mesh_url().unwrap_or(""),
        config.elevation.default_level(),
        config.elevation.strategy(),
        config.elevation.scratch_buffers(),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
