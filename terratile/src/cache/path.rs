//! Row path construction for the tile store.

use super::types::TileTable;
use crate::coord::TileIndex;
use std::path::{Path, PathBuf};

/// File extension of committed rows.
pub const ROW_EXTENSION: &str = "tile";

/// File name standing in for the empty level-0 quadkey.
const ROOT_ROW_STEM: &str = "_";

/// Construct the full path of a stored row.
///
/// Creates a hierarchical path structure:
/// ```text
/// <root>/<table>/<level>/<quadkey>.tile
/// ```
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use terratile::cache::{row_path, TileTable};
/// use terratile::coord::TileIndex;
///
/// let tile = TileIndex::new(3, 5, 3).unwrap();
/// let path = row_path(&PathBuf::from("/store"), TileTable::Heightmaps, &tile);
///
/// assert_eq!(path, PathBuf::from("/store/heightmaps/3/213.tile"));
/// ```
pub fn row_path(root: &Path, table: TileTable, tile: &TileIndex) -> PathBuf {
    level_directory(root, table, tile.level()).join(row_file_name(tile))
}

/// Directory holding all rows of one table at one level.
pub fn level_directory(root: &Path, table: TileTable, level: u8) -> PathBuf {
    table_directory(root, table).join(level.to_string())
}

/// Directory of one table.
pub fn table_directory(root: &Path, table: TileTable) -> PathBuf {
    root.join(table.dir_name())
}

fn row_file_name(tile: &TileIndex) -> String {
    let quadkey = tile.to_quadkey();
    let stem = if quadkey.is_empty() {
        ROOT_ROW_STEM
    } else {
        quadkey.as_str()
    };
    format!("{}.{}", stem, ROW_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_path_uses_quadkey() {
        let tile = TileIndex::new(1, 1, 0).unwrap();
        let path = row_path(Path::new("/cache"), TileTable::TileImages, &tile);
        assert_eq!(path, PathBuf::from("/cache/tile_images/1/2.tile"));
    }

    #[test]
    fn test_root_tile_has_placeholder_name() {
        let path = row_path(Path::new("/cache"), TileTable::Meshes, &TileIndex::root());
        assert_eq!(path, PathBuf::from("/cache/meshes/0/_.tile"));
    }

    #[test]
    fn test_tables_do_not_collide() {
        let tile = TileIndex::new(2, 3, 1).unwrap();
        let a = row_path(Path::new("/c"), TileTable::Heightmaps, &tile);
        let b = row_path(Path::new("/c"), TileTable::AttributeMasks, &tile);
        assert_ne!(a, b);
        assert_eq!(a.file_name(), b.file_name());
    }
}
