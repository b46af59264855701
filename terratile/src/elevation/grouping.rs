//! Bucketing elevation samples by tile.

use super::ElevationSample;
use crate::coord::{geo_to_tile, TileIndex};
use std::fmt;

/// Most tiles a fewest-tiles grouping settles for.
pub const MAX_FEWEST_GROUPS: usize = 4;

/// Sample indices that fall in one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGroup {
    pub tile: TileIndex,
    /// Positions in the caller's sample slice, ascending.
    pub indices: Vec<usize>,
}

impl TileGroup {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// How a batch is split into tile fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingStrategy {
    /// One group per distinct tile at the requested level.
    #[default]
    PerTile,
    /// Coarsen the level until the batch fits in a handful of tiles.
    FewestTiles,
}

impl GroupingStrategy {
    /// Parses a config value (`per_tile`, `fewest_tiles`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_tile" | "pertile" => Some(GroupingStrategy::PerTile),
            "fewest_tiles" | "fewesttiles" => Some(GroupingStrategy::FewestTiles),
            _ => None,
        }
    }

    /// Groups `samples` at `level`, returning the level actually used.
    pub fn group(&self, samples: &[ElevationSample], level: u8) -> (u8, Vec<TileGroup>) {
        match self {
            GroupingStrategy::PerTile => (level, group_by_tile(samples, level)),
            GroupingStrategy::FewestTiles => group_by_fewest_tiles(samples, level),
        }
    }
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingStrategy::PerTile => write!(f, "per_tile"),
            GroupingStrategy::FewestTiles => write!(f, "fewest_tiles"),
        }
    }
}

/// Buckets sample indices by their tile at `level`.
///
/// Groups appear in the order their first sample does. Lookup is a linear
/// scan over existing groups; batches touch few tiles.
pub fn group_by_tile(samples: &[ElevationSample], level: u8) -> Vec<TileGroup> {
    let mut groups: Vec<TileGroup> = Vec::new();

    for (index, sample) in samples.iter().enumerate() {
        let tile = geo_to_tile(&sample.position, level);
        match groups.iter_mut().find(|g| g.tile == tile) {
            Some(group) => group.indices.push(index),
            None => groups.push(TileGroup {
                tile,
                indices: vec![index],
            }),
        }
    }

    groups
}

/// Groups at the finest level, starting from `level`, that needs at most
/// [`MAX_FEWEST_GROUPS`] tiles.
///
/// Returns the level used with its groups. Level 1 has only four tiles, so
/// the bound always holds once `level <= 1`.
pub fn group_by_fewest_tiles(samples: &[ElevationSample], level: u8) -> (u8, Vec<TileGroup>) {
    let mut level = level;
    loop {
        let groups = group_by_tile(samples, level);
        if groups.len() <= MAX_FEWEST_GROUPS || level <= 1 {
            return (level, groups);
        }
        level -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lon: f64) -> ElevationSample {
        ElevationSample::from_degrees(lat, lon)
    }

    #[test]
    fn test_group_by_tile_order_and_indices() {
        let samples = vec![
            sample(47.0, 8.0),
            sample(-33.0, 151.0),
            sample(47.0001, 8.0001),
        ];

        let groups = group_by_tile(&samples, 10);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].indices, vec![0, 2]);
        assert_eq!(groups[1].indices, vec![1]);
        assert_eq!(groups[0].tile.level(), 10);
    }

    #[test]
    fn test_group_by_tile_empty_batch() {
        assert!(group_by_tile(&[], 12).is_empty());
        assert_eq!(group_by_fewest_tiles(&[], 12), (12, Vec::new()));
    }

    #[test]
    fn test_fewest_tiles_keeps_level_when_small() {
        let samples = vec![sample(10.0, 10.0), sample(10.0, 10.0001)];
        let (level, groups) = group_by_fewest_tiles(&samples, 14);
        assert_eq!(level, 14);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_fewest_tiles_coarsens_scattered_batches() {
        let samples: Vec<_> = [
            (60.0, -150.0),
            (60.0, 30.0),
            (-60.0, -150.0),
            (-60.0, 30.0),
            (10.0, 100.0),
            (-10.0, -100.0),
        ]
        .iter()
        .map(|&(lat, lon)| sample(lat, lon))
        .collect();

        let (level, groups) = group_by_fewest_tiles(&samples, 16);
        assert!(groups.len() <= MAX_FEWEST_GROUPS);
        assert!(level < 16);
        assert!(level >= 1);

        let mut all: Vec<usize> = groups.iter().flat_map(|g| g.indices.clone()).collect();
        all.sort();
        assert_eq!(all, (0..samples.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_fewest_tiles_bound_holds_for_dense_grid() {
        let mut samples = Vec::new();
        for lat in (-80..=80).step_by(10) {
            for lon in (-180..180).step_by(15) {
                samples.push(sample(lat as f64, lon as f64));
            }
        }

        for start in [1u8, 5, 10, 23] {
            let (level, groups) = group_by_fewest_tiles(&samples, start);
            assert!(groups.len() <= MAX_FEWEST_GROUPS, "start {}", start);
            assert!(level <= start);
        }
    }

    #[test]
    fn test_fewest_tiles_stops_at_level_zero_input() {
        let samples = vec![sample(1.0, 1.0), sample(-1.0, -1.0)];
        let (level, groups) = group_by_fewest_tiles(&samples, 0);
        assert_eq!(level, 0);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_strategy_parse_and_display() {
        assert_eq!(GroupingStrategy::parse("fewest-tiles"), Some(GroupingStrategy::FewestTiles));
        assert_eq!(GroupingStrategy::parse("PER_TILE"), Some(GroupingStrategy::PerTile));
        assert_eq!(GroupingStrategy::parse("nearest"), None);
        assert_eq!(GroupingStrategy::FewestTiles.to_string(), "fewest_tiles");
    }

    #[test]
    fn test_strategy_group_per_tile_keeps_level() {
        let samples = vec![sample(0.5, 0.5)];
        let (level, groups) = GroupingStrategy::PerTile.group(&samples, 9);
        assert_eq!(level, 9);
        assert_eq!(groups.len(), 1);
    }
}
