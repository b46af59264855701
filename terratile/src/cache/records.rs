//! Row formats for the four store tables.

use super::types::TileTable;
use thiserror::Error;

/// Magic prefix of a heightmap row.
const HEIGHTMAP_MAGIC: &[u8; 4] = b"TTHM";

/// Magic plus two little-endian `f64` scale parameters.
const HEIGHTMAP_HEADER_LEN: usize = 4 + 8 + 8;

/// Errors decoding a stored row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("row too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("bad magic {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
}

/// A payload type stored in one table of the tile store.
pub trait TileRecord: Sized + Send + Sync + 'static {
    /// Table this record lives in.
    const TABLE: TileTable;

    /// Serialises the record into its row bytes.
    fn encode(&self) -> Vec<u8>;

    /// Parses row bytes.
    fn decode(bytes: Vec<u8>) -> Result<Self, RecordError>;
}

/// A heightmap tile: an encoded grayscale image plus its elevation scale.
///
/// Cell value `v` maps to `v * elevation_delta / (2^bit_depth - 1) +
/// base_elevation` meters.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapRecord {
    pub base_elevation: f64,
    pub elevation_delta: f64,
    pub height_map: Vec<u8>,
}

impl TileRecord for HeightmapRecord {
    const TABLE: TileTable = TileTable::Heightmaps;

    fn encode(&self) -> Vec<u8> {
        let mut row = Vec::with_capacity(HEIGHTMAP_HEADER_LEN + self.height_map.len());
        row.extend_from_slice(HEIGHTMAP_MAGIC);
        row.extend_from_slice(&self.base_elevation.to_le_bytes());
        row.extend_from_slice(&self.elevation_delta.to_le_bytes());
        row.extend_from_slice(&self.height_map);
        row
    }

    fn decode(mut bytes: Vec<u8>) -> Result<Self, RecordError> {
        if bytes.len() < HEIGHTMAP_HEADER_LEN {
            return Err(RecordError::TooShort {
                len: bytes.len(),
                min: HEIGHTMAP_HEADER_LEN,
            });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        if &magic != HEIGHTMAP_MAGIC {
            return Err(RecordError::BadMagic { found: magic });
        }

        let base_elevation = read_f64(&bytes[4..12]);
        let elevation_delta = read_f64(&bytes[12..20]);
        for (field, value) in [
            ("base_elevation", base_elevation),
            ("elevation_delta", elevation_delta),
        ] {
            if !value.is_finite() {
                return Err(RecordError::NonFinite { field, value });
            }
        }

        let height_map = bytes.split_off(HEIGHTMAP_HEADER_LEN);
        Ok(Self {
            base_elevation,
            elevation_delta,
            height_map,
        })
    }
}

fn read_f64(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    f64::from_le_bytes(buf)
}

macro_rules! blob_record {
    ($(#[$meta:meta])* $name:ident, $field:ident, $table:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub $field: Vec<u8>,
        }

        impl $name {
            pub fn new($field: Vec<u8>) -> Self {
                Self { $field }
            }
        }

        impl TileRecord for $name {
            const TABLE: TileTable = $table;

            fn encode(&self) -> Vec<u8> {
                self.$field.clone()
            }

            fn decode(bytes: Vec<u8>) -> Result<Self, RecordError> {
                Ok(Self { $field: bytes })
            }
        }
    };
}

blob_record!(
    /// An encoded imagery tile (PNG/JPEG bytes).
    ImageRecord,
    image,
    TileTable::TileImages
);

blob_record!(
    /// An encoded attribute mask tile.
    AttributeMaskRecord,
    mask,
    TileTable::AttributeMasks
);

blob_record!(
    /// An opaque serialized mesh.
    MeshRecord,
    blob,
    TileTable::Meshes
);
