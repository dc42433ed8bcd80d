use crate::coordinates::{visit_descendants, MAX_NODE_LEVEL};
use crate::key::VoxelKey;
use crate::map::{InvalidResolution, SpatialMap};
use crate::voxel::{CoverageTag, Occupancy, Voxel};
use crate::core::glam::IVec3;

use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use rkyv::{AlignedVec, Archive, Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read, Write};
use thiserror::Error;

/// The most finest-level voxels a decoded snapshot may expand into.
pub const MAX_SNAPSHOT_VOXELS: u64 = 1 << 24;

/// Identifies the voxel representation stored in a [`MapSnapshot`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MapKind {
    /// Plain occupancy. Environment maps must be of this kind.
    Occupancy,
    /// Occupancy with per-voxel [`CoverageTag`]s.
    Coverage,
}

impl MapKind {
    pub const fn code(self) -> u8 {
        match self {
            MapKind::Occupancy => 1,
            MapKind::Coverage => 2,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MapKind::Occupancy),
            2 => Some(MapKind::Coverage),
            _ => None,
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKind::Occupancy => write!(f, "OccupancyMap"),
            MapKind::Coverage => write!(f, "CoverageMap"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to decompress snapshot: {0}")]
    Decompress(#[from] io::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("malformed snapshot: {0}")]
    Malformed(String),
    #[error("snapshot has unknown voxel representation tag {0}")]
    UnknownRepresentation(u8),
    #[error("snapshot contains a {found}, expected a {expected}")]
    WrongRepresentation { expected: MapKind, found: MapKind },
    #[error(transparent)]
    InvalidResolution(#[from] InvalidResolution),
    #[error("snapshot node at level {0} is too deep to expand")]
    LevelTooDeep(u8),
}

/// One node of a serialized map. A node at `level` L covers `2^L` finest-level voxels along each axis, starting at
/// `key << L`.
#[derive(Archive, Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[archive(check_bytes)]
pub struct SnapshotNode {
    pub key: [i32; 3],
    pub level: u8,
    pub occupancy: u8,
    pub tag: u8,
}

impl SnapshotNode {
    pub fn leaf(key: VoxelKey, voxel: Voxel) -> Self {
        Self {
            key: key.to_array(),
            level: 0,
            occupancy: voxel.occupancy.code(),
            tag: CoverageTag::code(voxel.tag),
        }
    }

    pub fn voxel(&self) -> Result<Voxel, SnapshotError> {
        let occupancy = Occupancy::from_code(self.occupancy).ok_or_else(|| {
            SnapshotError::Malformed(format!("invalid occupancy code {}", self.occupancy))
        })?;
        let tag = CoverageTag::from_code(self.tag)
            .ok_or_else(|| SnapshotError::Malformed(format!("invalid tag code {}", self.tag)))?;
        Ok(Voxel { occupancy, tag })
    }

    /// The number of finest-level voxels this node expands into.
    pub fn voxel_count(&self) -> u64 {
        1u64 << (3 * u32::from(self.level.min(MAX_NODE_LEVEL)))
    }

    /// Whether every descendant key of this node is representable.
    fn expansion_fits(&self) -> bool {
        let side = 1i32 << self.level;
        self.key
            .iter()
            .all(|&c| c.checked_mul(side).and_then(|m| m.checked_add(side - 1)).is_some())
    }
}

/// The serialized form of a [`SpatialMap`], possibly with hierarchically merged nodes.
///
/// On the wire, a snapshot is an `rkyv` archive wrapped in an LZ4 frame. Archives are validated before they are read, so
/// arbitrary bytes can be fed to [`MapSnapshot::decode`].
#[derive(Archive, Clone, Debug, Deserialize, PartialEq, Serialize)]
#[archive(check_bytes)]
pub struct MapSnapshot {
    pub kind: u8,
    pub resolution: f32,
    pub nodes: Vec<SnapshotNode>,
}

impl MapSnapshot {
    /// A snapshot with one leaf node per voxel of `map`.
    pub fn from_map(map: &SpatialMap, kind: MapKind) -> Self {
        let mut nodes: Vec<_> = map
            .iter()
            .map(|(key, voxel)| SnapshotNode::leaf(key, *voxel))
            .collect();
        // Deterministic output for identical maps.
        nodes.sort_unstable_by_key(|n| (n.key[2], n.key[1], n.key[0]));
        Self {
            kind: kind.code(),
            resolution: map.resolution(),
            nodes,
        }
    }

    pub fn kind(&self) -> Result<MapKind, SnapshotError> {
        MapKind::from_code(self.kind).ok_or(SnapshotError::UnknownRepresentation(self.kind))
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        let archive = rkyv::to_bytes::<_, 1024>(self)
            .map_err(|e| SnapshotError::Encode(e.to_string()))?;

        let mut encoder = FrameEncoder::new(Vec::new());
        encoder
            .write_all(archive.as_ref())
            .map_err(|e| SnapshotError::Encode(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let mut decompressed = Vec::new();
        FrameDecoder::new(bytes).read_to_end(&mut decompressed)?;

        // Validation requires the archive to be aligned.
        let mut aligned = AlignedVec::with_capacity(decompressed.len());
        aligned.extend_from_slice(&decompressed);

        let archived = rkyv::check_archived_root::<MapSnapshot>(&aligned[..])
            .map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|_| SnapshotError::Malformed("failed to deserialize archive".to_owned()))
    }

    /// Builds the map described by this snapshot, expanding merged nodes into finest-level voxels.
    ///
    /// Fails without building anything if the snapshot is not of the `expected` kind, or if its nodes would expand into
    /// more than [`MAX_SNAPSHOT_VOXELS`] voxels.
    pub fn into_map(self, expected: MapKind) -> Result<SpatialMap, SnapshotError> {
        self.into_map_with_budget(expected, MAX_SNAPSHOT_VOXELS)
    }

    /// Like [`Self::into_map`], with an explicit limit on the number of expanded voxels.
    pub fn into_map_with_budget(
        self,
        expected: MapKind,
        max_voxels: u64,
    ) -> Result<SpatialMap, SnapshotError> {
        let found = self.kind()?;
        if found != expected {
            return Err(SnapshotError::WrongRepresentation { expected, found });
        }

        // Validate every node before allocating any voxels.
        let mut total_voxels = 0u64;
        for node in self.nodes.iter() {
            if node.level > MAX_NODE_LEVEL {
                return Err(SnapshotError::LevelTooDeep(node.level));
            }
            if !node.expansion_fits() {
                return Err(SnapshotError::Malformed(format!(
                    "node {:?} at level {} expands outside the key range",
                    node.key, node.level
                )));
            }
            total_voxels = total_voxels.saturating_add(node.voxel_count());
        }
        if total_voxels > max_voxels {
            return Err(SnapshotError::Malformed(format!(
                "nodes expand into {} voxels, more than the limit of {}",
                total_voxels, max_voxels
            )));
        }

        let mut map = SpatialMap::new(self.resolution)?;
        for node in self.nodes.iter() {
            let voxel = node.voxel()?;
            visit_descendants(node.level, IVec3::from_array(node.key), |key| {
                map.set(key, voxel)
            });
        }
        log::debug!(
            "Expanded {} snapshot nodes into {} voxels at resolution {}",
            self.nodes.len(),
            map.len(),
            map.resolution()
        );
        Ok(map)
    }
}

/// Serializes all of `map` as a snapshot of `kind`.
pub fn encode_map(map: &SpatialMap, kind: MapKind) -> Result<Vec<u8>, SnapshotError> {
    MapSnapshot::from_map(map, kind).encode()
}

/// Deserializes a map of the `expected` kind.
pub fn decode_map(bytes: &[u8], expected: MapKind) -> Result<SpatialMap, SnapshotError> {
    MapSnapshot::decode(bytes)?.into_map(expected)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
