use crate::map::{decode_map, MapKind, SnapshotError, SpatialMap};
use crate::sensor::HeightBand;
use crate::volume::{tally_occupied, VolumeVariant};

/// The known environment together with its occupied volume.
///
/// The volume is computed once, when the map is loaded, and serves as the denominator of every coverage percentage until the
/// map is replaced.
#[derive(Clone, Debug)]
pub struct EnvironmentMap {
    map: SpatialMap,
    total_volume: f32,
}

impl EnvironmentMap {
    pub fn new(map: SpatialMap, band: HeightBand) -> Self {
        let tally = tally_occupied(&map, band, VolumeVariant::Plain);
        log::info!(
            "Environment volume {} m^3 from {} voxels ({} noise, {} outside height band)",
            tally.volume(),
            tally.counted,
            tally.noise,
            tally.out_of_band
        );
        Self {
            map,
            total_volume: tally.volume(),
        }
    }

    pub fn map(&self) -> &SpatialMap {
        &self.map
    }

    pub fn total_volume(&self) -> f32 {
        self.total_volume
    }

    pub fn resolution(&self) -> f32 {
        self.map.resolution()
    }
}

/// Owns the current [`EnvironmentMap`], if one has been loaded.
#[derive(Debug, Default)]
pub struct EnvironmentHolder {
    current: Option<EnvironmentMap>,
}

impl EnvironmentHolder {
    /// Decodes `bytes` into a new environment and swaps it in.
    ///
    /// The new map is fully built before the old one is dropped. On failure, the current environment is left untouched.
    pub fn load(&mut self, bytes: &[u8], band: HeightBand) -> Result<&EnvironmentMap, SnapshotError> {
        let map = decode_map(bytes, MapKind::Occupancy)?;
        log::info!(
            "Environment map decoded: {} voxels at resolution {}",
            map.len(),
            map.resolution()
        );
        Ok(self.replace(EnvironmentMap::new(map, band)))
    }

    pub fn replace(&mut self, environment: EnvironmentMap) -> &EnvironmentMap {
        self.current.insert(environment)
    }

    pub fn get(&self) -> Option<&EnvironmentMap> {
        self.current.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
