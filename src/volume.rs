use crate::map::{SpatialMap, VoxelKey};
use crate::sensor::HeightBand;

/// Horizontal axes checked by [`is_noise`]. Z is never checked.
const NOISE_AXES: [usize; 2] = [0, 1];

/// Selects which occupied voxels count toward a volume.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VolumeVariant {
    /// Raw occupancy, e.g. an environment map. Occupied voxels that look like isolated sensor noise are excluded.
    Plain,
    /// A coverage map. Its occupied voxels are confirmed sensor hits, so all of them count.
    Coverage,
}

/// The outcome of classifying every leaf of a map.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VolumeTally {
    pub voxel_volume: f32,
    /// Occupied, in-band voxels that count toward the volume.
    pub counted: usize,
    /// Occupied, in-band voxels excluded as noise.
    pub noise: usize,
    /// Voxels whose centers are outside the height band.
    pub out_of_band: usize,
}

impl VolumeTally {
    pub fn volume(&self) -> f32 {
        self.counted as f32 * self.voxel_volume
    }
}

/// Classifies every leaf inside the metric extent of `map`.
pub fn tally_occupied(map: &SpatialMap, band: HeightBand, variant: VolumeVariant) -> VolumeTally {
    let mut tally = VolumeTally {
        voxel_volume: map.voxel_volume(),
        ..Default::default()
    };
    let extent = match map.metric_extent() {
        Some(e) => e,
        None => return tally,
    };

    for (key, voxel) in map.leaves_in_extent(extent) {
        if !band.contains(map.voxel_center(key).z) {
            tally.out_of_band += 1;
            continue;
        }
        if !voxel.is_occupied() {
            continue;
        }
        if variant == VolumeVariant::Plain && is_noise(map, key) {
            tally.noise += 1;
            continue;
        }
        tally.counted += 1;
    }
    tally
}

/// The total volume of the occupied voxels of `map` whose centers lie in `band`.
pub fn occupied_volume(map: &SpatialMap, band: HeightBand, variant: VolumeVariant) -> f32 {
    tally_occupied(map, band, variant).volume()
}

/// An occupied voxel is noise if, along X or along Y, its next neighbor is occupied but the voxel after that is unknown.
///
/// A real surface either keeps going or is bounded by observed free space; an occupied pair that trails off into the
/// unknown is more likely a single spurious reading. Keys beyond the `i32` lattice are unknown.
pub fn is_noise(map: &SpatialMap, key: VoxelKey) -> bool {
    NOISE_AXES.iter().any(|&axis| {
        let next_occupied = key.offset_along(axis, 1).map_or(false, |k| map.is_occupied(k));
        next_occupied && key.offset_along(axis, 2).map_or(true, |k| map.search(k).is_none())
    })
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::Occupancy;

    use approx::assert_relative_eq;

    fn band() -> HeightBand {
        HeightBand::new(0.3, 2.0).unwrap()
    }

    fn map_with(resolution: f32, voxels: &[([i32; 3], Occupancy)]) -> SpatialMap {
        let mut map = SpatialMap::new(resolution).unwrap();
        for (key, occupancy) in voxels {
            map.set_occupancy(VoxelKey::from_array(*key), *occupancy);
        }
        map
    }

    #[test]
    fn empty_map_has_no_volume() {
        let map = SpatialMap::new(0.1).unwrap();
        assert_eq!(occupied_volume(&map, band(), VolumeVariant::Plain), 0.0);
    }

    #[test]
    fn pair_trailing_into_unknown_is_noise() {
        // A, B occupied; C unknown.
        let map = map_with(1.0, &[([0, 0, 1], Occupancy::Occupied), ([1, 0, 1], Occupancy::Occupied)]);
        let a = VoxelKey::new(0, 0, 1);
        assert!(is_noise(&map, a));

        let tally = tally_occupied(&map, band(), VolumeVariant::Plain);
        // B has no occupied neighbor in +X or +Y, so it counts.
        assert_eq!(tally.noise, 1);
        assert_eq!(tally.counted, 1);
        assert_relative_eq!(tally.volume(), 1.0);
    }

    #[test]
    fn continuing_run_is_not_noise() {
        let map = map_with(
            1.0,
            &[
                ([0, 0, 1], Occupancy::Occupied),
                ([1, 0, 1], Occupancy::Occupied),
                ([2, 0, 1], Occupancy::Occupied),
            ],
        );
        assert!(!is_noise(&map, VoxelKey::new(0, 0, 1)));
    }

    #[test]
    fn run_bounded_by_free_space_is_not_noise() {
        let map = map_with(
            0.5,
            &[
                ([0, 0, 2], Occupancy::Occupied),
                ([0, 1, 2], Occupancy::Occupied),
                ([0, 2, 2], Occupancy::Free),
            ],
        );
        assert!(!is_noise(&map, VoxelKey::new(0, 0, 2)));
        assert_relative_eq!(occupied_volume(&map, band(), VolumeVariant::Plain), 2.0 * 0.125);
    }

    #[test]
    fn noise_on_either_horizontal_axis_excludes() {
        let map = map_with(
            1.0,
            &[
                ([0, 0, 1], Occupancy::Occupied),
                ([1, 0, 1], Occupancy::Occupied),
                ([2, 0, 1], Occupancy::Occupied),
                ([0, 1, 1], Occupancy::Occupied),
            ],
        );
        // Fine along X, noisy along Y.
        assert!(is_noise(&map, VoxelKey::new(0, 0, 1)));
    }

    #[test]
    fn vertical_pairs_are_never_noise() {
        let map = map_with(1.0, &[([0, 0, 1], Occupancy::Occupied), ([0, 0, 2], Occupancy::Occupied)]);
        assert!(!is_noise(&map, VoxelKey::new(0, 0, 1)));
        assert_relative_eq!(occupied_volume(&map, band(), VolumeVariant::Plain), 2.0);
    }

    #[test]
    fn lookahead_past_the_lattice_edge_is_unknown() {
        let map = map_with(
            1.0,
            &[
                ([i32::MAX - 1, 0, 1], Occupancy::Occupied),
                ([i32::MAX, 0, 1], Occupancy::Occupied),
            ],
        );
        assert!(is_noise(&map, VoxelKey::new(i32::MAX - 1, 0, 1)));
        assert!(!is_noise(&map, VoxelKey::new(i32::MAX, 0, 1)));
    }

    #[test]
    fn coverage_variant_skips_the_noise_filter() {
        let map = map_with(1.0, &[([0, 0, 1], Occupancy::Occupied), ([1, 0, 1], Occupancy::Occupied)]);
        assert_relative_eq!(occupied_volume(&map, band(), VolumeVariant::Coverage), 2.0);
    }

    #[test]
    fn height_band_excludes_voxels() {
        let map = map_with(
            1.0,
            &[
                ([0, 0, 0], Occupancy::Occupied),
                ([5, 5, 1], Occupancy::Occupied),
                ([9, 9, 3], Occupancy::Occupied),
                ([7, 7, 1], Occupancy::Free),
            ],
        );
        let tally = tally_occupied(&map, band(), VolumeVariant::Coverage);
        assert_eq!(tally.out_of_band, 2);
        assert_eq!(tally.counted, 1);
        assert_relative_eq!(tally.volume(), 1.0);
    }
}
