use crate::map::SpatialMap;
use crate::sensor::HeightBand;
use crate::volume::{occupied_volume, VolumeVariant};

/// The covered share of the environment, in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoveredPercentage {
    Defined(f32),
    /// The environment has no occupied volume inside the height band, so there is nothing to cover.
    Undefined,
}

impl CoveredPercentage {
    pub fn new(covered_volume: f32, total_volume: f32) -> Self {
        if total_volume > 0.0 && total_volume.is_finite() {
            CoveredPercentage::Defined(100.0 * (covered_volume / total_volume))
        } else {
            CoveredPercentage::Undefined
        }
    }

    pub fn value(self) -> Option<f32> {
        match self {
            CoveredPercentage::Defined(p) => Some(p),
            CoveredPercentage::Undefined => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverageReport {
    pub covered_volume: f32,
    pub covered_percentage: CoveredPercentage,
}

/// Measures `coverage` against the environment's `total_volume`.
pub fn report(coverage: &SpatialMap, band: HeightBand, total_volume: f32) -> CoverageReport {
    let covered_volume = occupied_volume(coverage, band, VolumeVariant::Coverage);
    CoverageReport {
        covered_volume,
        covered_percentage: CoveredPercentage::new(covered_volume, total_volume),
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
