/// The observed state of a stored voxel. Voxels that are not stored are unknown.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Occupancy {
    Free,
    Occupied,
}

impl Occupancy {
    pub const fn code(self) -> u8 {
        match self {
            Occupancy::Free => 0,
            Occupancy::Occupied => 1,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Occupancy::Free),
            1 => Some(Occupancy::Occupied),
            _ => None,
        }
    }
}

/// Marks a voxel as covered by a sensor of a particular shape. Only used for visualization.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CoverageTag {
    Circular,
    Orthogonal,
}

impl CoverageTag {
    pub const fn color(self) -> [u8; 3] {
        match self {
            CoverageTag::Circular => [255, 0, 0],
            CoverageTag::Orthogonal => [128, 128, 128],
        }
    }

    /// `0` is reserved for "untagged" in serialized form.
    pub const fn code(tag: Option<Self>) -> u8 {
        match tag {
            None => 0,
            Some(CoverageTag::Circular) => 1,
            Some(CoverageTag::Orthogonal) => 2,
        }
    }

    pub const fn from_code(code: u8) -> Option<Option<Self>> {
        match code {
            0 => Some(None),
            1 => Some(Some(CoverageTag::Circular)),
            2 => Some(Some(CoverageTag::Orthogonal)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Voxel {
    pub occupancy: Occupancy,
    pub tag: Option<CoverageTag>,
}

impl Voxel {
    pub const FREE: Self = Self::new(Occupancy::Free);
    pub const OCCUPIED: Self = Self::new(Occupancy::Occupied);

    pub const fn new(occupancy: Occupancy) -> Self {
        Self {
            occupancy,
            tag: None,
        }
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.occupancy == Occupancy::Occupied
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
