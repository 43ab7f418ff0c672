//! The per-rank partition consumed by domain setup, and the provider trait.

use crate::error::MeshError;
use shear_core::{ElementId, Rank, Real, SubdomainId};

/// One of the four faces of an axis-aligned quadrilateral.
///
/// Discriminants are the face indices used throughout: 0 = x-min,
/// 1 = x-max, 2 = y-min, 3 = y-max.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    /// Left face, outward normal `(-1, 0)`.
    XMin = 0,
    /// Right face, outward normal `(1, 0)`.
    XMax = 1,
    /// Bottom face, outward normal `(0, -1)`.
    YMin = 2,
    /// Top face, outward normal `(0, 1)`.
    YMax = 3,
}

impl Face {
    /// All faces in index order.
    pub const ALL: [Face; 4] = [Face::XMin, Face::XMax, Face::YMin, Face::YMax];

    /// Face index in `0..4`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Face for an index in `0..4`.
    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// The face met across this one on a neighboring element.
    pub fn opposite(self) -> Self {
        match self {
            Self::XMin => Self::XMax,
            Self::XMax => Self::XMin,
            Self::YMin => Self::YMax,
            Self::YMax => Self::YMin,
        }
    }

    /// Outward unit normal.
    pub fn normal(self) -> (Real, Real) {
        match self {
            Self::XMin => (-1.0, 0.0),
            Self::XMax => (1.0, 0.0),
            Self::YMin => (0.0, -1.0),
            Self::YMax => (0.0, 1.0),
        }
    }

    /// Whether the face is normal to the x axis.
    pub fn is_x_face(self) -> bool {
        matches!(self, Self::XMin | Self::XMax)
    }
}

/// Axis-aligned bounding box of an element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Lower x.
    pub x0: Real,
    /// Upper x.
    pub x1: Real,
    /// Lower y.
    pub y0: Real,
    /// Upper y.
    pub y1: Real,
}

impl Bounds {
    /// Width along x.
    pub fn hx(&self) -> Real {
        self.x1 - self.x0
    }

    /// Height along y.
    pub fn hy(&self) -> Real {
        self.y1 - self.y0
    }

    /// Element extent normal to `face`.
    pub fn normal_extent(&self, face: Face) -> Real {
        if face.is_x_face() {
            self.hx()
        } else {
            self.hy()
        }
    }
}

/// The element across a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborElement {
    /// Global id of the neighbor.
    pub gid: ElementId,
    /// Rank owning the neighbor.
    pub rank: Rank,
    /// Subdomain the neighbor is assigned to.
    pub subdomain: SubdomainId,
    /// Polynomial order of the neighbor.
    pub order: usize,
    /// The neighbor's face that touches ours.
    pub face: Face,
}

/// What lies across one face of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceNeighbor {
    /// Domain exterior.
    Boundary,
    /// Another (possibly remote, possibly the same) element.
    Element(NeighborElement),
}

/// One element owned by the partition's rank.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementInfo {
    /// Global element id.
    pub gid: ElementId,
    /// Spatial extent.
    pub bounds: Bounds,
    /// Target subdomain.
    pub subdomain: SubdomainId,
    /// Polynomial order.
    pub order: usize,
    /// Neighbors indexed by [`Face::index`].
    pub neighbors: [FaceNeighbor; 4],
}

/// The elements owned by one rank, in provider order.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    /// The owning rank.
    pub rank: Rank,
    /// Number of ranks in the world.
    pub size: u32,
    /// Owned elements.
    pub elements: Vec<ElementInfo>,
}

impl Partition {
    /// Distinct subdomain ids present, ascending.
    pub fn subdomain_ids(&self) -> Vec<SubdomainId> {
        let mut ids: Vec<SubdomainId> = self.elements.iter().map(|e| e.subdomain).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Elements assigned to `sub`, in provider order.
    pub fn elements_of(&self, sub: SubdomainId) -> impl Iterator<Item = &ElementInfo> {
        self.elements.iter().filter(move |e| e.subdomain == sub)
    }
}

/// Source of element-to-subdomain assignments and face adjacency.
///
/// Implementations must be deterministic: every rank calling
/// `partition` with the same arguments sees a consistent global picture,
/// so that a face seen from both sides names the same pair of elements.
pub trait MeshProvider {
    /// The elements owned by `rank` in a world of `size` ranks.
    fn partition(&self, rank: Rank, size: u32) -> Result<Partition, MeshError>;
}
