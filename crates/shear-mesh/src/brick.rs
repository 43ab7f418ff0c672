//! Uniform brick mesh on the unit square.

use crate::connectivity::Connectivity;
use crate::error::MeshError;
use crate::morton;
use crate::partition::{
    Bounds, ElementInfo, Face, FaceNeighbor, MeshProvider, NeighborElement, Partition,
};
use shear_core::{ElementId, Rank, Real, SubdomainId};

/// `2^level x 2^level` equal quadrilaterals covering `[0, 1]^2`.
///
/// Global element ids are Morton codes of the element's `(ix, iy)` index.
/// Ranks and subdomains are both contiguous cuts of the id range: part
/// `p` of `P` starts at `floor(G p / P)` for `G` elements. Subdomain `s`
/// is discretized at order `base_order + s * order_step`.
///
/// # Examples
///
/// ```
/// use shear_mesh::{BrickMesh, Connectivity, MeshProvider};
/// use shear_core::Rank;
///
/// let mesh = BrickMesh::new(2, Connectivity::UnitSquare, 1, 4, 0).unwrap();
/// assert_eq!(mesh.num_elements(), 16);
/// let part = mesh.partition(Rank(0), 1).unwrap();
/// assert_eq!(part.elements.len(), 16);
/// ```
#[derive(Clone, Debug)]
pub struct BrickMesh {
    level: u32,
    connectivity: Connectivity,
    num_subdomains: u32,
    base_order: usize,
    order_step: usize,
}

impl BrickMesh {
    /// Deepest supported refinement (about a million elements).
    pub const MAX_LEVEL: u32 = 10;

    /// Create a brick mesh.
    ///
    /// Returns `Err(MeshError::LevelTooDeep)` past [`Self::MAX_LEVEL`],
    /// `Err(MeshError::Zero)` for zero subdomains or order, and
    /// `Err(MeshError::TooManyParts)` when there are more subdomains than
    /// elements.
    pub fn new(
        level: u32,
        connectivity: Connectivity,
        num_subdomains: u32,
        base_order: usize,
        order_step: usize,
    ) -> Result<Self, MeshError> {
        if level > Self::MAX_LEVEL {
            return Err(MeshError::LevelTooDeep {
                level,
                max: Self::MAX_LEVEL,
            });
        }
        if num_subdomains == 0 {
            return Err(MeshError::Zero {
                name: "num_subdomains",
            });
        }
        if base_order == 0 {
            return Err(MeshError::Zero { name: "order" });
        }
        let mesh = Self {
            level,
            connectivity,
            num_subdomains,
            base_order,
            order_step,
        };
        if u64::from(num_subdomains) > mesh.num_elements() {
            return Err(MeshError::TooManyParts {
                name: "subdomains",
                parts: u64::from(num_subdomains),
                elements: mesh.num_elements(),
            });
        }
        Ok(mesh)
    }

    /// Elements per axis.
    pub fn side(&self) -> u32 {
        1 << self.level
    }

    /// Total element count.
    pub fn num_elements(&self) -> u64 {
        u64::from(self.side()) * u64::from(self.side())
    }

    /// Topology.
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Polynomial order of subdomain `sub`.
    pub fn order_of(&self, sub: SubdomainId) -> usize {
        self.base_order + sub.0 as usize * self.order_step
    }

    fn subdomain_of(&self, gid: u64) -> SubdomainId {
        SubdomainId(owner_of(gid, self.num_elements(), u64::from(self.num_subdomains)) as u32)
    }

    fn bounds_of(&self, ix: u32, iy: u32) -> Bounds {
        let h = 1.0 / Real::from(self.side());
        Bounds {
            x0: Real::from(ix) * h,
            x1: Real::from(ix + 1) * h,
            y0: Real::from(iy) * h,
            y1: Real::from(iy + 1) * h,
        }
    }

    fn neighbor(&self, ix: u32, iy: u32, face: Face, size: u32) -> FaceNeighbor {
        let (dx, dy) = match face {
            Face::XMin => (-1, 0),
            Face::XMax => (1, 0),
            Face::YMin => (0, -1),
            Face::YMax => (0, 1),
        };
        let side = self.side();
        let nx = self.connectivity.resolve_axis(i64::from(ix) + dx, side);
        let ny = self.connectivity.resolve_axis(i64::from(iy) + dy, side);
        match (nx, ny) {
            (Some(nx), Some(ny)) => {
                let gid = morton::encode(nx, ny);
                let subdomain = self.subdomain_of(gid);
                FaceNeighbor::Element(NeighborElement {
                    gid: ElementId(gid),
                    rank: Rank(owner_of(gid, self.num_elements(), u64::from(size)) as u32),
                    subdomain,
                    order: self.order_of(subdomain),
                    face: face.opposite(),
                })
            }
            _ => FaceNeighbor::Boundary,
        }
    }
}

/// First id of part `p` when `total` ids are cut into `parts` pieces.
pub(crate) fn part_start(p: u64, total: u64, parts: u64) -> u64 {
    total * p / parts
}

/// The part owning id `g`: the largest `p` with `part_start(p) <= g`.
pub(crate) fn owner_of(g: u64, total: u64, parts: u64) -> u64 {
    ((g + 1) * parts - 1) / total
}

impl MeshProvider for BrickMesh {
    fn partition(&self, rank: Rank, size: u32) -> Result<Partition, MeshError> {
        if size == 0 {
            return Err(MeshError::Zero { name: "size" });
        }
        if rank.0 >= size {
            return Err(MeshError::RankOutOfRange { rank: rank.0, size });
        }
        let total = self.num_elements();
        if u64::from(size) > total {
            return Err(MeshError::TooManyParts {
                name: "ranks",
                parts: u64::from(size),
                elements: total,
            });
        }
        let first = part_start(u64::from(rank.0), total, u64::from(size));
        let last = part_start(u64::from(rank.0) + 1, total, u64::from(size));

        let elements = (first..last)
            .map(|gid| {
                let (ix, iy) = morton::decode(gid);
                let subdomain = self.subdomain_of(gid);
                ElementInfo {
                    gid: ElementId(gid),
                    bounds: self.bounds_of(ix, iy),
                    subdomain,
                    order: self.order_of(subdomain),
                    neighbors: Face::ALL.map(|f| self.neighbor(ix, iy, f, size)),
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            rank = rank.0,
            size,
            elements = elements.len(),
            first,
            "brick mesh partitioned"
        );
        Ok(Partition {
            rank,
            size,
            elements,
        })
    }
}
