//! Geometry payloads attached to subdomains.
//!
//! A volume subdomain holds a block of elements and the element faces
//! shared between two of its own elements. A glue subdomain holds an
//! ordered list of owner-element faces plus the identity of whatever lies
//! across them. Node data for both lives in the subdomain's fields; the
//! payload only describes how those nodes are laid out.

use shear_core::{ElementId, GlueKind, Rank, SubdomainId};
use shear_mesh::{Bounds, Face};

/// One element of a volume subdomain.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementGeom {
    /// Global element id.
    pub gid: ElementId,
    /// Spatial extent.
    pub bounds: Bounds,
}

/// A face shared by two elements of the same volume subdomain.
///
/// Element indices are positions in [`VolumeGeometry::elements`]. Each
/// shared face appears once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteriorFace {
    /// Element on the minus side.
    pub minus: usize,
    /// Face of the minus element.
    pub minus_face: Face,
    /// Element on the plus side.
    pub plus: usize,
    /// Face of the plus element.
    pub plus_face: Face,
}

/// Element block of a volume subdomain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumeGeometry {
    /// Elements in node-storage order.
    pub elements: Vec<ElementGeom>,
    /// Faces coupling two elements of this block.
    pub interior_faces: Vec<InteriorFace>,
}

/// Who sits across a glue subdomain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GluePartner {
    /// Domain exterior.
    Boundary,
    /// A glue subdomain on this process, owned by `volume`.
    Local {
        /// The mirror glue subdomain.
        glue: SubdomainId,
        /// The volume owning the mirror glue.
        volume: SubdomainId,
    },
    /// A volume subdomain on another process.
    Parallel {
        /// Rank owning the neighbor.
        rank: Rank,
        /// Neighbor volume id on that rank.
        volume: SubdomainId,
    },
}

impl GluePartner {
    /// The glue kind implied by the partner.
    pub fn kind(&self) -> GlueKind {
        match self {
            Self::Boundary => GlueKind::Boundary,
            Self::Local { .. } => GlueKind::Local,
            Self::Parallel { .. } => GlueKind::Parallel,
        }
    }
}

/// One owner-element face covered by a glue subdomain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlueFace {
    /// Position of the owner element in its volume's element list.
    pub owner_element: usize,
    /// Owner element's face.
    pub face: Face,
    /// Owner element's global id.
    pub owner_gid: ElementId,
    /// Element and face across, absent on the boundary.
    pub neighbor: Option<(ElementId, Face)>,
}

/// Face list of a glue subdomain.
///
/// Glue nodes are laid out face by face, `order + 1` nodes per face in
/// ascending tangential coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct GlueGeometry {
    /// Volume subdomain whose faces this glue covers.
    pub owner: SubdomainId,
    /// Polynomial order of the owner volume.
    pub owner_order: usize,
    /// Polynomial order across the glue (equal to `owner_order` on the
    /// boundary).
    pub neighbor_order: usize,
    /// What lies across.
    pub partner: GluePartner,
    /// Covered faces in exchange order.
    pub faces: Vec<GlueFace>,
}

impl GlueGeometry {
    /// The glue kind.
    pub fn kind(&self) -> GlueKind {
        self.partner.kind()
    }
}

/// The layout payload of a subdomain.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Element block.
    Volume(VolumeGeometry),
    /// Coupling surface.
    Glue(GlueGeometry),
    /// No layout; fields are plain node arrays.
    Detached,
}

impl Geometry {
    /// The volume payload, if any.
    pub fn as_volume(&self) -> Option<&VolumeGeometry> {
        match self {
            Self::Volume(v) => Some(v),
            _ => None,
        }
    }

    /// The glue payload, if any.
    pub fn as_glue(&self) -> Option<&GlueGeometry> {
        match self {
            Self::Glue(g) => Some(g),
            _ => None,
        }
    }
}
