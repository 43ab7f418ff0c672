//! Building a rank's [`Domain`] from its [`Partition`].
//!
//! Each subdomain id in the partition becomes one volume subdomain
//! holding its elements in partition order. Every element face is then
//! classified:
//!
//! | across the face | becomes |
//! |-----------------|---------|
//! | nothing | a face of the owner's `glue-boundary` subdomain |
//! | same rank, same subdomain | an interior face of the volume |
//! | same rank, other subdomain `b` | a face of `glue-local a->b` |
//! | rank `r`, subdomain `b` | a face of `glue-parallel a->r:b` |
//!
//! Glue faces are sorted by `(min gid, max gid, face of the min-gid
//! element)`, which both sides of an interface compute identically, so
//! glue node `k` on one side meets glue node `k` on the other. Glue ids
//! are numbered after the largest volume id.

use indexmap::IndexMap;
use thiserror::Error;

use shear_comm::CommError;
use shear_core::{
    minus, plus, ElementId, FieldError, GlueKind, Rank, Real, Role, SubdomainId, TagSet, GRID_X,
    GRID_Y, GRID_Z, STATE_FIELDS, TRACE_MATERIAL_FIELDS,
};
use shear_domain::{
    Domain, DomainError, ElementGeom, Geometry, GlueFace, GlueGeometry, GluePartner,
    InteriorFace, Subdomain, VolumeGeometry,
};
use shear_kernel::{LglBasis, Material};
use shear_mesh::{Bounds, Face, FaceNeighbor, MeshError, Partition};
use shear_protocol::RateError;

use crate::config::ConfigError;
use crate::exchange::ExchangeError;

// ── SetupError ─────────────────────────────────────────────────────

/// Errors building a simulation. All are fatal.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Invalid preferences.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Mesh provider failure.
    #[error("mesh: {0}")]
    Mesh(#[from] MeshError),
    /// Domain construction failure.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// A subdomain field could not be declared while building it.
    #[error(transparent)]
    Field(#[from] FieldError),
    /// Rate storage allocation or trace filling failed.
    #[error(transparent)]
    Rate(#[from] RateError),
    /// The setup-time material exchange failed.
    #[error("material exchange: {0}")]
    Exchange(#[from] ExchangeError),
    /// Message passing failed outside an exchange.
    #[error(transparent)]
    Comm(#[from] CommError),
    /// The kernel builder rejected its parameters.
    #[error("kernel configuration: {0}")]
    Kernel(String),
    /// A subdomain's elements disagree on polynomial order.
    #[error("subdomain {subdomain} mixes orders {first} and {second}")]
    MixedOrder {
        /// The subdomain.
        subdomain: SubdomainId,
        /// Order of its first element.
        first: usize,
        /// A conflicting order.
        second: usize,
    },
    /// A same-rank neighbor is not in the partition.
    #[error("element {gid} face {face:?}: neighbor {neighbor} is not on this rank")]
    MissingNeighbor {
        /// The element.
        gid: ElementId,
        /// Its face.
        face: Face,
        /// The neighbor it names.
        neighbor: ElementId,
    },
    /// A same-rank neighbor sits in another subdomain than it claims.
    #[error("element {neighbor} is in subdomain {actual}, but a neighbor claims {claimed}")]
    NeighborSubdomain {
        /// The neighbor.
        neighbor: ElementId,
        /// Subdomain named by the adjacency.
        claimed: SubdomainId,
        /// Subdomain it is actually in.
        actual: SubdomainId,
    },
    /// The faces of one glue see different orders across.
    #[error("glue '{glue}' sees neighbor orders {first} and {second}")]
    NeighborOrder {
        /// The glue subdomain name.
        glue: String,
        /// Order across its first face.
        first: usize,
        /// A conflicting order.
        second: usize,
    },
    /// A glue's partner is absent or inconsistent.
    #[error("glue '{glue}': {reason}")]
    Partner {
        /// The glue subdomain name.
        glue: String,
        /// What is wrong.
        reason: String,
    },
}

// ── Classification ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum GlueKey {
    Boundary(SubdomainId),
    Local(SubdomainId, SubdomainId),
    Parallel(SubdomainId, Rank, SubdomainId),
}

impl GlueKey {
    fn owner(self) -> SubdomainId {
        match self {
            Self::Boundary(o) | Self::Local(o, _) | Self::Parallel(o, _, _) => o,
        }
    }

    fn name(self) -> String {
        match self {
            Self::Boundary(o) => format!("glue-boundary {o}"),
            Self::Local(o, b) => format!("glue-local {o}->{b}"),
            Self::Parallel(o, r, b) => format!("glue-parallel {o}->{r}:{b}"),
        }
    }
}

struct VolumeDraft {
    order: usize,
    elements: Vec<ElementGeom>,
    interior: Vec<InteriorFace>,
}

#[derive(Default)]
struct GlueDraft {
    neighbor_order: Option<usize>,
    faces: Vec<((ElementId, ElementId, usize), GlueFace)>,
}

/// Sort key shared by both sides of an interface.
fn face_key(gid: ElementId, face: Face, ngid: ElementId, nface: Face) -> (ElementId, ElementId, usize) {
    if gid <= ngid {
        (gid, ngid, face.index())
    } else {
        (ngid, gid, nface.index())
    }
}

/// Build the domain of `partition`'s rank.
///
/// Volumes carry the nine state fields, constant material fields, and
/// node coordinates. Every glue carries node coordinates; local and
/// parallel glue also carry minus and plus traces of the state and the
/// impedances.
pub fn build_domain(partition: &Partition, material: &Material) -> Result<Domain, SetupError> {
    let mut position: IndexMap<ElementId, (SubdomainId, usize)> = IndexMap::new();
    let mut volumes: IndexMap<SubdomainId, VolumeDraft> = IndexMap::new();
    for e in &partition.elements {
        let v = volumes.entry(e.subdomain).or_insert_with(|| VolumeDraft {
            order: e.order,
            elements: Vec::new(),
            interior: Vec::new(),
        });
        if v.order != e.order {
            return Err(SetupError::MixedOrder {
                subdomain: e.subdomain,
                first: v.order,
                second: e.order,
            });
        }
        position.insert(e.gid, (e.subdomain, v.elements.len()));
        v.elements.push(ElementGeom {
            gid: e.gid,
            bounds: e.bounds,
        });
    }
    volumes.sort_keys();

    let mut glues: IndexMap<GlueKey, GlueDraft> = IndexMap::new();
    for e in &partition.elements {
        let (sub, pos) = position[&e.gid];
        for face in Face::ALL {
            let (key, glue_face, key_order, neighbor_order) = match e.neighbors[face.index()] {
                FaceNeighbor::Boundary => (
                    GlueKey::Boundary(sub),
                    GlueFace {
                        owner_element: pos,
                        face,
                        owner_gid: e.gid,
                        neighbor: None,
                    },
                    (e.gid, e.gid, face.index()),
                    None,
                ),
                FaceNeighbor::Element(nb) => {
                    let key = if nb.rank == partition.rank {
                        let &(nsub, npos) =
                            position
                                .get(&nb.gid)
                                .ok_or(SetupError::MissingNeighbor {
                                    gid: e.gid,
                                    face,
                                    neighbor: nb.gid,
                                })?;
                        if nsub != nb.subdomain {
                            return Err(SetupError::NeighborSubdomain {
                                neighbor: nb.gid,
                                claimed: nb.subdomain,
                                actual: nsub,
                            });
                        }
                        if nsub == sub {
                            if (e.gid, face.index()) < (nb.gid, nb.face.index()) {
                                volumes[&sub].interior.push(InteriorFace {
                                    minus: pos,
                                    minus_face: face,
                                    plus: npos,
                                    plus_face: nb.face,
                                });
                            }
                            continue;
                        }
                        GlueKey::Local(sub, nsub)
                    } else {
                        GlueKey::Parallel(sub, nb.rank, nb.subdomain)
                    };
                    (
                        key,
                        GlueFace {
                            owner_element: pos,
                            face,
                            owner_gid: e.gid,
                            neighbor: Some((nb.gid, nb.face)),
                        },
                        face_key(e.gid, face, nb.gid, nb.face),
                        Some(nb.order),
                    )
                }
            };
            let draft = glues.entry(key).or_default();
            if let Some(n) = neighbor_order {
                match draft.neighbor_order {
                    Some(m) if m != n => {
                        return Err(SetupError::NeighborOrder {
                            glue: key.name(),
                            first: m,
                            second: n,
                        })
                    }
                    _ => draft.neighbor_order = Some(n),
                }
            }
            draft.faces.push((key_order, glue_face));
        }
    }
    glues.sort_by(|k1, _, k2, _| (k1.owner(), k1).cmp(&(k2.owner(), k2)));

    let mut next_id = volumes.keys().map(|id| id.0 + 1).max().unwrap_or(0);
    let mut glue_ids: IndexMap<GlueKey, SubdomainId> = IndexMap::new();
    for key in glues.keys() {
        glue_ids.insert(*key, SubdomainId(next_id));
        next_id += 1;
    }

    let mut domain = Domain::new();
    let mut bases: IndexMap<usize, LglBasis> = IndexMap::new();
    for (&id, v) in &volumes {
        let basis = bases.entry(v.order).or_insert_with(|| LglBasis::new(v.order));
        domain.insert(volume_subdomain(id, v, basis, material)?)?;
    }
    for (key, draft) in glues {
        let owner = key.owner();
        let owner_order = volumes[&owner].order;
        let partner = match key {
            GlueKey::Boundary(_) => GluePartner::Boundary,
            GlueKey::Local(a, b) => {
                let mirror = glue_ids.get(&GlueKey::Local(b, a)).ok_or_else(|| {
                    SetupError::Partner {
                        glue: key.name(),
                        reason: format!("subdomain {b} has no glue facing {a}"),
                    }
                })?;
                GluePartner::Local {
                    glue: *mirror,
                    volume: b,
                }
            }
            GlueKey::Parallel(_, rank, volume) => GluePartner::Parallel { rank, volume },
        };
        let neighbor_order = draft.neighbor_order.unwrap_or(owner_order);
        let mut faces = draft.faces;
        faces.sort_by_key(|(k, _)| *k);
        let geom = GlueGeometry {
            owner,
            owner_order,
            neighbor_order,
            partner,
            faces: faces.into_iter().map(|(_, f)| f).collect(),
        };
        let order = owner_order.max(neighbor_order);
        let basis = bases.entry(order).or_insert_with(|| LglBasis::new(order));
        let owner_sub = domain.get(owner)?;
        let elements = owner_sub
            .geometry()
            .as_volume()
            .map(|v| v.elements.clone())
            .unwrap_or_default();
        domain.insert(glue_subdomain(glue_ids[&key], key.name(), geom, &elements, basis)?)?;
    }

    let count = |kind: GlueKind| {
        domain
            .subdomains()
            .iter()
            .filter(|s| s.role() == Ok(Role::Glue(kind)))
            .count()
    };
    tracing::info!(
        rank = %partition.rank,
        elements = partition.elements.len(),
        volumes = volumes.len(),
        glue_boundary = count(GlueKind::Boundary),
        glue_local = count(GlueKind::Local),
        glue_parallel = count(GlueKind::Parallel),
        "domain built"
    );
    Ok(domain)
}

fn to_element(lo: Real, hi: Real, xi: Real) -> Real {
    lo + 0.5 * (1.0 + xi) * (hi - lo)
}

fn volume_subdomain(
    id: SubdomainId,
    draft: &VolumeDraft,
    basis: &LglBasis,
    material: &Material,
) -> Result<Subdomain, SetupError> {
    let np = basis.np();
    let num_nodes = draft.elements.len() * np;
    let mut x = Vec::with_capacity(num_nodes);
    let mut y = Vec::with_capacity(num_nodes);
    for elem in &draft.elements {
        let b = &elem.bounds;
        for &eta in basis.nodes() {
            for &xi in basis.nodes() {
                x.push(to_element(b.x0, b.x1, xi));
                y.push(to_element(b.y0, b.y1, eta));
            }
        }
    }

    let mut tags = TagSet::for_role(Role::Volume);
    tags.insert(format!("N{}", draft.order));
    let geom = VolumeGeometry {
        elements: draft.elements.clone(),
        interior_faces: draft.interior.clone(),
    };
    let mut sub = Subdomain::new(
        id,
        format!("volume {id}"),
        tags,
        draft.order,
        num_nodes,
        Geometry::Volume(geom),
    );
    sub.add_field_with(GRID_X, x)?;
    sub.add_field_with(GRID_Y, y)?;
    sub.add_field(GRID_Z)?;
    for f in STATE_FIELDS {
        sub.add_field(f)?;
    }
    for (name, value) in material.fields() {
        sub.add_field_with(name, vec![value; num_nodes])?;
    }
    Ok(sub)
}

fn face_point(b: &Bounds, face: Face, xi: Real) -> (Real, Real) {
    match face {
        Face::XMin => (b.x0, to_element(b.y0, b.y1, xi)),
        Face::XMax => (b.x1, to_element(b.y0, b.y1, xi)),
        Face::YMin => (to_element(b.x0, b.x1, xi), b.y0),
        Face::YMax => (to_element(b.x0, b.x1, xi), b.y1),
    }
}

fn glue_subdomain(
    id: SubdomainId,
    name: String,
    geom: GlueGeometry,
    owner_elements: &[ElementGeom],
    basis: &LglBasis,
) -> Result<Subdomain, SetupError> {
    let kind = geom.kind();
    let num_nodes = geom.faces.len() * basis.nq();
    let mut x = Vec::with_capacity(num_nodes);
    let mut y = Vec::with_capacity(num_nodes);
    for gf in &geom.faces {
        let bounds = owner_elements
            .get(gf.owner_element)
            .map(|e| e.bounds)
            .ok_or_else(|| SetupError::Partner {
                glue: name.clone(),
                reason: format!("owner element {} out of range", gf.owner_element),
            })?;
        for &xi in basis.nodes() {
            let (px, py) = face_point(&bounds, gf.face, xi);
            x.push(px);
            y.push(py);
        }
    }

    let mut sub = Subdomain::new(
        id,
        name,
        TagSet::for_role(Role::Glue(kind)),
        basis.order(),
        num_nodes,
        Geometry::Glue(geom),
    );
    sub.add_field_with(GRID_X, x)?;
    sub.add_field_with(GRID_Y, y)?;
    sub.add_field(GRID_Z)?;
    if kind != GlueKind::Boundary {
        for f in STATE_FIELDS.iter().chain(TRACE_MATERIAL_FIELDS.iter()) {
            sub.add_field(&minus(f))?;
            sub.add_field(&plus(f))?;
        }
    }
    Ok(sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shear_mesh::{BrickMesh, Connectivity, MeshProvider};

    fn unit() -> Material {
        Material {
            rho: 1.0,
            lam: 1.0,
            mu: 1.0,
        }
    }

    fn domain_for(level: u32, subs: u32, rank: u32, size: u32, conn: Connectivity) -> Domain {
        let mesh = BrickMesh::new(level, conn, subs, 2, 1).unwrap();
        let part = mesh.partition(Rank(rank), size).unwrap();
        build_domain(&part, &unit()).unwrap()
    }

    fn glue_of<'a>(d: &'a Domain, kind: GlueKind) -> Vec<&'a Subdomain> {
        d.subdomains()
            .iter()
            .filter(|s| s.role() == Ok(Role::Glue(kind)))
            .collect()
    }

    #[test]
    fn single_subdomain_has_only_boundary_glue() {
        let d = domain_for(1, 1, 0, 1, Connectivity::UnitSquare);
        assert_eq!(d.len(), 2);
        let vol = &d.subdomains()[0];
        let geom = vol.geometry().as_volume().unwrap();
        assert_eq!(geom.elements.len(), 4);
        // Two vertical and two horizontal shared faces.
        assert_eq!(geom.interior_faces.len(), 4);
        assert_eq!(vol.num_nodes(), 4 * 9);
        let bnd = glue_of(&d, GlueKind::Boundary);
        assert_eq!(bnd.len(), 1);
        assert_eq!(bnd[0].id(), SubdomainId(1));
        assert_eq!(bnd[0].geometry().as_glue().unwrap().faces.len(), 8);
        assert_eq!(bnd[0].num_nodes(), 8 * 3);
    }

    #[test]
    fn periodic_mesh_has_no_boundary() {
        let d = domain_for(1, 1, 0, 1, Connectivity::Periodic);
        assert_eq!(d.len(), 1);
        let geom = d.subdomains()[0].geometry().as_volume().unwrap().clone();
        // Every element face is shared, each recorded once.
        assert_eq!(geom.interior_faces.len(), 8);
    }

    #[test]
    fn local_glue_pairs_point_at_each_other() {
        let d = domain_for(1, 2, 0, 1, Connectivity::UnitSquare);
        let local = glue_of(&d, GlueKind::Local);
        assert_eq!(local.len(), 2);
        let (a, b) = (local[0], local[1]);
        let ga = a.geometry().as_glue().unwrap();
        let gb = b.geometry().as_glue().unwrap();
        assert_eq!(
            ga.partner,
            GluePartner::Local {
                glue: b.id(),
                volume: gb.owner
            }
        );
        assert_eq!(
            gb.partner,
            GluePartner::Local {
                glue: a.id(),
                volume: ga.owner
            }
        );
        // Orders 2 and 3 meet at order 3.
        assert_eq!(a.order(), 3);
        assert_eq!(b.order(), 3);
        assert_eq!(a.num_nodes(), b.num_nodes());
        // Matching faces line up node by node.
        let (ax, bx) = (a.field(GRID_X).unwrap(), b.field(GRID_X).unwrap());
        let (ay, by) = (a.field(GRID_Y).unwrap(), b.field(GRID_Y).unwrap());
        for k in 0..a.num_nodes() {
            assert!((ax[k] - bx[k]).abs() < 1e-14);
            assert!((ay[k] - by[k]).abs() < 1e-14);
        }
        assert!(a.has_field("_minus_v1") && a.has_field("_plus_Zp"));
    }

    #[test]
    fn glue_ids_follow_volume_ids() {
        let d = domain_for(2, 3, 0, 1, Connectivity::UnitSquare);
        let max_volume = d
            .subdomains()
            .iter()
            .filter(|s| s.role() == Ok(Role::Volume))
            .map(|s| s.id())
            .max()
            .unwrap();
        for s in d.subdomains().iter().filter(|s| s.role() != Ok(Role::Volume)) {
            assert!(s.id() > max_volume);
        }
    }

    #[test]
    fn parallel_glue_agrees_across_ranks() {
        let d0 = domain_for(1, 1, 0, 2, Connectivity::UnitSquare);
        let d1 = domain_for(1, 1, 1, 2, Connectivity::UnitSquare);
        let p0 = glue_of(&d0, GlueKind::Parallel);
        let p1 = glue_of(&d1, GlueKind::Parallel);
        assert_eq!(p0.len(), 1);
        assert_eq!(p1.len(), 1);
        assert_eq!(
            p0[0].geometry().as_glue().unwrap().partner,
            GluePartner::Parallel {
                rank: Rank(1),
                volume: SubdomainId(0)
            }
        );
        assert_eq!(p0[0].field(GRID_X).unwrap(), p1[0].field(GRID_X).unwrap());
        assert_eq!(p0[0].field(GRID_Y).unwrap(), p1[0].field(GRID_Y).unwrap());
    }

    #[test]
    fn volume_grid_spans_elements() {
        let d = domain_for(0, 1, 0, 1, Connectivity::UnitSquare);
        let vol = &d.subdomains()[0];
        let x = vol.field(GRID_X).unwrap();
        let y = vol.field(GRID_Y).unwrap();
        assert_eq!(x.len(), 9);
        assert_eq!((x[0], y[0]), (0.0, 0.0));
        assert_eq!((x[8], y[8]), (1.0, 1.0));
        assert!((x[4] - 0.5).abs() < 1e-15);
        assert_eq!(vol.field("Zp").unwrap()[0], 3.0f64.sqrt());
    }

    #[test]
    fn duplicate_field_is_a_setup_error() {
        fn declare_again(sub: &mut Subdomain) -> Result<(), SetupError> {
            sub.add_field(GRID_X)?;
            Ok(())
        }
        let mut d = domain_for(1, 1, 0, 1, Connectivity::UnitSquare);
        let vol = &mut d.subdomains_mut()[0];
        let err = declare_again(vol).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");
        match err {
            SetupError::Field(FieldError::Exists { subdomain, field }) => {
                assert_eq!(subdomain, "volume 0");
                assert_eq!(field, GRID_X);
            }
            other => panic!("expected a duplicate field, got {other:?}"),
        }
    }
}
