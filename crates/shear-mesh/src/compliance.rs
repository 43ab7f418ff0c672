//! MeshProvider compliance test helpers.
//!
//! These functions verify that a provider's partitions form one
//! consistent global picture. Reused by every provider's tests.

use crate::partition::{ElementInfo, FaceNeighbor, MeshProvider, Partition};
use indexmap::IndexMap;
use shear_core::{ElementId, Rank};

fn gather(provider: &dyn MeshProvider, size: u32) -> Vec<Partition> {
    (0..size)
        .map(|r| provider.partition(Rank(r), size).unwrap())
        .collect()
}

fn index_by_gid(parts: &[Partition]) -> IndexMap<ElementId, (Rank, &ElementInfo)> {
    let mut map = IndexMap::new();
    for part in parts {
        for e in &part.elements {
            let prev = map.insert(e.gid, (part.rank, e));
            assert!(prev.is_none(), "element {} owned twice", e.gid);
        }
    }
    map
}

/// Assert that the partitions cover a contiguous id range exactly once.
pub fn assert_partitions_cover_all(provider: &dyn MeshProvider, size: u32) {
    let parts = gather(provider, size);
    let map = index_by_gid(&parts);
    let mut gids: Vec<u64> = map.keys().map(|g| g.0).collect();
    gids.sort_unstable();
    for (i, g) in gids.iter().enumerate() {
        assert_eq!(*g, i as u64, "element ids are not contiguous");
    }
}

/// Assert that whenever A sees B across face f, B sees A across the
/// named face, with the owner, subdomain and order A was told.
pub fn assert_neighbors_symmetric(provider: &dyn MeshProvider, size: u32) {
    let parts = gather(provider, size);
    let map = index_by_gid(&parts);
    for (gid, (rank, e)) in &map {
        for (f, nb) in e.neighbors.iter().enumerate() {
            let FaceNeighbor::Element(nb) = nb else {
                continue;
            };
            let (nb_rank, other) = map[&nb.gid];
            assert_eq!(nb.rank, nb_rank, "wrong owner for neighbor of {gid}");
            assert_eq!(nb.subdomain, other.subdomain);
            assert_eq!(nb.order, other.order);
            match other.neighbors[nb.face.index()] {
                FaceNeighbor::Element(back) => {
                    assert_eq!(back.gid, *gid);
                    assert_eq!(back.face.index(), f);
                    assert_eq!(back.rank, *rank);
                }
                FaceNeighbor::Boundary => {
                    panic!("{} face {} is boundary but {gid} sees it", nb.gid, nb.face.index())
                }
            }
        }
    }
}

/// Assert that touching faces coincide geometrically.
pub fn assert_faces_conform(provider: &dyn MeshProvider, size: u32) {
    let parts = gather(provider, size);
    let map = index_by_gid(&parts);
    for (_, (_, e)) in &map {
        for nb in e.neighbors.iter() {
            let FaceNeighbor::Element(nb) = nb else {
                continue;
            };
            let (_, other) = map[&nb.gid];
            if nb.face.is_x_face() {
                assert_eq!(e.bounds.y0, other.bounds.y0);
                assert_eq!(e.bounds.y1, other.bounds.y1);
            } else {
                assert_eq!(e.bounds.x0, other.bounds.x0);
                assert_eq!(e.bounds.x1, other.bounds.x1);
            }
        }
    }
}

/// Run all compliance checks.
pub fn run_full_compliance(provider: &dyn MeshProvider, size: u32) {
    assert_partitions_cover_all(provider, size);
    assert_neighbors_symmetric(provider, size);
    assert_faces_conform(provider, size);
}
