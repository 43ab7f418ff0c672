//! Integration test: coupled layouts agree with the monolithic run.
//!
//! With glue coupling on and a single polynomial order, cutting the mesh
//! into subdomains or ranks only moves element faces from the volume's
//! interior list onto glue. The upwind flux is the same either way, so
//! every layout must match the one-subdomain, one-rank run to rounding.

use std::collections::BTreeMap;

use shear_comm::{Communicator, SelfComm};
use shear_core::{Real, STATE_FIELDS};
use shear_engine::{Simulation, SolverConfig, StressFreeBox};
use shear_mesh::Connectivity;
use shear_test_utils::run_ranks;

/// `(element gid, local node)` → the nine state values.
type NodeStates = BTreeMap<(u64, usize), [Real; 9]>;

fn config(num_subdomains: u32, connectivity: Connectivity) -> SolverConfig {
    SolverConfig {
        order: 4,
        order_step: 0,
        refine_level: 2,
        num_subdomains,
        connectivity,
        glue_coupling: true,
        dt: 1e-3,
        end_time: 0.05,
        ..SolverConfig::default()
    }
}

fn node_states(sim: &Simulation) -> NodeStates {
    let np = (sim.config().order + 1).pow(2);
    let mut out = BTreeMap::new();
    for sub in sim.domain().subdomains() {
        let Some(vol) = sub.geometry().as_volume() else {
            continue;
        };
        let fields: Vec<&[Real]> = STATE_FIELDS.iter().map(|f| sub.field(f).unwrap()).collect();
        for (e, elem) in vol.elements.iter().enumerate() {
            for k in 0..np {
                let mut s = [0.0; 9];
                for (c, f) in fields.iter().enumerate() {
                    s[c] = f[e * np + k];
                }
                out.insert((elem.gid.0, k), s);
            }
        }
    }
    out
}

fn simulate(config: SolverConfig, comm: Box<dyn Communicator>) -> NodeStates {
    let mode = StressFreeBox {
        amplitude: 0.5,
        ..StressFreeBox::new(1, 2, config.material)
    };
    let mut sim = Simulation::new(config, comm).unwrap();
    sim.initialize(&mode).unwrap();
    sim.run().unwrap();
    node_states(&sim)
}

fn assert_close(reference: &NodeStates, other: &NodeStates, label: &str) {
    assert_eq!(reference.len(), other.len(), "{label}: node count");
    let mut worst: Real = 0.0;
    for (key, a) in reference {
        let b = &other[key];
        for c in 0..9 {
            worst = worst.max((a[c] - b[c]).abs());
        }
    }
    assert!(worst < 1e-9, "{label}: max deviation {worst}");
}

fn reference(connectivity: Connectivity) -> NodeStates {
    simulate(config(1, connectivity), Box::new(SelfComm::new()))
}

#[test]
fn subdomains_on_one_rank_match() {
    let reference = reference(Connectivity::UnitSquare);
    for parts in [2, 3, 5] {
        let split = simulate(
            config(parts, Connectivity::UnitSquare),
            Box::new(SelfComm::new()),
        );
        assert_close(&reference, &split, &format!("{parts} subdomains"));
    }
}

#[test]
fn ranks_match() {
    let reference = reference(Connectivity::UnitSquare);
    for size in [2, 4] {
        let per_rank = run_ranks(size, |comm| {
            simulate(config(1, Connectivity::UnitSquare), Box::new(comm))
        });
        let merged: NodeStates = per_rank.into_iter().flatten().collect();
        assert_close(&reference, &merged, &format!("{size} ranks"));
    }
}

#[test]
fn ranks_and_subdomains_match_on_periodic_mesh() {
    let reference = reference(Connectivity::Periodic);
    let per_rank = run_ranks(3, |comm| {
        simulate(config(4, Connectivity::Periodic), Box::new(comm))
    });
    let merged: NodeStates = per_rank.into_iter().flatten().collect();
    assert_close(&reference, &merged, "3 ranks, 4 subdomains, periodic");
}

#[test]
fn uncoupled_subdomains_diverge() {
    let reference = reference(Connectivity::UnitSquare);
    let uncoupled = simulate(
        SolverConfig {
            glue_coupling: false,
            ..config(2, Connectivity::UnitSquare)
        },
        Box::new(SelfComm::new()),
    );
    let differs = reference
        .iter()
        .any(|(k, a)| a.iter().zip(&uncoupled[k]).any(|(x, y)| (x - y).abs() > 1e-6));
    assert!(differs);
}
