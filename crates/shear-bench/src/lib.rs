//! Benchmark profiles and utilities for the shear solver.
//!
//! Provides pre-built configurations and prepared domains for
//! benchmarks:
//!
//! - [`brick_profile`]: a coupled brick-mesh [`SolverConfig`] at one order
//! - [`prepared_domain`]: a single-rank domain with rate storage allocated
//!   and the `(1, 1)` standing wave written into the state

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::error::Error;

use shear_core::{Rank, Role, STATE_FIELDS};
use shear_domain::{Domain, TagPredicate};
use shear_engine::{build_domain, SolverConfig, StressFreeBox, RATE_PREFIX};
use shear_kernel::ElasticRates;
use shear_mesh::{BrickMesh, MeshProvider};
use shear_protocol::RateAccumulation;

/// Build a brick profile: `4^refine_level` elements at `order`, cut
/// into `num_subdomains` coupled subdomains of equal order.
///
/// dt=1e-4 keeps order 10 on a level-3 mesh well inside the KC54
/// stability region.
pub fn brick_profile(order: usize, refine_level: u32, num_subdomains: u32) -> SolverConfig {
    SolverConfig {
        order,
        order_step: 0,
        refine_level,
        num_subdomains,
        glue_coupling: true,
        dt: 1e-4,
        ..SolverConfig::default()
    }
}

/// Rank 0 of a one-rank run of `config`, ready for direct protocol calls.
pub fn prepared_domain(config: &SolverConfig) -> Result<(Domain, ElasticRates), Box<dyn Error>> {
    let mesh = BrickMesh::new(
        config.refine_level,
        config.connectivity,
        config.num_subdomains,
        config.order,
        config.order_step,
    )?;
    let partition = mesh.partition(Rank(0), 1)?;
    let mut domain = build_domain(&partition, &config.material)?;

    let mut orders: Vec<usize> = domain.subdomains().iter().map(|s| s.order()).collect();
    orders.sort_unstable();
    orders.dedup();
    let rates = ElasticRates::builder()
        .boundary_reflection(config.boundary_reflection)
        .glue_coupling(config.glue_coupling)
        .orders(&orders)
        .build()?;
    for sub in domain.subdomains_mut() {
        rates.allocate_rate_storage(sub, RATE_PREFIX)?;
    }

    let mode = StressFreeBox::new(1, 1, config.material);
    let volumes = TagPredicate::any_of(&[Role::Volume.tag()]);
    for field in STATE_FIELDS {
        domain.init_field_where(&volumes, field, 0.0, &mode)?;
    }
    Ok((domain, rates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_storage_only_on_volumes() {
        let (domain, _) = prepared_domain(&brick_profile(3, 1, 2)).unwrap();
        let mut volumes = 0;
        for sub in domain.subdomains() {
            let is_volume = sub.role() == Ok(Role::Volume);
            volumes += usize::from(is_volume);
            assert_eq!(
                sub.has_field(&format!("{RATE_PREFIX}v1")),
                is_volume,
                "{}",
                sub.name()
            );
        }
        assert_eq!(volumes, 2);
    }

    #[test]
    fn bad_profile_is_an_error() {
        assert!(prepared_domain(&brick_profile(3, 0, 2)).is_err());
    }
}
