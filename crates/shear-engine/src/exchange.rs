//! Trace exchange across local and parallel glue.
//!
//! One exchange fills every glue's plus traces:
//!
//! 1. each local and parallel glue interpolates its owner's face values
//!    into `_minus_<f>` ([`RateAccumulation::fill_minus_traces`]);
//! 2. local glue copies its partner's `_minus_<f>` into its own
//!    `_plus_<f>`;
//! 3. parallel glue sends its minus traces and receives the remote minus
//!    traces as its plus traces, one message per neighbor rank.
//!
//! A rank's message to rank `r` holds, for each parallel glue facing `r`
//! in `(local volume, remote volume)` order, every exchanged field in
//! turn. The receiver walks its own glues facing the sender in
//! `(remote volume, local volume)` order, which is the same sequence seen
//! from the other side. Receives are unpacked in completion order.

use std::time::Instant;

use thiserror::Error;

use shear_comm::{CommError, Communicator, Request, Tag};
use shear_core::{minus, plus, FieldError, GlueKind, Rank, Role, SubdomainId};
use shear_domain::{Domain, GluePartner};
use shear_protocol::{RateAccumulation, RateError};

use crate::metrics::ExchangeMetrics;
use crate::setup::SetupError;

/// Tag of the one-off impedance exchange at setup.
pub const MATERIAL_TAG: Tag = Tag(1);
/// Tag of the per-stage state exchange.
pub const STATE_TAG: Tag = Tag(2);

/// A failure while exchanging traces.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Filling minus traces failed.
    #[error(transparent)]
    Rate(#[from] RateError),
    /// A trace field is missing or mis-sized.
    #[error(transparent)]
    Field(#[from] FieldError),
    /// Message passing failed.
    #[error(transparent)]
    Comm(#[from] CommError),
}

#[derive(Clone, Debug)]
struct Neighbor {
    rank: Rank,
    /// Glue indices in send order.
    send: Vec<usize>,
    /// Glue indices in receive order.
    recv: Vec<usize>,
    send_nodes: usize,
    recv_nodes: usize,
}

/// The validated communication pattern of one rank.
#[derive(Clone, Debug)]
pub struct Exchange {
    glues: Vec<usize>,
    local: Vec<(usize, usize)>,
    neighbors: Vec<Neighbor>,
}

impl Exchange {
    /// Plan the exchange for `domain` on `rank` of a `size`-rank world.
    ///
    /// # Errors
    ///
    /// [`SetupError::Partner`] when a local glue's partner is missing,
    /// is not local glue, does not point back, or differs in node
    /// count, or when a parallel glue names an invalid rank or this rank.
    pub fn plan(domain: &Domain, rank: Rank, size: u32) -> Result<Self, SetupError> {
        let mut glues = Vec::new();
        let mut local = Vec::new();
        let mut parallel: Vec<(Rank, SubdomainId, SubdomainId, usize)> = Vec::new();

        for (idx, sub) in domain.subdomains().iter().enumerate() {
            let Some(geom) = sub.geometry().as_glue() else {
                continue;
            };
            let partner_err = |reason: String| SetupError::Partner {
                glue: sub.name().to_owned(),
                reason,
            };
            match geom.partner {
                GluePartner::Boundary => continue,
                GluePartner::Local { glue, volume } => {
                    let pidx = domain
                        .index_of(glue)
                        .map_err(|_| partner_err(format!("partner glue {glue} does not exist")))?;
                    let partner = &domain.subdomains()[pidx];
                    if partner.role() != Ok(Role::Glue(GlueKind::Local)) {
                        return Err(partner_err(format!(
                            "partner '{}' is not local glue",
                            partner.name()
                        )));
                    }
                    let back = partner.geometry().as_glue().map(|g| (g.partner, g.owner));
                    let expected = GluePartner::Local {
                        glue: sub.id(),
                        volume: geom.owner,
                    };
                    if back != Some((expected, volume)) {
                        return Err(partner_err(format!(
                            "partner '{}' does not point back",
                            partner.name()
                        )));
                    }
                    if partner.num_nodes() != sub.num_nodes() {
                        return Err(partner_err(format!(
                            "partner '{}' has {} nodes, this glue has {}",
                            partner.name(),
                            partner.num_nodes(),
                            sub.num_nodes()
                        )));
                    }
                    local.push((idx, pidx));
                }
                GluePartner::Parallel { rank: r, volume } => {
                    if r.0 >= size {
                        return Err(partner_err(format!(
                            "rank {r} is outside a world of size {size}"
                        )));
                    }
                    if r == rank {
                        return Err(partner_err("parallel glue facing its own rank".to_owned()));
                    }
                    parallel.push((r, geom.owner, volume, idx));
                }
            }
            glues.push(idx);
        }

        let mut neighbors: Vec<Neighbor> = Vec::new();
        parallel.sort_by_key(|&(r, owner, remote, _)| (r, owner, remote));
        for (r, _, _, idx) in &parallel {
            match neighbors.last_mut() {
                Some(nb) if nb.rank == *r => nb.send.push(*idx),
                _ => neighbors.push(Neighbor {
                    rank: *r,
                    send: vec![*idx],
                    recv: Vec::new(),
                    send_nodes: 0,
                    recv_nodes: 0,
                }),
            }
        }
        parallel.sort_by_key(|&(r, owner, remote, _)| (r, remote, owner));
        for (r, _, _, idx) in &parallel {
            if let Some(nb) = neighbors.iter_mut().find(|nb| nb.rank == *r) {
                nb.recv.push(*idx);
            }
        }
        for nb in &mut neighbors {
            let nodes = |list: &[usize]| -> usize {
                list.iter()
                    .map(|&i| domain.subdomains()[i].num_nodes())
                    .sum()
            };
            nb.send_nodes = nodes(&nb.send);
            nb.recv_nodes = nodes(&nb.recv);
        }

        tracing::debug!(
            %rank,
            glues = glues.len(),
            local = local.len(),
            neighbor_ranks = neighbors.len(),
            "exchange planned"
        );
        Ok(Self {
            glues,
            local,
            neighbors,
        })
    }

    /// Whether any parallel glue exists, i.e. whether [`run`](Self::run)
    /// touches the communicator.
    pub fn has_parallel(&self) -> bool {
        !self.neighbors.is_empty()
    }

    /// Ranks this rank exchanges with, ascending.
    pub fn neighbor_ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        self.neighbors.iter().map(|nb| nb.rank)
    }

    /// Fill every glue's plus traces of `fields`.
    ///
    /// Blocks in [`Communicator::wait_any`] until all of this rank's
    /// receives complete. Makes no communicator call when there is no
    /// parallel glue.
    pub fn run(
        &self,
        domain: &mut Domain,
        comm: &mut dyn Communicator,
        rates: &dyn RateAccumulation,
        field_prefix: &str,
        fields: &[&str],
        tag: Tag,
    ) -> Result<ExchangeMetrics, ExchangeError> {
        let start = Instant::now();
        let mut metrics = ExchangeMetrics::default();
        let minus_names: Vec<String> = fields.iter().map(|f| minus(f)).collect();
        let plus_names: Vec<String> = fields.iter().map(|f| plus(f)).collect();

        for &g in &self.glues {
            rates.fill_minus_traces(domain, g, field_prefix, fields)?;
        }

        for &(g, p) in &self.local {
            let Some((partner, glue)) = domain.split_pair(p, g) else {
                continue;
            };
            for (m, pl) in minus_names.iter().zip(&plus_names) {
                let src = partner.field(m)?;
                let dst = glue.field_mut(pl)?;
                let expected = dst.len();
                if src.len() != expected {
                    return Err(FieldError::LengthMismatch {
                        subdomain: glue.name().to_owned(),
                        field: pl.clone(),
                        expected,
                        actual: src.len(),
                    }
                    .into());
                }
                dst.copy_from_slice(src);
            }
        }

        if self.neighbors.is_empty() {
            metrics.total_us = start.elapsed().as_micros() as u64;
            return Ok(metrics);
        }

        let width = fields.len();
        let mut pending: Vec<Request> = Vec::with_capacity(2 * self.neighbors.len());
        let mut recv_of: Vec<(Request, usize)> = Vec::with_capacity(self.neighbors.len());
        for (n, nb) in self.neighbors.iter().enumerate() {
            let r = comm.irecv(nb.rank, tag, nb.recv_nodes * width)?;
            pending.push(r);
            recv_of.push((r, n));
        }
        for nb in &self.neighbors {
            let mut buf = Vec::with_capacity(nb.send_nodes * width);
            for &g in &nb.send {
                let sub = &domain.subdomains()[g];
                for m in &minus_names {
                    buf.extend_from_slice(sub.field(m)?);
                }
            }
            metrics.values_sent += buf.len() as u64;
            pending.push(comm.isend(nb.rank, tag, buf)?);
            metrics.messages_sent += 1;
        }

        let wait_start = Instant::now();
        while !pending.is_empty() {
            let done = comm.wait_any(&mut pending)?;
            let Some(data) = done.data else {
                continue;
            };
            let Some(&(_, n)) = recv_of.iter().find(|(r, _)| *r == done.request) else {
                continue;
            };
            metrics.messages_received += 1;
            metrics.values_received += data.len() as u64;
            let mut offset = 0;
            for &g in &self.neighbors[n].recv {
                let sub = &mut domain.subdomains_mut()[g];
                for pl in &plus_names {
                    let dst = sub.field_mut(pl)?;
                    let end = offset + dst.len();
                    dst.copy_from_slice(&data[offset..end]);
                    offset = end;
                }
            }
        }
        metrics.wait_us = wait_start.elapsed().as_micros() as u64;
        metrics.total_us = start.elapsed().as_micros() as u64;
        Ok(metrics)
    }
}
