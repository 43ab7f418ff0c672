//! Reusable rate-protocol test fixtures.
//!
//! - [`ForcedDecay`]: `du/dt = -lambda u + f cos t` on every volume node,
//!   with a closed-form solution for convergence checks.
//! - [`FailingRates`]: [`ForcedDecay`] that fails volume `intra_rhs` after N calls.
//! - [`decay_domain`]: volumes plus boundary glue, without geometry.

use std::sync::atomic::{AtomicUsize, Ordering};

use shear_core::{prefixed, FieldError, GlueKind, Real, Role, SubdomainId, TagSet};
use shear_domain::{Domain, Geometry, Subdomain};
use shear_protocol::{role_of, Operation, RateAccumulation, RateError};

/// The evolved field of the decay fixtures.
pub const DECAY_FIELD: &str = "u";

/// Scalar forced decay `du/dt = -lambda u + forcing cos(t)` per node.
///
/// Volumes do the work; every glue role is a no-op. An unresolvable
/// role is reported by every operation.
#[derive(Clone, Copy, Debug)]
pub struct ForcedDecay {
    pub lambda: Real,
    pub forcing: Real,
}

impl ForcedDecay {
    pub fn new(lambda: Real, forcing: Real) -> Self {
        Self { lambda, forcing }
    }

    /// `u(t)` from `u(0) = u0`.
    pub fn exact(&self, u0: Real, t: Real) -> Real {
        let l = self.lambda;
        let k = self.forcing / (l * l + 1.0);
        (u0 - k * l) * (-l * t).exp() + k * (l * t.cos() + t.sin())
    }
}

fn field_err(sub: &Subdomain, op: Operation) -> impl Fn(FieldError) -> RateError + '_ {
    move |e| RateError::field(sub.name(), op, e)
}

fn is_volume(sub: &Subdomain, op: Operation) -> Result<bool, RateError> {
    Ok(role_of(sub, op)? == Role::Volume)
}

impl RateAccumulation for ForcedDecay {
    fn name(&self) -> &str {
        "ForcedDecay"
    }

    fn allocate_rate_storage(&self, sub: &mut Subdomain, prefix: &str) -> Result<(), RateError> {
        let op = Operation::AllocateRateStorage;
        if is_volume(sub, op)? {
            let label = sub.name().to_owned();
            sub.add_field(&prefixed(prefix, DECAY_FIELD))
                .map_err(|e| RateError::field(&label, op, e))?;
        }
        Ok(())
    }

    fn scale_rates(&self, sub: &mut Subdomain, prefix: &str, a: Real) -> Result<(), RateError> {
        let op = Operation::ScaleRates;
        if is_volume(sub, op)? {
            let label = sub.name().to_owned();
            let rate = sub
                .field_mut(&prefixed(prefix, DECAY_FIELD))
                .map_err(|e| RateError::field(&label, op, e))?;
            if a == 0.0 {
                rate.fill(0.0);
            } else {
                rate.iter_mut().for_each(|r| *r *= a);
            }
        }
        Ok(())
    }

    fn intra_rhs(
        &self,
        sub: &mut Subdomain,
        rate_prefix: &str,
        field_prefix: &str,
        t: Real,
    ) -> Result<(), RateError> {
        let op = Operation::IntraRhs;
        if !is_volume(sub, op)? {
            return Ok(());
        }
        let u = sub
            .field(&prefixed(field_prefix, DECAY_FIELD))
            .map_err(field_err(sub, op))?
            .to_vec();
        let label = sub.name().to_owned();
        let rate = sub
            .field_mut(&prefixed(rate_prefix, DECAY_FIELD))
            .map_err(|e| RateError::field(&label, op, e))?;
        let f = self.forcing * t.cos();
        for (r, u) in rate.iter_mut().zip(u) {
            *r += -self.lambda * u + f;
        }
        Ok(())
    }

    fn inter_rhs(
        &self,
        domain: &mut Domain,
        index: usize,
        _rate_prefix: &str,
        _field_prefix: &str,
        _t: Real,
    ) -> Result<(), RateError> {
        let op = Operation::InterRhs;
        let sub = domain.subdomains().get(index).ok_or_else(|| {
            RateError::domain(
                &format!("#{index}"),
                op,
                shear_domain::DomainError::NoSuchIndex(index),
            )
        })?;
        role_of(sub, op).map(|_| ())
    }

    fn add_rates(
        &self,
        sub: &mut Subdomain,
        lhs_prefix: &str,
        rhs_prefix: &str,
        rate_prefix: &str,
        a: Real,
    ) -> Result<(), RateError> {
        let op = Operation::AddRates;
        if !is_volume(sub, op)? {
            return Ok(());
        }
        let rhs = sub
            .field(&prefixed(rhs_prefix, DECAY_FIELD))
            .map_err(field_err(sub, op))?
            .to_vec();
        let rate = sub
            .field(&prefixed(rate_prefix, DECAY_FIELD))
            .map_err(field_err(sub, op))?
            .to_vec();
        let label = sub.name().to_owned();
        let lhs = sub
            .field_mut(&prefixed(lhs_prefix, DECAY_FIELD))
            .map_err(|e| RateError::field(&label, op, e))?;
        for ((l, q), r) in lhs.iter_mut().zip(rhs).zip(rate) {
            *l = q + a * r;
        }
        Ok(())
    }

    fn fill_minus_traces(
        &self,
        domain: &mut Domain,
        index: usize,
        _field_prefix: &str,
        _fields: &[&str],
    ) -> Result<(), RateError> {
        self.inter_rhs(domain, index, "", "", 0.0)
    }

    fn trace_fields(&self) -> &[&'static str] {
        &[]
    }
}

/// [`ForcedDecay`] whose `intra_rhs` fails after `succeed_count` calls on
/// volumes. Glue calls pass through uncounted.
pub struct FailingRates {
    pub inner: ForcedDecay,
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingRates {
    pub fn new(inner: ForcedDecay, succeed_count: usize) -> Self {
        Self {
            inner,
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `intra_rhs` has been called on a volume.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl RateAccumulation for FailingRates {
    fn name(&self) -> &str {
        "FailingRates"
    }

    fn allocate_rate_storage(&self, sub: &mut Subdomain, prefix: &str) -> Result<(), RateError> {
        self.inner.allocate_rate_storage(sub, prefix)
    }

    fn scale_rates(&self, sub: &mut Subdomain, prefix: &str, a: Real) -> Result<(), RateError> {
        self.inner.scale_rates(sub, prefix, a)
    }

    fn intra_rhs(
        &self,
        sub: &mut Subdomain,
        rate_prefix: &str,
        field_prefix: &str,
        t: Real,
    ) -> Result<(), RateError> {
        if !is_volume(sub, Operation::IntraRhs)? {
            return self.inner.intra_rhs(sub, rate_prefix, field_prefix, t);
        }
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(RateError::field(
                sub.name(),
                Operation::IntraRhs,
                FieldError::Missing {
                    subdomain: sub.name().to_owned(),
                    field: format!("deliberate failure after {} calls", self.succeed_count),
                },
            ));
        }
        self.inner.intra_rhs(sub, rate_prefix, field_prefix, t)
    }

    fn inter_rhs(
        &self,
        domain: &mut Domain,
        index: usize,
        rate_prefix: &str,
        field_prefix: &str,
        t: Real,
    ) -> Result<(), RateError> {
        self.inner
            .inter_rhs(domain, index, rate_prefix, field_prefix, t)
    }

    fn add_rates(
        &self,
        sub: &mut Subdomain,
        lhs_prefix: &str,
        rhs_prefix: &str,
        rate_prefix: &str,
        a: Real,
    ) -> Result<(), RateError> {
        self.inner
            .add_rates(sub, lhs_prefix, rhs_prefix, rate_prefix, a)
    }

    fn fill_minus_traces(
        &self,
        domain: &mut Domain,
        index: usize,
        field_prefix: &str,
        fields: &[&str],
    ) -> Result<(), RateError> {
        self.inner
            .fill_minus_traces(domain, index, field_prefix, fields)
    }

    fn trace_fields(&self) -> &[&'static str] {
        self.inner.trace_fields()
    }
}

/// `volumes` geometry-free volume subdomains, each holding `u = u0` on
/// `nodes` nodes, followed by one boundary glue subdomain.
pub fn decay_domain(volumes: u32, nodes: usize, u0: Real) -> Domain {
    let mut d = Domain::new();
    for id in 0..volumes {
        let mut sub = Subdomain::new(
            SubdomainId(id),
            format!("volume {id}"),
            TagSet::for_role(Role::Volume),
            1,
            nodes,
            Geometry::Detached,
        );
        sub.add_field_with(DECAY_FIELD, vec![u0; nodes])
            .expect("fresh subdomain");
        d.insert(sub).expect("unique id");
    }
    let glue = Subdomain::new(
        SubdomainId(volumes),
        "glue-boundary",
        TagSet::for_role(Role::Glue(GlueKind::Boundary)),
        1,
        0,
        Geometry::Detached,
    );
    d.insert(glue).expect("unique id");
    d
}
