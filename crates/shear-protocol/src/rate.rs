//! The [`RateAccumulation`] trait.

use crate::error::RateError;
use shear_core::Real;
use shear_domain::{Domain, Subdomain};

/// The spatial operator of an explicit scheme, split into per-subdomain
/// operations dispatched by role.
///
/// Field arguments are *prefixes*: an implementation that evolves the
/// fields `v1 .. S23` reads state `"{field_prefix}v1"` and writes rate
/// `"{rate_prefix}v1"`. An empty prefix names the physical state.
///
/// # Contract
///
/// - Every operation resolves the subdomain's role first. A tag set
///   without exactly one role tag, or a role whose geometry payload does
///   not match, is an error, never a silent no-op.
/// - Only volume subdomains hold rates. Operations on glue roles that
///   have nothing to do return `Ok(())`.
/// - `intra_rhs` only touches the subdomain it is given. `inter_rhs`
///   runs once the exchange has filled every glue's plus traces, and
///   adds into the *owner* volume of the glue at `index`.
/// - Results are deterministic: the same inputs give bitwise-identical
///   rates.
///
/// # Object safety
///
/// The stepper stores its protocol as `Box<dyn RateAccumulation>`.
pub trait RateAccumulation {
    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Declare zeroed rate fields under `prefix`.
    fn allocate_rate_storage(&self, sub: &mut Subdomain, prefix: &str) -> Result<(), RateError>;

    /// Multiply every rate field under `prefix` by `a`.
    fn scale_rates(&self, sub: &mut Subdomain, prefix: &str, a: Real) -> Result<(), RateError>;

    /// Add this subdomain's own contribution to its rates at time `t`.
    fn intra_rhs(
        &self,
        sub: &mut Subdomain,
        rate_prefix: &str,
        field_prefix: &str,
        t: Real,
    ) -> Result<(), RateError>;

    /// Add the coupling contribution of the subdomain at `index` to the
    /// rates of the volume it belongs to.
    fn inter_rhs(
        &self,
        domain: &mut Domain,
        index: usize,
        rate_prefix: &str,
        field_prefix: &str,
        t: Real,
    ) -> Result<(), RateError>;

    /// `lhs = rhs + a * rate`, per field and node.
    fn add_rates(
        &self,
        sub: &mut Subdomain,
        lhs_prefix: &str,
        rhs_prefix: &str,
        rate_prefix: &str,
        a: Real,
    ) -> Result<(), RateError>;

    /// Write the owner volume's face values of `fields` (under
    /// `field_prefix`) into the minus traces of the glue at `index`.
    ///
    /// Called by the exchange before traces are sent or copied.
    fn fill_minus_traces(
        &self,
        domain: &mut Domain,
        index: usize,
        field_prefix: &str,
        fields: &[&str],
    ) -> Result<(), RateError>;

    /// Names of the unknowns whose traces are exchanged each stage.
    fn trace_fields(&self) -> &[&'static str];
}
