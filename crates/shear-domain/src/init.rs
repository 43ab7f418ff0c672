//! Field initializers.
//!
//! An initializer fills one field of one subdomain from the node
//! coordinates and a time. Any context it needs travels inside the
//! initializer value itself.

use shear_core::{FieldError, Real};

/// Arguments handed to a [`FieldInit`].
#[derive(Clone, Copy, Debug)]
pub struct InitContext<'a> {
    /// Name of the field being filled.
    pub field: &'a str,
    /// Name of the subdomain being filled.
    pub subdomain: &'a str,
    /// Evaluation time.
    pub time: Real,
    /// Node x-coordinates.
    pub x: &'a [Real],
    /// Node y-coordinates.
    pub y: &'a [Real],
    /// Node z-coordinates.
    pub z: &'a [Real],
}

/// Fills a field's node values.
pub trait FieldInit {
    /// Write one value per node into `out` (`out.len() == ctx.x.len()`).
    fn fill(&self, ctx: &InitContext<'_>, out: &mut [Real]) -> Result<(), FieldError>;
}

/// Sets every node to the same value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantFill(pub Real);

impl FieldInit for ConstantFill {
    fn fill(&self, _ctx: &InitContext<'_>, out: &mut [Real]) -> Result<(), FieldError> {
        out.fill(self.0);
        Ok(())
    }
}

/// Wraps a closure `(x, y, z, t) -> value`.
///
/// # Examples
///
/// ```
/// use shear_domain::{FieldInit, FnInit, InitContext};
///
/// let init = FnInit(|x: f64, y: f64, _z: f64, t: f64| x + 2.0 * y + t);
/// let ctx = InitContext {
///     field: "v1",
///     subdomain: "vol",
///     time: 1.0,
///     x: &[0.0, 1.0],
///     y: &[0.5, 0.5],
///     z: &[0.0, 0.0],
/// };
/// let mut out = [0.0; 2];
/// init.fill(&ctx, &mut out).unwrap();
/// assert_eq!(out, [2.0, 3.0]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FnInit<F>(pub F);

impl<F> FieldInit for FnInit<F>
where
    F: Fn(Real, Real, Real, Real) -> Real,
{
    fn fill(&self, ctx: &InitContext<'_>, out: &mut [Real]) -> Result<(), FieldError> {
        for (n, v) in out.iter_mut().enumerate() {
            *v = (self.0)(ctx.x[n], ctx.y[n], ctx.z[n], ctx.time);
        }
        Ok(())
    }
}
