//! Analytic initial conditions.

use std::f64::consts::PI;

use shear_core::{FieldError, Real};
use shear_domain::{FieldInit, InitContext};
use shear_kernel::Material;

/// Anti-plane standing wave in the traction-free unit box.
///
/// ```text
/// u3  = A cos(kx x) cos(ky y) cos(w t),  kx = n pi, ky = m pi
/// w   = cs sqrt(kx^2 + ky^2)
/// v3  = -A w cos(kx x) cos(ky y) sin(w t)
/// S13 = -A mu kx sin(kx x) cos(ky y) cos(w t)
/// S23 = -A mu ky cos(kx x) sin(ky y) cos(w t)
/// ```
///
/// `S13` vanishes on `x = 0, 1` and `S23` on `y = 0, 1`, so the mode is
/// an exact solution with stress-free walls. Every other state field
/// is zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StressFreeBox {
    /// Mode number along x.
    pub n: u32,
    /// Mode number along y.
    pub m: u32,
    /// Displacement amplitude.
    pub amplitude: Real,
    /// Medium.
    pub material: Material,
}

impl StressFreeBox {
    /// Mode `(n, m)` with unit amplitude.
    pub fn new(n: u32, m: u32, material: Material) -> Self {
        Self {
            n,
            m,
            amplitude: 1.0,
            material,
        }
    }

    fn wavenumbers(&self) -> (Real, Real) {
        (Real::from(self.n) * PI, Real::from(self.m) * PI)
    }

    /// Angular frequency.
    pub fn omega(&self) -> Real {
        let (kx, ky) = self.wavenumbers();
        self.material.cs() * kx.hypot(ky)
    }

    /// Temporal period, infinite for the `(0, 0)` mode.
    pub fn period(&self) -> Real {
        2.0 * PI / self.omega()
    }

    /// Exact value of `field` at `(x, y, t)`.
    pub fn value(&self, field: &str, x: Real, y: Real, t: Real) -> Option<Real> {
        let (kx, ky) = self.wavenumbers();
        let a = self.amplitude;
        let w = self.omega();
        let mu = self.material.mu;
        let v = match field {
            "v3" => -a * w * (kx * x).cos() * (ky * y).cos() * (w * t).sin(),
            "S13" => -a * mu * kx * (kx * x).sin() * (ky * y).cos() * (w * t).cos(),
            "S23" => -a * mu * ky * (kx * x).cos() * (ky * y).sin() * (w * t).cos(),
            "v1" | "v2" | "S11" | "S22" | "S33" | "S12" => 0.0,
            _ => return None,
        };
        Some(v)
    }
}

impl FieldInit for StressFreeBox {
    fn fill(&self, ctx: &InitContext<'_>, out: &mut [Real]) -> Result<(), FieldError> {
        if self.value(ctx.field, 0.0, 0.0, ctx.time).is_none() {
            return Err(FieldError::Init {
                field: ctx.field.to_owned(),
                reason: format!("not a state field (subdomain '{}')", ctx.subdomain),
            });
        }
        for (n, o) in out.iter_mut().enumerate() {
            *o = self
                .value(ctx.field, ctx.x[n], ctx.y[n], ctx.time)
                .unwrap_or_default();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Material {
        Material {
            rho: 1.0,
            lam: 1.0,
            mu: 1.0,
        }
    }

    #[test]
    fn mode_two_two_period() {
        let b = StressFreeBox::new(2, 2, unit());
        assert!((b.period() - 1.0 / 2.0_f64.sqrt()).abs() < 1e-14);
    }

    #[test]
    fn walls_are_traction_free() {
        let b = StressFreeBox::new(2, 1, unit());
        for s in [0.0, 0.3, 0.7, 1.0] {
            for t in [0.0, 0.2] {
                assert!(b.value("S13", 0.0, s, t).unwrap().abs() < 1e-12);
                assert!(b.value("S13", 1.0, s, t).unwrap().abs() < 1e-12);
                assert!(b.value("S23", s, 0.0, t).unwrap().abs() < 1e-12);
                assert!(b.value("S23", s, 1.0, t).unwrap().abs() < 1e-12);
            }
        }
    }

    #[test]
    fn fills_state_and_rejects_other_fields() {
        let b = StressFreeBox::new(1, 1, unit());
        let ctx = |field| InitContext {
            field,
            subdomain: "volume 0",
            time: 0.0,
            x: &[0.25, 0.5],
            y: &[0.0, 0.0],
            z: &[0.0, 0.0],
        };
        let mut out = [9.0; 2];
        b.fill(&ctx("v3"), &mut out).unwrap();
        assert_eq!(out, [0.0, 0.0]);
        b.fill(&ctx("S12"), &mut out).unwrap();
        assert_eq!(out, [0.0, 0.0]);
        b.fill(&ctx("S13"), &mut out).unwrap();
        assert!((out[0] + PI * (PI / 4.0).sin()).abs() < 1e-14);
        assert!(matches!(
            b.fill(&ctx("rho"), &mut out),
            Err(FieldError::Init { .. })
        ));
    }
}
