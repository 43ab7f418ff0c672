//! Isotropic elastic material and its derived coefficients.

use shear_core::{Real, MATERIAL_FIELDS};

/// Density and Lamé parameters of a homogeneous isotropic solid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Density.
    pub rho: Real,
    /// First Lamé parameter.
    pub lam: Real,
    /// Shear modulus.
    pub mu: Real,
}

impl Material {
    /// S-wave impedance `sqrt(rho mu)`.
    pub fn zs(&self) -> Real {
        (self.rho * self.mu).sqrt()
    }

    /// P-wave impedance `sqrt(rho (lam + 2 mu))`.
    pub fn zp(&self) -> Real {
        (self.rho * (self.lam + 2.0 * self.mu)).sqrt()
    }

    /// S-wave speed.
    pub fn cs(&self) -> Real {
        (self.mu / self.rho).sqrt()
    }

    /// P-wave speed.
    pub fn cp(&self) -> Real {
        ((self.lam + 2.0 * self.mu) / self.rho).sqrt()
    }

    /// `(name, value)` for every material field, in storage order.
    pub fn fields(&self) -> [(&'static str, Real); 6] {
        let values = [
            self.rho,
            1.0 / self.rho,
            self.lam,
            self.mu,
            self.zs(),
            self.zp(),
        ];
        let mut out = [("", 0.0); 6];
        for (slot, (name, value)) in out.iter_mut().zip(MATERIAL_FIELDS.iter().zip(values)) {
            *slot = (*name, value);
        }
        out
    }

    /// Check the parameters describe a stable solid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.rho > 0.0) || !self.rho.is_finite() {
            return Err(format!("rho must be finite and > 0, got {}", self.rho));
        }
        if !(self.mu >= 0.0) || !self.mu.is_finite() {
            return Err(format!("mu must be finite and >= 0, got {}", self.mu));
        }
        if !(self.lam + 2.0 * self.mu > 0.0) || !self.lam.is_finite() {
            return Err(format!(
                "lam + 2 mu must be finite and > 0, got lam = {}",
                self.lam
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_material() {
        let m = Material {
            rho: 1.0,
            lam: 1.0,
            mu: 1.0,
        };
        assert_eq!(m.zs(), 1.0);
        assert_eq!(m.zp(), 3.0f64.sqrt());
        let f = m.fields();
        assert_eq!(f[1], ("rho_inv", 1.0));
        assert_eq!(f[5].0, "Zp");
    }

    #[test]
    fn rejects_unphysical() {
        let bad = Material {
            rho: 0.0,
            lam: 1.0,
            mu: 1.0,
        };
        assert!(bad.validate().unwrap_err().contains("rho"));
        let bad = Material {
            rho: 1.0,
            lam: -3.0,
            mu: 1.0,
        };
        assert!(bad.validate().is_err());
    }
}
