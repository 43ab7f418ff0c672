//! Order-specialized kernel selection.
//!
//! Orders `1..=MAX_SPECIALIZED` get a const-generic instantiation of the
//! volume kernel so loop bounds are compile-time constants; every other
//! order runs the generic instantiation. Both evaluate the same
//! expressions in the same order, so the choice never changes results.

use crate::elastic::{intra_impl, VolumeView};
use shear_core::Real;

/// Signature shared by every volume kernel instantiation.
pub type IntraKernel = fn(&VolumeView<'_>, &mut [&mut [Real]; 9]);

fn intra_fixed<const N: usize>(view: &VolumeView<'_>, rates: &mut [&mut [Real]; 9]) {
    debug_assert_eq!(view.basis.order(), N);
    intra_impl(N, view, rates)
}

/// Volume kernel for any order.
pub fn intra_generic(view: &VolumeView<'_>, rates: &mut [&mut [Real]; 9]) {
    intra_impl(view.basis.order(), view, rates)
}

/// Maps polynomial order to the volume kernel to run.
#[derive(Clone, Debug)]
pub struct KernelRegistry {
    intra: [IntraKernel; KernelRegistry::MAX_SPECIALIZED],
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelRegistry {
    /// Highest order with a specialized kernel.
    pub const MAX_SPECIALIZED: usize = 8;

    /// Registry with the built-in specializations.
    pub fn new() -> Self {
        Self {
            intra: [
                intra_fixed::<1>,
                intra_fixed::<2>,
                intra_fixed::<3>,
                intra_fixed::<4>,
                intra_fixed::<5>,
                intra_fixed::<6>,
                intra_fixed::<7>,
                intra_fixed::<8>,
            ],
        }
    }

    /// Whether `order` has a specialized kernel.
    pub fn is_specialized(&self, order: usize) -> bool {
        (1..=Self::MAX_SPECIALIZED).contains(&order)
    }

    /// The volume kernel for `order`, falling back to [`intra_generic`].
    pub fn intra(&self, order: usize) -> IntraKernel {
        if self.is_specialized(order) {
            self.intra[order - 1]
        } else {
            intra_generic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::LglBasis;
    use crate::elastic::MaterialView;
    use proptest::prelude::*;
    use shear_core::ElementId;
    use shear_domain::{ElementGeom, InteriorFace};
    use shear_mesh::{Bounds, Face};

    fn two_elements() -> Vec<ElementGeom> {
        vec![
            ElementGeom {
                gid: ElementId(0),
                bounds: Bounds {
                    x0: 0.0,
                    x1: 0.5,
                    y0: 0.0,
                    y1: 0.25,
                },
            },
            ElementGeom {
                gid: ElementId(1),
                bounds: Bounds {
                    x0: 0.5,
                    x1: 1.0,
                    y0: 0.0,
                    y1: 0.25,
                },
            },
        ]
    }

    fn run(kernel: IntraKernel, order: usize, seed: &[Real]) -> Vec<Vec<Real>> {
        let basis = LglBasis::new(order);
        let elements = two_elements();
        let faces = [InteriorFace {
            minus: 0,
            minus_face: Face::XMax,
            plus: 1,
            plus_face: Face::XMin,
        }];
        let nn = 2 * basis.np();
        let state: Vec<Vec<Real>> = (0..9)
            .map(|c| {
                (0..nn)
                    .map(|i| seed[(c * 7 + i) % seed.len()] * (1.0 + c as Real))
                    .collect()
            })
            .collect();
        let rho_inv: Vec<Real> = vec![0.8; nn];
        let lam: Vec<Real> = vec![1.5; nn];
        let mu: Vec<Real> = vec![0.7; nn];
        let zs: Vec<Real> = mu.iter().zip(&rho_inv).map(|(m, r)| (m / r).sqrt()).collect();
        let zp: Vec<Real> = (0..nn).map(|i| ((lam[i] + 2.0 * mu[i]) / rho_inv[i]).sqrt()).collect();
        let view = VolumeView {
            basis: &basis,
            elements: &elements,
            interior_faces: &faces,
            state: std::array::from_fn(|c| state[c].as_slice()),
            material: MaterialView {
                rho_inv: &rho_inv,
                lam: &lam,
                mu: &mu,
                zs: &zs,
                zp: &zp,
            },
        };
        let mut out: Vec<Vec<Real>> = (0..9).map(|_| vec![0.25; nn]).collect();
        {
            let mut it = out.iter_mut();
            let mut rates: [&mut [Real]; 9] =
                std::array::from_fn(|_| it.next().map(|v| v.as_mut_slice()).unwrap());
            kernel(&view, &mut rates);
        }
        out
    }

    #[test]
    fn fallback_beyond_specialized_range() {
        let reg = KernelRegistry::new();
        assert!(reg.is_specialized(1));
        assert!(reg.is_specialized(8));
        assert!(!reg.is_specialized(9));
        assert!(!reg.is_specialized(0));
    }

    #[test]
    fn constant_state_has_zero_rhs() {
        let reg = KernelRegistry::new();
        let out = run(reg.intra(4), 4, &[1.25]);
        for field in &out {
            for &v in field {
                assert!((v - 0.25).abs() < 1e-12);
            }
        }
    }

    proptest! {
        #[test]
        fn specialized_matches_generic_bitwise(
            order in 1usize..=8,
            seed in prop::collection::vec(-1.0f64..1.0, 1..40),
        ) {
            let reg = KernelRegistry::new();
            let fast = run(reg.intra(order), order, &seed);
            let slow = run(intra_generic, order, &seed);
            for (a, b) in fast.iter().zip(&slow) {
                for (x, y) in a.iter().zip(b) {
                    prop_assert_eq!(x.to_bits(), y.to_bits());
                }
            }
        }
    }
}
