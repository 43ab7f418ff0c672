//! Pointwise upwind fluxes for the elastic system.
//!
//! Every face node is treated as a one-dimensional Riemann problem along
//! the minus side's outward normal `n`. The traction `T = S n` and
//! velocity split into a normal part, carried by P waves with impedance
//! `Zp`, and a tangential part (including the out-of-plane component),
//! carried by S waves with impedance `Zs`. The solution `(v*, T*)`
//! satisfies
//!
//! ```text
//! T* - Zm v* = Tm - Zm vm      (outgoing from the minus side)
//! T* + Zp v* = Tp + Zp vp      (incoming from the plus side)
//! ```
//!
//! and the minus side is corrected by `dv = v* - vm`, `dT = T* - Tm`.

use shear_core::Real;

/// Velocity and stress at one node, in state-field order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeState {
    /// `v1 v2 v3`.
    pub v: [Real; 3],
    /// `S11 S22 S33 S12 S13 S23`.
    pub s: [Real; 6],
}

impl NodeState {
    /// Gather node `i` from nine state arrays.
    #[inline(always)]
    pub fn gather(fields: &[&[Real]; 9], i: usize) -> Self {
        Self {
            v: [fields[0][i], fields[1][i], fields[2][i]],
            s: [
                fields[3][i],
                fields[4][i],
                fields[5][i],
                fields[6][i],
                fields[7][i],
                fields[8][i],
            ],
        }
    }

    /// Traction `S n` for an in-plane normal.
    #[inline(always)]
    pub fn traction(&self, n: [Real; 2]) -> [Real; 3] {
        let s = &self.s;
        [
            s[0] * n[0] + s[3] * n[1],
            s[3] * n[0] + s[1] * n[1],
            s[4] * n[0] + s[5] * n[1],
        ]
    }
}

/// Impedances on one side of a face node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impedance {
    /// S-wave impedance `sqrt(rho mu)`.
    pub zs: Real,
    /// P-wave impedance `sqrt(rho (lam + 2 mu))`.
    pub zp: Real,
}

/// Correction to the minus side at one face node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Correction {
    /// `v* - vm`.
    pub dv: [Real; 3],
    /// `T* - Tm`.
    pub dt: [Real; 3],
}

#[inline(always)]
fn split(a: [Real; 3], n: [Real; 2]) -> (Real, [Real; 3]) {
    let an = a[0] * n[0] + a[1] * n[1];
    (an, [a[0] - an * n[0], a[1] - an * n[1], a[2]])
}

#[inline(always)]
fn join(normal: Real, tangential: [Real; 3], n: [Real; 2]) -> [Real; 3] {
    [
        normal * n[0] + tangential[0],
        normal * n[1] + tangential[1],
        tangential[2],
    ]
}

/// `v*` for one wave family; zero when both impedances vanish.
#[inline(always)]
fn interface_velocity(tm: Real, tp: Real, vm: Real, vp: Real, zm: Real, zp: Real) -> Real {
    let zsum = zm + zp;
    if zsum == 0.0 {
        vm
    } else {
        (tp - tm + zm * vm + zp * vp) / zsum
    }
}

/// Upwind correction between two elastic states across normal `n`.
#[inline(always)]
pub fn upwind(
    n: [Real; 2],
    minus: &NodeState,
    zm: Impedance,
    plus: &NodeState,
    zp: Impedance,
) -> Correction {
    let (tm_n, tm_t) = split(minus.traction(n), n);
    let (tp_n, tp_t) = split(plus.traction(n), n);
    let (vm_n, vm_t) = split(minus.v, n);
    let (vp_n, vp_t) = split(plus.v, n);

    let vs_n = interface_velocity(tm_n, tp_n, vm_n, vp_n, zm.zp, zp.zp);
    let mut dv_t = [0.0; 3];
    for c in 0..3 {
        dv_t[c] = interface_velocity(tm_t[c], tp_t[c], vm_t[c], vp_t[c], zm.zs, zp.zs) - vm_t[c];
    }
    let dv_n = vs_n - vm_n;

    Correction {
        dv: join(dv_n, dv_t, n),
        dt: join(zm.zp * dv_n, dv_t.map(|d| zm.zs * d), n),
    }
}

/// Boundary correction for reflection coefficient `r`.
///
/// With `w = Tm - Z vm` the outgoing characteristic, the boundary state
/// is `T* = (1 + r) w / 2`, `v* = (r - 1) w / (2 Z)`: `r = -1` is a
/// traction-free surface, `r = 1` a rigid wall, `r = 0` absorbing.
#[inline(always)]
pub fn boundary(n: [Real; 2], minus: &NodeState, z: Impedance, r: Real) -> Correction {
    let (tm_n, tm_t) = split(minus.traction(n), n);
    let (vm_n, vm_t) = split(minus.v, n);

    let reflect = |t: Real, v: Real, z: Real| -> (Real, Real) {
        if z == 0.0 {
            return (0.0, 0.0);
        }
        let w = t - z * v;
        let ts = 0.5 * (1.0 + r) * w;
        let vs = 0.5 * (r - 1.0) * w / z;
        (vs - v, ts - t)
    };

    let (dv_n, dt_n) = reflect(tm_n, vm_n, z.zp);
    let mut dv_t = [0.0; 3];
    let mut dt_t = [0.0; 3];
    for c in 0..3 {
        let (dv, dt) = reflect(tm_t[c], vm_t[c], z.zs);
        dv_t[c] = dv;
        dt_t[c] = dt;
    }
    Correction {
        dv: join(dv_n, dv_t, n),
        dt: join(dt_n, dt_t, n),
    }
}

/// Add a lifted correction into the nine rate arrays at node `i`.
///
/// `lift` includes the face-to-volume mass ratio; the material
/// coefficients are those at node `i`.
#[inline(always)]
#[allow(clippy::too_many_arguments)]
pub fn apply(
    rates: &mut [&mut [Real]; 9],
    i: usize,
    n: [Real; 2],
    c: &Correction,
    lift: Real,
    rho_inv: Real,
    lam: Real,
    mu: Real,
) {
    let [dv1, dv2, dv3] = c.dv;
    let l2m = lam + 2.0 * mu;
    rates[0][i] += lift * rho_inv * c.dt[0];
    rates[1][i] += lift * rho_inv * c.dt[1];
    rates[2][i] += lift * rho_inv * c.dt[2];
    rates[3][i] += lift * (l2m * dv1 * n[0] + lam * dv2 * n[1]);
    rates[4][i] += lift * (lam * dv1 * n[0] + l2m * dv2 * n[1]);
    rates[5][i] += lift * lam * (dv1 * n[0] + dv2 * n[1]);
    rates[6][i] += lift * mu * (dv1 * n[1] + dv2 * n[0]);
    rates[7][i] += lift * mu * dv3 * n[0];
    rates[8][i] += lift * mu * dv3 * n[1];
}

#[cfg(test)]
mod tests {
    use super::*;

    const Z: Impedance = Impedance { zs: 1.0, zp: 2.0 };

    fn state(v: [Real; 3], s: [Real; 6]) -> NodeState {
        NodeState { v, s }
    }

    #[test]
    fn continuous_state_has_zero_correction() {
        let a = state([0.3, -0.2, 0.7], [1.0, 2.0, 3.0, 0.5, -0.4, 0.1]);
        let c = upwind([0.0, 1.0], &a, Z, &a, Z);
        assert!(c.dv.iter().chain(&c.dt).all(|x| x.abs() < 1e-15));
    }

    #[test]
    fn correction_is_equal_and_opposite_in_traction() {
        let a = state([0.3, -0.2, 0.7], [1.0, 2.0, 3.0, 0.5, -0.4, 0.1]);
        let b = state([-0.1, 0.4, 0.2], [0.2, -1.0, 0.0, 0.3, 0.9, -0.6]);
        let n = [1.0, 0.0];
        let ca = upwind(n, &a, Z, &b, Z);
        let cb = upwind([-1.0, 0.0], &b, Z, &a, Z);
        // Both sides agree on v* and on T* expressed with the same normal.
        for k in 0..3 {
            assert!((a.v[k] + ca.dv[k] - (b.v[k] + cb.dv[k])).abs() < 1e-14);
            let ta = a.traction(n)[k] + ca.dt[k];
            let tb = b.traction([-1.0, 0.0])[k] + cb.dt[k];
            assert!((ta + tb).abs() < 1e-14);
        }
    }

    #[test]
    fn traction_free_boundary_zeroes_traction() {
        let a = state([0.3, -0.2, 0.7], [1.0, 2.0, 3.0, 0.5, -0.4, 0.1]);
        let n = [0.0, -1.0];
        let c = boundary(n, &a, Z, -1.0);
        let t = a.traction(n);
        for k in 0..3 {
            assert!((t[k] + c.dt[k]).abs() < 1e-14);
        }
    }

    #[test]
    fn rigid_boundary_zeroes_velocity() {
        let a = state([0.3, -0.2, 0.7], [1.0, 2.0, 3.0, 0.5, -0.4, 0.1]);
        let c = boundary([1.0, 0.0], &a, Z, 1.0);
        for k in 0..3 {
            assert!((a.v[k] + c.dv[k]).abs() < 1e-14);
        }
    }

    #[test]
    fn absorbing_boundary_matches_upwind_against_rest() {
        let a = state([0.3, -0.2, 0.7], [1.0, 2.0, 3.0, 0.5, -0.4, 0.1]);
        let rest = NodeState::default();
        let n = [0.0, 1.0];
        let cb = boundary(n, &a, Z, 0.0);
        let cu = upwind(n, &a, Z, &rest, Z);
        for k in 0..3 {
            assert!((cb.dv[k] - cu.dv[k]).abs() < 1e-14);
            assert!((cb.dt[k] - cu.dt[k]).abs() < 1e-14);
        }
    }
}
