//! Order-generic elastic DG kernels.
//!
//! Node `i + j (N + 1)` of element `e` lives at index `e (N + 1)^2 + i +
//! j (N + 1)` of every volume field. Glue fields hold `N_g + 1` nodes per
//! face, faces in glue order. All kernels *add* into rates.
//!
//! The kernels take `n` explicitly so that [`crate::registry`] can
//! instantiate them with a constant order; the generic path passes the
//! basis order at run time. Both execute identical floating-point
//! operations.

use crate::basis::{face_node, LglBasis};
use crate::flux::{self, Correction, Impedance, NodeState};
use shear_core::Real;
use shear_domain::{ElementGeom, GlueFace, InteriorFace};

const V1: usize = 0;
const V2: usize = 1;
const V3: usize = 2;
const S11: usize = 3;
const S22: usize = 4;
const S33: usize = 5;
const S12: usize = 6;
const S13: usize = 7;
const S23: usize = 8;

/// Per-node material coefficients of a volume subdomain.
#[derive(Clone, Copy, Debug)]
pub struct MaterialView<'a> {
    /// `1 / rho`.
    pub rho_inv: &'a [Real],
    /// First Lamé parameter.
    pub lam: &'a [Real],
    /// Shear modulus.
    pub mu: &'a [Real],
    /// S-wave impedance.
    pub zs: &'a [Real],
    /// P-wave impedance.
    pub zp: &'a [Real],
}

/// Inputs of the volume kernel.
#[derive(Clone, Copy, Debug)]
pub struct VolumeView<'a> {
    /// Basis of the subdomain's order.
    pub basis: &'a LglBasis,
    /// Element block.
    pub elements: &'a [ElementGeom],
    /// Faces shared inside the block.
    pub interior_faces: &'a [InteriorFace],
    /// The nine state arrays.
    pub state: [&'a [Real]; 9],
    /// Material arrays.
    pub material: MaterialView<'a>,
}

/// Inputs of the boundary kernel.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryView<'a> {
    /// Basis of the owner volume.
    pub basis: &'a LglBasis,
    /// Owner element block.
    pub elements: &'a [ElementGeom],
    /// Boundary faces.
    pub faces: &'a [GlueFace],
    /// Owner state.
    pub state: [&'a [Real]; 9],
    /// Owner material.
    pub material: MaterialView<'a>,
    /// Reflection coefficient.
    pub reflection: Real,
}

/// Inputs of the glue coupling kernel.
#[derive(Clone, Copy, Debug)]
pub struct GlueView<'a> {
    /// Basis of the owner volume.
    pub owner_basis: &'a LglBasis,
    /// Basis of the glue order.
    pub glue_basis: &'a LglBasis,
    /// Owner-to-glue interpolation, `(N_g + 1) x (N_m + 1)` row-major.
    pub interp: &'a [Real],
    /// Owner element block.
    pub elements: &'a [ElementGeom],
    /// Glue faces.
    pub faces: &'a [GlueFace],
    /// Minus traces at glue nodes.
    pub minus: [&'a [Real]; 9],
    /// Plus traces at glue nodes.
    pub plus: [&'a [Real]; 9],
    /// Minus impedances at glue nodes.
    pub minus_z: (&'a [Real], &'a [Real]),
    /// Plus impedances at glue nodes.
    pub plus_z: (&'a [Real], &'a [Real]),
    /// Owner material at volume nodes.
    pub material: MaterialView<'a>,
}

/// Volume derivative terms plus the upwind flux on interior faces.
#[inline(always)]
pub(crate) fn intra_impl(n: usize, view: &VolumeView<'_>, rates: &mut [&mut [Real]; 9]) {
    let nq = n + 1;
    let np = nq * nq;
    let d = view.basis.diff();
    let st = &view.state;
    let m = &view.material;

    for (e, elem) in view.elements.iter().enumerate() {
        let off = e * np;
        let rx = 2.0 / elem.bounds.hx();
        let ry = 2.0 / elem.bounds.hy();
        for j in 0..nq {
            for i in 0..nq {
                let mut dx = [0.0; 9];
                let mut dy = [0.0; 9];
                for k in 0..nq {
                    let dik = d[i * nq + k];
                    let djk = d[j * nq + k];
                    let px = off + k + j * nq;
                    let py = off + i + k * nq;
                    for c in 0..9 {
                        dx[c] += dik * st[c][px];
                        dy[c] += djk * st[c][py];
                    }
                }
                for c in 0..9 {
                    dx[c] *= rx;
                    dy[c] *= ry;
                }

                let p = off + i + j * nq;
                let rho_inv = m.rho_inv[p];
                let lam = m.lam[p];
                let mu = m.mu[p];
                let l2m = lam + 2.0 * mu;
                rates[V1][p] += rho_inv * (dx[S11] + dy[S12]);
                rates[V2][p] += rho_inv * (dx[S12] + dy[S22]);
                rates[V3][p] += rho_inv * (dx[S13] + dy[S23]);
                rates[S11][p] += l2m * dx[V1] + lam * dy[V2];
                rates[S22][p] += lam * dx[V1] + l2m * dy[V2];
                rates[S33][p] += lam * (dx[V1] + dy[V2]);
                rates[S12][p] += mu * (dy[V1] + dx[V2]);
                rates[S13][p] += mu * dx[V3];
                rates[S23][p] += mu * dy[V3];
            }
        }
    }

    for face in view.interior_faces {
        let (em, fm) = (face.minus, face.minus_face);
        let (ep, fp) = (face.plus, face.plus_face);
        let nm = fm.normal();
        let nm = [nm.0, nm.1];
        let npl = fp.normal();
        let npl = [npl.0, npl.1];
        let lift_m = view
            .basis
            .lift(view.elements[em].bounds.normal_extent(fm));
        let lift_p = view
            .basis
            .lift(view.elements[ep].bounds.normal_extent(fp));
        for k in 0..nq {
            let im = em * np + face_node(n, fm.index(), k);
            let ip = ep * np + face_node(n, fp.index(), k);
            let sm = NodeState::gather(st, im);
            let sp = NodeState::gather(st, ip);
            let zm = Impedance {
                zs: m.zs[im],
                zp: m.zp[im],
            };
            let zp = Impedance {
                zs: m.zs[ip],
                zp: m.zp[ip],
            };
            let cm = flux::upwind(nm, &sm, zm, &sp, zp);
            let cp = flux::upwind(npl, &sp, zp, &sm, zm);
            flux::apply(rates, im, nm, &cm, lift_m, m.rho_inv[im], m.lam[im], m.mu[im]);
            flux::apply(rates, ip, npl, &cp, lift_p, m.rho_inv[ip], m.lam[ip], m.mu[ip]);
        }
    }
}

/// Boundary flux into the owner volume's face nodes.
pub fn boundary_rhs(view: &BoundaryView<'_>, rates: &mut [&mut [Real]; 9]) {
    let n = view.basis.order();
    let np = view.basis.np();
    let m = &view.material;
    for gf in view.faces {
        let e = gf.owner_element;
        let (n0, n1) = gf.face.normal();
        let normal = [n0, n1];
        let lift = view
            .basis
            .lift(view.elements[e].bounds.normal_extent(gf.face));
        for k in 0..=n {
            let i = e * np + face_node(n, gf.face.index(), k);
            let s = NodeState::gather(&view.state, i);
            let z = Impedance {
                zs: m.zs[i],
                zp: m.zp[i],
            };
            let c = flux::boundary(normal, &s, z, view.reflection);
            flux::apply(rates, i, normal, &c, lift, m.rho_inv[i], m.lam[i], m.mu[i]);
        }
    }
}

/// Upwind coupling flux across a local or parallel glue, evaluated at
/// glue nodes and projected onto the owner's face nodes with
/// `W_m^{-1} I^T W_g`.
pub fn glue_rhs(view: &GlueView<'_>, rates: &mut [&mut [Real]; 9]) {
    let nm = view.owner_basis.order();
    let nqm = nm + 1;
    let np = view.owner_basis.np();
    let nqg = view.glue_basis.nq();
    let wm = view.owner_basis.weights();
    let wg = view.glue_basis.weights();
    let m = &view.material;
    let mut corr = vec![Correction::default(); nqg];

    for (fi, gf) in view.faces.iter().enumerate() {
        let e = gf.owner_element;
        let (n0, n1) = gf.face.normal();
        let normal = [n0, n1];
        let lift = view
            .owner_basis
            .lift(view.elements[e].bounds.normal_extent(gf.face));

        for (g, c) in corr.iter_mut().enumerate() {
            let idx = fi * nqg + g;
            let sm = NodeState::gather(&view.minus, idx);
            let sp = NodeState::gather(&view.plus, idx);
            let zm = Impedance {
                zs: view.minus_z.0[idx],
                zp: view.minus_z.1[idx],
            };
            let zp = Impedance {
                zs: view.plus_z.0[idx],
                zp: view.plus_z.1[idx],
            };
            *c = flux::upwind(normal, &sm, zm, &sp, zp);
        }

        for a in 0..nqm {
            let mut c = Correction::default();
            for (g, cg) in corr.iter().enumerate() {
                let p = view.interp[g * nqm + a] * wg[g] / wm[a];
                for k in 0..3 {
                    c.dv[k] += p * cg.dv[k];
                    c.dt[k] += p * cg.dt[k];
                }
            }
            let i = e * np + face_node(nm, gf.face.index(), a);
            flux::apply(rates, i, normal, &c, lift, m.rho_inv[i], m.lam[i], m.mu[i]);
        }
    }
}

/// Interpolate the owner's face values of `src` onto glue nodes.
pub fn fill_trace(
    owner_basis: &LglBasis,
    glue_nq: usize,
    interp: &[Real],
    faces: &[GlueFace],
    src: &[Real],
    dst: &mut [Real],
) {
    let nm = owner_basis.order();
    let nqm = nm + 1;
    let np = owner_basis.np();
    for (fi, gf) in faces.iter().enumerate() {
        let e = gf.owner_element;
        for g in 0..glue_nq {
            let mut v = 0.0;
            for a in 0..nqm {
                v += interp[g * nqm + a] * src[e * np + face_node(nm, gf.face.index(), a)];
            }
            dst[fi * glue_nq + g] = v;
        }
    }
}
