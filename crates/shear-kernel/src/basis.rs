//! One-dimensional Legendre-Gauss-Lobatto nodal basis.
//!
//! Quadrilateral elements use the tensor product of this basis. For
//! order `N` there are `N + 1` nodes on `[-1, 1]`, including both
//! endpoints, with the associated quadrature weights (exact for
//! polynomials of degree `2N - 1`), the nodal differentiation matrix,
//! and barycentric interpolation to arbitrary points.

use shear_core::Real;

const NEWTON_TOL: Real = 4.0 * Real::EPSILON;
const NEWTON_MAX_ITERS: usize = 100;

/// Legendre polynomials `P_N(x)` and `P_{N-1}(x)` by three-term recurrence.
fn legendre_pair(n: usize, x: Real) -> (Real, Real) {
    let mut p_prev = 1.0;
    if n == 0 {
        return (p_prev, 0.0);
    }
    let mut p = x;
    for k in 1..n {
        let k = k as Real;
        let next = ((2.0 * k + 1.0) * x * p - k * p_prev) / (k + 1.0);
        p_prev = p;
        p = next;
    }
    (p, p_prev)
}

/// Nodes and weights of the `n + 1` point Gauss-Lobatto rule, ascending.
pub fn lgl_nodes_weights(n: usize) -> (Vec<Real>, Vec<Real>) {
    if n == 0 {
        return (vec![0.0], vec![2.0]);
    }
    let pi = std::f64::consts::PI as Real;
    let mut x: Vec<Real> = (0..=n)
        .map(|i| -(pi * i as Real / n as Real).cos())
        .collect();

    let np1 = (n + 1) as Real;
    for _ in 0..NEWTON_MAX_ITERS {
        let mut max_step: Real = 0.0;
        for xi in x.iter_mut() {
            let (pn, pn1) = legendre_pair(n, *xi);
            let step = (*xi * pn - pn1) / (np1 * pn);
            *xi -= step;
            max_step = max_step.max(step.abs());
        }
        if max_step <= NEWTON_TOL {
            break;
        }
    }

    // Exact symmetry about zero.
    for i in 0..(n + 1) / 2 {
        let half = 0.5 * (x[n - i] - x[i]);
        x[i] = -half;
        x[n - i] = half;
    }
    if n % 2 == 0 {
        x[n / 2] = 0.0;
    }

    let scale = 2.0 / (n as Real * np1);
    let w = x
        .iter()
        .map(|&xi| {
            let (pn, _) = legendre_pair(n, xi);
            scale / (pn * pn)
        })
        .collect();
    (x, w)
}

/// Barycentric weights `1 / prod_{k != j} (x_j - x_k)`.
pub fn barycentric_weights(x: &[Real]) -> Vec<Real> {
    (0..x.len())
        .map(|j| {
            let prod: Real = (0..x.len())
                .filter(|&k| k != j)
                .map(|k| x[j] - x[k])
                .product();
            1.0 / prod
        })
        .collect()
}

/// Nodal differentiation matrix, row-major: `D[i][j] = l_j'(x_i)`.
pub fn differentiation_matrix(x: &[Real], bary: &[Real]) -> Vec<Real> {
    let m = x.len();
    let mut d = vec![0.0; m * m];
    for i in 0..m {
        let mut diag = 0.0;
        for j in 0..m {
            if i != j {
                let v = (bary[j] / bary[i]) / (x[i] - x[j]);
                d[i * m + j] = v;
                diag -= v;
            }
        }
        d[i * m + i] = diag;
    }
    d
}

/// Lagrange interpolation matrix, row-major with one row per target
/// point: `I[p][j] = l_j(points[p])`.
///
/// A target that coincides with a node gets the exact unit row, so
/// interpolating onto the basis' own nodes is the identity bit for bit.
pub fn interpolation_matrix(x: &[Real], bary: &[Real], points: &[Real]) -> Vec<Real> {
    let m = x.len();
    let mut out = vec![0.0; points.len() * m];
    for (p, &y) in points.iter().enumerate() {
        let row = &mut out[p * m..(p + 1) * m];
        if let Some(hit) = x.iter().position(|&xj| xj == y) {
            row[hit] = 1.0;
            continue;
        }
        let mut denom = 0.0;
        for j in 0..m {
            let t = bary[j] / (y - x[j]);
            row[j] = t;
            denom += t;
        }
        for v in row.iter_mut() {
            *v /= denom;
        }
    }
    out
}

/// Tensor-product LGL basis data for one polynomial order.
#[derive(Clone, Debug, PartialEq)]
pub struct LglBasis {
    order: usize,
    nodes: Vec<Real>,
    weights: Vec<Real>,
    bary: Vec<Real>,
    diff: Vec<Real>,
}

impl LglBasis {
    /// Build the basis of order `order`.
    pub fn new(order: usize) -> Self {
        let (nodes, weights) = lgl_nodes_weights(order);
        let bary = barycentric_weights(&nodes);
        let diff = differentiation_matrix(&nodes, &bary);
        Self {
            order,
            nodes,
            weights,
            bary,
            diff,
        }
    }

    /// Polynomial order `N`.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Nodes per direction, `N + 1`.
    pub fn nq(&self) -> usize {
        self.order + 1
    }

    /// Nodes per element, `(N + 1)^2`.
    pub fn np(&self) -> usize {
        self.nq() * self.nq()
    }

    /// Reference nodes on `[-1, 1]`.
    pub fn nodes(&self) -> &[Real] {
        &self.nodes
    }

    /// Quadrature weights.
    pub fn weights(&self) -> &[Real] {
        &self.weights
    }

    /// Differentiation matrix, row-major `nq x nq`.
    pub fn diff(&self) -> &[Real] {
        &self.diff
    }

    /// Interpolation from this basis' nodes to `points`.
    pub fn interpolation_to(&self, points: &[Real]) -> Vec<Real> {
        interpolation_matrix(&self.nodes, &self.bary, points)
    }

    /// Lift factor for a face of an element whose extent normal to the
    /// face is `h_normal`: the inverse of the lumped mass at a face node
    /// divided by the face quadrature weight, `2 / (h_normal w_0)`.
    pub fn lift(&self, h_normal: Real) -> Real {
        2.0 / (h_normal * self.weights[0])
    }
}

/// Volume node index of tangential position `k` on `face` for order `n`.
///
/// Nodes are numbered `i + j (n + 1)` with `i` along x. Faces are
/// 0 = x-min, 1 = x-max, 2 = y-min, 3 = y-max; positions run along
/// ascending tangential coordinate.
#[inline(always)]
pub fn face_node(n: usize, face: usize, k: usize) -> usize {
    let nq = n + 1;
    match face {
        0 => k * nq,
        1 => n + k * nq,
        2 => k,
        _ => k + n * nq,
    }
}
