//! Low-storage Runge-Kutta coefficient tables.
//!
//! A 2N-storage scheme keeps one rate register `k` next to the state
//! `q`. Stage `i` evaluates
//!
//! ```text
//! k <- A_i k + RHS(q, t + c_i dt)
//! q <- q + B_i dt k
//! ```
//!
//! Every method here has `A_0 = 0`, so nothing from the previous step
//! survives into the first stage.

use std::fmt;

use shear_core::Real;

/// The built-in methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LsrkMethod {
    /// Kennedy-Carpenter five-stage fourth order.
    #[default]
    Kc54,
    /// Forward Euler.
    ForwardEuler,
    /// Heun's second-order method.
    Heun,
    /// Williamson three-stage third order.
    Williamson33,
}

impl LsrkMethod {
    /// Every method.
    pub const ALL: [LsrkMethod; 4] = [
        LsrkMethod::Kc54,
        LsrkMethod::ForwardEuler,
        LsrkMethod::Heun,
        LsrkMethod::Williamson33,
    ];

    /// Parse a preference name (`KC54`, `FE`, `HEUN`, `W33`),
    /// ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// Preference name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Kc54 => "KC54",
            Self::ForwardEuler => "FE",
            Self::Heun => "HEUN",
            Self::Williamson33 => "W33",
        }
    }

    /// Formal order of accuracy.
    pub fn order(self) -> u32 {
        match self {
            Self::Kc54 => 4,
            Self::ForwardEuler => 1,
            Self::Heun => 2,
            Self::Williamson33 => 3,
        }
    }

    /// Coefficient table.
    pub fn tableau(self) -> Tableau {
        let (a, b): (&[Real], &[Real]) = match self {
            Self::Kc54 => (&KC54_A, &KC54_B),
            Self::ForwardEuler => (&[0.0], &[1.0]),
            Self::Heun => (&[0.0, -1.0], &[1.0, 0.5]),
            Self::Williamson33 => (
                &[0.0, -5.0 / 9.0, -153.0 / 128.0],
                &[1.0 / 3.0, 15.0 / 16.0, 8.0 / 15.0],
            ),
        };
        Tableau::from_parts(a.to_vec(), b.to_vec())
    }
}

impl fmt::Display for LsrkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const KC54_A: [Real; 5] = [
    0.0,
    -567_301_805_773.0 / 1_357_537_059_087.0,
    -2_404_267_990_393.0 / 2_016_746_695_238.0,
    -3_550_918_686_646.0 / 2_091_501_179_385.0,
    -1_275_806_237_668.0 / 842_570_457_699.0,
];

const KC54_B: [Real; 5] = [
    1_432_997_174_477.0 / 9_575_080_441_755.0,
    5_161_836_677_717.0 / 13_612_068_292_357.0,
    1_720_146_321_549.0 / 2_090_206_949_498.0,
    3_134_564_353_537.0 / 4_481_467_310_338.0,
    2_277_821_191_437.0 / 14_882_151_754_819.0,
];

/// `A`, `B`, and stage abscissae `c` of a 2N-storage scheme.
#[derive(Clone, Debug, PartialEq)]
pub struct Tableau {
    a: Vec<Real>,
    b: Vec<Real>,
    c: Vec<Real>,
}

impl Tableau {
    /// Build a tableau from `A` and `B`, deriving `c`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the tables are empty, differ in length, or
    /// `A_0 != 0`.
    pub fn new(a: Vec<Real>, b: Vec<Real>) -> Result<Self, String> {
        if a.is_empty() || a.len() != b.len() {
            return Err(format!(
                "A and B must be non-empty and of equal length, got {} and {}",
                a.len(),
                b.len()
            ));
        }
        if a[0] != 0.0 {
            return Err(format!("A_0 must be 0, got {}", a[0]));
        }
        Ok(Self::from_parts(a, b))
    }

    fn from_parts(a: Vec<Real>, b: Vec<Real>) -> Self {
        // `r` is the multiple of dt the rate register carries into `q`
        // for a linear-in-time right-hand side.
        let mut c = Vec::with_capacity(a.len());
        let mut ci = 0.0;
        let mut r = 0.0;
        for (ai, bi) in a.iter().zip(&b) {
            c.push(ci);
            r = ai * r + 1.0;
            ci += bi * r;
        }
        Self { a, b, c }
    }

    /// Number of stages.
    pub fn stages(&self) -> usize {
        self.a.len()
    }

    /// `A` coefficients.
    pub fn a(&self) -> &[Real] {
        &self.a
    }

    /// `B` coefficients.
    pub fn b(&self) -> &[Real] {
        &self.b
    }

    /// Stage abscissae.
    pub fn c(&self) -> &[Real] {
        &self.c
    }
}
