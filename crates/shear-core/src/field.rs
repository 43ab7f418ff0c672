//! Names of the elastic state, material, coordinate, and trace fields.
//!
//! Every array a subdomain carries is addressed by name. The nine state
//! unknowns have fixed names; auxiliary copies (rates, alternative states)
//! are the same names behind a prefix, and glue subdomains hold the owner
//! side and neighbor side of a trace behind [`minus`] and [`plus`].

use std::ops::Index;

/// Number of scalar unknowns of the elastic system.
pub const NUM_FIELDS: usize = 9;

/// The state unknowns: three velocity components followed by the six
/// independent stress components.
pub const STATE_FIELDS: [&str; NUM_FIELDS] = [
    "v1", "v2", "v3", "S11", "S22", "S33", "S12", "S13", "S23",
];

/// Per-node material coefficients stored on volume subdomains.
pub const MATERIAL_FIELDS: [&str; 6] = ["rho", "rho_inv", "lam", "mu", "Zs", "Zp"];

/// Material fields whose traces are exchanged across glue at setup.
pub const TRACE_MATERIAL_FIELDS: [&str; 2] = ["Zs", "Zp"];

/// Node x-coordinate field.
pub const GRID_X: &str = "_grid_x";
/// Node y-coordinate field.
pub const GRID_Y: &str = "_grid_y";
/// Node z-coordinate field (zero in two-dimensional geometry).
pub const GRID_Z: &str = "_grid_z";

const MINUS_PREFIX: &str = "_minus_";
const PLUS_PREFIX: &str = "_plus_";

/// `prefix` followed by `field`.
pub fn prefixed(prefix: &str, field: &str) -> String {
    let mut s = String::with_capacity(prefix.len() + field.len());
    s.push_str(prefix);
    s.push_str(field);
    s
}

/// Name of the owner-side trace of `field` on a glue subdomain.
pub fn minus(field: &str) -> String {
    prefixed(MINUS_PREFIX, field)
}

/// Name of the neighbor-side trace of `field` on a glue subdomain.
pub fn plus(field: &str) -> String {
    prefixed(PLUS_PREFIX, field)
}

/// The nine state field names under one prefix, in [`STATE_FIELDS`] order.
///
/// Built once per operation so kernels index names by component instead
/// of formatting strings in loops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixedNames {
    names: [String; NUM_FIELDS],
}

impl PrefixedNames {
    /// Prefix every state field with `prefix`. An empty prefix yields the
    /// bare state names.
    pub fn new(prefix: &str) -> Self {
        Self {
            names: STATE_FIELDS.map(|f| prefixed(prefix, f)),
        }
    }

    /// Iterate in component order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Borrow all names.
    pub fn as_array(&self) -> &[String; NUM_FIELDS] {
        &self.names
    }
}

impl Index<usize> for PrefixedNames {
    type Output = str;

    fn index(&self, component: usize) -> &str {
        &self.names[component]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_names() {
        assert_eq!(minus("v1"), "_minus_v1");
        assert_eq!(plus("Zs"), "_plus_Zs");
    }

    #[test]
    fn empty_prefix_is_state() {
        let names = PrefixedNames::new("");
        assert!(names.iter().eq(STATE_FIELDS.iter().copied()));
    }

    #[test]
    fn prefixed_names_keep_component_order() {
        let names = PrefixedNames::new("_lsrk_rate_");
        assert_eq!(&names[0], "_lsrk_rate_v1");
        assert_eq!(&names[8], "_lsrk_rate_S23");
    }

    #[test]
    fn state_material_and_grid_names_are_disjoint() {
        for s in STATE_FIELDS {
            assert!(!MATERIAL_FIELDS.contains(&s));
            assert_ne!(s, GRID_X);
        }
        for m in TRACE_MATERIAL_FIELDS {
            assert!(MATERIAL_FIELDS.contains(&m));
        }
    }
}
