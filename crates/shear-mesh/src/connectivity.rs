//! Macro-mesh topology: which element faces lie on the domain exterior.

use std::fmt;

/// Topology of the unit-square macro mesh.
///
/// `UnitSquare` leaves every outer face on the boundary; `Periodic`
/// wraps both axes so the mesh is a torus with no boundary at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Connectivity {
    /// Bounded unit square.
    #[default]
    UnitSquare,
    /// Unit square with both axes wrapped.
    Periodic,
}

impl Connectivity {
    /// Look up a connectivity by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unitsquare" => Some(Self::UnitSquare),
            "periodic" => Some(Self::Periodic),
            _ => None,
        }
    }

    /// The configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Self::UnitSquare => "unitsquare",
            Self::Periodic => "periodic",
        }
    }

    /// Resolve a neighbor index along one axis of length `len`.
    ///
    /// Returns `None` when the index leaves a bounded axis.
    pub(crate) fn resolve_axis(self, val: i64, len: u32) -> Option<u32> {
        let n = i64::from(len);
        if (0..n).contains(&val) {
            return Some(val as u32);
        }
        match self {
            Self::UnitSquare => None,
            Self::Periodic => Some(val.rem_euclid(n) as u32),
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for c in [Connectivity::UnitSquare, Connectivity::Periodic] {
            assert_eq!(Connectivity::from_name(c.name()), Some(c));
        }
        assert_eq!(Connectivity::from_name("brick"), None);
    }

    #[test]
    fn periodic_wraps_bounded_absorbs() {
        assert_eq!(Connectivity::Periodic.resolve_axis(-1, 4), Some(3));
        assert_eq!(Connectivity::Periodic.resolve_axis(4, 4), Some(0));
        assert_eq!(Connectivity::UnitSquare.resolve_axis(-1, 4), None);
        assert_eq!(Connectivity::UnitSquare.resolve_axis(2, 4), Some(2));
    }
}
