//! Role resolution and geometry checks shared by protocol implementations.

use crate::error::{Operation, RateError};
use shear_core::{GlueKind, Role};
use shear_domain::{Geometry, GlueGeometry, Subdomain, VolumeGeometry};

fn geometry_name(g: &Geometry) -> &'static str {
    match g {
        Geometry::Volume(_) => "an element block",
        Geometry::Glue(glue) => match glue.kind() {
            GlueKind::Local => "local glue faces",
            GlueKind::Parallel => "parallel glue faces",
            GlueKind::Boundary => "boundary glue faces",
        },
        Geometry::Detached => "detached",
    }
}

/// Resolve the role of `sub`, attributing failure to `op`.
pub fn role_of(sub: &Subdomain, op: Operation) -> Result<Role, RateError> {
    sub.role().map_err(|source| RateError::UnknownRole {
        subdomain: sub.name().to_owned(),
        operation: op,
        source,
    })
}

/// The element block of a volume subdomain.
pub fn expect_volume(sub: &Subdomain, op: Operation) -> Result<&VolumeGeometry, RateError> {
    sub.geometry()
        .as_volume()
        .ok_or_else(|| RateError::RoleMismatch {
            subdomain: sub.name().to_owned(),
            operation: op,
            role: Role::Volume,
            geometry: geometry_name(sub.geometry()),
        })
}

/// The face list of a glue subdomain whose partner is of `kind`.
pub fn expect_glue(
    sub: &Subdomain,
    kind: GlueKind,
    op: Operation,
) -> Result<&GlueGeometry, RateError> {
    match sub.geometry().as_glue() {
        Some(glue) if glue.kind() == kind => Ok(glue),
        _ => Err(RateError::RoleMismatch {
            subdomain: sub.name().to_owned(),
            operation: op,
            role: Role::Glue(kind),
            geometry: geometry_name(sub.geometry()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shear_core::{RoleError, SubdomainId, TagSet};
    use shear_domain::GluePartner;

    fn sub(tags: &[&str], geometry: Geometry) -> Subdomain {
        Subdomain::new(
            SubdomainId(7),
            "s7",
            tags.iter().copied().collect::<TagSet>(),
            1,
            0,
            geometry,
        )
    }

    #[test]
    fn unknown_role_names_subdomain_and_operation() {
        let s = sub(&["mystery"], Geometry::Detached);
        let err = role_of(&s, Operation::ScaleRates).unwrap_err();
        assert_eq!(err.subdomain(), "s7");
        assert_eq!(err.operation(), Operation::ScaleRates);
        assert!(matches!(
            err,
            RateError::UnknownRole {
                source: RoleError::Unrecognized { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("scale_rates"));
    }

    #[test]
    fn volume_tag_on_glue_geometry_mismatches() {
        let glue = GlueGeometry {
            owner: SubdomainId(0),
            owner_order: 1,
            neighbor_order: 1,
            partner: GluePartner::Boundary,
            faces: vec![],
        };
        let s = sub(&["volume"], Geometry::Glue(glue));
        assert!(matches!(
            expect_volume(&s, Operation::IntraRhs),
            Err(RateError::RoleMismatch { role: Role::Volume, .. })
        ));
        assert!(expect_glue(&s, GlueKind::Boundary, Operation::InterRhs).is_ok());
        assert!(expect_glue(&s, GlueKind::Local, Operation::InterRhs).is_err());
    }
}
