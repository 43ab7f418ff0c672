//! The ordered collection of subdomains owned by one process.

use crate::error::DomainError;
use crate::init::FieldInit;
use crate::predicate::TagPredicate;
use crate::snapshot::{Snapshot, SnapshotEntry};
use crate::subdomain::Subdomain;
use indexmap::IndexMap;
use shear_core::{minus, plus, Real, SubdomainId};

/// Subdomains in partition order, addressable by id.
///
/// The order is the order of insertion and is the order every
/// domain-wide operation visits subdomains in. It is deterministic per
/// process but not coordinated across processes.
#[derive(Clone, Debug, Default)]
pub struct Domain {
    subdomains: Vec<Subdomain>,
    index: IndexMap<SubdomainId, usize>,
}

impl Domain {
    /// An empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subdomain. Ids must be unique within the domain.
    pub fn insert(&mut self, sub: Subdomain) -> Result<(), DomainError> {
        if self.index.contains_key(&sub.id()) {
            return Err(DomainError::DuplicateId {
                id: sub.id(),
                name: sub.name().to_owned(),
            });
        }
        self.index.insert(sub.id(), self.subdomains.len());
        self.subdomains.push(sub);
        Ok(())
    }

    /// Number of subdomains.
    pub fn len(&self) -> usize {
        self.subdomains.len()
    }

    /// Whether the domain holds no subdomains.
    pub fn is_empty(&self) -> bool {
        self.subdomains.is_empty()
    }

    /// Subdomains in partition order.
    pub fn subdomains(&self) -> &[Subdomain] {
        &self.subdomains
    }

    /// Mutable subdomains in partition order.
    pub fn subdomains_mut(&mut self) -> &mut [Subdomain] {
        &mut self.subdomains
    }

    /// Position of `id` in partition order.
    pub fn index_of(&self, id: SubdomainId) -> Result<usize, DomainError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(DomainError::UnknownSubdomain(id))
    }

    /// Look up by id.
    pub fn get(&self, id: SubdomainId) -> Result<&Subdomain, DomainError> {
        let i = self.index_of(id)?;
        Ok(&self.subdomains[i])
    }

    /// Look up by id, mutably.
    pub fn get_mut(&mut self, id: SubdomainId) -> Result<&mut Subdomain, DomainError> {
        let i = self.index_of(id)?;
        Ok(&mut self.subdomains[i])
    }

    /// Borrow two distinct subdomains by position, the first shared and
    /// the second exclusive. Returns `None` if `a == b` or either is out
    /// of range.
    pub fn split_pair(&mut self, a: usize, b: usize) -> Option<(&Subdomain, &mut Subdomain)> {
        if a == b || a >= self.subdomains.len() || b >= self.subdomains.len() {
            return None;
        }
        if a < b {
            let (lo, hi) = self.subdomains.split_at_mut(b);
            Some((&lo[a], &mut hi[0]))
        } else {
            let (lo, hi) = self.subdomains.split_at_mut(a);
            Some((&hi[0], &mut lo[b]))
        }
    }

    /// Subdomains matching `pred`, in partition order.
    pub fn select<'a>(&'a self, pred: &'a TagPredicate) -> impl Iterator<Item = &'a Subdomain> {
        self.subdomains.iter().filter(move |s| pred.matches(s.tags()))
    }

    /// Declare a zero-filled field on every subdomain matching `pred`.
    ///
    /// Stops at the first failure; subdomains visited before it keep the
    /// new field.
    pub fn add_field_where(&mut self, pred: &TagPredicate, name: &str) -> Result<(), DomainError> {
        let mut count = 0usize;
        for sub in self.subdomains.iter_mut().filter(|s| pred.matches(s.tags())) {
            sub.add_field(name)?;
            count += 1;
        }
        tracing::trace!(field = name, subdomains = count, "field declared");
        Ok(())
    }

    /// Initialize `name` on every subdomain matching `pred`.
    pub fn init_field_where(
        &mut self,
        pred: &TagPredicate,
        name: &str,
        time: Real,
        init: &dyn FieldInit,
    ) -> Result<(), DomainError> {
        for sub in self.subdomains.iter_mut().filter(|s| pred.matches(s.tags())) {
            sub.init_field(name, time, init)?;
        }
        Ok(())
    }

    /// Declare the owner-side trace of `name` on every matching subdomain.
    pub fn add_minus_field_where(
        &mut self,
        pred: &TagPredicate,
        name: &str,
    ) -> Result<(), DomainError> {
        self.add_field_where(pred, &minus(name))
    }

    /// Declare the neighbor-side trace of `name` on every matching
    /// subdomain. Only the exchange ever writes these.
    pub fn add_plus_field_where(
        &mut self,
        pred: &TagPredicate,
        name: &str,
    ) -> Result<(), DomainError> {
        self.add_field_where(pred, &plus(name))
    }

    /// Borrow `fields` of every subdomain matching `pred`.
    ///
    /// Fields a matching subdomain does not carry are left out of the
    /// view rather than reported.
    pub fn snapshot<'a>(&'a self, pred: &TagPredicate, fields: &[&'a str]) -> Snapshot<'a> {
        let mut entries = Vec::new();
        for sub in self.subdomains.iter().filter(|s| pred.matches(s.tags())) {
            for &field in fields {
                if let Ok(data) = sub.field(field) {
                    entries.push(SnapshotEntry {
                        subdomain: sub.id(),
                        name: sub.name(),
                        field,
                        data,
                    });
                }
            }
        }
        Snapshot::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::init::ConstantFill;
    use shear_core::{FieldError, GlueKind, Role, TagSet, GRID_X, GRID_Y, GRID_Z};

    fn make(id: u32, role: Role, n: usize) -> Subdomain {
        let mut s = Subdomain::new(
            SubdomainId(id),
            format!("s{id}"),
            TagSet::for_role(role),
            1,
            n,
            Geometry::Detached,
        );
        for g in [GRID_X, GRID_Y, GRID_Z] {
            s.add_field(g).unwrap();
        }
        s
    }

    fn domain() -> Domain {
        let mut d = Domain::new();
        d.insert(make(0, Role::Volume, 4)).unwrap();
        d.insert(make(1, Role::Volume, 4)).unwrap();
        d.insert(make(2, Role::Glue(GlueKind::Boundary), 2)).unwrap();
        d.insert(make(3, Role::Glue(GlueKind::Local), 2)).unwrap();
        d
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut d = domain();
        let err = d.insert(make(1, Role::Volume, 1)).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateId { id: SubdomainId(1), .. }));
        assert_eq!(d.len(), 4);
    }

    #[test]
    fn add_and_init_only_touch_selected() {
        let mut d = domain();
        let vol = TagPredicate::any_of(&["volume"]);
        d.add_field_where(&vol, "rho").unwrap();
        d.init_field_where(&vol, "rho", 0.0, &ConstantFill(3.0)).unwrap();
        assert_eq!(d.get(SubdomainId(1)).unwrap().field("rho").unwrap(), &[3.0; 4]);
        assert!(!d.get(SubdomainId(2)).unwrap().has_field("rho"));
    }

    #[test]
    fn minus_and_plus_fields() {
        let mut d = domain();
        let glue = TagPredicate::any_of(&["glue-local", "glue-parallel"]);
        d.add_minus_field_where(&glue, "v1").unwrap();
        d.add_plus_field_where(&glue, "v1").unwrap();
        let g = d.get(SubdomainId(3)).unwrap();
        assert!(g.has_field("_minus_v1"));
        assert!(g.has_field("_plus_v1"));
        assert!(!d.get(SubdomainId(2)).unwrap().has_field("_minus_v1"));
    }

    #[test]
    fn add_field_where_reports_existing() {
        let mut d = domain();
        let all = TagPredicate::everything();
        d.add_field_where(&all, "x").unwrap();
        let err = d.add_field_where(&all, "x").unwrap_err();
        assert!(matches!(err, DomainError::Field(FieldError::Exists { .. })));
    }

    #[test]
    fn split_pair_both_directions() {
        let mut d = domain();
        d.add_field_where(&TagPredicate::everything(), "f").unwrap();
        {
            let (src, dst) = d.split_pair(3, 0).unwrap();
            assert_eq!(src.id(), SubdomainId(3));
            dst.field_mut("f").unwrap()[0] = 1.0;
        }
        let (src, _) = d.split_pair(0, 3).unwrap();
        assert_eq!(src.field("f").unwrap()[0], 1.0);
        assert!(d.split_pair(1, 1).is_none());
        assert!(d.split_pair(0, 9).is_none());
    }

    #[test]
    fn snapshot_skips_missing_fields() {
        let mut d = domain();
        let vol = TagPredicate::any_of(&["volume"]);
        d.add_field_where(&vol, "v1").unwrap();
        let snap = d.snapshot(&TagPredicate::everything(), &["v1"]);
        assert_eq!(snap.len(), 2);
        assert!(snap.iter().all(|e| e.field == "v1"));
    }
}
