//! Read-only borrowed views of field data for external output.

use shear_core::{Real, SubdomainId};

/// One field of one subdomain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapshotEntry<'a> {
    /// Subdomain id.
    pub subdomain: SubdomainId,
    /// Subdomain name.
    pub name: &'a str,
    /// Field name.
    pub field: &'a str,
    /// Node values.
    pub data: &'a [Real],
}

/// A read-only view of selected fields across selected subdomains.
///
/// Borrows from the [`crate::Domain`] it was taken from; the domain
/// cannot be stepped while a snapshot is alive. Entries are ordered by
/// subdomain (partition order) and then by the requested field order.
#[derive(Clone, Debug, Default)]
pub struct Snapshot<'a> {
    entries: Vec<SnapshotEntry<'a>>,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(entries: Vec<SnapshotEntry<'a>>) -> Self {
        Self { entries }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &SnapshotEntry<'a>> {
        self.entries.iter()
    }

    /// Data of `field` on subdomain `id`.
    pub fn get(&self, id: SubdomainId, field: &str) -> Option<&'a [Real]> {
        self.entries
            .iter()
            .find(|e| e.subdomain == id && e.field == field)
            .map(|e| e.data)
    }

    /// Largest absolute value of `field` across the view.
    pub fn max_abs(&self, field: &str) -> Real {
        self.entries
            .iter()
            .filter(|e| e.field == field)
            .flat_map(|e| e.data.iter())
            .fold(0.0, |m: Real, v| m.max(v.abs()))
    }
}
