//! A tagged container of per-node field arrays.

use crate::geometry::Geometry;
use crate::init::{FieldInit, InitContext};
use indexmap::IndexMap;
use shear_core::{FieldError, Real, Role, RoleError, SubdomainId, TagSet, GRID_X, GRID_Y, GRID_Z};

/// A tagged region of the mesh owning its own field arrays.
///
/// Every field has exactly `num_nodes` values, in the node order
/// described by the geometry payload. Fields keep insertion order, so
/// iteration over them is deterministic.
#[derive(Clone, Debug)]
pub struct Subdomain {
    id: SubdomainId,
    name: String,
    tags: TagSet,
    order: usize,
    num_nodes: usize,
    geometry: Geometry,
    fields: IndexMap<String, Vec<Real>>,
}

impl Subdomain {
    /// Create a subdomain with no fields.
    pub fn new(
        id: SubdomainId,
        name: impl Into<String>,
        tags: TagSet,
        order: usize,
        num_nodes: usize,
        geometry: Geometry,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            tags,
            order,
            num_nodes,
            geometry,
            fields: IndexMap::new(),
        }
    }

    /// Locally unique id.
    pub fn id(&self) -> SubdomainId {
        self.id
    }

    /// Human-readable name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag set.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Whether `tag` is present.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Role resolved from the tag set.
    pub fn role(&self) -> Result<Role, RoleError> {
        self.tags.role()
    }

    /// Polynomial order.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Length of every field array.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Geometry payload.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Whether a field exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn missing(&self, name: &str) -> FieldError {
        FieldError::Missing {
            subdomain: self.name.clone(),
            field: name.to_owned(),
        }
    }

    /// Declare a zero-filled field.
    pub fn add_field(&mut self, name: &str) -> Result<(), FieldError> {
        if self.fields.contains_key(name) {
            return Err(FieldError::Exists {
                subdomain: self.name.clone(),
                field: name.to_owned(),
            });
        }
        self.fields.insert(name.to_owned(), vec![0.0; self.num_nodes]);
        Ok(())
    }

    /// Declare a field holding `values`.
    pub fn add_field_with(&mut self, name: &str, values: Vec<Real>) -> Result<(), FieldError> {
        if values.len() != self.num_nodes {
            return Err(FieldError::LengthMismatch {
                subdomain: self.name.clone(),
                field: name.to_owned(),
                expected: self.num_nodes,
                actual: values.len(),
            });
        }
        self.add_field(name)?;
        self.fields.insert(name.to_owned(), values);
        Ok(())
    }

    /// Read a field.
    pub fn field(&self, name: &str) -> Result<&[Real], FieldError> {
        self.fields
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| self.missing(name))
    }

    /// Write a field.
    pub fn field_mut(&mut self, name: &str) -> Result<&mut [Real], FieldError> {
        if !self.fields.contains_key(name) {
            return Err(self.missing(name));
        }
        Ok(self
            .fields
            .get_mut(name)
            .map(Vec::as_mut_slice)
            .unwrap_or_default())
    }

    /// Move a group of distinct fields out for simultaneous mutation.
    ///
    /// The slots are left empty until [`Subdomain::restore_fields`] puts
    /// the buffers back; callers must restore on every path, including
    /// errors. Fails without taking anything if a name is missing.
    pub fn take_fields<const K: usize>(
        &mut self,
        names: [&str; K],
    ) -> Result<[Vec<Real>; K], FieldError> {
        if let Some(name) = names.iter().find(|n| !self.fields.contains_key(**n)) {
            return Err(self.missing(name));
        }
        Ok(names.map(|n| {
            self.fields
                .get_mut(n)
                .map(std::mem::take)
                .unwrap_or_default()
        }))
    }

    /// Return buffers taken by [`Subdomain::take_fields`].
    pub fn restore_fields<const K: usize>(&mut self, names: [&str; K], bufs: [Vec<Real>; K]) {
        for (name, buf) in names.into_iter().zip(bufs) {
            if let Some(slot) = self.fields.get_mut(name) {
                *slot = buf;
            }
        }
    }

    /// Fill `name` by evaluating `init` at the node coordinates.
    ///
    /// Requires the `_grid_x`, `_grid_y`, `_grid_z` fields.
    pub fn init_field(
        &mut self,
        name: &str,
        time: Real,
        init: &dyn FieldInit,
    ) -> Result<(), FieldError> {
        let [mut out] = self.take_fields([name])?;
        let result = self.fill_from_grid(name, time, init, &mut out);
        self.restore_fields([name], [out]);
        result
    }

    fn fill_from_grid(
        &self,
        name: &str,
        time: Real,
        init: &dyn FieldInit,
        out: &mut [Real],
    ) -> Result<(), FieldError> {
        // Grid fields themselves cannot be their own input.
        if name == GRID_X || name == GRID_Y || name == GRID_Z {
            return Err(FieldError::Init {
                field: name.to_owned(),
                reason: "node coordinates are fixed at setup".to_owned(),
            });
        }
        let ctx = InitContext {
            field: name,
            subdomain: &self.name,
            time,
            x: self.field(GRID_X)?,
            y: self.field(GRID_Y)?,
            z: self.field(GRID_Z)?,
        };
        init.fill(&ctx, out)
    }
}
