//! [`ElasticRates`]: the rate-accumulation protocol for the elastic
//! system.
//!
//! | operation | volume | glue-boundary | glue-local / glue-parallel |
//! |-----------|--------|---------------|----------------------------|
//! | `allocate_rate_storage` | nine zeroed rates | no-op | no-op |
//! | `scale_rates` | `rate *= a` | no-op | no-op |
//! | `intra_rhs` | derivatives + interior faces | no-op | skipped |
//! | `inter_rhs` | no-op | reflection flux into owner | coupling flux if enabled |
//! | `add_rates` | `lhs = rhs + a rate` | no-op | no-op |

use crate::basis::LglBasis;
use crate::elastic::{self, BoundaryView, GlueView, MaterialView, VolumeView};
use crate::registry::KernelRegistry;
use indexmap::IndexMap;
use shear_core::{
    minus, plus, prefixed, GlueKind, PrefixedNames, Real, Role, NUM_FIELDS, STATE_FIELDS,
};
use shear_domain::{Domain, DomainError, GlueGeometry, Subdomain, VolumeGeometry};
use shear_protocol::{expect_glue, expect_volume, role_of, Operation, RateAccumulation, RateError};
use std::borrow::Cow;

/// Upwind nodal DG spatial operator for isotropic elastodynamics.
///
/// Constructed via the builder pattern: [`ElasticRates::builder`].
#[derive(Debug)]
pub struct ElasticRates {
    reflection: Real,
    coupling: bool,
    registry: KernelRegistry,
    bases: IndexMap<usize, LglBasis>,
    interps: IndexMap<(usize, usize), Vec<Real>>,
}

/// Builder for [`ElasticRates`].
pub struct ElasticRatesBuilder {
    reflection: Real,
    coupling: bool,
    orders: Vec<usize>,
}

impl ElasticRatesBuilder {
    /// Boundary reflection coefficient in `[-1, 1]` (default `-1`,
    /// traction free).
    pub fn boundary_reflection(mut self, r: Real) -> Self {
        self.reflection = r;
        self
    }

    /// Whether local and parallel glue contribute the coupling flux in
    /// `inter_rhs` (default `false`).
    pub fn glue_coupling(mut self, on: bool) -> Self {
        self.coupling = on;
        self
    }

    /// Orders whose bases and cross-order interpolation are precomputed.
    /// Other orders still work; their data is built per call.
    pub fn orders(mut self, orders: &[usize]) -> Self {
        self.orders.extend_from_slice(orders);
        self
    }

    /// Build the protocol, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the reflection coefficient is outside `[-1, 1]`
    /// or NaN, or if any order is zero.
    pub fn build(mut self) -> Result<ElasticRates, String> {
        if !(-1.0..=1.0).contains(&self.reflection) {
            return Err(format!(
                "boundary_reflection must be in [-1, 1], got {}",
                self.reflection
            ));
        }
        if self.orders.contains(&0) {
            return Err("orders must be at least 1".to_string());
        }
        self.orders.sort_unstable();
        self.orders.dedup();

        let registry = KernelRegistry::new();
        let mut bases = IndexMap::new();
        for &n in &self.orders {
            bases.insert(n, LglBasis::new(n));
            tracing::debug!(order = n, specialized = registry.is_specialized(n), "basis built");
        }
        let mut interps = IndexMap::new();
        for (&a, ba) in &bases {
            for (&b, bb) in &bases {
                if a <= b {
                    interps.insert((a, b), ba.interpolation_to(bb.nodes()));
                }
            }
        }
        tracing::info!(
            orders = ?self.orders,
            boundary_reflection = self.reflection,
            glue_coupling = self.coupling,
            "elastic rates prepared"
        );
        Ok(ElasticRates {
            reflection: self.reflection,
            coupling: self.coupling,
            registry,
            bases,
            interps,
        })
    }
}

fn names_of(p: &PrefixedNames) -> [&str; NUM_FIELDS] {
    std::array::from_fn(|c| &p[c])
}

fn read_fields<'a, const K: usize>(
    sub: &'a Subdomain,
    names: [&str; K],
    op: Operation,
) -> Result<[&'a [Real]; K], RateError> {
    let got = names.map(|n| sub.field(n));
    for (name, r) in names.iter().zip(&got) {
        match r {
            Err(e) => return Err(RateError::field(sub.name(), op, e.clone())),
            Ok(data) if data.len() != sub.num_nodes() => {
                return Err(RateError::field(
                    sub.name(),
                    op,
                    shear_core::FieldError::LengthMismatch {
                        subdomain: sub.name().to_owned(),
                        field: (*name).to_owned(),
                        expected: sub.num_nodes(),
                        actual: data.len(),
                    },
                ))
            }
            Ok(_) => {}
        }
    }
    Ok(got.map(|r| r.unwrap_or_default()))
}

fn material_of(sub: &Subdomain, op: Operation) -> Result<MaterialView<'_>, RateError> {
    let [rho_inv, lam, mu, zs, zp] = read_fields(sub, ["rho_inv", "lam", "mu", "Zs", "Zp"], op)?;
    Ok(MaterialView {
        rho_inv,
        lam,
        mu,
        zs,
        zp,
    })
}

fn check_volume_nodes(
    sub: &Subdomain,
    geom: &VolumeGeometry,
    basis: &LglBasis,
    op: Operation,
) -> Result<(), RateError> {
    if geom.elements.len() * basis.np() != sub.num_nodes() {
        return Err(RateError::RoleMismatch {
            subdomain: sub.name().to_owned(),
            operation: op,
            role: Role::Volume,
            geometry: "an element block inconsistent with the node count",
        });
    }
    Ok(())
}

fn check_glue_nodes(sub: &Subdomain, glue: &GlueGeometry, op: Operation) -> Result<(), RateError> {
    if glue.faces.len() * (sub.order() + 1) != sub.num_nodes() {
        return Err(RateError::RoleMismatch {
            subdomain: sub.name().to_owned(),
            operation: op,
            role: Role::Glue(glue.kind()),
            geometry: "glue faces inconsistent with the node count",
        });
    }
    Ok(())
}

fn no_such_index(index: usize, op: Operation) -> RateError {
    RateError::domain(&format!("#{index}"), op, DomainError::NoSuchIndex(index))
}

impl ElasticRates {
    /// Create a new builder.
    pub fn builder() -> ElasticRatesBuilder {
        ElasticRatesBuilder {
            reflection: -1.0,
            coupling: false,
            orders: Vec::new(),
        }
    }

    /// Boundary reflection coefficient.
    pub fn boundary_reflection(&self) -> Real {
        self.reflection
    }

    /// Whether local and parallel glue couple in `inter_rhs`.
    pub fn glue_coupling(&self) -> bool {
        self.coupling
    }

    /// Kernel registry in use.
    pub fn registry(&self) -> &KernelRegistry {
        &self.registry
    }

    /// Basis of `order`, cached when precomputed.
    pub fn basis(&self, order: usize) -> Cow<'_, LglBasis> {
        match self.bases.get(&order) {
            Some(b) => Cow::Borrowed(b),
            None => Cow::Owned(LglBasis::new(order)),
        }
    }

    /// Interpolation from order `from` nodes to order `to` nodes.
    pub fn interpolation(&self, from: usize, to: usize) -> Cow<'_, [Real]> {
        match self.interps.get(&(from, to)) {
            Some(m) => Cow::Borrowed(m.as_slice()),
            None => Cow::Owned(self.basis(from).interpolation_to(self.basis(to).nodes())),
        }
    }

    /// Locate the owner volume of the glue at `index`.
    fn owner_index(
        &self,
        domain: &Domain,
        index: usize,
        kind: GlueKind,
        op: Operation,
    ) -> Result<usize, RateError> {
        let sub = domain
            .subdomains()
            .get(index)
            .ok_or_else(|| no_such_index(index, op))?;
        let glue = expect_glue(sub, kind, op)?;
        check_glue_nodes(sub, glue, op)?;
        domain
            .index_of(glue.owner)
            .map_err(|e| RateError::domain(sub.name(), op, e))
    }

    fn volume_intra(
        &self,
        sub: &mut Subdomain,
        rate_prefix: &str,
        field_prefix: &str,
    ) -> Result<(), RateError> {
        let op = Operation::IntraRhs;
        expect_volume(sub, op)?;
        let rate_names = PrefixedNames::new(rate_prefix);
        let rn = names_of(&rate_names);
        let label = sub.name().to_owned();
        let mut rates = sub
            .take_fields(rn)
            .map_err(|e| RateError::field(&label, op, e))?;
        let result = self.volume_intra_into(sub, field_prefix, &mut rates);
        sub.restore_fields(rn, rates);
        result
    }

    fn volume_intra_into(
        &self,
        sub: &Subdomain,
        field_prefix: &str,
        rates: &mut [Vec<Real>; NUM_FIELDS],
    ) -> Result<(), RateError> {
        let op = Operation::IntraRhs;
        let geom = expect_volume(sub, op)?;
        let basis = self.basis(sub.order());
        check_volume_nodes(sub, geom, &basis, op)?;
        let state_names = PrefixedNames::new(field_prefix);
        let view = VolumeView {
            basis: &basis,
            elements: &geom.elements,
            interior_faces: &geom.interior_faces,
            state: read_fields(sub, names_of(&state_names), op)?,
            material: material_of(sub, op)?,
        };
        let mut r = rates.each_mut().map(|v| v.as_mut_slice());
        (self.registry.intra(sub.order()))(&view, &mut r);
        Ok(())
    }

    fn boundary_inter(
        &self,
        domain: &mut Domain,
        index: usize,
        rate_prefix: &str,
        field_prefix: &str,
    ) -> Result<(), RateError> {
        let op = Operation::InterRhs;
        let owner_idx = self.owner_index(domain, index, GlueKind::Boundary, op)?;
        let (glue_sub, owner) = domain
            .split_pair(index, owner_idx)
            .ok_or_else(|| no_such_index(owner_idx, op))?;
        let glue = expect_glue(glue_sub, GlueKind::Boundary, op)?;
        expect_volume(owner, op)?;

        let rate_names = PrefixedNames::new(rate_prefix);
        let rn = names_of(&rate_names);
        let label = owner.name().to_owned();
        let mut rates = owner
            .take_fields(rn)
            .map_err(|e| RateError::field(&label, op, e))?;
        let result = self.boundary_into(glue, owner, field_prefix, &mut rates);
        owner.restore_fields(rn, rates);
        result
    }

    fn boundary_into(
        &self,
        glue: &GlueGeometry,
        owner: &Subdomain,
        field_prefix: &str,
        rates: &mut [Vec<Real>; NUM_FIELDS],
    ) -> Result<(), RateError> {
        let op = Operation::InterRhs;
        let geom = expect_volume(owner, op)?;
        let basis = self.basis(owner.order());
        check_volume_nodes(owner, geom, &basis, op)?;
        let state_names = PrefixedNames::new(field_prefix);
        let view = BoundaryView {
            basis: &basis,
            elements: &geom.elements,
            faces: &glue.faces,
            state: read_fields(owner, names_of(&state_names), op)?,
            material: material_of(owner, op)?,
            reflection: self.reflection,
        };
        let mut r = rates.each_mut().map(|v| v.as_mut_slice());
        elastic::boundary_rhs(&view, &mut r);
        Ok(())
    }

    fn glue_inter(
        &self,
        domain: &mut Domain,
        index: usize,
        kind: GlueKind,
        rate_prefix: &str,
    ) -> Result<(), RateError> {
        let op = Operation::InterRhs;
        let owner_idx = self.owner_index(domain, index, kind, op)?;
        let (glue_sub, owner) = domain
            .split_pair(index, owner_idx)
            .ok_or_else(|| no_such_index(owner_idx, op))?;
        expect_glue(glue_sub, kind, op)?;
        expect_volume(owner, op)?;

        let rate_names = PrefixedNames::new(rate_prefix);
        let rn = names_of(&rate_names);
        let label = owner.name().to_owned();
        let mut rates = owner
            .take_fields(rn)
            .map_err(|e| RateError::field(&label, op, e))?;
        let result = self.glue_into(glue_sub, kind, owner, &mut rates);
        owner.restore_fields(rn, rates);
        result
    }

    fn glue_into(
        &self,
        glue_sub: &Subdomain,
        kind: GlueKind,
        owner: &Subdomain,
        rates: &mut [Vec<Real>; NUM_FIELDS],
    ) -> Result<(), RateError> {
        let op = Operation::InterRhs;
        let glue = expect_glue(glue_sub, kind, op)?;
        check_glue_nodes(glue_sub, glue, op)?;
        let geom = expect_volume(owner, op)?;
        let owner_basis = self.basis(owner.order());
        check_volume_nodes(owner, geom, &owner_basis, op)?;
        let glue_basis = self.basis(glue_sub.order());
        let interp = self.interpolation(owner.order(), glue_sub.order());

        let minus_names = STATE_FIELDS.map(minus);
        let plus_names = STATE_FIELDS.map(plus);
        let [mzs, mzp, pzs, pzp] = read_fields(
            glue_sub,
            [&minus("Zs"), &minus("Zp"), &plus("Zs"), &plus("Zp")].map(String::as_str),
            op,
        )?;
        let view = GlueView {
            owner_basis: &owner_basis,
            glue_basis: &glue_basis,
            interp: &interp,
            elements: &geom.elements,
            faces: &glue.faces,
            minus: read_fields(glue_sub, minus_names.each_ref().map(String::as_str), op)?,
            plus: read_fields(glue_sub, plus_names.each_ref().map(String::as_str), op)?,
            minus_z: (mzs, mzp),
            plus_z: (pzs, pzp),
            material: material_of(owner, op)?,
        };
        let mut r = rates.each_mut().map(|v| v.as_mut_slice());
        elastic::glue_rhs(&view, &mut r);
        Ok(())
    }

    fn fill_glue_traces(
        &self,
        domain: &mut Domain,
        index: usize,
        kind: GlueKind,
        field_prefix: &str,
        fields: &[&str],
    ) -> Result<(), RateError> {
        let op = Operation::FillTraces;
        let owner_idx = self.owner_index(domain, index, kind, op)?;
        let (owner, glue_sub) = domain
            .split_pair(owner_idx, index)
            .ok_or_else(|| no_such_index(owner_idx, op))?;
        let geom = expect_volume(owner, op)?;
        let owner_basis = self.basis(owner.order());
        check_volume_nodes(owner, geom, &owner_basis, op)?;
        let glue_order = glue_sub.order();
        let interp = self.interpolation(owner.order(), glue_order);
        let label = glue_sub.name().to_owned();

        for &field in fields {
            let src_name = prefixed(field_prefix, field);
            let [src] = read_fields(owner, [src_name.as_str()], op)?;
            let dst_name = minus(field);
            let [mut dst] = glue_sub
                .take_fields([dst_name.as_str()])
                .map_err(|e| RateError::field(&label, op, e))?;
            let result = expect_glue(glue_sub, kind, op)
                .and_then(|glue| check_glue_nodes(glue_sub, glue, op).map(|()| glue))
                .map(|glue| {
                    elastic::fill_trace(
                        &owner_basis,
                        glue_order + 1,
                        &interp,
                        &glue.faces,
                        src,
                        &mut dst,
                    )
                });
            glue_sub.restore_fields([dst_name.as_str()], [dst]);
            result?;
        }
        Ok(())
    }
}

impl RateAccumulation for ElasticRates {
    fn name(&self) -> &str {
        "ElasticRates"
    }

    fn allocate_rate_storage(&self, sub: &mut Subdomain, prefix: &str) -> Result<(), RateError> {
        let op = Operation::AllocateRateStorage;
        match role_of(sub, op)? {
            Role::Volume => {
                expect_volume(sub, op)?;
                let label = sub.name().to_owned();
                for name in PrefixedNames::new(prefix).iter() {
                    sub.add_field(name)
                        .map_err(|e| RateError::field(&label, op, e))?;
                }
                Ok(())
            }
            Role::Glue(kind) => expect_glue(sub, kind, op).map(|_| ()),
        }
    }

    fn scale_rates(&self, sub: &mut Subdomain, prefix: &str, a: Real) -> Result<(), RateError> {
        let op = Operation::ScaleRates;
        match role_of(sub, op)? {
            Role::Volume => {
                expect_volume(sub, op)?;
                let label = sub.name().to_owned();
                for name in PrefixedNames::new(prefix).iter() {
                    let rate = sub
                        .field_mut(name)
                        .map_err(|e| RateError::field(&label, op, e))?;
                    if a == 0.0 {
                        rate.fill(0.0);
                    } else {
                        for v in rate.iter_mut() {
                            *v *= a;
                        }
                    }
                }
                Ok(())
            }
            Role::Glue(kind) => expect_glue(sub, kind, op).map(|_| ()),
        }
    }

    fn intra_rhs(
        &self,
        sub: &mut Subdomain,
        rate_prefix: &str,
        field_prefix: &str,
        _t: Real,
    ) -> Result<(), RateError> {
        let op = Operation::IntraRhs;
        match role_of(sub, op)? {
            Role::Volume => self.volume_intra(sub, rate_prefix, field_prefix),
            // Boundary glue has no interior term; coupling glue is handled
            // entirely in inter_rhs.
            Role::Glue(kind) => expect_glue(sub, kind, op).map(|_| ()),
        }
    }

    fn inter_rhs(
        &self,
        domain: &mut Domain,
        index: usize,
        rate_prefix: &str,
        field_prefix: &str,
        _t: Real,
    ) -> Result<(), RateError> {
        let op = Operation::InterRhs;
        let sub = domain
            .subdomains()
            .get(index)
            .ok_or_else(|| no_such_index(index, op))?;
        match role_of(sub, op)? {
            Role::Volume => expect_volume(sub, op).map(|_| ()),
            Role::Glue(GlueKind::Boundary) => {
                self.boundary_inter(domain, index, rate_prefix, field_prefix)
            }
            Role::Glue(kind) => {
                expect_glue(sub, kind, op)?;
                if self.coupling {
                    self.glue_inter(domain, index, kind, rate_prefix)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn add_rates(
        &self,
        sub: &mut Subdomain,
        lhs_prefix: &str,
        rhs_prefix: &str,
        rate_prefix: &str,
        a: Real,
    ) -> Result<(), RateError> {
        let op = Operation::AddRates;
        match role_of(sub, op)? {
            Role::Volume => {
                expect_volume(sub, op)?;
                let label = sub.name().to_owned();
                let lhs = PrefixedNames::new(lhs_prefix);
                let rhs = PrefixedNames::new(rhs_prefix);
                let rate = PrefixedNames::new(rate_prefix);
                let in_place = lhs_prefix == rhs_prefix;
                for c in 0..NUM_FIELDS {
                    if in_place && a == 0.0 {
                        // Still report a missing field.
                        sub.field(&lhs[c]).map_err(|e| RateError::field(&label, op, e))?;
                        continue;
                    }
                    let [mut out] = sub
                        .take_fields([&lhs[c]])
                        .map_err(|e| RateError::field(&label, op, e))?;
                    let result = add_one(sub, &mut out, in_place, &rhs[c], &rate[c], a, op);
                    sub.restore_fields([&lhs[c]], [out]);
                    result?;
                }
                Ok(())
            }
            Role::Glue(kind) => expect_glue(sub, kind, op).map(|_| ()),
        }
    }

    fn fill_minus_traces(
        &self,
        domain: &mut Domain,
        index: usize,
        field_prefix: &str,
        fields: &[&str],
    ) -> Result<(), RateError> {
        let op = Operation::FillTraces;
        let sub = domain
            .subdomains()
            .get(index)
            .ok_or_else(|| no_such_index(index, op))?;
        match role_of(sub, op)? {
            Role::Volume => expect_volume(sub, op).map(|_| ()),
            Role::Glue(GlueKind::Boundary) => expect_glue(sub, GlueKind::Boundary, op).map(|_| ()),
            Role::Glue(kind) => self.fill_glue_traces(domain, index, kind, field_prefix, fields),
        }
    }

    fn trace_fields(&self) -> &[&'static str] {
        &STATE_FIELDS
    }
}

fn add_one(
    sub: &Subdomain,
    out: &mut [Real],
    in_place: bool,
    rhs: &str,
    rate: &str,
    a: Real,
    op: Operation,
) -> Result<(), RateError> {
    let [r] = read_fields(sub, [rate], op)?;
    if out.len() != r.len() {
        return Err(RateError::field(
            sub.name(),
            op,
            shear_core::FieldError::LengthMismatch {
                subdomain: sub.name().to_owned(),
                field: rate.to_owned(),
                expected: out.len(),
                actual: r.len(),
            },
        ));
    }
    if in_place {
        for (o, &rv) in out.iter_mut().zip(r) {
            *o += a * rv;
        }
    } else {
        let [src] = read_fields(sub, [rhs], op)?;
        if a == 0.0 {
            out.copy_from_slice(src);
        } else {
            for ((o, &s), &rv) in out.iter_mut().zip(src).zip(r) {
                *o = s + a * rv;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shear_core::{ElementId, SubdomainId, TagSet};
    use shear_domain::{ElementGeom, GlueFace, GluePartner, Geometry};
    use shear_mesh::{Bounds, Face};

    const ORDER: usize = 2;
    const NP: usize = (ORDER + 1) * (ORDER + 1);
    const RATE: &str = "_rate_";

    fn volume() -> Subdomain {
        let geom = VolumeGeometry {
            elements: vec![ElementGeom {
                gid: ElementId(0),
                bounds: Bounds {
                    x0: 0.0,
                    x1: 1.0,
                    y0: 0.0,
                    y1: 1.0,
                },
            }],
            interior_faces: Vec::new(),
        };
        let mut sub = Subdomain::new(
            SubdomainId(0),
            "volume 0",
            TagSet::for_role(Role::Volume),
            ORDER,
            NP,
            Geometry::Volume(geom),
        );
        for f in STATE_FIELDS {
            sub.add_field(f).unwrap();
        }
        for (name, value) in [("rho_inv", 1.0), ("lam", 1.0), ("mu", 1.0), ("Zs", 1.0)] {
            sub.add_field_with(name, vec![value; NP]).unwrap();
        }
        sub.add_field_with("Zp", vec![3.0f64.sqrt(); NP]).unwrap();
        sub
    }

    fn glue(id: u32, partner: GluePartner) -> Subdomain {
        let faces = Face::ALL
            .iter()
            .map(|&face| GlueFace {
                owner_element: 0,
                face,
                owner_gid: ElementId(0),
                neighbor: None,
            })
            .collect();
        let geom = GlueGeometry {
            owner: SubdomainId(0),
            owner_order: ORDER,
            neighbor_order: ORDER,
            partner,
            faces,
        };
        Subdomain::new(
            SubdomainId(id),
            format!("glue {id}"),
            TagSet::for_role(Role::Glue(partner.kind())),
            ORDER,
            4 * (ORDER + 1),
            Geometry::Glue(geom),
        )
    }

    fn boxed(r: Real) -> (ElasticRates, Domain) {
        let rates = ElasticRates::builder()
            .boundary_reflection(r)
            .orders(&[ORDER])
            .build()
            .unwrap();
        let mut domain = Domain::new();
        domain.insert(volume()).unwrap();
        domain.insert(glue(1, GluePartner::Boundary)).unwrap();
        for sub in domain.subdomains_mut() {
            rates.allocate_rate_storage(sub, RATE).unwrap();
        }
        (rates, domain)
    }

    fn stranger(tags: &[&str]) -> Subdomain {
        Subdomain::new(
            SubdomainId(9),
            "stranger",
            tags.iter().copied().collect(),
            ORDER,
            NP,
            Geometry::Detached,
        )
    }

    #[test]
    fn builder_validates_reflection() {
        assert!(ElasticRates::builder().boundary_reflection(1.5).build().is_err());
        assert!(ElasticRates::builder()
            .boundary_reflection(Real::NAN)
            .build()
            .is_err());
        assert!(ElasticRates::builder().orders(&[0]).build().is_err());
        let ok = ElasticRates::builder().build().unwrap();
        assert_eq!(ok.boundary_reflection(), -1.0);
        assert!(!ok.glue_coupling());
    }

    #[test]
    fn allocate_creates_zeroed_rates_on_volumes_only() {
        let (_, domain) = boxed(-1.0);
        let vol = &domain.subdomains()[0];
        for name in PrefixedNames::new(RATE).iter() {
            assert!(vol.field(name).unwrap().iter().all(|&v| v == 0.0));
        }
        let glue = &domain.subdomains()[1];
        assert!(!glue.has_field(&prefixed(RATE, "v1")));
    }

    #[test]
    fn scale_by_zero_clears_non_finite_values() {
        let (rates, mut domain) = boxed(-1.0);
        let vol = &mut domain.subdomains_mut()[0];
        vol.field_mut(&prefixed(RATE, "S12")).unwrap()[3] = Real::NAN;
        vol.field_mut(&prefixed(RATE, "v2")).unwrap()[0] = Real::INFINITY;
        rates.scale_rates(vol, RATE, 0.0).unwrap();
        for name in PrefixedNames::new(RATE).iter() {
            assert!(vol.field(name).unwrap().iter().all(|&v| v == 0.0));
        }

        vol.field_mut(&prefixed(RATE, "v1")).unwrap()[1] = 2.0;
        rates.scale_rates(vol, RATE, -0.5).unwrap();
        assert_eq!(vol.field(&prefixed(RATE, "v1")).unwrap()[1], -1.0);
    }

    #[test]
    fn add_rates_with_zero_factor_is_exact() {
        let (rates, mut domain) = boxed(-1.0);
        let vol = &mut domain.subdomains_mut()[0];
        for name in PrefixedNames::new("_rhs_").iter() {
            vol.add_field_with(name, (0..NP).map(|i| 0.1 * i as Real + 1e-17).collect())
                .unwrap();
        }
        vol.field_mut(&prefixed(RATE, "v3")).unwrap().fill(Real::MAX);
        rates.add_rates(vol, "", "_rhs_", RATE, 0.0).unwrap();
        for c in 0..NUM_FIELDS {
            let lhs = vol.field(STATE_FIELDS[c]).unwrap();
            let rhs = vol.field(&prefixed("_rhs_", STATE_FIELDS[c])).unwrap();
            for (a, b) in lhs.iter().zip(rhs) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }

        let before: Vec<Real> = vol.field("v1").unwrap().to_vec();
        rates.add_rates(vol, "", "", RATE, 0.0).unwrap();
        assert_eq!(vol.field("v1").unwrap(), before.as_slice());
    }

    #[test]
    fn add_rates_in_place() {
        let (rates, mut domain) = boxed(-1.0);
        let vol = &mut domain.subdomains_mut()[0];
        vol.field_mut("v1").unwrap().fill(1.0);
        vol.field_mut(&prefixed(RATE, "v1")).unwrap().fill(4.0);
        rates.add_rates(vol, "", "", RATE, 0.25).unwrap();
        assert!(vol.field("v1").unwrap().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn traction_free_boundary_keeps_stress_free_motion() {
        let (rates, mut domain) = boxed(-1.0);
        domain.subdomains_mut()[0].field_mut("v3").unwrap().fill(1.0);
        for i in 0..domain.len() {
            rates.inter_rhs(&mut domain, i, RATE, "", 0.0).unwrap();
        }
        let vol = &domain.subdomains()[0];
        for name in PrefixedNames::new(RATE).iter() {
            assert!(vol.field(name).unwrap().iter().all(|&v| v == 0.0), "{name}");
        }
    }

    #[test]
    fn rigid_wall_stops_boundary_motion() {
        let (rates, mut domain) = boxed(1.0);
        domain.subdomains_mut()[0].field_mut("v3").unwrap().fill(1.0);
        rates.inter_rhs(&mut domain, 1, RATE, "", 0.0).unwrap();
        let vol = &domain.subdomains()[0];
        let dv3 = vol.field(&prefixed(RATE, "v3")).unwrap();
        // Corner node: pulled back towards rest.
        assert!(dv3[0] < 0.0);
        // The centre node is not on any face.
        assert_eq!(dv3[4], 0.0);
    }

    #[test]
    fn intra_rhs_of_constant_state_is_zero() {
        let (rates, mut domain) = boxed(-1.0);
        let vol = &mut domain.subdomains_mut()[0];
        vol.field_mut("S11").unwrap().fill(3.0);
        vol.field_mut("v2").unwrap().fill(-2.0);
        rates.intra_rhs(vol, RATE, "", 0.0).unwrap();
        for name in PrefixedNames::new(RATE).iter() {
            assert!(vol.field(name).unwrap().iter().all(|&v| v.abs() < 1e-12));
        }
        // Rates are back in place after the kernel ran.
        assert_eq!(vol.field(&prefixed(RATE, "v1")).unwrap().len(), NP);
    }

    #[test]
    fn intra_rhs_on_glue_is_a_no_op() {
        let (rates, mut domain) = boxed(-1.0);
        rates
            .intra_rhs(&mut domain.subdomains_mut()[1], RATE, "", 0.0)
            .unwrap();
    }

    #[test]
    fn uncoupled_local_glue_needs_no_traces() {
        let rates = ElasticRates::builder().build().unwrap();
        let mut domain = Domain::new();
        domain.insert(volume()).unwrap();
        domain
            .insert(glue(
                1,
                GluePartner::Local {
                    glue: SubdomainId(2),
                    volume: SubdomainId(0),
                },
            ))
            .unwrap();
        rates.inter_rhs(&mut domain, 1, RATE, "", 0.0).unwrap();
    }

    #[test]
    fn minus_traces_copy_face_values_for_equal_orders() {
        let rates = ElasticRates::builder().orders(&[ORDER]).build().unwrap();
        let mut domain = Domain::new();
        let mut vol = volume();
        let values: Vec<Real> = (0..NP).map(|i| (i as Real).sin()).collect();
        vol.field_mut("S13").unwrap().copy_from_slice(&values);
        domain.insert(vol).unwrap();
        let mut g = glue(
            1,
            GluePartner::Parallel {
                rank: shear_core::Rank(1),
                volume: SubdomainId(0),
            },
        );
        g.add_field(&minus("S13")).unwrap();
        domain.insert(g).unwrap();

        rates
            .fill_minus_traces(&mut domain, 1, "", &["S13"])
            .unwrap();
        let trace = domain.subdomains()[1].field(&minus("S13")).unwrap();
        // x-min face of a single order-2 element: nodes 0, 3, 6.
        assert_eq!(&trace[0..3], &[values[0], values[3], values[6]]);
        // y-max face: nodes 6, 7, 8.
        assert_eq!(&trace[9..12], &[values[6], values[7], values[8]]);
    }

    #[test]
    fn unknown_role_reported_by_every_operation() {
        let rates = ElasticRates::builder().build().unwrap();
        let mut sub = stranger(&["mystery"]);
        let errs = [
            rates.allocate_rate_storage(&mut sub, RATE).unwrap_err(),
            rates.scale_rates(&mut sub, RATE, 1.0).unwrap_err(),
            rates.intra_rhs(&mut sub, RATE, "", 0.0).unwrap_err(),
            rates.add_rates(&mut sub, "", "", RATE, 1.0).unwrap_err(),
        ];
        for e in &errs {
            assert!(matches!(e, RateError::UnknownRole { .. }), "{e}");
            assert_eq!(e.subdomain(), "stranger");
        }
        let mut domain = Domain::new();
        domain.insert(sub).unwrap();
        let e = rates.inter_rhs(&mut domain, 0, RATE, "", 0.0).unwrap_err();
        assert_eq!(e.operation(), Operation::InterRhs);
        assert!(matches!(e, RateError::UnknownRole { .. }));
        let e = rates
            .fill_minus_traces(&mut domain, 0, "", &STATE_FIELDS)
            .unwrap_err();
        assert!(matches!(e, RateError::UnknownRole { .. }));
    }

    #[test]
    fn role_without_matching_geometry_is_a_mismatch() {
        let rates = ElasticRates::builder().build().unwrap();
        let mut sub = stranger(&["volume"]);
        let e = rates.allocate_rate_storage(&mut sub, RATE).unwrap_err();
        assert!(matches!(e, RateError::RoleMismatch { role: Role::Volume, .. }));

        let mut sub = stranger(&["glue-boundary"]);
        let e = rates.scale_rates(&mut sub, RATE, 2.0).unwrap_err();
        assert!(matches!(e, RateError::RoleMismatch { .. }));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let (rates, mut domain) = boxed(-1.0);
        let e = rates.inter_rhs(&mut domain, 7, RATE, "", 0.0).unwrap_err();
        assert!(matches!(
            e,
            RateError::Domain {
                source: DomainError::NoSuchIndex(7),
                ..
            }
        ));
    }
}
