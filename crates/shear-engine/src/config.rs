//! Solver preferences, validation, and error types.
//!
//! [`SolverConfig`] is the immutable input to
//! [`Simulation`](crate::simulation::Simulation). It is normally read from
//! a flat TOML table with [`SolverConfig::from_toml_str`]:
//!
//! ```toml
//! N = 4
//! num_subdomains = 2
//! lsrk_method = "KC54"
//! dt = 0.001
//! ```
//!
//! Absent keys take their documented default with a warning. Unknown
//! connectivity or method names fall back to the default, also with a
//! warning. Values of the wrong type or outside their valid range are a
//! [`ConfigError`].

use std::collections::BTreeMap;

use serde::Deserialize;
use shear_core::Real;
use shear_kernel::Material;
use shear_mesh::Connectivity;
use thiserror::Error;

use crate::method::LsrkMethod;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while reading or validating a [`SolverConfig`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The text is not valid TOML, or a key holds a value of the wrong
    /// type.
    #[error("invalid preferences: {0}")]
    Parse(String),
    /// A value is outside its valid range.
    #[error("preference '{key}' = {value}: {reason}")]
    OutOfRange {
        /// The offending key.
        key: &'static str,
        /// The value as written.
        value: String,
        /// What the valid range is.
        reason: String,
    },
}

fn out_of_range(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::OutOfRange {
        key,
        value: value.to_string(),
        reason: reason.to_owned(),
    }
}

// ── SolverConfig ───────────────────────────────────────────────────

/// Complete configuration of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    /// Polynomial order of subdomain 0 (`N`). Default: 5.
    pub order: usize,
    /// Number of subdomains the mesh is cut into. Default: 1.
    pub num_subdomains: u32,
    /// Subdomain `k` runs at order `order + k * order_step`. Default: 1.
    pub order_step: usize,
    /// Brick refinement level; the mesh has `4^level` elements. Default: 1.
    pub refine_level: u32,
    /// Mesh topology. Default: unit square.
    pub connectivity: Connectivity,
    /// Time integration method. Default: KC54.
    pub lsrk_method: LsrkMethod,
    /// Density and Lamé parameters. Default: all 1.
    pub material: Material,
    /// Time step. Default: 0.005.
    pub dt: Real,
    /// End time of [`Simulation::run`](crate::simulation::Simulation::run).
    /// Default: 10.
    pub end_time: Real,
    /// Boundary reflection coefficient. Default: -1 (stress free).
    pub boundary_reflection: Real,
    /// Whether local and parallel glue contribute a coupling flux.
    /// Default: false.
    pub glue_coupling: bool,
    /// Upper bound on one exchange wait, in milliseconds. Default: 60000.
    pub exchange_timeout_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            order: 5,
            num_subdomains: 1,
            order_step: 1,
            refine_level: 1,
            connectivity: Connectivity::UnitSquare,
            lsrk_method: LsrkMethod::Kc54,
            material: Material {
                rho: 1.0,
                lam: 1.0,
                mu: 1.0,
            },
            dt: 0.005,
            end_time: 10.0,
            boundary_reflection: -1.0,
            glue_coupling: false,
            exchange_timeout_ms: 60_000,
        }
    }
}

/// Flat preference table as written.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPrefs {
    #[serde(rename = "N")]
    order: Option<i64>,
    num_subdomains: Option<i64>,
    order_step: Option<i64>,
    refine_level: Option<i64>,
    connectivity: Option<String>,
    lsrk_method: Option<String>,
    rho: Option<Real>,
    mu: Option<Real>,
    lam: Option<Real>,
    dt: Option<Real>,
    end_time: Option<Real>,
    boundary_reflection: Option<Real>,
    glue_coupling: Option<bool>,
    exchange_timeout_ms: Option<i64>,
    #[serde(flatten)]
    extra: BTreeMap<String, toml::Value>,
}

fn or_default<T: std::fmt::Debug>(key: &'static str, value: Option<T>, default: T) -> T {
    match value {
        Some(v) => v,
        None => {
            tracing::warn!(key, default = ?default, "preference not set, using default");
            default
        }
    }
}

fn non_negative(key: &'static str, value: Option<i64>, default: i64) -> Result<i64, ConfigError> {
    let v = or_default(key, value, default);
    if v < 0 {
        return Err(out_of_range(key, v, "must be >= 0"));
    }
    Ok(v)
}

impl SolverConfig {
    /// Parse and validate a flat TOML preference table.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or mistyped values,
    /// [`ConfigError::OutOfRange`] for values [`validate`](Self::validate)
    /// rejects.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawPrefs = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        for key in raw.extra.keys() {
            tracing::warn!(key = key.as_str(), "unknown preference ignored");
        }
        let d = Self::default();

        let order = non_negative("N", raw.order, d.order as i64)?;
        let num_subdomains = non_negative(
            "num_subdomains",
            raw.num_subdomains,
            i64::from(d.num_subdomains),
        )?;
        let order_step = non_negative("order_step", raw.order_step, d.order_step as i64)?;
        let refine_level = non_negative(
            "refine_level",
            raw.refine_level,
            i64::from(d.refine_level),
        )?;
        let exchange_timeout_ms = non_negative(
            "exchange_timeout_ms",
            raw.exchange_timeout_ms,
            d.exchange_timeout_ms as i64,
        )?;

        let connectivity = match raw.connectivity {
            None => or_default("connectivity", None, d.connectivity),
            Some(name) => Connectivity::from_name(&name).unwrap_or_else(|| {
                tracing::warn!(
                    value = name.as_str(),
                    fallback = %d.connectivity,
                    "unknown connectivity, using fallback"
                );
                d.connectivity
            }),
        };
        let lsrk_method = match raw.lsrk_method {
            None => or_default("lsrk_method", None, d.lsrk_method),
            Some(name) => LsrkMethod::from_name(&name).unwrap_or_else(|| {
                tracing::warn!(
                    value = name.as_str(),
                    fallback = %d.lsrk_method,
                    "unknown lsrk_method, using fallback"
                );
                d.lsrk_method
            }),
        };

        let config = Self {
            order: order as usize,
            num_subdomains: u32::try_from(num_subdomains)
                .map_err(|_| out_of_range("num_subdomains", num_subdomains, "too large"))?,
            order_step: order_step as usize,
            refine_level: u32::try_from(refine_level)
                .map_err(|_| out_of_range("refine_level", refine_level, "too large"))?,
            connectivity,
            lsrk_method,
            material: Material {
                rho: or_default("rho", raw.rho, d.material.rho),
                lam: or_default("lam", raw.lam, d.material.lam),
                mu: or_default("mu", raw.mu, d.material.mu),
            },
            dt: or_default("dt", raw.dt, d.dt),
            end_time: or_default("end_time", raw.end_time, d.end_time),
            boundary_reflection: or_default(
                "boundary_reflection",
                raw.boundary_reflection,
                d.boundary_reflection,
            ),
            glue_coupling: or_default("glue_coupling", raw.glue_coupling, d.glue_coupling),
            exchange_timeout_ms: exchange_timeout_ms as u64,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order == 0 {
            return Err(out_of_range("N", self.order, "must be >= 1"));
        }
        if self.num_subdomains == 0 {
            return Err(out_of_range("num_subdomains", 0, "must be >= 1"));
        }
        if self.refine_level > shear_mesh::BrickMesh::MAX_LEVEL {
            return Err(out_of_range(
                "refine_level",
                self.refine_level,
                &format!("must be <= {}", shear_mesh::BrickMesh::MAX_LEVEL),
            ));
        }
        self.material
            .validate()
            .map_err(|reason| out_of_range("rho/lam/mu", format!("{:?}", self.material), &reason))?;
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(out_of_range("dt", self.dt, "must be finite and > 0"));
        }
        if !self.end_time.is_finite() || self.end_time < 0.0 {
            return Err(out_of_range("end_time", self.end_time, "must be finite and >= 0"));
        }
        if !(-1.0..=1.0).contains(&self.boundary_reflection) {
            return Err(out_of_range(
                "boundary_reflection",
                self.boundary_reflection,
                "must be in [-1, 1]",
            ));
        }
        if self.exchange_timeout_ms == 0 {
            return Err(out_of_range("exchange_timeout_ms", 0, "must be >= 1"));
        }
        Ok(())
    }

    /// Order of subdomain `k`.
    pub fn order_of(&self, k: u32) -> usize {
        self.order + k as usize * self.order_step
    }

    /// Log every preference at `info` level.
    pub fn log_preferences(&self) {
        tracing::info!(
            N = self.order,
            num_subdomains = self.num_subdomains,
            order_step = self.order_step,
            refine_level = self.refine_level,
            connectivity = %self.connectivity,
            lsrk_method = %self.lsrk_method,
            rho = self.material.rho,
            lam = self.material.lam,
            mu = self.material.mu,
            dt = self.dt,
            end_time = self.end_time,
            boundary_reflection = self.boundary_reflection,
            glue_coupling = self.glue_coupling,
            exchange_timeout_ms = self.exchange_timeout_ms,
            "preferences"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_gives_defaults() {
        let cfg = SolverConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, SolverConfig::default());
        assert_eq!(cfg.order, 5);
        assert_eq!(cfg.lsrk_method, LsrkMethod::Kc54);
        assert_eq!(cfg.exchange_timeout_ms, 60_000);
    }

    #[test]
    fn reads_every_key() {
        let cfg = SolverConfig::from_toml_str(
            r#"
            N = 3
            num_subdomains = 4
            order_step = 0
            refine_level = 2
            connectivity = "periodic"
            lsrk_method = "W33"
            rho = 2.0
            mu = 3
            lam = 0.5
            dt = 0.01
            end_time = 1.5
            boundary_reflection = 0.0
            glue_coupling = true
            exchange_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(cfg.order, 3);
        assert_eq!(cfg.num_subdomains, 4);
        assert_eq!(cfg.order_of(3), 3);
        assert_eq!(cfg.refine_level, 2);
        assert_eq!(cfg.connectivity, Connectivity::Periodic);
        assert_eq!(cfg.lsrk_method, LsrkMethod::Williamson33);
        assert_eq!(cfg.material.mu, 3.0);
        assert_eq!(cfg.boundary_reflection, 0.0);
        assert!(cfg.glue_coupling);
        assert_eq!(cfg.exchange_timeout_ms, 250);
    }

    #[test]
    fn unknown_names_fall_back() {
        let cfg = SolverConfig::from_toml_str(
            "connectivity = \"moebius\"\nlsrk_method = \"RK4\"\ncolour = 3\n",
        )
        .unwrap();
        assert_eq!(cfg.connectivity, Connectivity::UnitSquare);
        assert_eq!(cfg.lsrk_method, LsrkMethod::Kc54);
    }

    #[test]
    fn wrong_type_is_fatal() {
        let err = SolverConfig::from_toml_str("N = \"five\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = SolverConfig::from_toml_str("glue_coupling = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_values_are_fatal() {
        for text in [
            "N = 0",
            "N = -2",
            "num_subdomains = 0",
            "refine_level = 11",
            "dt = 0.0",
            "end_time = -1.0",
            "boundary_reflection = 1.5",
            "rho = 0.0",
            "exchange_timeout_ms = 0",
        ] {
            let err = SolverConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConfigError::OutOfRange { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn order_of_steps_per_subdomain() {
        let cfg = SolverConfig {
            order: 2,
            order_step: 3,
            ..SolverConfig::default()
        };
        assert_eq!(cfg.order_of(0), 2);
        assert_eq!(cfg.order_of(2), 8);
    }
}
