//! The run driver: mesh → domain → materials → initial state → steps.
//!
//! [`Simulation`] owns one rank's [`Domain`] and its [`LsrkStepper`].
//! Built from a [`SolverConfig`] it uses the [`BrickMesh`] provider;
//! [`from_mesh`](Simulation::from_mesh) accepts any [`MeshProvider`].
//!
//! # Ownership model
//!
//! Snapshots handed to the [`run_until`](Simulation::run_until) observer
//! borrow the domain, so the observer cannot hold one across steps.

use shear_comm::Communicator;
use shear_core::{GlueKind, Rank, Real, Role, STATE_FIELDS};
use shear_domain::{snapshot_hash, Domain, FieldInit, Snapshot, TagPredicate};
use shear_kernel::{ElasticRates, LglBasis};
use shear_mesh::{BrickMesh, MeshProvider};

use crate::config::SolverConfig;
use crate::metrics::StepMetrics;
use crate::setup::{build_domain, SetupError};
use crate::stepper::{LsrkStepper, StepError};

/// Slack on the step count so `end_time / dt` landing a hair under an
/// integer still takes that many steps.
const STEP_COUNT_SLACK: Real = 1e-6;

/// What the [`run_until`](Simulation::run_until) observer sees after
/// each step.
pub struct Progress<'a> {
    /// Steps completed so far.
    pub step: u64,
    /// Simulation time.
    pub time: Real,
    /// Every volume's state fields.
    pub snapshot: Snapshot<'a>,
    /// Metrics of the step just taken.
    pub metrics: &'a StepMetrics,
}

// ── Simulation ─────────────────────────────────────────────────────

/// One rank of an elastic-wave run.
///
/// # Example
///
/// ```
/// use shear_comm::SelfComm;
/// use shear_engine::{SolverConfig, Simulation, StressFreeBox};
///
/// let config = SolverConfig { order: 2, dt: 0.001, ..SolverConfig::default() };
/// let mut sim = Simulation::new(config.clone(), Box::new(SelfComm::new())).unwrap();
/// sim.initialize(&StressFreeBox::new(1, 1, config.material)).unwrap();
/// sim.step().unwrap();
/// assert_eq!(sim.steps(), 1);
/// ```
pub struct Simulation {
    config: SolverConfig,
    domain: Domain,
    stepper: LsrkStepper,
}

impl Simulation {
    /// Build a run on the brick mesh described by `config`.
    ///
    /// # Errors
    ///
    /// See [`from_mesh`](Self::from_mesh); additionally
    /// [`SetupError::Mesh`] if the brick parameters are rejected.
    pub fn new(config: SolverConfig, comm: Box<dyn Communicator>) -> Result<Self, SetupError> {
        config.validate()?;
        let mesh = BrickMesh::new(
            config.refine_level,
            config.connectivity,
            config.num_subdomains,
            config.order,
            config.order_step,
        )?;
        Self::from_mesh(config, &mesh, comm)
    }

    /// Build a run on `mesh`.
    ///
    /// Validates and logs the preferences, builds this rank's domain,
    /// allocates rates, and exchanges impedance traces with the
    /// neighbor ranks.
    ///
    /// # Errors
    ///
    /// [`SetupError`] for invalid preferences, an inconsistent
    /// partition, or a failed setup exchange.
    pub fn from_mesh(
        config: SolverConfig,
        mesh: &dyn MeshProvider,
        comm: Box<dyn Communicator>,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        if comm.rank() == Rank(0) {
            config.log_preferences();
        }
        let partition = mesh.partition(comm.rank(), comm.size())?;
        let mut domain = build_domain(&partition, &config.material)?;

        let coupled_glue = domain.subdomains().iter().any(|s| {
            matches!(
                s.role(),
                Ok(Role::Glue(GlueKind::Local | GlueKind::Parallel))
            )
        });
        if coupled_glue && !config.glue_coupling {
            tracing::warn!(
                rank = %comm.rank(),
                "glue_coupling is off: subdomains evolve independently across local and parallel glue"
            );
        }

        let mut orders: Vec<usize> = domain.subdomains().iter().map(|s| s.order()).collect();
        orders.sort_unstable();
        orders.dedup();
        let rates = ElasticRates::builder()
            .boundary_reflection(config.boundary_reflection)
            .glue_coupling(config.glue_coupling)
            .orders(&orders)
            .build()
            .map_err(SetupError::Kernel)?;
        for &order in &orders {
            let basis = rates.basis(order);
            tracing::info!(
                order,
                nodes_per_element = basis.np(),
                min_spacing = min_spacing(&basis),
                specialized = rates.registry().is_specialized(order),
                "basis order"
            );
        }

        let tableau = config.lsrk_method.tableau();
        let stepper = LsrkStepper::new(&mut domain, Box::new(rates), comm, tableau)?;
        Ok(Self {
            config,
            domain,
            stepper,
        })
    }

    /// Fill every volume's state fields from `init` at the current time.
    ///
    /// # Errors
    ///
    /// [`SetupError::Domain`] if `init` rejects a field.
    pub fn initialize(&mut self, init: &dyn FieldInit) -> Result<(), SetupError> {
        let volumes = TagPredicate::any_of(&[Role::Volume.tag()]);
        let t = self.stepper.time();
        for field in STATE_FIELDS {
            self.domain.init_field_where(&volumes, field, t, init)?;
        }
        Ok(())
    }

    /// Take one step of the configured `dt`.
    pub fn step(&mut self) -> Result<&StepMetrics, StepError> {
        self.stepper.step(&mut self.domain, self.config.dt)
    }

    /// Step until `end_time`, calling `observer` after every step.
    ///
    /// Takes `floor((end_time - time) / dt)` steps of the configured
    /// `dt`, counting a ratio within `1e-6` of the next integer as that
    /// integer. Returns the number of steps taken.
    pub fn run_until<F>(&mut self, end_time: Real, mut observer: F) -> Result<u64, StepError>
    where
        F: FnMut(Progress<'_>),
    {
        let remaining = end_time - self.stepper.time();
        let n = if remaining > 0.0 {
            (remaining / self.config.dt + STEP_COUNT_SLACK).floor() as u64
        } else {
            0
        };
        tracing::info!(
            steps = n,
            from = self.stepper.time(),
            to = end_time,
            dt = self.config.dt,
            "run"
        );
        let volumes = TagPredicate::any_of(&[Role::Volume.tag()]);
        for _ in 0..n {
            self.stepper.step(&mut self.domain, self.config.dt)?;
            observer(Progress {
                step: self.stepper.steps(),
                time: self.stepper.time(),
                snapshot: self.domain.snapshot(&volumes, &STATE_FIELDS),
                metrics: self.stepper.last_metrics(),
            });
        }
        Ok(n)
    }

    /// Step until the configured `end_time`.
    pub fn run(&mut self) -> Result<u64, StepError> {
        self.run_until(self.config.end_time, |_| {})
    }

    /// Every volume's state fields.
    pub fn snapshot(&self) -> Snapshot<'_> {
        let volumes = TagPredicate::any_of(&[Role::Volume.tag()]);
        self.domain.snapshot(&volumes, &STATE_FIELDS)
    }

    /// FNV-1a digest of [`snapshot`](Self::snapshot).
    pub fn state_hash(&self) -> u64 {
        snapshot_hash(&self.snapshot())
    }

    /// The preferences this run was built from.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// This rank's subdomains.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The time integrator.
    pub fn stepper(&self) -> &LsrkStepper {
        &self.stepper
    }

    /// Simulation time.
    pub fn time(&self) -> Real {
        self.stepper.time()
    }

    /// Steps completed.
    pub fn steps(&self) -> u64 {
        self.stepper.steps()
    }
}

fn min_spacing(basis: &LglBasis) -> Real {
    basis
        .nodes()
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(Real::INFINITY, Real::min)
}
