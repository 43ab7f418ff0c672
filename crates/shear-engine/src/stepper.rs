//! The low-storage Runge-Kutta stepper.
//!
//! [`LsrkStepper`] owns the rate protocol, the communicator, and the
//! exchange plan of one rank. Each [`step`](LsrkStepper::step) runs every
//! stage of its [`Tableau`]:
//!
//! ```text
//! scale_rates(A_i) → intra_rhs(t + c_i dt) → exchange
//!                  → inter_rhs(t + c_i dt) → add_rates(B_i dt)
//! ```
//!
//! Subdomains are visited in domain order in every phase, so a run is
//! bitwise reproducible on a given process layout.
//!
//! # Failure
//!
//! Any error inside a stage leaves the state half-updated. The stepper
//! moves to [`StepperState::Failed`] and refuses every later step.

use std::fmt;
use std::time::Instant;

use thiserror::Error;

use shear_comm::Communicator;
use shear_core::{Real, TRACE_MATERIAL_FIELDS};
use shear_domain::Domain;
use shear_protocol::{RateAccumulation, RateError};

use crate::exchange::{Exchange, ExchangeError, MATERIAL_TAG, STATE_TAG};
use crate::method::Tableau;
use crate::metrics::StepMetrics;
use crate::setup::SetupError;

/// Prefix of the stepper's rate register.
pub const RATE_PREFIX: &str = "_lsrk_rate_";
/// Prefix of the evolved state: the physical fields themselves.
pub const STATE_PREFIX: &str = "";

// ── StepperState ───────────────────────────────────────────────────

/// Where the stepper is in its stage cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepperState {
    /// Between steps.
    Idle,
    /// Running local rate operations of a stage.
    StageEvaluating,
    /// Inside the trace exchange of a stage.
    Exchanging,
    /// A stage finished its state update.
    StageComplete,
    /// A step failed; no further step is possible.
    Failed,
}

impl fmt::Display for StepperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::StageEvaluating => "stage-evaluating",
            Self::Exchanging => "exchanging",
            Self::StageComplete => "stage-complete",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ── StepError ──────────────────────────────────────────────────────

/// Errors from [`LsrkStepper::step`].
#[derive(Debug, Error)]
pub enum StepError {
    /// An earlier step failed.
    #[error("stepper failed in an earlier step")]
    Failed,
    /// The time step is not finite and positive. The state is untouched.
    #[error("time step must be finite and > 0, got {0}")]
    InvalidDt(Real),
    /// A rate operation failed.
    #[error("stage {stage}: {source}")]
    Rate {
        /// Zero-based stage index.
        stage: usize,
        /// Underlying protocol error.
        #[source]
        source: RateError,
    },
    /// The trace exchange failed.
    #[error("stage {stage} exchange: {source}")]
    Exchange {
        /// Zero-based stage index.
        stage: usize,
        /// Underlying exchange error.
        #[source]
        source: ExchangeError,
    },
}

// ── LsrkStepper ────────────────────────────────────────────────────

/// Explicit 2N-storage Runge-Kutta time integrator over a [`Domain`].
pub struct LsrkStepper {
    rates: Box<dyn RateAccumulation>,
    comm: Box<dyn Communicator>,
    exchange: Exchange,
    tableau: Tableau,
    state: StepperState,
    time: Real,
    steps: u64,
    last_metrics: StepMetrics,
}

impl LsrkStepper {
    /// Prepare `domain` for stepping.
    ///
    /// Plans the exchange, allocates the rate register on every
    /// subdomain, and exchanges the impedance traces once.
    ///
    /// # Errors
    ///
    /// [`SetupError::Partner`] for an inconsistent glue plan,
    /// [`SetupError::Rate`] if allocation fails, and
    /// [`SetupError::Exchange`] if the impedance exchange fails.
    pub fn new(
        domain: &mut Domain,
        rates: Box<dyn RateAccumulation>,
        mut comm: Box<dyn Communicator>,
        tableau: Tableau,
    ) -> Result<Self, SetupError> {
        let exchange = Exchange::plan(domain, comm.rank(), comm.size())?;
        for sub in domain.subdomains_mut() {
            rates.allocate_rate_storage(sub, RATE_PREFIX)?;
        }
        let m = exchange.run(
            domain,
            comm.as_mut(),
            rates.as_ref(),
            STATE_PREFIX,
            &TRACE_MATERIAL_FIELDS,
            MATERIAL_TAG,
        )?;
        tracing::debug!(
            rank = %comm.rank(),
            protocol = rates.name(),
            stages = tableau.stages(),
            messages = m.messages_sent,
            "stepper ready"
        );
        Ok(Self {
            rates,
            comm,
            exchange,
            tableau,
            state: StepperState::Idle,
            time: 0.0,
            steps: 0,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Current state.
    pub fn state(&self) -> StepperState {
        self.state
    }

    /// Simulation time.
    pub fn time(&self) -> Real {
        self.time
    }

    /// Steps completed.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Metrics of the most recent successful step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The coefficient table.
    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    /// The exchange plan.
    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// The rate protocol.
    pub fn rates(&self) -> &dyn RateAccumulation {
        self.rates.as_ref()
    }

    /// The communicator.
    pub fn comm(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    fn transition(&mut self, to: StepperState) {
        tracing::trace!(from = %self.state, %to, "stepper transition");
        self.state = to;
    }

    /// Advance `domain` from `time()` to `time() + dt`.
    ///
    /// # Errors
    ///
    /// [`StepError::Failed`] once any earlier step has failed, and
    /// [`StepError::InvalidDt`] for a non-finite or non-positive `dt`
    /// (neither changes anything). A rate or exchange failure moves the
    /// stepper to [`StepperState::Failed`].
    pub fn step(&mut self, domain: &mut Domain, dt: Real) -> Result<&StepMetrics, StepError> {
        if self.state == StepperState::Failed {
            return Err(StepError::Failed);
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(StepError::InvalidDt(dt));
        }
        match self.run_stages(domain, dt) {
            Ok(metrics) => {
                self.time += dt;
                self.steps += 1;
                self.transition(StepperState::Idle);
                tracing::debug!(
                    step = self.steps,
                    time = self.time,
                    total_us = metrics.total_us,
                    exchange_us = metrics.exchange.total_us,
                    "step complete"
                );
                self.last_metrics = metrics;
                Ok(&self.last_metrics)
            }
            Err(e) => {
                tracing::error!(step = self.steps + 1, error = %e, "step failed");
                self.transition(StepperState::Failed);
                Err(e)
            }
        }
    }

    fn run_stages(&mut self, domain: &mut Domain, dt: Real) -> Result<StepMetrics, StepError> {
        let start = Instant::now();
        let mut metrics = StepMetrics::default();

        for stage in 0..self.tableau.stages() {
            let a = self.tableau.a()[stage];
            let b = self.tableau.b()[stage];
            let t = self.time + self.tableau.c()[stage] * dt;
            let rate_err = |source| StepError::Rate { stage, source };

            self.transition(StepperState::StageEvaluating);
            let phase = Instant::now();
            for sub in domain.subdomains_mut() {
                self.rates
                    .scale_rates(sub, RATE_PREFIX, a)
                    .map_err(rate_err)?;
            }
            metrics.scale_us += phase.elapsed().as_micros() as u64;

            let phase = Instant::now();
            for sub in domain.subdomains_mut() {
                self.rates
                    .intra_rhs(sub, RATE_PREFIX, STATE_PREFIX, t)
                    .map_err(rate_err)?;
            }
            metrics.intra_us += phase.elapsed().as_micros() as u64;

            self.transition(StepperState::Exchanging);
            let exchanged = self
                .exchange
                .run(
                    domain,
                    self.comm.as_mut(),
                    self.rates.as_ref(),
                    STATE_PREFIX,
                    self.rates.trace_fields(),
                    STATE_TAG,
                )
                .map_err(|source| StepError::Exchange { stage, source })?;
            metrics.exchange.accumulate(&exchanged);

            self.transition(StepperState::StageEvaluating);
            let phase = Instant::now();
            for index in 0..domain.len() {
                self.rates
                    .inter_rhs(domain, index, RATE_PREFIX, STATE_PREFIX, t)
                    .map_err(rate_err)?;
            }
            metrics.inter_us += phase.elapsed().as_micros() as u64;

            let phase = Instant::now();
            for sub in domain.subdomains_mut() {
                self.rates
                    .add_rates(sub, STATE_PREFIX, STATE_PREFIX, RATE_PREFIX, b * dt)
                    .map_err(rate_err)?;
            }
            metrics.add_us += phase.elapsed().as_micros() as u64;

            metrics.stages += 1;
            self.transition(StepperState::StageComplete);
        }

        metrics.total_us = start.elapsed().as_micros() as u64;
        Ok(metrics)
    }
}

impl fmt::Debug for LsrkStepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LsrkStepper")
            .field("rates", &self.rates.name())
            .field("rank", &self.comm.rank())
            .field("stages", &self.tableau.stages())
            .field("state", &self.state)
            .field("time", &self.time)
            .field("steps", &self.steps)
            .finish()
    }
}
