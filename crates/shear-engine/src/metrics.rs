//! Per-step performance metrics.
//!
//! [`StepMetrics`] captures timing and message counts for a single time
//! step, enabling telemetry and profiling. All durations are in
//! microseconds and summed over the step's stages.

/// Timing and traffic of one trace exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExchangeMetrics {
    /// Wall-clock time of the whole exchange.
    pub total_us: u64,
    /// Time blocked in `wait_any`.
    pub wait_us: u64,
    /// Messages posted.
    pub messages_sent: u64,
    /// Messages received.
    pub messages_received: u64,
    /// Values packed into sent messages.
    pub values_sent: u64,
    /// Values unpacked from received messages.
    pub values_received: u64,
}

impl ExchangeMetrics {
    /// Add `other` into `self`.
    pub fn accumulate(&mut self, other: &ExchangeMetrics) {
        self.total_us += other.total_us;
        self.wait_us += other.wait_us;
        self.messages_sent += other.messages_sent;
        self.messages_received += other.messages_received;
        self.values_sent += other.values_sent;
        self.values_received += other.values_received;
    }
}

/// Timing and traffic collected during a single step.
///
/// The stepper populates these fields after each `step()` call;
/// consumers read them from the most recent step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Time in `scale_rates`.
    pub scale_us: u64,
    /// Time in `intra_rhs`.
    pub intra_us: u64,
    /// Time in `inter_rhs`.
    pub inter_us: u64,
    /// Time in `add_rates`.
    pub add_us: u64,
    /// Stages executed.
    pub stages: u32,
    /// Exchange totals over all stages.
    pub exchange: ExchangeMetrics,
}
