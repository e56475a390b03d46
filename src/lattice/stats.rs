// SPDX-License-Identifier: AGPL-3.0-only

//! Call counters and elapsed time per kernel family.
//!
//! The caller owns a [`KernelStats`] and passes it `&mut` into every kernel
//! call, so concurrent callers each accumulate into their own context and
//! merge afterwards. Each call records exactly once, after its parallel
//! section has joined.

use std::time::{Duration, Instant};

use log::info;

/// Call count and accumulated wall time for one kernel family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallTimer {
    pub calls: u64,
    pub elapsed: Duration,
}

impl CallTimer {
    /// Count one call that started at `start`.
    pub fn record(&mut self, start: Instant) {
        self.calls += 1;
        self.elapsed += start.elapsed();
    }

    pub fn merge(&mut self, other: &Self) {
        self.calls += other.calls;
        self.elapsed += other.elapsed;
    }

    /// Mean wall time per call in microseconds (0 when never called).
    #[must_use]
    pub fn mean_us(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.elapsed.as_secs_f64() * 1e6 / self.calls as f64
        }
    }
}

/// Diagnostics for the forward/adjoint band applies and the exact inverses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KernelStats {
    /// `m5d`, `m5d_dag` and their shifted variants.
    pub m5d: CallTimer,
    /// `mooee_inv`, `mooee_inv_dag` and their shifted variants.
    pub mooee_inv: CallTimer,
}

impl KernelStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: &Self) {
        self.m5d.merge(&other.m5d);
        self.mooee_inv.merge(&other.mooee_inv);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn log_summary(&self) {
        info!(
            "M5D: {} calls, {:.3} ms total, {:.2} us/call",
            self.m5d.calls,
            self.m5d.elapsed.as_secs_f64() * 1e3,
            self.m5d.mean_us()
        );
        info!(
            "MooeeInv: {} calls, {:.3} ms total, {:.2} us/call",
            self.mooee_inv.calls,
            self.mooee_inv.elapsed.as_secs_f64() * 1e3,
            self.mooee_inv.mean_us()
        );
    }
}
