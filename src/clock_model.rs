// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

//! Pure global-time ↔ local-time translation. A `ClockModel` never touches the
//! event queue: every operation is a deterministic function of its own
//! configuration and the caller-supplied `now_global` reference.

use crate::base_types::{Duration, Time};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "unit_tests/clock_model_tests.rs"]
mod clock_model_tests;

/// An affine (perfect) clock: `local = frequency * global + offset`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Affine {
    frequency: f64,
    offset: Duration,
}

/// The legacy ns-3 `PerfectClockModelImpl` default frequency, preserved so that
/// scenarios built against the original defaults replay bit-for-bit.
pub const LEGACY_DEFAULT_FREQUENCY: f64 = 2.0;

impl Affine {
    /// Identity clock: `frequency = 1`, `offset = 0`.
    pub fn identity() -> Self {
        Affine {
            frequency: 1.0,
            offset: Duration::ZERO,
        }
    }

    /// `frequency` must be strictly positive; this is a construction-time
    /// validation error, not a run-time precondition violation.
    pub fn new(frequency: f64, offset: Duration) -> Result<Self> {
        ensure!(
            frequency > 0.0,
            "Affine clock model requires a positive frequency, got {}",
            frequency
        );
        Ok(Affine { frequency, offset })
    }

    /// Constructor matching the original C++ default (`frequency = 2`), kept for
    /// bit-exact replay of scenarios that relied on the implicit default.
    pub fn with_legacy_default() -> Self {
        Affine {
            frequency: LEGACY_DEFAULT_FREQUENCY,
            offset: Duration::ZERO,
        }
    }
}

/// A periodic, piecewise-affine clock modelling a clock correction protocol that
/// is re-synchronized every `period` ticks, converging towards `x_ref_global`
/// within each cycle. See §4.1 for the segment definitions.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Periodic {
    delta: Duration,
    period: Duration,
    interval: Duration,
    slope: f64,
    x_ref_global: Time,
}

impl Periodic {
    pub fn new(
        delta: Duration,
        period: Duration,
        interval: Duration,
        slope: f64,
        x_ref_global: Time,
    ) -> Result<Self> {
        ensure!(period.0 > 0, "Periodic clock model requires a positive period");
        ensure!(interval.0 > 0, "Periodic clock model requires a positive interval");
        ensure!(slope > 0.0, "Periodic clock model requires a positive slope");
        Ok(Periodic {
            delta,
            period,
            interval,
            slope,
            x_ref_global,
        })
    }

    /// Global-axis boundary of segment B/C within a cycle, relative to the cycle start.
    fn rho(&self) -> Time {
        Time((self.interval.0 as f64 / self.slope) as i64)
    }

    /// Map a coordinate `u` relative to the start of its cycle (global axis) to the
    /// local-axis coordinate relative to the start of the corresponding local cycle.
    fn within_cycle_global_to_local(&self, u: Time) -> Time {
        let rho = self.rho();
        let half_delta = Time(self.delta.0 / 2);
        if u.0 <= 0 {
            u - half_delta
        } else if u.0 <= rho.0 {
            Time((self.slope * u.0 as f64) as i64) - half_delta
        } else if u.0 <= rho.0 + self.interval.0 {
            Time((((u.0 - rho.0) as f64) / self.slope) as i64) + self.interval - half_delta
        } else {
            u - half_delta
        }
    }

    /// Symmetric construction on the local axis (signs of `delta` flipped).
    fn within_cycle_local_to_global(&self, u: Time) -> Time {
        let half_delta = Time(self.delta.0 / 2);
        if u.0 <= 0 {
            u + half_delta
        } else if u.0 <= self.interval.0 {
            Time(((u.0 as f64) / self.slope) as i64) + half_delta
        } else if u.0 <= self.interval.0 + self.rho().0 {
            Time((self.slope * ((u.0 - self.interval.0) as f64)) as i64) + self.interval + half_delta
        } else {
            u + half_delta
        }
    }
}

/// The translation contract implemented by every clock variant. Kept as a trait
/// (rather than an enum of segments baked into the simulator) so that additional
/// variants can be added without touching `LocalClock` or `LocalTimeSimulator`.
pub trait ClockModel {
    fn global_to_local_time(&self, global: Time) -> Time;
    fn local_to_global_time(&self, local: Time) -> Time;

    fn local_now(&self, now_global: Time) -> Time {
        self.global_to_local_time(now_global)
    }

    fn global_to_local_delay(&self, now_global: Time, delay: Duration) -> Duration {
        self.global_to_local_time(now_global + delay) - self.local_now(now_global)
    }

    fn local_to_global_delay(&self, now_global: Time, delay: Duration) -> Duration {
        self.local_to_global_time(self.local_now(now_global) + delay) - now_global
    }
}

impl ClockModel for Affine {
    fn global_to_local_time(&self, global: Time) -> Time {
        Time((self.frequency * global.0 as f64) as i64) + self.offset
    }

    fn local_to_global_time(&self, local: Time) -> Time {
        Time((((local - self.offset).0 as f64) / self.frequency) as i64)
    }
}

impl ClockModel for Periodic {
    fn global_to_local_time(&self, global: Time) -> Time {
        let offset = global - self.x_ref_global;
        let cycles = offset.0.div_euclid(self.period.0);
        let u = Time(offset.0.rem_euclid(self.period.0));
        self.within_cycle_global_to_local(u) + Time(cycles * self.period.0) + self.x_ref_global
    }

    fn local_to_global_time(&self, local: Time) -> Time {
        let x_ref_local = self.global_to_local_time(self.x_ref_global);
        let offset = local - x_ref_local;
        let cycles = offset.0.div_euclid(self.period.0);
        let u = Time(offset.0.rem_euclid(self.period.0));
        self.within_cycle_local_to_global(u) + x_ref_local + Time(cycles * self.period.0)
    }
}

/// A tagged union of the clock variants supported by this core, used as the
/// concrete type stored in [`crate::local_clock::LocalClock`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum AnyClockModel {
    Affine(Affine),
    Periodic(Periodic),
}

impl From<Affine> for AnyClockModel {
    fn from(model: Affine) -> Self {
        AnyClockModel::Affine(model)
    }
}

impl From<Periodic> for AnyClockModel {
    fn from(model: Periodic) -> Self {
        AnyClockModel::Periodic(model)
    }
}

impl ClockModel for AnyClockModel {
    fn global_to_local_time(&self, global: Time) -> Time {
        match self {
            AnyClockModel::Affine(m) => m.global_to_local_time(global),
            AnyClockModel::Periodic(m) => m.global_to_local_time(global),
        }
    }

    fn local_to_global_time(&self, local: Time) -> Time {
        match self {
            AnyClockModel::Affine(m) => m.local_to_global_time(local),
            AnyClockModel::Periodic(m) => m.local_to_global_time(local),
        }
    }
}

impl Default for AnyClockModel {
    fn default() -> Self {
        AnyClockModel::Affine(Affine::identity())
    }
}
