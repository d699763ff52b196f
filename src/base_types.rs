// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

//! Time primitives shared by every component of the core: a monotonic tick count
//! used for both the global axis and any entity's local axis, and the context-id
//! type used to address entities.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
#[path = "unit_tests/base_types_tests.rs"]
mod base_types_tests;

/// A tick count, saturating within the signed 64-bit range. Used both as an absolute
/// instant (global or local time) and, via the same representation, as a duration
/// (a displacement on either axis).
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Serialize, Deserialize, Default)]
pub struct Time(pub i64);

/// A displacement on a time axis. Distinct from [`Time`] only by name, to keep call
/// sites self-documenting; the two freely interoperate via the `Add`/`Sub` impls below.
pub type Duration = Time;

/// Identifies the entity a scheduled event belongs to. The sentinel
/// [`NO_CONTEXT`] denotes "no entity" (application-level stop events, etc.).
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Serialize, Deserialize, Debug)]
pub struct ContextId(pub u32);

/// Reserved context id meaning "no entity is executing".
pub const NO_CONTEXT: ContextId = ContextId(0xFFFF_FFFF);

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl Time {
    pub const ZERO: Time = Time(0);

    /// The maximum positive representable tick count.
    pub fn max_value() -> Time {
        Time(i64::MAX)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl std::ops::Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Neg for Time {
    type Output = Time;
    fn neg(self) -> Time {
        Time(self.0.checked_neg().unwrap_or(i64::MAX))
    }
}
