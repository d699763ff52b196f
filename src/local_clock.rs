// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

//! Per-entity façade over a [`ClockModel`]. A `LocalClock` is deliberately a thin
//! data holder: it owns the current model and the list of outstanding event
//! handles the entity has queued, but it never reaches back into the simulator.
//! The re-schedule protocol that needs both the clock *and* the simulator's
//! queue/uid allocator lives on [`crate::simulator::LocalTimeSimulator`], which
//! looks clocks up through the [`crate::entity_registry::EntityRegistry`] rather
//! than the clock holding a strong (or even weak) handle back to its owner.

use crate::base_types::{Duration, Time};
use crate::clock_model::{AnyClockModel, ClockModel};
use crate::event::EventId;

#[cfg(test)]
#[path = "unit_tests/local_clock_tests.rs"]
mod local_clock_tests;

#[derive(Debug)]
pub struct LocalClock {
    model: AnyClockModel,
    events: Vec<EventId>,
}

impl LocalClock {
    pub fn new(model: AnyClockModel) -> Self {
        LocalClock {
            model,
            events: Vec::new(),
        }
    }

    pub fn model(&self) -> &AnyClockModel {
        &self.model
    }

    pub fn get_local_time(&self, now_global: Time) -> Time {
        self.model.local_now(now_global)
    }

    pub fn global_to_local_time(&self, global: Time) -> Time {
        self.model.global_to_local_time(global)
    }

    pub fn local_to_global_time(&self, local: Time) -> Time {
        self.model.local_to_global_time(local)
    }

    pub fn global_to_local_delay(&self, now_global: Time, delay: Duration) -> Duration {
        self.model.global_to_local_delay(now_global, delay)
    }

    pub fn local_to_global_delay(&self, now_global: Time, delay: Duration) -> Duration {
        self.model.local_to_global_delay(now_global, delay)
    }

    /// Record an outstanding event on behalf of the owning entity. Lazily evicts
    /// expired handles first; the same uid must never be inserted twice.
    pub fn insert_event(&mut self, event: EventId) {
        debug_assert!(
            !self.events.iter().any(|e| e.uid() == event.uid()),
            "uid {:?} inserted twice into the same LocalClock",
            event.uid()
        );
        self.evict_expired();
        self.events.push(event);
    }

    fn evict_expired(&mut self) {
        self.events.retain(|id| id.payload_is_alive());
    }

    /// First half of the re-schedule protocol (§4.2): evict expired handles,
    /// snapshot and clear the surviving ones, and install the new model. Returns
    /// the old model (needed to compute each handle's remaining local duration)
    /// and the snapshot the simulator must re-enter `schedule` with.
    pub(crate) fn begin_reschedule(&mut self, new_model: AnyClockModel) -> (AnyClockModel, Vec<EventId>) {
        self.evict_expired();
        let snapshot = std::mem::take(&mut self.events);
        let old_model = std::mem::replace(&mut self.model, new_model);
        (old_model, snapshot)
    }
}
