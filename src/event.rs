// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

//! Event payloads and handles.
//!
//! The queue owns a strong (`Arc`) reference to every payload, which is what
//! keeps it alive. Every [`EventId`] handed back to a caller — and every handle
//! recorded in a [`crate::local_clock::LocalClock`] — holds only a *weak*
//! reference. This is what makes supersession possible without ever cloning a
//! payload: the old and the new queue entry can share the same `Arc`, and the
//! simulator's `superseded` table decides which of the two weak handles still
//! gets to invoke it.

use crate::base_types::{ContextId, Time, NO_CONTEXT};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

#[cfg(test)]
#[path = "unit_tests/event_tests.rs"]
mod event_tests;

/// uid reserved for a handle that never refers to a real queued event.
pub const INVALID_UID: u32 = 0;
/// uid reserved for "now" sentinel events.
pub const NOW_UID: u32 = 1;
/// uid category shared conceptually by destroy events (each still gets its own
/// fresh uid from the allocator; see `SPEC_FULL.md` §4.4).
pub const DESTROY_CATEGORY_UID: u32 = 2;
/// The uid allocator never hands out a value below this; 0..=2 stay reserved.
pub const FIRST_ALLOCATED_UID: u32 = 4;

/// The work associated with a scheduled event. `invoke` must be a no-op once
/// `cancel` has been called — this is what lets the dispatcher pop a cancelled
/// event unconditionally without special-casing it in the loop (mirroring
/// `ns3::EventImpl::Invoke`, which silently skips cancelled events).
pub trait EventImpl: Send + Sync {
    fn invoke(&self);
    fn cancel(&self);
    fn is_cancelled(&self) -> bool;
}

/// A convenience payload wrapping a plain closure, for callers that do not need
/// a custom `EventImpl`.
pub struct ClosureEvent<F: Fn() + Send + Sync> {
    action: F,
    cancelled: AtomicBool,
}

impl<F: Fn() + Send + Sync> ClosureEvent<F> {
    pub fn new(action: F) -> Self {
        ClosureEvent {
            action,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn boxed(action: F) -> Arc<dyn EventImpl>
    where
        F: 'static,
    {
        Arc::new(ClosureEvent::new(action))
    }
}

impl<F: Fn() + Send + Sync> EventImpl for ClosureEvent<F> {
    fn invoke(&self) {
        if !self.is_cancelled() {
            (self.action)();
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Opaque handle to a scheduled event. Equality and hashing are by `uid` alone,
/// matching the "EventId equality is by uid" invariant; two handles to the same
/// logical event (e.g. before/after a clone) always compare equal.
/// Distinguishes ordinary queued events from destroy-category ones, which live
/// outside the main queue entirely (`LocalTimeSimulator::destroy_events`) and are
/// expired by a different rule (see `SPEC_FULL.md` §4.4).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventCategory {
    Normal,
    Destroy,
}

#[derive(Clone)]
pub struct EventId {
    payload: Weak<dyn EventImpl>,
    ts: Time,
    context: ContextId,
    uid: u32,
    category: EventCategory,
}

impl EventId {
    pub(crate) fn new(payload: &Arc<dyn EventImpl>, ts: Time, context: ContextId, uid: u32) -> Self {
        EventId {
            payload: Arc::downgrade(payload),
            ts,
            context,
            uid,
            category: EventCategory::Normal,
        }
    }

    pub(crate) fn new_destroy(payload: &Arc<dyn EventImpl>, ts: Time, uid: u32) -> Self {
        EventId {
            payload: Arc::downgrade(payload),
            ts,
            context: NO_CONTEXT,
            uid,
            category: EventCategory::Destroy,
        }
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn ts(&self) -> Time {
        self.ts
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// True while the queue (or `destroy_events`) still keeps the payload alive.
    pub fn payload_is_alive(&self) -> bool {
        self.payload.upgrade().is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        match self.payload.upgrade() {
            Some(payload) => payload.is_cancelled(),
            None => true,
        }
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<dyn EventImpl>> {
        self.payload.upgrade()
    }

    pub(crate) fn cancel(&self) {
        if let Some(payload) = self.payload.upgrade() {
            payload.cancel();
        }
    }
}

impl PartialEq for EventId {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}
impl Eq for EventId {}

impl std::hash::Hash for EventId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

impl std::fmt::Debug for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventId(uid={}, ts={:?}, context={:?})", self.uid, self.ts, self.context)
    }
}

/// The internal queue record: `{global_ts, context, uid, payload}`, ordered
/// primarily by `global_ts` and secondarily by `uid` (FIFO at equal times). Only
/// the key fields participate in ordering/equality: the payload is carried along
/// but never compared, which is what lets a placeholder `Event` (built from just
/// a uid/ts pair) be used to remove a real entry from a `BTreeSet`-backed
/// scheduler.
pub struct Event {
    pub global_ts: Time,
    pub context: ContextId,
    pub uid: u32,
    pub payload: Arc<dyn EventImpl>,
}

impl Event {
    pub fn key(&self) -> (Time, u32) {
        (self.global_ts, self.uid)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}
