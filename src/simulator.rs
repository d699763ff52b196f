// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

//! The discrete-event loop. `LocalTimeSimulator` owns the event queue, the
//! per-entity clock registry, and the supersession table that makes the
//! re-schedule protocol possible. See `SPEC_FULL.md` §4.4 for the contract.

use crate::base_types::{ContextId, Duration, Time, NO_CONTEXT};
use crate::clock_model::{AnyClockModel, ClockModel};
use crate::entity_registry::EntityRegistry;
use crate::event::{ClosureEvent, Event, EventCategory, EventId, EventImpl};
use crate::scheduler::{BTreeScheduler, Scheduler};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(test)]
#[path = "unit_tests/simulator_tests.rs"]
mod simulator_tests;

/// Associated constant callers can match on when dispatching by implementation
/// name, mirroring `ns3::TypeId::LookupByName("ns3::LocalTimeSimulatorImpl")`.
pub const LOCAL_TIME_SIMULATOR_IMPL: &str = "LocalTimeSimulatorImpl";

/// A pending cross-thread injection: `schedule_with_context` called off the main
/// thread parks one of these until the next drain point.
struct PendingCrossEvent {
    context: ContextId,
    delay_global: Duration,
    payload: Arc<dyn EventImpl>,
}

/// The only handle that may cross a thread boundary. `LocalTimeSimulator` itself
/// is intentionally not `Send`: its queue, registry and counters are exclusively
/// owned by the main thread once `run` begins.
#[derive(Clone)]
pub struct Injector {
    pending: Arc<Mutex<VecDeque<PendingCrossEvent>>>,
    nonempty: Arc<AtomicBool>,
}

impl Injector {
    /// Park an event to be materialised into the queue at the next drain point.
    /// `delay_global` is always a global-time delay, regardless of the target
    /// entity's clock (see `SPEC_FULL.md` §4.4's rationale for the
    /// `schedule_with_context` split).
    pub fn schedule_with_context(&self, context: ContextId, delay_global: Duration, payload: Arc<dyn EventImpl>) {
        assert!(!delay_global.is_negative(), "schedule_with_context requires a non-negative delay");
        let mut pending = self.pending.lock().unwrap();
        pending.push_back(PendingCrossEvent {
            context,
            delay_global,
            payload,
        });
        self.nonempty.store(true, Ordering::SeqCst);
    }
}

pub struct LocalTimeSimulator {
    events_queue: Box<dyn Scheduler>,
    destroy_events: Vec<EventId>,
    cross_pending: Arc<Mutex<VecDeque<PendingCrossEvent>>>,
    cross_nonempty: Arc<AtomicBool>,
    superseded: HashMap<u32, EventId>,
    registry: EntityRegistry,
    current_ts: Time,
    current_uid: u32,
    current_context: ContextId,
    next_uid: u32,
    unscheduled_count: i64,
    event_count: u64,
    stop_flag: Arc<AtomicBool>,
    main_thread_id: Option<std::thread::ThreadId>,
}

impl Default for LocalTimeSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTimeSimulator {
    pub fn new() -> Self {
        LocalTimeSimulator {
            events_queue: Box::new(BTreeScheduler::new()),
            destroy_events: Vec::new(),
            cross_pending: Arc::new(Mutex::new(VecDeque::new())),
            cross_nonempty: Arc::new(AtomicBool::new(false)),
            superseded: HashMap::new(),
            registry: EntityRegistry::new(),
            current_ts: Time::ZERO,
            current_uid: crate::event::INVALID_UID,
            current_context: NO_CONTEXT,
            next_uid: crate::event::FIRST_ALLOCATED_UID,
            unscheduled_count: 0,
            event_count: 0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            main_thread_id: None,
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// A cloneable, `Send + Sync` handle callable from any thread. The simulator
    /// itself never crosses a thread boundary.
    pub fn injector(&self) -> Injector {
        Injector {
            pending: Arc::clone(&self.cross_pending),
            nonempty: Arc::clone(&self.cross_nonempty),
        }
    }

    /// Swap the priority queue implementation, draining the old one into the
    /// new. Only meaningful between runs: calling this mid-`run` would disturb
    /// the queue-ordering invariant out from under the dispatch loop.
    pub fn set_scheduler(&mut self, mut new_scheduler: Box<dyn Scheduler>) {
        self.events_queue.drain_into(new_scheduler.as_mut());
        self.events_queue = new_scheduler;
    }

    fn alloc_uid(&mut self) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    fn assert_main_thread(&self, what: &str) {
        if let Some(id) = self.main_thread_id {
            assert_eq!(
                id,
                std::thread::current().id(),
                "{} must be called from the simulator's main thread",
                what
            );
        }
    }

    /// Interprets `local_delay` in the local time of `current_context`, or as a
    /// bare global delay when no entity is executing.
    pub fn schedule(&mut self, local_delay: Duration, payload: Arc<dyn EventImpl>) -> EventId {
        self.assert_main_thread("schedule");
        assert!(!local_delay.is_negative(), "schedule requires a non-negative delay");

        let global_delay = if self.current_context == NO_CONTEXT {
            local_delay
        } else {
            let clock = self.registry.required(self.current_context);
            clock.local_to_global_delay(self.current_ts, local_delay)
        };
        let tabs = self.current_ts + global_delay;

        log::trace!(
            "schedule: context={:?} local_delay={:?} -> tabs={:?}",
            self.current_context,
            local_delay,
            tabs
        );

        let uid = self.alloc_uid();
        let context = self.current_context;
        let handle = EventId::new(&payload, tabs, context, uid);
        self.events_queue.insert(Event {
            global_ts: tabs,
            context,
            uid,
            payload,
        });
        self.unscheduled_count += 1;

        if context != NO_CONTEXT {
            self.registry.required_mut(context).insert_event(handle.clone());
        }
        handle
    }

    /// Always a global-time delay, regardless of the destination entity's clock.
    /// Off the main thread, use [`Self::injector`] instead — this method panics
    /// if called from any thread other than the one `run` was started on.
    pub fn schedule_with_context(&mut self, context: ContextId, global_delay: Duration, payload: Arc<dyn EventImpl>) {
        self.assert_main_thread("schedule_with_context");
        assert!(!global_delay.is_negative(), "schedule_with_context requires a non-negative delay");

        let tabs = self.current_ts + global_delay;
        log::trace!("schedule_with_context: context={:?} tabs={:?}", context, tabs);
        let uid = self.alloc_uid();
        self.events_queue.insert(Event {
            global_ts: tabs,
            context,
            uid,
            payload,
        });
        self.unscheduled_count += 1;
    }

    pub fn schedule_now(&mut self, payload: Arc<dyn EventImpl>) -> EventId {
        self.schedule(Duration::ZERO, payload)
    }

    /// Appends to `destroy_events`; executed (in insertion order) at `destroy()`
    /// time, never during `run()`. Gets a fresh uid, unlike the original's
    /// aliased constant for every destroy event.
    pub fn schedule_destroy(&mut self, payload: Arc<dyn EventImpl>) -> EventId {
        let uid = self.alloc_uid();
        let handle = EventId::new_destroy(&payload, self.current_ts, uid);
        log::trace!("schedule_destroy: uid={}", uid);
        self.destroy_events.push(handle.clone());
        handle
    }

    /// Marks the payload cancelled; it is still popped by the dispatcher but its
    /// invocation becomes a no-op. Idempotent.
    pub fn cancel(&mut self, id: &EventId) {
        id.cancel();
    }

    /// Registers `superseded[old.uid] = new`, the hook used by the `LocalClock`
    /// re-schedule protocol. Does not touch the old payload.
    pub(crate) fn cancel_rescheduling(&mut self, old: &EventId, new: EventId) {
        self.superseded.insert(old.uid(), new);
    }

    /// Eagerly removes the event from wherever it lives (the queue, or
    /// `destroy_events` for a destroy-category handle) and cancels the payload.
    pub fn remove(&mut self, id: &EventId) {
        id.cancel();
        match id.category() {
            EventCategory::Normal => {
                let payload = match id.upgrade() {
                    Some(p) => p,
                    None => return,
                };
                let key = Event {
                    global_ts: id.ts(),
                    context: id.context(),
                    uid: id.uid(),
                    payload,
                };
                if self.events_queue.remove(&key).is_some() {
                    self.unscheduled_count -= 1;
                }
            }
            EventCategory::Destroy => {
                self.destroy_events.retain(|e| e.uid() != id.uid());
            }
        }
    }

    /// See `SPEC_FULL.md` §4.4 for the full rule. Destroy-category handles are
    /// expired iff no longer present in `destroy_events`; ordinary handles are
    /// expired by supersession, payload death, or having already been passed by
    /// `current_ts`/`current_uid`.
    pub fn is_expired(&self, id: &EventId) -> bool {
        if id.category() == EventCategory::Destroy {
            return !self.destroy_events.iter().any(|e| e.uid() == id.uid());
        }
        if let Some(superseding) = self.superseded.get(&id.uid()) {
            if superseding.ts() <= self.current_ts {
                return true;
            }
        }
        if !id.payload_is_alive() || id.is_cancelled() {
            return true;
        }
        if id.ts().0 < self.current_ts.0 {
            return true;
        }
        if id.ts() == self.current_ts && id.uid() <= self.current_uid {
            return true;
        }
        false
    }

    fn drain_pending(&mut self) {
        if !self.cross_nonempty.load(Ordering::SeqCst) {
            return;
        }
        let drained: Vec<PendingCrossEvent> = {
            let mut pending = self.cross_pending.lock().unwrap();
            let drained = pending.drain(..).collect();
            self.cross_nonempty.store(false, Ordering::SeqCst);
            drained
        };
        for entry in drained {
            let tabs = self.current_ts + entry.delay_global;
            let uid = self.alloc_uid();
            log::trace!("drain_pending: context={:?} tabs={:?}", entry.context, tabs);
            self.events_queue.insert(Event {
                global_ts: tabs,
                context: entry.context,
                uid,
                payload: entry.payload,
            });
            self.unscheduled_count += 1;
        }
    }

    /// Pops events until one survives supersession (or the queue runs dry),
    /// advances `current_ts`/`current_uid`/`current_context`, and returns it
    /// ready to invoke. Factored out of `run` so that [`Self::run_shared`] can
    /// release its lock before calling into the payload.
    fn pop_ready(&mut self) -> Option<Event> {
        loop {
            let event = self.events_queue.remove_next()?;
            if let Some(superseding) = self.superseded.remove(&event.uid) {
                log::trace!("run: dropping superseded uid={} (-> {:?})", event.uid, superseding.uid());
                self.unscheduled_count -= 1;
                continue;
            }
            assert!(
                event.global_ts.0 >= self.current_ts.0,
                "event queue went backwards: {:?} < {:?}",
                event.global_ts,
                self.current_ts
            );
            self.current_ts = event.global_ts;
            self.current_uid = event.uid;
            if event.context != NO_CONTEXT {
                self.current_context = event.context;
            }
            return Some(event);
        }
    }

    fn finish_dispatch(&mut self, event: Event) {
        self.event_count += 1;
        self.unscheduled_count -= 1;
        drop(event);
    }

    fn check_queue_invariant(&self) {
        if self.events_queue.is_empty() {
            assert_eq!(
                self.unscheduled_count, 0,
                "unscheduled_count out of sync with an empty queue: {}",
                self.unscheduled_count
            );
        }
    }

    /// Runs until the queue is empty or `stop` has been called. Sets the main
    /// thread id on entry, which subsequent single-thread-only operations are
    /// checked against. Payloads invoked this way cannot re-enter `schedule` on
    /// this same `&mut self` (there is no handle to do so with) — use
    /// [`Self::run_shared`] when a payload needs to reschedule itself.
    pub fn run(&mut self) {
        self.main_thread_id = Some(std::thread::current().id());
        self.drain_pending();

        while !self.events_queue.is_empty() && !self.stop_flag.load(Ordering::SeqCst) {
            self.drain_pending();
            let event = match self.pop_ready() {
                Some(e) => e,
                None => break,
            };
            log::debug!("run: dispatching uid={} ts={:?} context={:?}", event.uid, event.global_ts, event.context);
            event.payload.invoke();
            self.finish_dispatch(event);
            self.drain_pending();
        }

        self.check_queue_invariant();
    }

    /// Same dispatch loop as [`Self::run`], but driven through a shared handle
    /// so the lock is released while the payload executes. This is what lets an
    /// `EventImpl::invoke` call back into `schedule` on the very simulator that
    /// is running it, without deadlocking on its own lock (see `SPEC_FULL.md`
    /// §4.4's chained-scheduling scenario).
    pub fn run_shared(shared: &Arc<Mutex<LocalTimeSimulator>>) {
        {
            let mut sim = shared.lock().unwrap();
            sim.main_thread_id = Some(std::thread::current().id());
            sim.drain_pending();
        }
        loop {
            let event = {
                let mut sim = shared.lock().unwrap();
                if sim.events_queue.is_empty() || sim.stop_flag.load(Ordering::SeqCst) {
                    break;
                }
                sim.drain_pending();
                sim.pop_ready()
            };
            let event = match event {
                Some(e) => e,
                None => break,
            };
            log::debug!("run_shared: dispatching uid={} ts={:?} context={:?}", event.uid, event.global_ts, event.context);
            event.payload.invoke();
            let mut sim = shared.lock().unwrap();
            sim.finish_dispatch(event);
            sim.drain_pending();
        }
        shared.lock().unwrap().check_queue_invariant();
    }

    pub fn stop(&mut self) {
        log::debug!("stop: immediate");
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn stop_after(&mut self, delay: Duration) {
        let flag = Arc::clone(&self.stop_flag);
        self.schedule(
            delay,
            ClosureEvent::boxed(move || {
                flag.store(true, Ordering::SeqCst);
            }),
        );
    }

    /// Invokes each non-cancelled destroy event, in insertion order. Never
    /// called implicitly by `run`.
    pub fn destroy(&mut self) {
        log::debug!("destroy: running {} destroy events", self.destroy_events.len());
        for id in std::mem::take(&mut self.destroy_events) {
            if let Some(payload) = id.upgrade() {
                payload.invoke();
            }
        }
    }

    pub fn now(&self) -> Time {
        self.current_ts
    }

    pub fn delay_left(&self, id: &EventId) -> Time {
        if self.is_expired(id) {
            Time::ZERO
        } else {
            id.ts() - self.current_ts
        }
    }

    pub fn max_simulation_time(&self) -> Time {
        Time::max_value()
    }

    pub fn system_id(&self) -> u32 {
        0
    }

    pub fn context(&self) -> ContextId {
        self.current_context
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Orchestrates the re-schedule protocol of `SPEC_FULL.md` §4.2: asks the
    /// `LocalClock` to evict/snapshot/swap its model, then re-enters `schedule`
    /// for each surviving handle under the new model and registers the
    /// resulting supersession. `LocalClock` itself never calls back into this
    /// type — see the cyclic-reference design note in §9.
    pub fn set_clock(&mut self, context: ContextId, new_model: AnyClockModel) {
        if self.main_thread_id.is_none() {
            log::warn!("set_clock called before run(): no queue exists yet to supersede");
        }
        let (old_model, snapshot) = self.registry.required_mut(context).begin_reschedule(new_model);
        let now = self.current_ts;

        let saved_context = self.current_context;
        self.current_context = context;
        for old_handle in snapshot {
            let local_remaining = old_model.global_to_local_delay(now, old_handle.ts() - now);
            let payload = match old_handle.upgrade() {
                Some(p) => p,
                None => continue,
            };
            let new_handle = self.schedule(local_remaining, payload);
            self.cancel_rescheduling(&old_handle, new_handle);
        }
        self.current_context = saved_context;
    }
}
