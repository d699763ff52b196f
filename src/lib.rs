// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

//! Discrete-event simulation core with per-entity local clocks.
//!
//! Four cooperating components, leaves first: [`clock_model`] (pure time-domain
//! translation), [`local_clock`] (per-entity clock + outstanding-event list),
//! [`entity_registry`] (context id → clock lookup) and [`simulator`] (the
//! priority-queue dispatch loop and the re-schedule protocol that ties the
//! other three together).

/// Common time and context-id definitions.
pub mod base_types;

/// Clock models: affine and periodic global↔local time translation.
pub mod clock_model;

/// Event payloads and handles.
pub mod event;

/// Per-entity clock façade and the re-schedule protocol's data half.
pub mod local_clock;

/// Context-id → `LocalClock` lookup.
pub mod entity_registry;

/// The pluggable priority queue behind the simulator.
pub mod scheduler;

/// The discrete-event dispatch loop.
pub mod simulator;

pub use base_types::{ContextId, Duration, Time, NO_CONTEXT};
pub use clock_model::{Affine, AnyClockModel, ClockModel, Periodic};
pub use entity_registry::EntityRegistry;
pub use event::{ClosureEvent, Event, EventCategory, EventId, EventImpl};
pub use local_clock::LocalClock;
pub use scheduler::{BTreeScheduler, Scheduler};
pub use simulator::{Injector, LocalTimeSimulator, LOCAL_TIME_SIMULATOR_IMPL};
