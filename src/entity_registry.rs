// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

//! A numeric-context-id → [`LocalClock`] lookup. Populated once during
//! simulation setup and then consulted by `LocalTimeSimulator` whenever a
//! `schedule`-family call needs to translate a local delay into a global one.

use crate::base_types::ContextId;
use crate::local_clock::LocalClock;
use std::collections::HashMap;

#[cfg(test)]
#[path = "unit_tests/entity_registry_tests.rs"]
mod entity_registry_tests;

#[derive(Default)]
pub struct EntityRegistry {
    clocks: HashMap<ContextId, LocalClock>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        EntityRegistry {
            clocks: HashMap::new(),
        }
    }

    /// Attach a clock to an entity's context id, for use by simulation setup code.
    pub fn register(&mut self, context: ContextId, clock: LocalClock) {
        self.clocks.insert(context, clock);
    }

    pub fn lookup(&self, context: ContextId) -> Option<&LocalClock> {
        self.clocks.get(&context)
    }

    pub fn lookup_mut(&mut self, context: ContextId) -> Option<&mut LocalClock> {
        self.clocks.get_mut(&context)
    }

    /// Precondition: `context` is registered. Fatal (`no-such-entity`) otherwise.
    pub fn required(&self, context: ContextId) -> &LocalClock {
        self.lookup(context)
            .unwrap_or_else(|| panic!("no LocalClock registered for context {:?}", context))
    }

    pub fn required_mut(&mut self, context: ContextId) -> &mut LocalClock {
        self.lookup_mut(context)
            .unwrap_or_else(|| panic!("no LocalClock registered for context {:?}", context))
    }
}
