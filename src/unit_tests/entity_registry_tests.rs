// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::clock_model::AnyClockModel;

#[test]
fn test_register_and_lookup() {
    let mut registry = EntityRegistry::new();
    let ctx = ContextId(1);
    assert!(registry.lookup(ctx).is_none());

    registry.register(ctx, LocalClock::new(AnyClockModel::default()));
    assert!(registry.lookup(ctx).is_some());
    assert!(registry.lookup(ContextId(2)).is_none());
}

#[test]
fn test_lookup_mut() {
    let mut registry = EntityRegistry::new();
    let ctx = ContextId(1);
    registry.register(ctx, LocalClock::new(AnyClockModel::default()));
    assert!(registry.lookup_mut(ctx).is_some());
}

#[test]
#[should_panic(expected = "no LocalClock registered")]
fn test_required_panics_when_missing() {
    let registry = EntityRegistry::new();
    registry.required(ContextId(99));
}

#[test]
fn test_required_mut_returns_registered_clock() {
    let mut registry = EntityRegistry::new();
    let ctx = ContextId(3);
    registry.register(ctx, LocalClock::new(AnyClockModel::default()));
    let _ = registry.required_mut(ctx);
}
