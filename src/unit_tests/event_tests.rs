// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

use super::*;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

#[test]
fn test_closure_event_invokes_once_unless_cancelled() {
    let counter = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&counter);
    let payload = ClosureEvent::boxed(move || {
        c.fetch_add(1, AtomicOrdering::SeqCst);
    });
    payload.invoke();
    payload.invoke();
    assert_eq!(counter.load(AtomicOrdering::SeqCst), 2);
}

#[test]
fn test_cancel_suppresses_invoke() {
    let counter = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&counter);
    let payload = ClosureEvent::boxed(move || {
        c.fetch_add(1, AtomicOrdering::SeqCst);
    });
    payload.cancel();
    payload.invoke();
    assert_eq!(counter.load(AtomicOrdering::SeqCst), 0);
    assert!(payload.is_cancelled());
}

#[test]
fn test_event_id_equality_is_by_uid() {
    let payload: Arc<dyn EventImpl> = ClosureEvent::boxed(|| {});
    let a = EventId::new(&payload, Time(1), NO_CONTEXT, 10);
    let b = EventId::new(&payload, Time(2), ContextId(1), 10);
    let c = EventId::new(&payload, Time(1), NO_CONTEXT, 11);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_event_id_payload_liveness() {
    let payload: Arc<dyn EventImpl> = ClosureEvent::boxed(|| {});
    let id = EventId::new(&payload, Time(1), NO_CONTEXT, 20);
    assert!(id.payload_is_alive());
    drop(payload);
    assert!(!id.payload_is_alive());
    assert!(id.is_cancelled()); // a dead payload counts as cancelled-from-the-outside.
}

#[test]
fn test_event_id_cancel_propagates_to_payload() {
    let payload: Arc<dyn EventImpl> = ClosureEvent::boxed(|| {});
    let id = EventId::new(&payload, Time(1), NO_CONTEXT, 21);
    assert!(!id.is_cancelled());
    id.cancel();
    assert!(id.is_cancelled());
    assert!(payload.is_cancelled());
}

#[test]
fn test_event_category_default_and_destroy() {
    let payload: Arc<dyn EventImpl> = ClosureEvent::boxed(|| {});
    let normal = EventId::new(&payload, Time(1), NO_CONTEXT, 22);
    let destroy = EventId::new_destroy(&payload, Time(1), 23);
    assert_eq!(normal.category(), EventCategory::Normal);
    assert_eq!(destroy.category(), EventCategory::Destroy);
    assert_eq!(destroy.context(), NO_CONTEXT);
}

#[test]
fn test_event_ordering_by_ts_then_uid() {
    let payload: Arc<dyn EventImpl> = ClosureEvent::boxed(|| {});
    let e1 = Event {
        global_ts: Time(5),
        context: NO_CONTEXT,
        uid: 1,
        payload: Arc::clone(&payload),
    };
    let e2 = Event {
        global_ts: Time(5),
        context: NO_CONTEXT,
        uid: 2,
        payload: Arc::clone(&payload),
    };
    let e3 = Event {
        global_ts: Time(4),
        context: NO_CONTEXT,
        uid: 100,
        payload,
    };
    assert!(e1 < e2);
    assert!(e3 < e1);
}
