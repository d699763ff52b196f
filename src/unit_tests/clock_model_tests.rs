// Copyright (c) Calibra Research
// SPDX-License-Identifier: Apache-2.0

use super::*;

#[test]
fn test_affine_identity() {
    let m = Affine::identity();
    assert_eq!(m.global_to_local_time(Time(42)), Time(42));
    assert_eq!(m.local_to_global_time(Time(42)), Time(42));
}

#[test]
fn test_affine_rejects_nonpositive_frequency() {
    assert!(Affine::new(0.0, Time::ZERO).is_err());
    assert!(Affine::new(-1.0, Time::ZERO).is_err());
    assert!(Affine::new(1.0, Time::ZERO).is_ok());
}

#[test]
fn test_affine_half_frequency() {
    // f=0.5: local = 0.5 * global
    let m = Affine::new(0.5, Time::ZERO).unwrap();
    assert_eq!(m.global_to_local_time(Time(4)), Time(2));
    assert_eq!(m.local_to_global_time(Time(2)), Time(4));
}

#[test]
fn test_affine_round_trip_exact_values() {
    // P1: global_to_local . local_to_global = identity, for values that divide exactly.
    let m = Affine::new(2.0, Time(10)).unwrap();
    for local in [Time(10), Time(12), Time(100), Time(1000)] {
        let global = m.local_to_global_time(local);
        assert_eq!(m.global_to_local_time(global), local);
    }
}

#[test]
fn test_affine_with_legacy_default() {
    let m = Affine::with_legacy_default();
    assert_eq!(m.global_to_local_time(Time(10)), Time(20));
}

#[test]
fn test_affine_delay_composition() {
    // P2: delay(now+d) = delay(now) + translate(d), within rounding, for an affine model.
    let m = Affine::new(0.5, Time::ZERO).unwrap();
    let now = Time(4);
    let d = Time(6);
    assert_eq!(m.global_to_local_delay(now, d), Time(3));
    assert_eq!(m.local_to_global_delay(Time(2), Time(3)), Time(6));
}

#[test]
fn test_periodic_rejects_nonpositive_params() {
    assert!(Periodic::new(Time(0), Time(0), Time(10), 1.0, Time::ZERO).is_err());
    assert!(Periodic::new(Time(0), Time(100), Time(0), 1.0, Time::ZERO).is_err());
    assert!(Periodic::new(Time(0), Time(100), Time(10), 0.0, Time::ZERO).is_err());
    assert!(Periodic::new(Time(0), Time(100), Time(10), 1.0, Time::ZERO).is_ok());
}

#[test]
fn test_periodic_identity_at_reference() {
    let m = Periodic::new(Time(0), Time(100), Time(10), 1.0, Time(50)).unwrap();
    assert_eq!(m.global_to_local_time(Time(50)), Time(50));
}

#[test]
fn test_periodic_round_trip() {
    let m = Periodic::new(Time(0), Time(100), Time(20), 2.0, Time(0)).unwrap();
    for global in [Time(-150), Time(-5), Time(0), Time(3), Time(40), Time(210)] {
        let local = m.global_to_local_time(global);
        let back = m.local_to_global_time(local);
        // within one tick of rounding, matching the affine-precision rule from §4.1.
        assert!((back.0 - global.0).abs() <= 1, "global={:?} local={:?} back={:?}", global, local, back);
    }
}

#[test]
fn test_periodic_round_trip_with_nonzero_delta() {
    // Regression test: local_to_global_time must anchor on x_ref_local, not
    // x_ref_global, or the round trip is off by exactly `delta` whenever
    // delta != 0. Same period/interval/slope (and thus the same per-point
    // rounding behaviour) as `test_periodic_round_trip`, just offset by a
    // nonzero delta and a nonzero x_ref_global.
    let m = Periodic::new(Time(10), Time(100), Time(20), 2.0, Time(1000)).unwrap();
    for global in [Time(850), Time(995), Time(1000), Time(1003), Time(1040), Time(1210)] {
        let local = m.global_to_local_time(global);
        let back = m.local_to_global_time(local);
        assert!((back.0 - global.0).abs() <= 1, "global={:?} local={:?} back={:?}", global, local, back);
    }
}

#[test]
fn test_any_clock_model_dispatch() {
    let affine: AnyClockModel = Affine::new(0.5, Time::ZERO).unwrap().into();
    assert_eq!(affine.global_to_local_time(Time(4)), Time(2));

    let periodic: AnyClockModel = Periodic::new(Time(0), Time(100), Time(10), 1.0, Time(50))
        .unwrap()
        .into();
    assert_eq!(periodic.global_to_local_time(Time(50)), Time(50));
}

#[test]
fn test_any_clock_model_default_is_identity() {
    let m = AnyClockModel::default();
    assert_eq!(m.global_to_local_time(Time(7)), Time(7));
}
