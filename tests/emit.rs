//! End-to-end: payload in, location events out.

use route_replay::{
    flatten, parse_route, Emitter, Spacing, Trace, TraceOptions,
};
use serde_json::json;

/// An L around a block in Washington DC: due west, then due north. Two real
/// steps plus the arrival marker.
fn block_payload() -> String {
    json!({ "routes": [{ "duration": 20.4, "legs": [{ "steps": [
        {
            "distance": 24.5, "duration": 7.0,
            "geometry": { "coordinates": [
                [-77.032395, 38.912603],
                [-77.032595, 38.912603],
                [-77.032678, 38.912603],
            ]}
        },
        {
            "distance": 83.9, "duration": 13.4,
            "geometry": { "coordinates": [
                [-77.032678, 38.912603],
                [-77.032678, 38.91315],
                [-77.032675, 38.913357],
            ]}
        },
        {
            "distance": 0.0, "duration": 0.0,
            "geometry": { "coordinates": [[-77.032675, 38.913357]] }
        },
    ]}]}]})
    .to_string()
}

/// The same block plus a third eastward step, for the acceldecel scenario.
fn three_step_payload() -> String {
    json!({ "routes": [{ "legs": [{ "steps": [
        {
            "distance": 24.5, "duration": 7.0,
            "geometry": { "coordinates": [
                [-77.032395, 38.912603],
                [-77.032595, 38.912603],
                [-77.032678, 38.912603],
            ]}
        },
        {
            "distance": 83.9, "duration": 13.4,
            "geometry": { "coordinates": [
                [-77.032678, 38.912603],
                [-77.032678, 38.91315],
                [-77.032675, 38.913357],
            ]}
        },
        {
            "distance": 24.2, "duration": 6.0,
            "geometry": { "coordinates": [
                [-77.032675, 38.913357],
                [-77.032520, 38.913357],
                [-77.032395, 38.913357],
            ]}
        },
        {
            "distance": 0.0, "duration": 0.0,
            "geometry": { "coordinates": [[-77.032395, 38.913357]] }
        },
    ]}]}]})
    .to_string()
}

fn block_trace(spacing: Spacing) -> Trace {
    let payload = parse_route(&block_payload()).unwrap();
    Trace::from_route(&payload, &TraceOptions { spacing }).unwrap()
}

#[test]
fn flattening_drops_the_arrival_step() {
    let steps = flatten(&parse_route(&block_payload()).unwrap()).unwrap();
    assert_eq!(steps.len(), 2);
    let coords: usize = steps.iter().map(|s| s.geometry.coordinates.len()).sum();
    assert_eq!(coords, 6);
}

#[test]
fn event_count_matches_route_duration() {
    let trace = block_trace(Spacing::Uniform);
    let end = *trace.times.last().unwrap();
    assert_eq!(end, 20400.0);

    for interval in [100.0, 250.0, 1000.0, 3000.0] {
        let mut emitter = Emitter::new(trace.clone(), interval, 0);
        let events = emitter.all();
        let emitted_span = events.len() as f64 * interval;
        assert!(
            (emitted_span - end).abs() <= interval,
            "{} events at {interval}ms against a {end}ms trace",
            events.len()
        );
    }

    let mut emitter = Emitter::new(trace, 1000.0, 0);
    assert_eq!(emitter.all().len(), 21);
}

#[test]
fn exhaustion_is_terminal() {
    let mut emitter = Emitter::new(block_trace(Spacing::Uniform), 1000.0, 0);
    while emitter.next().is_some() {}
    assert!(emitter.next().is_none());
    assert!(emitter.next().is_none());
    assert!(emitter.all().is_empty());
}

#[test]
fn events_walk_the_route_in_order() {
    let trace = block_trace(Spacing::Uniform);
    let first_vertex = trace.coords[0];
    let last_vertex = *trace.coords.last().unwrap();

    // 20400 is a whole number of 100ms intervals, so the final event lands
    // exactly on the last vertex.
    let mut emitter = Emitter::new(trace, 100.0, 0);
    let events = emitter.all();
    assert_eq!(events.len(), 205);
    assert_eq!(events[0].coords, first_vertex);
    assert_eq!(events.last().unwrap().coords, last_vertex);

    assert!(events[0].speedchange.is_none());
    for event in &events[1..] {
        assert!(event.speedchange.is_some());
    }

    // West first (negative bearing), then north (near 0).
    assert!((events[1].bearing + 90.0).abs() < 0.5);
    assert!(events[150].bearing.abs() < 5.0);
}

#[test]
fn all_matches_repeated_next() {
    let mut drained = Emitter::new(block_trace(Spacing::AccelDecel), 500.0, 0);
    let mut stepped = Emitter::new(block_trace(Spacing::AccelDecel), 500.0, 0);
    for event in drained.all() {
        assert_eq!(Some(event), stepped.next());
    }
    assert!(stepped.next().is_none());
}

#[test]
fn seek_offsets_the_first_event() {
    let trace = block_trace(Spacing::Uniform);
    let mut from_start = Emitter::new(trace.clone(), 1000.0, 0);
    let events = from_start.all();

    let mut resumed = Emitter::new(trace, 1000.0, 3);
    let first = resumed.next().unwrap();
    // Same place and speed as the fourth event of the start-aligned viewer;
    // bearing/speedchange differ because the resumed viewer has no history.
    assert_eq!(first.coords, events[3].coords);
    assert_eq!(first.speed, events[3].speed);
    assert!(first.speedchange.is_none());
    assert_eq!(resumed.all().len(), events.len() - 4);
}

#[test]
fn acceldecel_events_carry_kinematics() {
    let payload = parse_route(&three_step_payload()).unwrap();
    let mut emitter = Emitter::from_route(
        &payload,
        &TraceOptions {
            spacing: Spacing::AccelDecel,
        },
        2000.0,
        0,
    )
    .unwrap();

    let events = emitter.all();
    assert!(!events.is_empty());
    for (i, event) in events.iter().enumerate() {
        assert!(event.coords[0].is_finite() && event.coords[1].is_finite());
        assert!(event.bearing.is_finite());
        assert!(event.speed.is_finite() && event.speed >= 0.0);
        if i == 0 {
            assert!(event.speedchange.is_none());
        } else {
            assert!(event.speedchange.unwrap().is_finite());
        }
    }
    // Pulls away from rest.
    assert_eq!(events[0].speed, 0.0);
    assert!(events[1].speed > 0.0);
}

#[test]
fn acceldecel_trace_is_consistent() {
    let trace = block_trace(Spacing::AccelDecel);
    assert_eq!(trace.times[0], 0.0);
    assert_eq!(*trace.times.last().unwrap(), 20400.0);
    assert_eq!(trace.speeds[0], 0.0);
    assert_eq!(*trace.speeds.last().unwrap(), 0.0);
    for pair in trace.times.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    for pair in trace.dists.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    for speed in &trace.speeds {
        assert!(*speed >= 0.0);
    }
}

#[test]
fn emitted_json_omits_speedchange_only_at_the_start() {
    let mut emitter = Emitter::new(block_trace(Spacing::Uniform), 1000.0, 0);
    let events = emitter.all();
    let first = serde_json::to_value(&events[0]).unwrap();
    assert!(first.get("speedchange").is_none());
    assert!(first.get("coords").is_some());
    assert!(first.get("bearing").is_some());
    assert!(first.get("speed").is_some());
    let second = serde_json::to_value(&events[1]).unwrap();
    assert!(second.get("speedchange").is_some());
}
