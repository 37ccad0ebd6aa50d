use serde::Serialize;

use crate::error::Result;
use crate::place::Placer;
use crate::route::RoutePayload;
use crate::trace::{Trace, TraceOptions};

/// A point-in-time snapshot of the vehicle. This is the only shape
/// renderers consume. `speedchange` is dropped from the serialized form
/// entirely when there was no previous observation to diff against.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    /// [lon, lat].
    pub coords: [f64; 2],
    /// Signed degrees from north; 0 when the heading is undefined.
    pub bearing: f64,
    /// Meters/second.
    pub speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speedchange: Option<f64>,
}

/// Replays a trace as discrete location events at a fixed cadence. Once the
/// trajectory is exhausted the emitter stays exhausted; build a new one to
/// replay again.
pub struct Emitter {
    place: Placer,
    /// Milliseconds between events.
    interval: f64,
    /// When the next event fires, ms from trajectory start.
    clock: f64,
    last: Option<Observation>,
    done: bool,
}

impl Emitter {
    /// `seek` counts intervals already elapsed, so two emitters over the
    /// same route with different seeks act as independent viewers; the
    /// first event fires at `seek * interval`.
    pub fn new(trace: Trace, interval: f64, seek: usize) -> Emitter {
        assert!(
            interval.is_finite() && interval > 0.0,
            "emit interval must be positive"
        );
        Emitter {
            place: Placer::new(trace),
            interval,
            clock: seek as f64 * interval,
            last: None,
            done: false,
        }
    }

    pub fn from_route(
        payload: &RoutePayload,
        opts: &TraceOptions,
        interval: f64,
        seek: usize,
    ) -> Result<Emitter> {
        Ok(Emitter::new(Trace::from_route(payload, opts)?, interval, seek))
    }

    /// Remaining events, drained in order through `next`.
    pub fn all(&mut self) -> Vec<Observation> {
        let mut events = Vec::new();
        while let Some(event) = self.next() {
            events.push(event);
        }
        events
    }
}

impl Iterator for Emitter {
    type Item = Observation;

    fn next(&mut self) -> Option<Observation> {
        if self.done || self.clock > self.place.end_time() {
            self.done = true;
            return None;
        }
        let event = self.place.point(self.clock, self.last.as_ref());
        self.clock += self.interval;
        self.last = Some(event.clone());
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speedchange_key_vanishes_when_absent() {
        let obs = Observation {
            coords: [-77.032395, 38.912603],
            bearing: 0.0,
            speed: 3.5,
            speedchange: None,
        };
        let json = serde_json::to_value(&obs).unwrap();
        assert!(json.get("speedchange").is_none());
        assert_eq!(json["coords"][0], -77.032395);

        let obs = Observation {
            speedchange: Some(-0.25),
            ..obs
        };
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["speedchange"], -0.25);
    }
}
