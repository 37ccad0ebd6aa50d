use geo::{Haversine, InterpolatePoint, Point};

use crate::bearing::initial_bearing;
use crate::emit::Observation;
use crate::trace::{Spacing, Trace};

/// Time-indexed view over a trace. Owns the trace outright, plus a cursor
/// that makes monotonically increasing queries O(1) amortized. The cursor is
/// only a hint; the bracket is always re-checked against the timestamps, so
/// querying out of order changes nothing but the cost.
pub struct Placer {
    trace: Trace,
    accel_aware: bool,
    cursor: usize,
}

impl Placer {
    pub fn new(trace: Trace) -> Placer {
        Placer {
            accel_aware: trace.spacing() == Spacing::AccelDecel,
            trace,
            cursor: 0,
        }
    }

    /// Final trace timestamp, ms.
    pub fn end_time(&self) -> f64 {
        *self.trace.times.last().unwrap()
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// The state of the vehicle `at` ms into the trajectory. `last` is the
    /// previously returned observation, if any; it drives the bearing and
    /// the speedchange delta, nothing else.
    pub fn point(&mut self, at: f64, last: Option<&Observation>) -> Observation {
        let times = &self.trace.times;
        let n = times.len();

        // Clamp to the trajectory's ends.
        if at <= times[0] {
            self.cursor = 0;
            return self.at_vertex(0, last);
        }
        if at >= times[n - 1] {
            self.cursor = n - 1;
            return self.at_vertex(n - 1, last);
        }

        let mut lo = self.cursor;
        if times[lo] > at {
            // Seeking backward; bisect instead of walking from the hint.
            lo = times.partition_point(|t| *t <= at) - 1;
        }
        while times[lo + 1] <= at {
            lo += 1;
        }
        self.cursor = lo;
        if times[lo] == at {
            return self.at_vertex(lo, last);
        }

        let hi = lo + 1;
        let frac = (at - times[lo]) / (times[hi] - times[lo]);
        let speed = if self.accel_aware {
            self.trace.speeds[lo] + frac * (self.trace.speeds[hi] - self.trace.speeds[lo])
        } else {
            self.trace.speeds[lo]
        };
        if self.trace.coords[lo] == self.trace.coords[hi] {
            // Standing still; interpolating a zero-length arc divides by 0.
            return self.observe(self.trace.coords[lo], speed, last);
        }
        let pt = Haversine::point_at_ratio_between(
            Point::new(self.trace.coords[lo][0], self.trace.coords[lo][1]),
            Point::new(self.trace.coords[hi][0], self.trace.coords[hi][1]),
            frac,
        );
        self.observe([pt.x(), pt.y()], speed, last)
    }

    fn at_vertex(&self, i: usize, last: Option<&Observation>) -> Observation {
        self.observe(self.trace.coords[i], self.trace.speeds[i], last)
    }

    fn observe(&self, coords: [f64; 2], speed: f64, last: Option<&Observation>) -> Observation {
        Observation {
            bearing: initial_bearing(last.map(|obs| obs.coords), coords),
            coords,
            speed,
            speedchange: last.map(|obs| speed - obs.speed),
        }
    }
}
