use geo::{Destination, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::bearing::initial_bearing;
use crate::error::{ReplayError, Result};
use crate::profile::SpeedProfile;
use crate::route::{flatten, RoutePayload, Step};

/// Below this many meters, two samples count as the same spot.
const EPSILON: f64 = 1e-6;

/// Speed-assignment policy when building a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    /// Each step moves at its mean speed end to end.
    #[default]
    Uniform,
    /// Each step accelerates, cruises, and decelerates, matching speeds
    /// across step boundaries and standing still at both trajectory ends.
    AccelDecel,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct TraceOptions {
    #[serde(default)]
    pub spacing: Spacing,
}

/// A route flattened into four parallel arrays, one entry per polyline
/// vertex, timestamped from the start of the trajectory. Built once, never
/// mutated afterwards.
// TODO Long dwells stack up duplicate vertices; compress them to one pair.
#[derive(Clone, Debug)]
pub struct Trace {
    /// Milliseconds from trajectory start; non-decreasing, first entry 0.
    pub times: Vec<f64>,
    /// [lon, lat] per vertex.
    pub coords: Vec<[f64; 2]>,
    /// Meters/second at each vertex.
    pub speeds: Vec<f64>,
    /// Cumulative meters from trajectory start.
    pub dists: Vec<f64>,
    spacing: Spacing,
}

impl Trace {
    pub fn from_route(payload: &RoutePayload, opts: &TraceOptions) -> Result<Trace> {
        Trace::build(&flatten(payload)?, opts)
    }

    pub fn build(steps: &[Step], opts: &TraceOptions) -> Result<Trace> {
        let mut trace = Trace {
            times: Vec::new(),
            coords: Vec::new(),
            speeds: Vec::new(),
            dists: Vec::new(),
            spacing: opts.spacing,
        };

        // First pass: validate, and measure every step's geometry.
        let mut cums = Vec::new();
        for (i, step) in steps.iter().enumerate() {
            if !step.distance.is_finite()
                || step.distance < 0.0
                || !step.duration.is_finite()
                || step.duration < 0.0
            {
                return Err(ReplayError::MalformedRoute(format!(
                    "step {} claims {}m over {}s",
                    i, step.distance, step.duration
                )));
            }
            if step.geometry.coordinates.is_empty() {
                return Err(ReplayError::MalformedRoute(format!("step {i} has no geometry")));
            }
            cums.push(vertex_dists(&step.geometry.coordinates));
        }

        // Cruise speeds each step would hold on its own, for matching speeds
        // where steps meet.
        let targets: Vec<f64> = steps
            .iter()
            .zip(&cums)
            .map(|(step, cum)| {
                if step.duration > 0.0 {
                    cum.last().unwrap() / step.duration
                } else {
                    0.0
                }
            })
            .collect();

        let mut start_ms = 0.0;
        let mut start_dist = 0.0;
        for (i, step) in steps.iter().enumerate() {
            let coords = &step.geometry.coordinates;
            let cum = &cums[i];
            let len = *cum.last().unwrap();
            let dur_ms = step.duration * 1000.0;

            if len <= EPSILON {
                // The vehicle holds this position; a stop shows up as a
                // duplicated vertex bounding the dwell.
                let coord = coords[0];
                if trace.coords.last() != Some(&coord) {
                    trace.push(start_ms, coord, 0.0, start_dist);
                }
                if dur_ms > 0.0 {
                    trace.push(start_ms + dur_ms, coord, 0.0, start_dist);
                }
            } else {
                match opts.spacing {
                    Spacing::Uniform => {
                        let speed = if step.duration > 0.0 {
                            step.distance / step.duration
                        } else {
                            0.0
                        };
                        for (j, coord) in coords.iter().enumerate() {
                            if j == 0 && trace.coords.last() == Some(coord) {
                                continue;
                            }
                            trace.push(
                                start_ms + cum[j] / len * dur_ms,
                                *coord,
                                speed,
                                start_dist + cum[j],
                            );
                        }
                    }
                    Spacing::AccelDecel => {
                        // Come to (or from) rest at the trajectory ends and
                        // around dwells; elsewhere match the entered step's
                        // own cruise speed so there's no jump at the seam.
                        let stopped_before = i == 0 || *cums[i - 1].last().unwrap() <= EPSILON;
                        let enter = if stopped_before { 0.0 } else { targets[i] };
                        let exit = if i + 1 == steps.len() { 0.0 } else { targets[i + 1] };
                        let profile = SpeedProfile::solve(len, step.duration, enter, exit);

                        // Sample every vertex plus any phase handoff that
                        // falls between vertices.
                        let mut samples: Vec<(f64, Option<usize>)> =
                            cum.iter().enumerate().map(|(j, d)| (*d, Some(j))).collect();
                        for brk in profile.breaks() {
                            if brk <= EPSILON || brk + EPSILON >= len {
                                continue;
                            }
                            if cum.iter().any(|d| (d - brk).abs() <= EPSILON) {
                                continue;
                            }
                            samples.push((brk, None));
                        }
                        samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

                        for (d, vertex) in &samples {
                            let coord = match vertex {
                                Some(j) => coords[*j],
                                None => point_along(coords, cum, *d),
                            };
                            if *d <= EPSILON && trace.coords.last() == Some(&coord) {
                                continue;
                            }
                            let at_end = (*d - len).abs() <= EPSILON;
                            let t = if at_end { dur_ms } else { profile.time_at(*d) * 1000.0 };
                            let speed = if at_end { exit } else { profile.speed_at(*d) };
                            trace.push(start_ms + t, coord, speed, start_dist + d);
                        }
                    }
                }
            }

            start_ms += dur_ms;
            start_dist += len;
        }

        if trace.times.len() < 2 {
            return Err(ReplayError::MalformedRoute(format!(
                "trace has {} vertices, need at least 2",
                trace.times.len()
            )));
        }
        info!(
            "built {:?} trace: {} vertices, {:.0}m over {:.1}s",
            opts.spacing,
            trace.times.len(),
            start_dist,
            start_ms / 1000.0
        );
        Ok(trace)
    }

    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    fn push(&mut self, time: f64, coord: [f64; 2], speed: f64, dist: f64) {
        // Float noise must never produce a backwards trace.
        let time = match self.times.last() {
            Some(prev) => time.max(*prev),
            None => time,
        };
        let dist = match self.dists.last() {
            Some(prev) => dist.max(*prev),
            None => dist,
        };
        self.times.push(time);
        self.coords.push(coord);
        self.speeds.push(speed.max(0.0));
        self.dists.push(dist);
    }
}

/// Cumulative meters along a step's geometry, one entry per vertex.
fn vertex_dists(coords: &[[f64; 2]]) -> Vec<f64> {
    let mut cum = vec![0.0];
    for pair in coords.windows(2) {
        let d = Haversine::distance(
            Point::new(pair[0][0], pair[0][1]),
            Point::new(pair[1][0], pair[1][1]),
        );
        cum.push(cum.last().unwrap() + d);
    }
    cum
}

/// The point `d` meters along a step's geometry.
fn point_along(coords: &[[f64; 2]], cum: &[f64], d: f64) -> [f64; 2] {
    let j = cum
        .partition_point(|c| *c <= d)
        .clamp(1, cum.len() - 1)
        - 1;
    let within = d - cum[j];
    if within <= EPSILON {
        return coords[j];
    }
    let heading = initial_bearing(Some(coords[j]), coords[j + 1]);
    let pt = Haversine::destination(Point::new(coords[j][0], coords[j][1]), heading, within);
    [pt.x(), pt.y()]
}
