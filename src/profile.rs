//! Per-step speed profiles for accelerate/cruise/decelerate spacing.

/// Fixed ramp magnitude, m/s^2.
pub const ACCELERATION: f64 = 3.0;

/// A span of constant acceleration: `dist` meters covered in `time` seconds,
/// speed moving linearly from `v0` to `v1`.
#[derive(Clone, Copy, Debug)]
pub struct Phase {
    pub dist: f64,
    pub time: f64,
    pub v0: f64,
    pub v1: f64,
}

impl Phase {
    fn ramp(v0: f64, v1: f64) -> Phase {
        let time = (v1 - v0).abs() / ACCELERATION;
        Phase {
            dist: (v0 + v1) / 2.0 * time,
            time,
            v0,
            v1,
        }
    }

    /// Seconds to cover the first `d` meters of this phase.
    fn time_at(&self, d: f64) -> f64 {
        if self.dist <= 0.0 || self.time <= 0.0 {
            return 0.0;
        }
        let accel = (self.v1 - self.v0) / self.time;
        if accel.abs() < 1e-12 {
            return d / self.dist * self.time;
        }
        (((self.v0 * self.v0 + 2.0 * accel * d).max(0.0)).sqrt() - self.v0) / accel
    }

    /// Speed after covering the first `d` meters of this phase.
    fn speed_at(&self, d: f64) -> f64 {
        if self.dist <= 0.0 || self.time <= 0.0 {
            return self.v1;
        }
        let accel = (self.v1 - self.v0) / self.time;
        if accel.abs() < 1e-12 {
            return self.v0;
        }
        (self.v0 * self.v0 + 2.0 * accel * d).max(0.0).sqrt()
    }
}

/// The shape a step's traversal takes once ramps are accounted for.
#[derive(Debug)]
pub enum SpeedProfile {
    /// Constant speed end to end.
    Cruise(Phase),
    /// Two back-to-back ramps with no steady phase.
    Ramp(Phase, Phase),
    /// Ramp from the entry speed, hold, ramp to the exit speed.
    Trapezoid(Phase, Phase, Phase),
}

impl SpeedProfile {
    /// Solve a profile covering `dist` meters in `dur` seconds, entering at
    /// `v_in` and leaving at `v_out` m/s. Ramps never change the step's
    /// total distance or duration; when no cruise speed can satisfy that,
    /// the profile degrades to a pure ramp (duration kept exact) or a
    /// constant speed.
    pub fn solve(dist: f64, dur: f64, v_in: f64, v_out: f64) -> SpeedProfile {
        if dur <= 0.0 || dist <= 0.0 {
            // A dwell or an instantaneous hop; the builder stamps its
            // endpoint times directly.
            return SpeedProfile::Cruise(Phase {
                dist: dist.max(0.0),
                time: dur.max(0.0),
                v0: 0.0,
                v1: 0.0,
            });
        }

        let a = ACCELERATION;
        let vv = v_in * v_in + v_out * v_out;

        // Candidate cruise speeds from the sign regimes of the
        // ramp-cruise-ramp equations (cruise above both boundary speeds,
        // below both, or between them). The arithmetic check in the loop
        // picks whichever candidate's regime actually holds.
        let mut candidates = Vec::new();
        let s = a * dur + v_in + v_out;
        let disc = s * s - 4.0 * a * dist - 2.0 * vv;
        if disc >= 0.0 {
            candidates.push((s - disc.sqrt()) / 2.0);
        }
        let s = v_in + v_out - a * dur;
        let disc = s * s + 4.0 * a * dist - 2.0 * vv;
        if disc >= 0.0 {
            candidates.push((s + disc.sqrt()) / 2.0);
        }
        candidates.push(
            (2.0 * a * dist + v_in * v_in - v_out * v_out) / (2.0 * (a * dur + v_in - v_out)),
        );
        candidates.push(
            (2.0 * a * dist - v_in * v_in + v_out * v_out) / (2.0 * (a * dur - v_in + v_out)),
        );

        for cruise in candidates {
            if !cruise.is_finite() || cruise < 0.0 {
                continue;
            }
            let up = Phase::ramp(v_in, cruise);
            let down = Phase::ramp(cruise, v_out);
            let hold_t = dur - up.time - down.time;
            let hold_d = dist - up.dist - down.dist;
            if hold_t < -1e-9 || (hold_d - cruise * hold_t).abs() > 1e-6 * dist.max(1.0) {
                continue;
            }
            if up.time <= 1e-9 && down.time <= 1e-9 {
                return SpeedProfile::Cruise(Phase {
                    dist,
                    time: dur,
                    v0: cruise,
                    v1: cruise,
                });
            }
            if hold_t <= 1e-9 {
                return SpeedProfile::Ramp(up, down);
            }
            return SpeedProfile::Trapezoid(
                up,
                Phase {
                    dist: hold_d,
                    time: hold_t,
                    v0: cruise,
                    v1: cruise,
                },
                down,
            );
        }

        // No cruise speed fits: spend half the duration reaching whatever
        // peak makes the distance work out, keeping the duration exact.
        let peak = 2.0 * dist / dur - (v_in + v_out) / 2.0;
        if peak >= 0.0 {
            debug!("no cruise fits {dist}m over {dur}s ({v_in}->{v_out} m/s), using pure ramp");
            let half = dur / 2.0;
            return SpeedProfile::Ramp(
                Phase {
                    dist: (v_in + peak) / 2.0 * half,
                    time: half,
                    v0: v_in,
                    v1: peak,
                },
                Phase {
                    dist: (peak + v_out) / 2.0 * half,
                    time: half,
                    v0: peak,
                    v1: v_out,
                },
            );
        }

        debug!("ramps cannot fit {dist}m over {dur}s ({v_in}->{v_out} m/s), holding speed");
        let speed = dist / dur;
        SpeedProfile::Cruise(Phase {
            dist,
            time: dur,
            v0: speed,
            v1: speed,
        })
    }

    fn phases(&self) -> Vec<&Phase> {
        match self {
            SpeedProfile::Cruise(hold) => vec![hold],
            SpeedProfile::Ramp(up, down) => vec![up, down],
            SpeedProfile::Trapezoid(up, hold, down) => vec![up, hold, down],
        }
    }

    /// Distances from the step start where one phase hands off to the next.
    pub fn breaks(&self) -> Vec<f64> {
        let phases = self.phases();
        let mut d = 0.0;
        let mut out = Vec::new();
        for phase in &phases[..phases.len() - 1] {
            d += phase.dist;
            out.push(d);
        }
        out
    }

    /// Seconds into the step after covering `d` meters.
    pub fn time_at(&self, d: f64) -> f64 {
        let mut remaining = d;
        let mut elapsed = 0.0;
        for phase in self.phases() {
            if remaining <= phase.dist {
                return elapsed + phase.time_at(remaining);
            }
            remaining -= phase.dist;
            elapsed += phase.time;
        }
        elapsed
    }

    /// Speed in m/s after covering `d` meters.
    pub fn speed_at(&self, d: f64) -> f64 {
        let mut remaining = d;
        for phase in self.phases() {
            if remaining <= phase.dist {
                return phase.speed_at(remaining);
            }
            remaining -= phase.dist;
        }
        self.phases().last().unwrap().v1
    }
}
