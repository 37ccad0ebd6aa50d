//! Turns a static directions-API response into a continuous,
//! time-parameterized trajectory: flatten the route's steps into one
//! geometry, build a speed-profiled trace over it, then sample "where is the
//! vehicle and how is it moving" at any elapsed time, or step through
//! location events at a fixed cadence with an `Emitter`.

#[macro_use]
extern crate log;

mod bearing;
mod emit;
mod error;
mod place;
mod profile;
mod route;
mod trace;

pub use self::bearing::initial_bearing;
pub use self::emit::{Emitter, Observation};
pub use self::error::{ReplayError, Result};
pub use self::place::Placer;
pub use self::route::{flatten, parse_route, Geometry, RoutePayload, Step};
pub use self::trace::{Spacing, Trace, TraceOptions};
