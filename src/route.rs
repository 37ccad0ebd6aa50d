use serde::Deserialize;

use crate::error::{ReplayError, Result};

/// One maneuver-bounded piece of a leg, as the directions API reports it.
/// Consecutive steps share their boundary coordinate.
#[derive(Clone, Debug, Deserialize)]
pub struct Step {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub geometry: Geometry,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Geometry {
    /// [lon, lat] pairs.
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Leg {
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Route {
    pub legs: Vec<Leg>,
}

/// The two wire shapes directions services hand back. Modern responses nest
/// steps under legs, one leg per waypoint pair; legacy responses are a bare
/// array of routes, each with a flat step list.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RoutePayload {
    Modern { routes: Vec<Route> },
    Legacy(Vec<Leg>),
}

pub fn parse_route(raw: &str) -> Result<RoutePayload> {
    serde_json::from_str(raw).map_err(|err| ReplayError::Input(err.to_string()))
}

/// Flattens the first route into one ordered step list. The last step of
/// every leg only marks arrival and covers no ground, so it's dropped.
pub fn flatten(payload: &RoutePayload) -> Result<Vec<Step>> {
    let legs: Vec<&Leg> = match payload {
        RoutePayload::Modern { routes } => match routes.first() {
            Some(route) if !route.legs.is_empty() => route.legs.iter().collect(),
            Some(_) => return Err(ReplayError::Input("route has no legs".to_string())),
            None => return Err(ReplayError::Input("payload has no routes".to_string())),
        },
        RoutePayload::Legacy(routes) => match routes.first() {
            Some(first) => vec![first],
            None => return Err(ReplayError::Input("payload has no routes".to_string())),
        },
    };

    let mut steps = Vec::new();
    for leg in legs {
        if leg.steps.is_empty() {
            return Err(ReplayError::Input("leg has no steps".to_string()));
        }
        steps.extend(leg.steps[..leg.steps.len() - 1].iter().cloned());
    }
    if steps.is_empty() {
        return Err(ReplayError::Input("route has no steps to traverse".to_string()));
    }
    debug!("flattened route to {} steps", steps.len());
    Ok(steps)
}
