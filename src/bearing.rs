use geo::{Bearing, Distance, Haversine, Point};

/// Two points closer than this (meters) count as the same place.
const COINCIDENT: f64 = 1e-6;

/// Signed initial bearing from `last` to `next` in degrees: 0 is north,
/// east of north positive, west of north negative, range (-180, 180].
/// 0 when there is no previous point or the points coincide.
pub fn initial_bearing(last: Option<[f64; 2]>, next: [f64; 2]) -> f64 {
    let last = match last {
        Some(pt) => pt,
        None => return 0.0,
    };
    let from = Point::new(last[0], last[1]);
    let to = Point::new(next[0], next[1]);
    if Haversine::distance(from, to) < COINCIDENT {
        return 0.0;
    }
    // geo reports compass degrees (0..360); fold the western half negative.
    let compass = Haversine::bearing(from, to);
    if compass > 180.0 {
        compass - 360.0
    } else {
        compass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_previous_point() {
        assert_eq!(initial_bearing(None, [-77.032395, 38.912603]), 0.0);
    }

    #[test]
    fn coincident_points() {
        let pt = [-77.032678, 38.91315];
        assert_eq!(initial_bearing(Some(pt), pt), 0.0);
    }

    #[test]
    fn cardinal_directions() {
        let origin = [-77.0324, 38.9126];
        let west = initial_bearing(Some(origin), [-77.0326, 38.9126]);
        assert!((west + 90.0).abs() < 0.01, "due west was {west}");
        let east = initial_bearing(Some(origin), [-77.0322, 38.9126]);
        assert!((east - 90.0).abs() < 0.01, "due east was {east}");
        let north = initial_bearing(Some(origin), [-77.0324, 38.9128]);
        assert!(north.abs() < 0.01, "due north was {north}");
        let south = initial_bearing(Some(origin), [-77.0324, 38.9124]);
        assert!((south.abs() - 180.0).abs() < 0.01, "due south was {south}");
    }
}
