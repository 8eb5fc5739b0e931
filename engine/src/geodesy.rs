use shared::Coordinate;

const EARTH_RADIUS_MILES: f64 = 3958.8;
const MILES_PER_DEGREE: f64 = 69.0;
const FEET_PER_MILE: f64 = 5280.0;

/// Threshold below which distances are displayed in feet instead of miles.
const FEET_DISPLAY_THRESHOLD_MILES: f64 = 0.1;

pub fn haversine_miles(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

pub fn path_distance_miles(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_miles(w[0], w[1])).sum()
}

/// Offset `start` by `distance_miles` along `bearing_rad` using an
/// equirectangular step: 69 miles per degree, with the longitude delta
/// corrected by cos(latitude) for meridian convergence. Accurate at the
/// scale of a single run (a few miles).
pub fn destination_point(start: Coordinate, distance_miles: f64, bearing_rad: f64) -> Coordinate {
    let lat = start.lat + distance_miles * bearing_rad.cos() / MILES_PER_DEGREE;
    let lon = start.lon
        + distance_miles * bearing_rad.sin() / (MILES_PER_DEGREE * start.lat.to_radians().cos());

    Coordinate {
        lat,
        lon: normalize_longitude(lon),
    }
}

pub fn normalize_longitude(lon: f64) -> f64 {
    let mut normalized = lon;
    while normalized < -180.0 {
        normalized += 360.0;
    }
    while normalized > 180.0 {
        normalized -= 360.0;
    }
    normalized
}

pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let mut value = bearing_deg % 360.0;
    if value < 0.0 {
        value += 360.0;
    }
    value
}

/// Display contract: short distances render as whole feet, everything else
/// as miles with one decimal place.
pub fn format_miles(miles: f64) -> String {
    if miles < FEET_DISPLAY_THRESHOLD_MILES {
        format!("{} ft", (miles * FEET_PER_MILE).round() as i64)
    } else {
        format!("{miles:.1} mi")
    }
}

pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
