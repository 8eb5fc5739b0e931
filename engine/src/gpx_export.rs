use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use shared::{Coordinate, Route};

use crate::error::EngineError;

/// Encode a synthesized route as a base64 GPX 1.1 track so a chosen loop
/// can be handed to other running apps. Nothing is persisted by the engine.
pub fn encode_route_as_gpx(route: &Route) -> Result<String, EngineError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("runloop".into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some(route.description.clone()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    for waypoint in route.points.iter().map(to_waypoint) {
        segment.points.push(waypoint);
    }
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(coord: &Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lon, coord.lat))
}
