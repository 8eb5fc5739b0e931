use std::f64::consts::TAU;

use rand::Rng;

use shared::{Coordinate, Route, SynthesisRequest};

use crate::geodesy::{destination_point, path_distance_miles};

/// Each candidate's target is perturbed by a factor in this range so a batch
/// shows visually distinct but comparably sized loops.
const DISTANCE_JITTER_MIN: f64 = 0.95;
const DISTANCE_JITTER_MAX: f64 = 1.05;
const WAYPOINTS_PER_MILE: f64 = 3.0;
const MIN_WAYPOINTS: usize = 3;

/// Cycled by batch index; every route gets a value even when the batch is
/// larger than the palette.
pub const ROUTE_COLORS: [&str; 3] = ["#e74c3c", "#3498db", "#2ecc71"];
pub const ROUTE_DESCRIPTIONS: [&str; 3] = ["Scenic loop", "Steady circuit", "Explorer loop"];

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("target distance must be strictly positive")]
    InvalidTargetDistance,
    #[error("at least one route must be requested")]
    InvalidRouteCount,
}

/// Generate closed-loop candidates by random walk.
///
/// Each route walks `max(3, floor(adjusted * 3))` equal-length hops from the
/// origin, every hop on a fresh uniform random bearing, then appends the
/// origin to force closure. The closing segment is unconstrained and may be
/// arbitrarily long; the reported distance is recomputed from the polyline,
/// so it stays honest even when it diverges from the request.
pub fn synthesize_loops<R: Rng>(
    rng: &mut R,
    req: &SynthesisRequest,
) -> Result<Vec<Route>, SynthesisError> {
    validate(req)?;

    tracing::info!(
        "synthesizing {} geometric loop(s) around ({:.5}, {:.5}), target {:.2} mi",
        req.count,
        req.origin.lat,
        req.origin.lon,
        req.target_miles
    );

    let routes = (0..req.count)
        .map(|index| {
            let adjusted = jittered_target(rng, req.target_miles);
            let hops = waypoint_count(adjusted);
            let hop_miles = adjusted / hops as f64;

            let mut points = Vec::with_capacity(hops + 2);
            points.push(req.origin);
            let mut cursor = req.origin;
            for _ in 0..hops {
                let bearing = rng.random_range(0.0..TAU);
                cursor = destination_point(cursor, hop_miles, bearing);
                points.push(cursor);
            }
            points.push(req.origin);

            let route = finish_route(index, points);
            tracing::debug!(
                "loop #{index}: {hops} hops of {hop_miles:.2} mi, polyline {:.2} mi",
                route.distance_miles
            );
            route
        })
        .collect();

    Ok(routes)
}

pub(crate) fn validate(req: &SynthesisRequest) -> Result<(), SynthesisError> {
    if !req.target_miles.is_finite() || req.target_miles <= 0.0 {
        return Err(SynthesisError::InvalidTargetDistance);
    }
    if req.count < 1 {
        return Err(SynthesisError::InvalidRouteCount);
    }
    Ok(())
}

pub(crate) fn jittered_target<R: Rng>(rng: &mut R, target_miles: f64) -> f64 {
    target_miles * rng.random_range(DISTANCE_JITTER_MIN..=DISTANCE_JITTER_MAX)
}

fn waypoint_count(adjusted_miles: f64) -> usize {
    MIN_WAYPOINTS.max((adjusted_miles * WAYPOINTS_PER_MILE).floor() as usize)
}

/// Recompute the authoritative distance and assign palette entries. Shared
/// by both synthesis strategies.
pub(crate) fn finish_route(index: usize, points: Vec<Coordinate>) -> Route {
    let distance_miles = path_distance_miles(&points);
    Route {
        id: index as u32,
        points,
        distance_miles,
        description: ROUTE_DESCRIPTIONS[index % ROUTE_DESCRIPTIONS.len()].to_string(),
        color: ROUTE_COLORS[index % ROUTE_COLORS.len()].to_string(),
    }
}
