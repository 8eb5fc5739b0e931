use std::f64::consts::{FRAC_PI_2, PI, TAU};

use rand::Rng;

use shared::{Coordinate, Route, SynthesisRequest};

use crate::directions::{DirectionsError, DirectionsProvider};
use crate::geodesy::{destination_point, normalize_bearing};
use crate::synth::{self, SynthesisError};

/// The straight-line leg is shrunk relative to the target because the
/// provider adds distance following real paths, not straight lines.
const DESTINATION_SHRINK: f64 = 0.45;

/// Retry ladder: (bearing offset, distance factor) per attempt. Rotate a
/// quarter turn first, then try the opposite direction at a reduced target.
const RETRY_TIERS: [(f64, f64); 3] = [(0.0, 1.0), (FRAC_PI_2, 1.0), (PI, 0.7)];

/// Synthesizes loops snapped to real walkable ways through a directions
/// provider. Trades availability for path realism: every failure terminates
/// in either a later ladder tier or a filterable degenerate route, never an
/// unhandled error.
pub struct AssistedSynthesizer<D> {
    provider: D,
}

impl<D: DirectionsProvider> AssistedSynthesizer<D> {
    pub fn new(provider: D) -> Self {
        Self { provider }
    }

    /// Returns between 0 and `req.count` routes; routes whose fallback
    /// ladder is exhausted are omitted rather than reported as errors.
    /// Provider calls run sequentially per route to stay inside external
    /// rate limits.
    pub async fn synthesize<R: Rng>(
        &self,
        rng: &mut R,
        req: &SynthesisRequest,
    ) -> Result<Vec<Route>, SynthesisError> {
        synth::validate(req)?;

        tracing::info!(
            "synthesizing {} service-assisted loop(s) around ({:.5}, {:.5}), target {:.2} mi",
            req.count,
            req.origin.lat,
            req.origin.lon,
            req.target_miles
        );

        let mut routes = Vec::with_capacity(req.count);
        for index in 0..req.count {
            // A lone route wanders anywhere; concurrent routes get evenly
            // spaced biases so the batch visibly diverges in direction.
            let bias = if req.count == 1 {
                rng.random_range(0.0..TAU)
            } else {
                index as f64 * TAU / req.count as f64
            };
            let adjusted = synth::jittered_target(rng, req.target_miles);

            let points = self.loop_points(req.origin, adjusted, bias).await;
            let route = synth::finish_route(index, points);
            if route.is_valid_loop() {
                tracing::debug!(
                    "route #{index}: {:.2} mi over {} points, bias {:.0}°",
                    route.distance_miles,
                    route.points.len(),
                    normalize_bearing(bias.to_degrees())
                );
                routes.push(route);
            } else {
                tracing::warn!("route #{index} degenerated after all fallback tiers, omitting");
            }
        }

        Ok(routes)
    }

    /// Walk the retry ladder; degenerate to the bare origin when every tier
    /// fails so the caller can filter the result.
    async fn loop_points(&self, origin: Coordinate, adjusted: f64, bias: f64) -> Vec<Coordinate> {
        for (attempt, (offset, factor)) in RETRY_TIERS.iter().enumerate() {
            let bearing = bias + offset;
            let leg_miles = DESTINATION_SHRINK * adjusted * factor;
            let destination = destination_point(origin, leg_miles, bearing);

            match self.out_and_back(origin, destination).await {
                Ok(points) => return points,
                Err(err) => tracing::debug!(
                    "attempt {} (bearing {:.0}°, leg {:.2} mi) failed: {err}",
                    attempt + 1,
                    normalize_bearing(bearing.to_degrees()),
                    leg_miles
                ),
            }
        }
        vec![origin]
    }

    async fn out_and_back(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, DirectionsError> {
        let mut points = self.provider.walking_route(origin, destination).await?;
        let mut inbound = self.provider.walking_route(destination, origin).await?;

        if !inbound.is_empty() {
            inbound.remove(0); // drop the duplicated joint point
        }
        points.extend(inbound);

        // Snapped endpoints may differ; force the loop closed
        if let Some(&first) = points.first() {
            if points.last() != Some(&first) {
                points.push(first);
            }
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Pops one scripted response per call and records the requested
    /// endpoints.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<Vec<Coordinate>, DirectionsError>>>,
        calls: Mutex<Vec<(Coordinate, Coordinate)>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<Vec<Coordinate>, DirectionsError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Always answers with a straight three-point leg.
        fn always_ok() -> Self {
            Self::new(Vec::new())
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl DirectionsProvider for ScriptedProvider {
        async fn walking_route(
            &self,
            from: Coordinate,
            to: Coordinate,
        ) -> Result<Vec<Coordinate>, DirectionsError> {
            self.calls.lock().unwrap().push((from, to));
            match self.responses.lock().unwrap().pop_front() {
                Some(response) => response,
                None => Ok(vec![
                    from,
                    Coordinate {
                        lat: (from.lat + to.lat) / 2.0,
                        lon: (from.lon + to.lon) / 2.0,
                    },
                    to,
                ]),
            }
        }
    }

    fn request(count: usize) -> SynthesisRequest {
        SynthesisRequest {
            origin: Coordinate { lat: 40.0, lon: -74.0 },
            target_miles: 2.0,
            count,
        }
    }

    #[tokio::test]
    async fn test_single_route_out_and_back() {
        let provider = ScriptedProvider::always_ok();
        let synthesizer = AssistedSynthesizer::new(provider);
        let mut rng = StdRng::seed_from_u64(1);

        let routes = synthesizer.synthesize(&mut rng, &request(1)).await.unwrap();

        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        // out leg (3 pts) + back leg minus the joint (2 pts); endpoints
        // already coincide so no closure point is appended
        assert_eq!(route.points.len(), 5);
        assert_eq!(route.points.first(), route.points.last());
        assert_eq!(route.distance_miles, crate::geodesy::path_distance_miles(&route.points));
        assert_eq!(synthesizer.provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_tier_rotates_bearing() {
        let provider = ScriptedProvider::new(vec![Err(DirectionsError::EmptyRoute)]);
        let synthesizer = AssistedSynthesizer::new(provider);
        let mut rng = StdRng::seed_from_u64(1);

        let routes = synthesizer.synthesize(&mut rng, &request(1)).await.unwrap();

        assert_eq!(routes.len(), 1);
        // one failed call, then a successful out-and-back pair
        assert_eq!(synthesizer.provider.call_count(), 3);

        let calls = synthesizer.provider.calls.lock().unwrap();
        let first_dest = calls[0].1;
        let second_dest = calls[1].1;
        assert!(
            (first_dest.lat - second_dest.lat).abs() > 1e-9
                || (first_dest.lon - second_dest.lon).abs() > 1e-9
        );
    }

    #[tokio::test]
    async fn test_exhausted_ladder_omits_route() {
        let failures = (0..3)
            .map(|_| Err(DirectionsError::EmptyRoute))
            .collect::<Vec<_>>();
        let provider = ScriptedProvider::new(failures);
        let synthesizer = AssistedSynthesizer::new(provider);
        let mut rng = StdRng::seed_from_u64(1);

        let routes = synthesizer.synthesize(&mut rng, &request(1)).await.unwrap();

        // all three tiers failed on the outbound call; the degenerate
        // single-point route is filtered, not surfaced as an error
        assert!(routes.is_empty());
        assert_eq!(synthesizer.provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_partial_batch_keeps_original_ids() {
        // route 0: three outbound failures; routes 1 and 2 succeed
        let mut responses: Vec<Result<Vec<Coordinate>, DirectionsError>> = Vec::new();
        for _ in 0..3 {
            responses.push(Err(DirectionsError::EmptyRoute));
        }
        let provider = ScriptedProvider::new(responses);
        let synthesizer = AssistedSynthesizer::new(provider);
        let mut rng = StdRng::seed_from_u64(1);

        let routes = synthesizer.synthesize(&mut rng, &request(3)).await.unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].id, 1);
        assert_eq!(routes[1].id, 2);
    }

    #[tokio::test]
    async fn test_multi_route_biases_diverge() {
        let provider = ScriptedProvider::always_ok();
        let synthesizer = AssistedSynthesizer::new(provider);
        let mut rng = StdRng::seed_from_u64(1);
        let req = request(3);

        let routes = synthesizer.synthesize(&mut rng, &req).await.unwrap();
        assert_eq!(routes.len(), 3);

        let calls = synthesizer.provider.calls.lock().unwrap();
        // outbound destinations per route are calls 0, 2 and 4
        let north = calls[0].1;
        let southeast = calls[2].1;
        let southwest = calls[4].1;

        // bias 0 heads due north
        assert!(north.lat > req.origin.lat);
        assert!((north.lon - req.origin.lon).abs() < 1e-9);
        // bias 120° heads south of east, bias 240° south of west
        assert!(southeast.lat < req.origin.lat && southeast.lon > req.origin.lon);
        assert!(southwest.lat < req.origin.lat && southwest.lon < req.origin.lon);
    }

    #[tokio::test]
    async fn test_open_provider_polyline_is_closed() {
        let origin = Coordinate { lat: 40.0, lon: -74.0 };
        let snapped_start = Coordinate { lat: 40.0001, lon: -74.0001 };
        let turn = Coordinate { lat: 40.003, lon: -74.002 };
        let snapped_end = Coordinate { lat: 40.0002, lon: -74.0 };
        let provider = ScriptedProvider::new(vec![
            Ok(vec![snapped_start, turn]),
            Ok(vec![turn, snapped_end]),
        ]);
        let synthesizer = AssistedSynthesizer::new(provider);
        let mut rng = StdRng::seed_from_u64(1);

        let routes = synthesizer
            .synthesize(
                &mut rng,
                &SynthesisRequest {
                    origin,
                    target_miles: 2.0,
                    count: 1,
                },
            )
            .await
            .unwrap();

        let points = &routes[0].points;
        assert_eq!(points.first(), points.last());
        assert_eq!(points.len(), 4); // snapped_start, turn, snapped_end, snapped_start
    }

    #[tokio::test]
    async fn test_invalid_request_fails_fast() {
        let provider = ScriptedProvider::always_ok();
        let synthesizer = AssistedSynthesizer::new(provider);
        let mut rng = StdRng::seed_from_u64(1);

        let result = synthesizer
            .synthesize(
                &mut rng,
                &SynthesisRequest {
                    origin: Coordinate { lat: 40.0, lon: -74.0 },
                    target_miles: 0.0,
                    count: 1,
                },
            )
            .await;

        assert!(matches!(result, Err(SynthesisError::InvalidTargetDistance)));
        assert_eq!(synthesizer.provider.call_count(), 0);
    }
}
