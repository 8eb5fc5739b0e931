use std::future::Future;

use reqwest::StatusCode;
use serde::Deserialize;

use shared::Coordinate;

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";
const WALKING_PROFILE: &str = "mapbox/walking";

#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directions service answered {0}")]
    Status(StatusCode),
    #[error("directions payload held no usable route")]
    EmptyRoute,
}

/// Walking-directions seam. The service-assisted synthesizer only ever sees
/// this trait, so tests swap in scripted providers and the retry ladder can
/// be exercised without a network.
pub trait DirectionsProvider {
    fn walking_route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> impl Future<Output = Result<Vec<Coordinate>, DirectionsError>> + Send;
}

/// Mapbox Directions API client (walking profile, geojson geometry).
pub struct MapboxDirections {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl MapboxDirections {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Tests point this at a local stub server.
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }
}

impl DirectionsProvider for MapboxDirections {
    async fn walking_route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Coordinate>, DirectionsError> {
        let url = format!(
            "{}/directions/v5/{WALKING_PROFILE}/{:.6},{:.6};{:.6},{:.6}",
            self.base_url, from.lon, from.lat, to.lon, to.lat
        );

        let response = self
            .http
            .get(&url)
            .query(&[
                ("geometries", "geojson"),
                ("overview", "full"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("directions service answered {status} for {url}");
            return Err(DirectionsError::Status(status));
        }

        let payload: DirectionsPayload = response.json().await?;
        polyline_from_payload(payload)
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsPayload {
    #[serde(default)]
    routes: Vec<RouteLeg>,
}

#[derive(Debug, Deserialize)]
struct RouteLeg {
    geometry: LineGeometry,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    /// geojson order: [lon, lat]
    coordinates: Vec<[f64; 2]>,
}

fn polyline_from_payload(payload: DirectionsPayload) -> Result<Vec<Coordinate>, DirectionsError> {
    let leg = payload
        .routes
        .into_iter()
        .next()
        .ok_or(DirectionsError::EmptyRoute)?;
    if leg.geometry.coordinates.is_empty() {
        return Err(DirectionsError::EmptyRoute);
    }
    Ok(leg
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| Coordinate { lat, lon })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_maps_geojson_order() {
        let payload: DirectionsPayload = serde_json::from_value(serde_json::json!({
            "routes": [{
                "geometry": {
                    "coordinates": [[-74.0, 40.0], [-74.001, 40.002]]
                }
            }]
        }))
        .unwrap();

        let polyline = polyline_from_payload(payload).unwrap();
        assert_eq!(polyline.len(), 2);
        assert_eq!(polyline[0], Coordinate { lat: 40.0, lon: -74.0 });
        assert_eq!(polyline[1].lat, 40.002);
        assert_eq!(polyline[1].lon, -74.001);
    }

    #[test]
    fn test_payload_without_routes_is_empty_route() {
        let payload: DirectionsPayload =
            serde_json::from_value(serde_json::json!({ "routes": [] })).unwrap();
        assert!(matches!(
            polyline_from_payload(payload),
            Err(DirectionsError::EmptyRoute)
        ));
    }

    #[test]
    fn test_payload_with_empty_geometry_is_empty_route() {
        let payload: DirectionsPayload = serde_json::from_value(serde_json::json!({
            "routes": [{ "geometry": { "coordinates": [] } }]
        }))
        .unwrap();
        assert!(matches!(
            polyline_from_payload(payload),
            Err(DirectionsError::EmptyRoute)
        ));
    }

    #[test]
    fn test_payload_missing_routes_field_defaults_empty() {
        let payload: DirectionsPayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            polyline_from_payload(payload),
            Err(DirectionsError::EmptyRoute)
        ));
    }
}
