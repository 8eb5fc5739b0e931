use serde::Deserialize;

use crate::directions::MapboxDirections;
use crate::error::EngineError;

pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Engine configuration. The directions token is the only persisted value;
/// presence is the only validation performed on it. Without a token the
/// synthesizer is restricted to the geometric strategy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    pub mapbox_token: Option<String>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mapbox_token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());
        Self { mapbox_token }
    }

    pub fn directions_configured(&self) -> bool {
        self.mapbox_token.is_some()
    }

    pub fn directions_client(&self) -> Result<MapboxDirections, EngineError> {
        match &self.mapbox_token {
            Some(token) => Ok(MapboxDirections::new(token.clone())),
            None => Err(EngineError::MissingDirectionsToken),
        }
    }
}
