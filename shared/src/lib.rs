use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// One synthesized closed-loop route. `distance_miles` is always recomputed
/// from `points`, never taken from the request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: u32,
    pub points: Vec<Coordinate>,
    pub distance_miles: f64,
    pub description: String,
    pub color: String,
}

impl Route {
    /// A route that degenerated below a drawable loop (service fallback
    /// exhausted) is excluded from synthesis batches.
    pub fn is_valid_loop(&self) -> bool {
        self.points.len() > 2
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub origin: Coordinate,
    pub target_miles: f64,
    #[serde(default = "default_route_count")]
    pub count: usize,
}

pub fn default_route_count() -> usize {
    3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Idle,
    FindingRoutes,
    Tracking,
}

/// Events streamed from an active tracking session to the display layer.
///
/// A rejected sample still carries the raw position: the map marker follows
/// every fix while only the odometer filters them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    Position {
        position: Coordinate,
        traveled_miles: f64,
        accepted: bool,
    },
    Tick {
        elapsed_seconds: u64,
    },
    TargetReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub target_miles: f64,
    pub traveled_miles: f64,
    pub elapsed_seconds: u64,
    pub target_reached: bool,
}
