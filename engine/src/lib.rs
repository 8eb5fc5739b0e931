pub mod assisted;
pub mod config;
pub mod directions;
pub mod error;
pub mod geodesy;
pub mod gpx_export;
pub mod haptics;
pub mod position;
pub mod session;
pub mod synth;
pub mod tracker;

pub use crate::assisted::AssistedSynthesizer;
pub use crate::config::EngineConfig;
pub use crate::directions::{DirectionsProvider, MapboxDirections};
pub use crate::error::EngineError;
pub use crate::haptics::{Haptics, NoHaptics};
pub use crate::position::PositionSource;
pub use crate::session::{RunSession, SessionController};
pub use crate::synth::synthesize_loops;
pub use crate::tracker::LiveTracker;
