use shared::Coordinate;

use crate::geodesy::haversine_miles;

/// A jump of at least this many miles between consecutive fixes is not
/// plausible at running speed for one update interval; it is sensor noise.
pub const NOISE_JUMP_MILES: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOutcome {
    /// Cumulative accepted distance after this sample.
    pub traveled_miles: f64,
    /// Distance from the previous fix, zero for the baseline sample.
    pub segment_miles: f64,
    pub accepted: bool,
}

/// Streaming odometer over raw position fixes.
///
/// The baseline advances on every sample, rejected jumps included: the noise
/// filter is single-step, and "where the marker is drawn" is decoupled from
/// "what counts toward distance". One bad fix can therefore poison the next
/// segment's baseline; no correction is attempted.
#[derive(Debug, Default)]
pub struct LiveTracker {
    last_position: Option<Coordinate>,
    accumulated_miles: f64,
}

impl LiveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The only re-initialization path; invoked once per session start.
    pub fn reset(&mut self) {
        self.last_position = None;
        self.accumulated_miles = 0.0;
    }

    pub fn traveled_miles(&self) -> f64 {
        self.accumulated_miles
    }

    pub fn last_position(&self) -> Option<Coordinate> {
        self.last_position
    }

    pub fn accept(&mut self, sample: Coordinate) -> SampleOutcome {
        let Some(last) = self.last_position else {
            // First fix establishes the baseline and contributes nothing
            self.last_position = Some(sample);
            return SampleOutcome {
                traveled_miles: 0.0,
                segment_miles: 0.0,
                accepted: true,
            };
        };

        let segment_miles = haversine_miles(last, sample);
        let accepted = segment_miles < NOISE_JUMP_MILES;
        if accepted {
            self.accumulated_miles += segment_miles;
        } else {
            tracing::debug!("rejected {segment_miles:.2} mi jump as noise");
        }
        self.last_position = Some(sample);

        SampleOutcome {
            traveled_miles: self.accumulated_miles,
            segment_miles,
            accepted,
        }
    }
}
