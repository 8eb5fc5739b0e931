use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::mpsc;

use shared::{Coordinate, Mode, Route, SessionEvent, SessionSnapshot, SynthesisRequest};

use crate::assisted::AssistedSynthesizer;
use crate::directions::DirectionsProvider;
use crate::error::EngineError;
use crate::haptics::{Haptics, TARGET_REACHED_PATTERN};
use crate::position::{self, PositionSource};
use crate::synth;
use crate::tracker::{LiveTracker, SampleOutcome};

const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// One active run: target distance, odometer, elapsed clock and the
/// one-shot reached flag. Pure state machine; the async wiring lives in
/// [`SessionController::run_tracking`].
pub struct RunSession {
    target_miles: f64,
    tracker: LiveTracker,
    elapsed_seconds: u64,
    target_reached: bool,
    started_at: DateTime<Utc>,
}

impl RunSession {
    pub fn new(target_miles: f64) -> Self {
        Self {
            target_miles,
            tracker: LiveTracker::new(),
            elapsed_seconds: 0,
            target_reached: false,
            started_at: Utc::now(),
        }
    }

    /// Seed the odometer baseline from the pre-session fix; contributes
    /// nothing to distance.
    pub fn seed_baseline(&mut self, fix: Coordinate) {
        self.tracker.accept(fix);
    }

    /// Feed one raw sample. The second tuple field is true only on the
    /// single crossing of the target; it can never be true twice for one
    /// session.
    pub fn handle_sample(&mut self, sample: Coordinate) -> (SampleOutcome, bool) {
        let outcome = self.tracker.accept(sample);
        let crossed =
            outcome.accepted && !self.target_reached && outcome.traveled_miles >= self.target_miles;
        if crossed {
            self.target_reached = true;
        }
        (outcome, crossed)
    }

    pub fn tick(&mut self) -> u64 {
        self.elapsed_seconds += 1;
        self.elapsed_seconds
    }

    pub fn target_reached(&self) -> bool {
        self.target_reached
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn snapshot(&self, mode: Mode) -> SessionSnapshot {
        SessionSnapshot {
            mode,
            target_miles: self.target_miles,
            traveled_miles: self.tracker.traveled_miles(),
            elapsed_seconds: self.elapsed_seconds,
            target_reached: self.target_reached,
        }
    }
}

/// Orchestrates mode switching between finding routes and tracking a run.
///
/// Holding the controller by `&mut` for the whole of a tracking session is
/// what enforces the no-overlap rule: a second session cannot start until
/// the first one's subscription and clock have been dropped.
pub struct SessionController<P, H> {
    positions: P,
    haptics: H,
    mode: Mode,
}

impl<P: PositionSource, H: Haptics> SessionController<P, H> {
    pub fn new(positions: P, haptics: H) -> Self {
        Self {
            positions,
            haptics,
            mode: Mode::Idle,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Propose geometric loop routes around the current position. A failed
    /// fix blocks entering the mode.
    pub async fn find_routes<R: Rng>(
        &mut self,
        rng: &mut R,
        target_miles: f64,
        count: usize,
    ) -> Result<Vec<Route>, EngineError> {
        let origin = position::initial_fix(&self.positions).await?;
        let routes = synth::synthesize_loops(
            rng,
            &SynthesisRequest {
                origin,
                target_miles,
                count,
            },
        )?;
        self.mode = Mode::FindingRoutes;
        Ok(routes)
    }

    /// Like [`find_routes`](Self::find_routes) but snapped to real paths
    /// through a directions provider.
    pub async fn find_routes_assisted<R: Rng, D: DirectionsProvider>(
        &mut self,
        rng: &mut R,
        synthesizer: &AssistedSynthesizer<D>,
        target_miles: f64,
        count: usize,
    ) -> Result<Vec<Route>, EngineError> {
        let origin = position::initial_fix(&self.positions).await?;
        let routes = synthesizer
            .synthesize(
                rng,
                &SynthesisRequest {
                    origin,
                    target_miles,
                    count,
                },
            )
            .await?;
        self.mode = Mode::FindingRoutes;
        Ok(routes)
    }

    /// Track a run against `target_miles`, streaming events to the display
    /// layer until the position stream or the event receiver closes.
    ///
    /// The initial fix seeds the odometer baseline and gates mode entry.
    /// The subscription receiver and the 1 s clock are locals of this call,
    /// so ending a session (returning, erroring, or being dropped) always
    /// tears both down before another session can begin.
    pub async fn run_tracking(
        &mut self,
        target_miles: f64,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<SessionSnapshot, EngineError> {
        if !target_miles.is_finite() || target_miles <= 0.0 {
            return Err(EngineError::InvalidTarget);
        }

        let fix = position::initial_fix(&self.positions).await?;
        let mut samples = self.positions.watch();
        let mut run = RunSession::new(target_miles);
        run.seed_baseline(fix);
        self.mode = Mode::Tracking;
        tracing::info!(
            "tracking session started at {}: target {:.2} mi",
            run.started_at().format("%H:%M:%S"),
            target_miles
        );

        let mut clock = tokio::time::interval(CLOCK_PERIOD);
        clock.tick().await; // the first tick completes immediately

        loop {
            tokio::select! {
                maybe_sample = samples.recv() => {
                    let Some(sample) = maybe_sample else {
                        tracing::info!("position stream closed, ending session");
                        break;
                    };
                    let (outcome, crossed) = run.handle_sample(sample);
                    let event = SessionEvent::Position {
                        position: sample,
                        traveled_miles: outcome.traveled_miles,
                        accepted: outcome.accepted,
                    };
                    if events.send(event).await.is_err() {
                        break;
                    }
                    if crossed {
                        tracing::info!("target of {target_miles:.2} mi reached");
                        self.haptics.vibrate(&TARGET_REACHED_PATTERN);
                        if events.send(SessionEvent::TargetReached).await.is_err() {
                            break;
                        }
                    }
                }
                _ = clock.tick() => {
                    let elapsed_seconds = run.tick();
                    if events.send(SessionEvent::Tick { elapsed_seconds }).await.is_err() {
                        break;
                    }
                }
            }
        }

        self.mode = Mode::Idle;
        Ok(run.snapshot(Mode::Idle))
    }
}
