use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engine::geodesy::{format_elapsed, format_miles, haversine_miles};
use engine::gpx_export::encode_route_as_gpx;
use engine::position::{PositionError, PositionSource};
use engine::{AssistedSynthesizer, EngineConfig, Haptics, SessionController, synthesize_loops};
use shared::{Coordinate, SessionEvent, SynthesisRequest};

/// Spacing of simulated GPS fixes; small enough that the noise filter
/// accepts every hop.
const SAMPLE_SPACING_MILES: f64 = 0.05;
const SAMPLE_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(author, version, about = "Loop-route synthesis and run-tracking demo")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Propose loop routes around a start coordinate
    Routes {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
        /// Desired loop length in miles
        #[arg(long)]
        miles: f64,
        #[arg(long, default_value_t = 3)]
        count: usize,
        /// Seed for reproducible batches
        #[arg(long)]
        seed: Option<u64>,
        /// Also print the first route as base64 GPX
        #[arg(long)]
        gpx: bool,
    },
    /// Synthesize a loop and replay it through a full tracking session
    Simulate {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
        /// Desired loop length in miles
        #[arg(long)]
        miles: f64,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Args::parse().command {
        Command::Routes {
            lat,
            lon,
            miles,
            count,
            seed,
            gpx,
        } => routes_command(Coordinate { lat, lon }, miles, count, seed, gpx).await,
        Command::Simulate {
            lat,
            lon,
            miles,
            seed,
        } => simulate_command(Coordinate { lat, lon }, miles, seed).await,
    }
}

async fn routes_command(
    origin: Coordinate,
    miles: f64,
    count: usize,
    seed: Option<u64>,
    gpx: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env();
    let req = SynthesisRequest {
        origin,
        target_miles: miles,
        count,
    };
    let mut rng = seeded(seed);

    let routes = if config.directions_configured() {
        let synthesizer = AssistedSynthesizer::new(config.directions_client()?);
        synthesizer.synthesize(&mut rng, &req).await?
    } else {
        tracing::info!("no directions token configured, using the geometric strategy");
        synthesize_loops(&mut rng, &req)?
    };

    for route in &routes {
        println!(
            "#{} {:<16} {:>9}  {} points  {}",
            route.id,
            route.description,
            format_miles(route.distance_miles),
            route.points.len(),
            route.color
        );
    }
    if routes.len() < count {
        println!("({} of {} requested routes available)", routes.len(), count);
    }

    if gpx {
        if let Some(route) = routes.first() {
            println!("{}", encode_route_as_gpx(route)?);
        }
    }
    Ok(())
}

async fn simulate_command(
    origin: Coordinate,
    miles: f64,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = seeded(seed);
    let routes = synthesize_loops(
        &mut rng,
        &SynthesisRequest {
            origin,
            target_miles: miles,
            count: 1,
        },
    )?;
    let route = routes.into_iter().next().expect("batch of one");

    let samples = densify(&route.points);
    println!(
        "replaying {} fixes along a {} loop",
        samples.len(),
        format_miles(route.distance_miles)
    );

    // finish just short of the polyline so the completion buzz fires
    // during the replay
    let target_miles = route.distance_miles * 0.9;
    let source = ReplaySource {
        fix: origin,
        samples,
    };
    let mut controller = SessionController::new(source, BuzzHaptics);

    let (events_tx, mut events_rx) = mpsc::channel(32);
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                SessionEvent::Position {
                    traveled_miles,
                    accepted,
                    ..
                } => {
                    if accepted {
                        println!("odometer {}", format_miles(traveled_miles));
                    } else {
                        println!("noise sample ignored");
                    }
                }
                SessionEvent::Tick { elapsed_seconds } => {
                    println!("elapsed {}", format_elapsed(elapsed_seconds));
                }
                SessionEvent::TargetReached => println!("*** target reached ***"),
            }
        }
    });

    let snapshot = controller.run_tracking(target_miles, events_tx).await?;
    printer.await?;

    println!(
        "final: {} in {}, target reached: {}",
        format_miles(snapshot.traveled_miles),
        format_elapsed(snapshot.elapsed_seconds),
        snapshot.target_reached
    );
    Ok(())
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Subdivide route legs into GPS-sized hops.
fn densify(points: &[Coordinate]) -> Vec<Coordinate> {
    let mut samples = Vec::new();
    for leg in points.windows(2) {
        let leg_miles = haversine_miles(leg[0], leg[1]);
        let steps = (leg_miles / SAMPLE_SPACING_MILES).ceil().max(1.0) as usize;
        for step in 1..=steps {
            samples.push(leg[0].interpolate(leg[1], step as f64 / steps as f64));
        }
    }
    samples
}

/// Feeds a pre-computed sample list through the positioning seam at a
/// steady cadence.
struct ReplaySource {
    fix: Coordinate,
    samples: Vec<Coordinate>,
}

impl PositionSource for ReplaySource {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        Ok(self.fix)
    }

    fn watch(&self) -> mpsc::Receiver<Coordinate> {
        let (tx, rx) = mpsc::channel(16);
        let samples = self.samples.clone();
        tokio::spawn(async move {
            for sample in samples {
                if tx.send(sample).await.is_err() {
                    break;
                }
                tokio::time::sleep(SAMPLE_PERIOD).await;
            }
        });
        rx
    }
}

struct BuzzHaptics;

impl Haptics for BuzzHaptics {
    fn vibrate(&self, pattern: &[u64]) {
        println!("bzzzt {pattern:?}");
    }
}
