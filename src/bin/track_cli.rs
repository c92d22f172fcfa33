use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use nalgebra::Point3;

use globe_tracker::config::Args;
use globe_tracker::data::load_records;
use globe_tracker::math::geodetic::GeodeticProjector;
use globe_tracker::model::{
    AnimationScheduler, EphemerisSource, FrameOutcome, ObjectId, OrbitalState, RenderSink,
    SimulatedClock, StandardEphemeris, TrackedObjectRegistry,
};

/// Runs the tracker without a window and prints where everything ends up.
#[derive(Debug, Parser)]
struct CliArgs {
    #[command(flatten)]
    common: Args,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u32,
}

fn orbit_summary(state: &OrbitalState) -> String {
    match state {
        OrbitalState::ElementSet(set) => format!(
            "SGP4 epoch {} i {:.1} n {:.3} rev/d",
            set.epoch().format("%Y-%m-%d %H:%M"),
            set.inclination_deg(),
            set.mean_motion(),
        ),
        OrbitalState::Circular(orbit) => format!("circular r {:.0} km", orbit.radius_km()),
    }
}

#[derive(Default)]
struct Tally {
    placements: usize,
    draws: usize,
}

impl RenderSink for Tally {
    fn place_marker(&mut self, _: &ObjectId, _: &Point3<f64>) {
        self.placements += 1;
    }

    fn draw(&mut self) {
        self.draws += 1;
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let config = args.common.to_config()?;

    let start = Utc::now();
    let projector = GeodeticProjector::new(config.globe_radius);
    let ephemeris = StandardEphemeris;

    let records = load_records(&config.source);
    let mut registry = TrackedObjectRegistry::load(records, &ephemeris, &projector, start);

    let clock = SimulatedClock::new(start, config.clock_mode)?;
    let mut scheduler = AnimationScheduler::new(clock, projector);

    // Pretend frames arrive exactly on schedule
    let frame_interval = Duration::from_secs_f64(1.0 / config.fps as f64);
    let origin = Instant::now();
    scheduler.start(origin);

    let mut sink = Tally::default();
    let mut frozen = 0;
    for frame in 1..=args.frames {
        match scheduler.frame(origin + frame_interval * frame, &mut registry, &ephemeris, &mut sink) {
            FrameOutcome::Rendered(stats) => frozen += stats.frozen,
            FrameOutcome::Stopped => break,
        }
    }
    scheduler.stop();

    let instant = scheduler.clock().current_instant();
    println!(
        "Simulated {} -> {} ({}), {} frames, {} placements, {} frozen",
        start.format("%Y-%m-%d %H:%M:%S"),
        instant.format("%Y-%m-%d %H:%M:%S"),
        config.clock_mode,
        sink.draws,
        sink.placements,
        frozen,
    );

    for object in registry.iter() {
        let position = object.last_position();
        let geodetic = ephemeris
            .propagate(object.orbital_state(), instant)
            .map(|eci| ephemeris.to_geodetic(&eci, instant));

        let location = match geodetic {
            Some(g) => format!(
                "lat {:>8.3} lon {:>8.3} alt {:>9.1} km",
                g.latitude_deg, g.longitude_deg, g.altitude_km
            ),
            None => String::from("no valid position"),
        };
        let priority = object
            .aux()
            .priority
            .map_or("-", |priority| priority.label());

        println!(
            "{:>8}  {:<24}  {}  ({:.4}, {:.4}, {:.4})  {:<11}  {}",
            object.id(),
            object.display_name(),
            location,
            position.x,
            position.y,
            position.z,
            priority,
            orbit_summary(object.orbital_state()),
        );
    }

    Ok(())
}
