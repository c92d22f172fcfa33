use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use kiss3d::light::Light;
use kiss3d::window::Window;

use globe_tracker::config::Args;
use globe_tracker::data::load_records;
use globe_tracker::gui::Session;
use globe_tracker::math::geodetic::GeodeticProjector;
use globe_tracker::model::{
    AnimationScheduler, PointerPicker, SimulatedClock, StandardEphemeris, TrackedObjectRegistry,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().to_config()?;
    log::info!("Starting globe tracker, clock {}", config.clock_mode);

    let start = Utc::now();
    let projector = GeodeticProjector::new(config.globe_radius);
    let ephemeris = StandardEphemeris;

    let records = load_records(&config.source);
    let registry = TrackedObjectRegistry::load(records, &ephemeris, &projector, start);

    let clock = SimulatedClock::new(start, config.clock_mode)?;
    let scheduler = AnimationScheduler::new(clock, projector);
    let picker = PointerPicker::new(config.marker_radius);

    let mut window = Window::new("Globe Tracker");
    window.set_light(Light::StickToCamera);
    window.set_framerate_limit(Some(config.fps));

    // The first frame starts the scheduler, so setup time never counts as
    // simulated time
    let session = Session::new(
        &mut window,
        registry,
        scheduler,
        picker,
        Box::new(ephemeris),
    );
    window.render_loop(session);

    Ok(())
}
