use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use nalgebra::Point3;

use crate::math::geodetic::GeodeticProjector;

use super::clock::SimulatedClock;
use super::ephemeris::EphemerisSource;
use super::registry::{ObjectId, TrackedObjectRegistry};

/// Where marker positions go once a frame has computed them.
pub trait RenderSink {
    fn place_marker(&mut self, id: &ObjectId, position: &Point3<f64>);
    fn draw(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Requests teardown of a running scheduler from outside its frame loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub instant: DateTime<Utc>,
    pub updated: usize,
    /// Objects whose propagation failed this frame and kept their old position.
    pub frozen: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Rendered(FrameStats),
    Stopped,
}

/// Drives the per-frame update: advance the clock, re-propagate and
/// re-project every object, then draw.
///
/// The host loop owns the timing and just calls `frame` once per tick. Once
/// stopped, every later call returns `FrameOutcome::Stopped` without touching
/// the clock or the registry.
#[derive(Debug)]
pub struct AnimationScheduler {
    clock: SimulatedClock,
    projector: GeodeticProjector,
    state: SchedulerState,
    last_frame: Option<Instant>,
    stop: StopHandle,
}

impl AnimationScheduler {
    pub fn new(clock: SimulatedClock, projector: GeodeticProjector) -> Self {
        Self {
            clock,
            projector,
            state: SchedulerState::Idle,
            last_frame: None,
            stop: StopHandle::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn clock(&self) -> &SimulatedClock {
        &self.clock
    }

    pub fn projector(&self) -> &GeodeticProjector {
        &self.projector
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Moves from Idle to Running. The first frame after this sees no real
    /// elapsed time.
    pub fn start(&mut self, now: Instant) {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Running;
            self.last_frame = Some(now);
            log::debug!("Animation started at {}", self.clock.current_instant());
        }
    }

    pub fn stop(&mut self) {
        self.stop.stop();
        self.transition_to_stopped();
    }

    pub fn frame(
        &mut self,
        now: Instant,
        registry: &mut TrackedObjectRegistry,
        ephemeris: &dyn EphemerisSource,
        sink: &mut dyn RenderSink,
    ) -> FrameOutcome {
        if self.stop.is_stopped() {
            self.transition_to_stopped();
        }
        match self.state {
            SchedulerState::Stopped => return FrameOutcome::Stopped,
            SchedulerState::Idle => self.start(now),
            SchedulerState::Running => {}
        }

        let real_delta_ms = match self.last_frame {
            Some(previous) => now.saturating_duration_since(previous).as_secs_f64() * 1000.0,
            None => 0.0,
        };
        self.last_frame = Some(now);

        let instant = self.clock.advance(real_delta_ms);

        let mut updated = 0;
        let mut frozen = 0;
        for object in registry.iter_mut() {
            let geodetic = ephemeris
                .propagate(object.orbital_state(), instant)
                .map(|eci| ephemeris.to_geodetic(&eci, instant))
                .filter(|geodetic| geodetic.is_finite());

            match geodetic {
                Some(geodetic) => {
                    let position = self.projector.project_geodetic(&geodetic);
                    object.set_last_position(position);
                    sink.place_marker(object.id(), &position);
                    updated += 1;
                }
                None => frozen += 1,
            }
        }

        if frozen > 0 {
            log::debug!("{} objects kept their previous position at {}", frozen, instant);
        }

        sink.draw();

        FrameOutcome::Rendered(FrameStats {
            instant,
            updated,
            frozen,
        })
    }

    fn transition_to_stopped(&mut self) {
        if self.state != SchedulerState::Stopped {
            log::info!("Animation stopped at {}", self.clock.current_instant());
            self.state = SchedulerState::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::time::Duration;

    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use crate::math::geodetic::Geodetic;
    use crate::model::clock::ClockMode;
    use crate::model::ephemeris::{EciPosition, OrbitalState};
    use crate::model::record::parse_payload;

    /// Positions are read back as (lat, lon, alt); longitude drifts with
    /// simulated time so every frame lands somewhere new.
    struct Drifting {
        start: DateTime<Utc>,
        fail: Cell<bool>,
    }

    impl EphemerisSource for Drifting {
        fn propagate(&self, _: &OrbitalState, instant: DateTime<Utc>) -> Option<EciPosition> {
            if self.fail.get() {
                return None;
            }
            let seconds = (instant - self.start).num_milliseconds() as f64 / 1000.0;
            Some(EciPosition::new(20.0, seconds, 400.0))
        }

        fn to_geodetic(&self, position: &EciPosition, _: DateTime<Utc>) -> Geodetic {
            Geodetic::new(position.x, position.y, position.z)
        }
    }

    #[derive(Default)]
    struct Recorder {
        placed: Vec<(ObjectId, Point3<f64>)>,
        draws: usize,
    }

    impl RenderSink for Recorder {
        fn place_marker(&mut self, id: &ObjectId, position: &Point3<f64>) {
            self.placed.push((id.clone(), *position));
        }

        fn draw(&mut self) {
            self.draws += 1;
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap()
    }

    fn setup(count: usize) -> (AnimationScheduler, TrackedObjectRegistry, Drifting) {
        let ephemeris = Drifting {
            start: start(),
            fail: Cell::new(false),
        };
        let payload: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"name": "SAT {}", "lat": 0, "lon": 0, "alt": 0}}"#, i))
            .collect();
        let records = if count == 0 {
            Vec::new()
        } else {
            parse_payload(&format!("[{}]", payload.join(","))).unwrap()
        };

        let projector = GeodeticProjector::default();
        let registry = TrackedObjectRegistry::load(records, &ephemeris, &projector, start());
        let clock = SimulatedClock::new(start(), ClockMode::FixedStep { step_ms: 100.0 }).unwrap();
        (AnimationScheduler::new(clock, projector), registry, ephemeris)
    }

    #[test]
    fn test_successful_frame_projects_every_object() {
        let (mut scheduler, mut registry, ephemeris) = setup(3);
        let mut sink = Recorder::default();

        let now = Instant::now();
        scheduler.start(now);
        assert_eq!(scheduler.state(), SchedulerState::Running);

        let outcome = scheduler.frame(now, &mut registry, &ephemeris, &mut sink);
        let expected_instant = start() + chrono::Duration::milliseconds(100);
        assert_eq!(
            outcome,
            FrameOutcome::Rendered(FrameStats {
                instant: expected_instant,
                updated: 3,
                frozen: 0,
            })
        );
        assert_eq!(sink.draws, 1);
        assert_eq!(sink.placed.len(), 3);

        let expected = GeodeticProjector::default().project(20.0, 0.1, 400.0);
        for object in registry.iter() {
            assert_abs_diff_eq!(object.last_position(), expected, epsilon = 1e-12);
        }
        for (_, position) in sink.placed.iter() {
            assert_abs_diff_eq!(*position, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_failed_frames_keep_last_position() {
        let (mut scheduler, mut registry, ephemeris) = setup(2);
        let mut sink = Recorder::default();
        let now = Instant::now();

        scheduler.frame(now, &mut registry, &ephemeris, &mut sink);
        let before: Vec<_> = registry.iter().map(|o| o.last_position()).collect();

        ephemeris.fail.set(true);
        let mut previous_instant = scheduler.clock().current_instant();
        for i in 1..=100 {
            let outcome = scheduler.frame(
                now + Duration::from_millis(i * 16),
                &mut registry,
                &ephemeris,
                &mut sink,
            );
            match outcome {
                FrameOutcome::Rendered(stats) => {
                    assert_eq!(stats.updated, 0);
                    assert_eq!(stats.frozen, 2);
                    assert!(stats.instant > previous_instant);
                    previous_instant = stats.instant;
                }
                FrameOutcome::Stopped => panic!("scheduler stopped unexpectedly"),
            }
        }

        let after: Vec<_> = registry.iter().map(|o| o.last_position()).collect();
        assert_eq!(before, after);
        // Still drawn every frame, just without new placements
        assert_eq!(sink.draws, 101);
        assert_eq!(sink.placed.len(), 2);
    }

    #[test]
    fn test_empty_registry_still_draws() {
        let (mut scheduler, mut registry, ephemeris) = setup(0);
        let mut sink = Recorder::default();
        let outcome = scheduler.frame(Instant::now(), &mut registry, &ephemeris, &mut sink);
        assert!(matches!(
            outcome,
            FrameOutcome::Rendered(FrameStats {
                updated: 0,
                frozen: 0,
                ..
            })
        ));
        assert_eq!(sink.draws, 1);
        assert!(sink.placed.is_empty());
    }

    #[test]
    fn test_first_frame_from_idle_uses_zero_delta() {
        let (_, mut registry, ephemeris) = setup(1);
        let clock =
            SimulatedClock::new(start(), ClockMode::WallClockScaled { multiplier: 5.0 }).unwrap();
        let mut scheduler = AnimationScheduler::new(clock, GeodeticProjector::default());
        let mut sink = Recorder::default();

        // However long setup took before the first frame, none of it counts
        let now = Instant::now() + Duration::from_secs(10);
        scheduler.frame(now, &mut registry, &ephemeris, &mut sink);
        // Only the minimum step
        assert_eq!(
            scheduler.clock().current_instant(),
            start() + chrono::Duration::microseconds(1)
        );

        scheduler.frame(now + Duration::from_millis(20), &mut registry, &ephemeris, &mut sink);
        assert_eq!(
            scheduler.clock().current_instant(),
            start() + chrono::Duration::microseconds(100_001)
        );
    }

    #[test]
    fn test_stop_handle_tears_down() {
        let (mut scheduler, mut registry, ephemeris) = setup(1);
        let mut sink = Recorder::default();
        let handle = scheduler.stop_handle();
        let now = Instant::now();

        scheduler.frame(now, &mut registry, &ephemeris, &mut sink);
        let instant = scheduler.clock().current_instant();
        let position = registry.iter().next().unwrap().last_position();

        handle.stop();
        assert!(handle.is_stopped());
        for i in 1..5 {
            let outcome = scheduler.frame(
                now + Duration::from_secs(i),
                &mut registry,
                &ephemeris,
                &mut sink,
            );
            assert_eq!(outcome, FrameOutcome::Stopped);
        }

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(scheduler.clock().current_instant(), instant);
        assert_eq!(registry.iter().next().unwrap().last_position(), position);
        assert_eq!(sink.draws, 1);

        // Stopped is terminal
        scheduler.start(now);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[test]
    fn test_stop_directly() {
        let (mut scheduler, mut registry, ephemeris) = setup(1);
        let mut sink = Recorder::default();
        scheduler.stop();
        assert_eq!(
            scheduler.frame(Instant::now(), &mut registry, &ephemeris, &mut sink),
            FrameOutcome::Stopped
        );
        assert_eq!(sink.draws, 0);
    }
}
