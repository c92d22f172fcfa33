use std::time::Instant;

use kiss3d::camera::Camera;
use kiss3d::event::EventManager;
use kiss3d::planar_camera::PlanarCamera;
use kiss3d::post_processing::PostProcessingEffect;
use kiss3d::renderer::Renderer;
use kiss3d::window::{State, Window};

use self::controller::Controller;
use self::view::View;
use crate::model::ephemeris::EphemerisSource;
use crate::model::picker::PointerPicker;
use crate::model::registry::TrackedObjectRegistry;
use crate::model::scheduler::{AnimationScheduler, FrameOutcome};

pub mod camera;
mod controller;
mod markers;
mod tooltip;
mod view;

/// Everything one viewer session owns. Dropping it tears the session down.
pub struct Session {
    view: View,
    controller: Controller,
    registry: TrackedObjectRegistry,
    scheduler: AnimationScheduler,
    picker: PointerPicker,
    ephemeris: Box<dyn EphemerisSource>,
}

impl Session {
    pub fn new(
        window: &mut Window,
        registry: TrackedObjectRegistry,
        scheduler: AnimationScheduler,
        picker: PointerPicker,
        ephemeris: Box<dyn EphemerisSource>,
    ) -> Self {
        let globe_radius = scheduler.projector().globe_radius();
        let view = View::new(window, &registry, globe_radius, picker.marker_radius());
        let controller = Controller::new(scheduler.stop_handle());

        Self {
            view,
            controller,
            registry,
            scheduler,
            picker,
            ephemeris,
        }
    }

    fn process_user_input(&mut self, mut events: EventManager) {
        for event in events.iter() {
            self.controller.process_event(event);
        }

        // Pick before the frame moves anything, against what's on screen now
        if let Some((x, y)) = self.controller.take_pointer() {
            self.view
                .handle_pointer(x, y, &self.picker, &self.registry);
        }
    }
}

impl State for Session {
    fn cameras_and_effect_and_renderer(
        &mut self,
    ) -> (
        Option<&mut dyn Camera>,
        Option<&mut dyn PlanarCamera>,
        Option<&mut dyn Renderer>,
        Option<&mut dyn PostProcessingEffect>,
    ) {
        (Some(self.view.camera_mut()), None, None, None)
    }

    fn step(&mut self, window: &mut Window) {
        self.process_user_input(window.events());

        let outcome = self.scheduler.frame(
            Instant::now(),
            &mut self.registry,
            self.ephemeris.as_ref(),
            self.view.markers_mut(),
        );
        match outcome {
            FrameOutcome::Rendered(stats) => self.view.record_frame(stats),
            FrameOutcome::Stopped => {
                window.close();
                return;
            }
        }

        self.view.prerender_scene(
            window,
            &self.controller,
            self.scheduler.clock(),
            self.registry.len(),
        );
        self.controller.increment_frame_counter();
    }
}
