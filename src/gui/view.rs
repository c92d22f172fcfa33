use kiss3d::text::Font;
use kiss3d::window::Window;
use nalgebra::{Point2, Point3};

use super::camera::GlobeCamera;
use super::controller::Controller;
use super::markers::{add_globe, MarkerSet};
use super::tooltip::TextTooltip;
use crate::model::clock::SimulatedClock;
use crate::model::picker::PointerPicker;
use crate::model::registry::TrackedObjectRegistry;
use crate::model::scheduler::FrameStats;

const HUD_FONT_SIZE: f32 = 60.0;
// Starting distance and zoom range, in globe radii
const CAMERA_DISTANCE: f64 = 3.0;
const CAMERA_MIN_DISTANCE: f64 = 1.05;
const CAMERA_MAX_DISTANCE: f64 = 20.0;

pub struct View {
    camera: GlobeCamera,
    markers: MarkerSet,
    tooltip: TextTooltip,
    last_frame: Option<FrameStats>,
}

impl View {
    pub fn new(
        window: &mut Window,
        registry: &TrackedObjectRegistry,
        globe_radius: f64,
        marker_radius: f64,
    ) -> Self {
        add_globe(window, globe_radius);

        let camera = GlobeCamera::new((globe_radius * CAMERA_DISTANCE) as f32)
            .with_distance_limits(
                (globe_radius * CAMERA_MIN_DISTANCE) as f32,
                (globe_radius * CAMERA_MAX_DISTANCE) as f32,
            );

        Self {
            camera,
            markers: MarkerSet::new(window, registry, marker_radius),
            tooltip: TextTooltip::default(),
            last_frame: None,
        }
    }

    pub fn camera_mut(&mut self) -> &mut GlobeCamera {
        &mut self.camera
    }

    pub fn markers_mut(&mut self) -> &mut MarkerSet {
        &mut self.markers
    }

    /// Picks against the current marker positions and updates the tooltip.
    pub fn handle_pointer(
        &mut self,
        x: f64,
        y: f64,
        picker: &PointerPicker,
        registry: &TrackedObjectRegistry,
    ) {
        picker.on_pointer_move(
            x,
            y,
            self.camera.width() as f64,
            self.camera.height() as f64,
            &self.camera,
            registry,
            &mut self.tooltip,
        );
    }

    pub fn record_frame(&mut self, stats: FrameStats) {
        self.last_frame = Some(stats);
    }

    pub fn prerender_scene(
        &mut self,
        window: &mut Window,
        controller: &Controller,
        clock: &SimulatedClock,
        object_count: usize,
    ) {
        window.draw_text(
            &self.time_summary_text(controller.fps(), clock, object_count),
            &Point2::origin(),
            HUD_FONT_SIZE,
            &Font::default(),
            &Point3::new(1.0, 1.0, 1.0),
        );
        self.tooltip.render(window);
    }

    fn time_summary_text(&self, fps: f64, clock: &SimulatedClock, object_count: usize) -> String {
        let frozen = self.last_frame.map_or(0, |stats| stats.frozen);
        format!(
            "Time: {}
Clock: {}
Objects: {} ({} frozen)
FPS: {:.0}",
            clock.current_instant().format("%Y-%m-%d %H:%M:%S UTC"),
            clock.mode(),
            object_count,
            frozen,
            fps,
        )
    }
}
