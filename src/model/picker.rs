use kiss3d::camera::Camera;
use nalgebra::{Matrix4, Point3};

use crate::math::geometry::Ray;

use super::registry::{AuxAttributes, ObjectId, TrackedObjectRegistry};

/// Receives the tooltip for whatever is under the pointer.
pub trait TooltipSink {
    fn show(&mut self, text: &str, x: f64, y: f64);
    fn hide(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickedObject {
    pub id: ObjectId,
    pub display_name: String,
    pub aux: AuxAttributes,
    /// Screen position the tooltip should be anchored to.
    pub screen_x: f64,
    pub screen_y: f64,
    /// Distance from the camera to the marker surface, in render units.
    pub distance: f64,
}

impl PickedObject {
    pub fn tooltip_text(&self) -> String {
        let mut text = self.display_name.clone();
        if let Some(catalog_number) = self.aux.catalog_number {
            text.push_str(&format!("\nNORAD ID: {}", catalog_number));
        }
        if let Some(priority) = self.aux.priority {
            text.push_str(&format!("\nPriority: {}", priority));
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickResult {
    None,
    Hit(PickedObject),
}

/// Resolves the marker under the pointer by casting a ray through the camera.
///
/// Every marker is a sphere of `marker_radius` around its last position. When
/// several are under the pointer, the one nearest the camera wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPicker {
    marker_radius: f64,
}

impl PointerPicker {
    pub fn new(marker_radius: f64) -> Self {
        Self { marker_radius }
    }

    pub fn marker_radius(&self) -> f64 {
        self.marker_radius
    }

    /// Ray from the eye through the given window coordinate, or None for a
    /// degenerate viewport.
    pub fn pointer_ray(
        &self,
        screen_x: f64,
        screen_y: f64,
        viewport_width: f64,
        viewport_height: f64,
        camera: &dyn Camera,
    ) -> Option<Ray> {
        let inputs = [screen_x, screen_y, viewport_width, viewport_height];
        if inputs.iter().any(|v| !v.is_finite()) || viewport_width <= 0.0 || viewport_height <= 0.0
        {
            return None;
        }

        let ndc_x = 2.0 * screen_x / viewport_width - 1.0;
        let ndc_y = -(2.0 * screen_y / viewport_height) + 1.0;

        let inverse: Matrix4<f64> = nalgebra::convert(camera.inverse_transformation());
        let far_point = inverse.transform_point(&Point3::new(ndc_x, ndc_y, 1.0));
        let eye: Point3<f64> = nalgebra::convert(camera.eye());

        if !far_point.coords.iter().all(|c| c.is_finite()) {
            return None;
        }
        Ray::through(eye, far_point)
    }

    pub fn pick(
        &self,
        screen_x: f64,
        screen_y: f64,
        viewport_width: f64,
        viewport_height: f64,
        camera: &dyn Camera,
        registry: &TrackedObjectRegistry,
    ) -> PickResult {
        let ray = match self.pointer_ray(screen_x, screen_y, viewport_width, viewport_height, camera)
        {
            Some(ray) => ray,
            None => return PickResult::None,
        };

        let nearest = registry
            .iter()
            .filter_map(|object| {
                ray.intersect_sphere(&object.last_position(), self.marker_radius)
                    .map(|distance| (distance, object))
            })
            .min_by(|(a, _), (b, _)| a.total_cmp(b));

        match nearest {
            Some((distance, object)) => PickResult::Hit(PickedObject {
                id: object.id().clone(),
                display_name: object.display_name().to_owned(),
                aux: object.aux().clone(),
                screen_x,
                screen_y,
                distance,
            }),
            None => PickResult::None,
        }
    }

    /// Picks and forwards the result to the tooltip: shown on a hit, hidden
    /// otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn on_pointer_move(
        &self,
        screen_x: f64,
        screen_y: f64,
        viewport_width: f64,
        viewport_height: f64,
        camera: &dyn Camera,
        registry: &TrackedObjectRegistry,
        sink: &mut dyn TooltipSink,
    ) -> PickResult {
        let result = self.pick(
            screen_x,
            screen_y,
            viewport_width,
            viewport_height,
            camera,
            registry,
        );

        match &result {
            PickResult::Hit(picked) => {
                log::trace!("Pointer over {} at {:.3}", picked.id, picked.distance);
                sink.show(&picked.tooltip_text(), picked.screen_x, picked.screen_y);
            }
            PickResult::None => sink.hide(),
        }
        result
    }
}
