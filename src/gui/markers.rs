use std::collections::HashMap;

use kiss3d::scene::SceneNode;
use kiss3d::window::Window;
use nalgebra::{Point3, Translation3};

use crate::model::registry::{ObjectId, TrackedObjectRegistry};
use crate::model::risk::RiskLevel;
use crate::model::scheduler::RenderSink;

const GLOBE_COLOR: [f32; 3] = [0.15, 0.35, 0.75];

fn marker_color(priority: Option<RiskLevel>) -> [f32; 3] {
    match priority {
        Some(RiskLevel::High) => [1.0, 0.2, 0.2],
        Some(RiskLevel::Medium) => [1.0, 0.6, 0.0],
        Some(RiskLevel::Low) | None => [1.0, 1.0, 0.0],
    }
}

fn set_position_helper(node: &mut SceneNode, position: &Point3<f64>) {
    let position: Point3<f32> = nalgebra::convert(*position);
    node.set_local_translation(Translation3::from(position));
}

pub fn add_globe(window: &mut Window, radius: f64) -> SceneNode {
    let mut globe = window.add_sphere(radius as f32);
    let [r, g, b] = GLOBE_COLOR;
    globe.set_color(r, g, b);
    globe
}

/// One sphere per tracked object, moved by the scheduler each frame.
pub struct MarkerSet {
    nodes: HashMap<ObjectId, SceneNode>,
}

impl MarkerSet {
    pub fn new(window: &mut Window, registry: &TrackedObjectRegistry, marker_radius: f64) -> Self {
        let mut nodes = HashMap::with_capacity(registry.len());
        for object in registry.iter() {
            let mut sphere = window.add_sphere(marker_radius as f32);
            let [r, g, b] = marker_color(object.aux().priority);
            sphere.set_color(r, g, b);
            set_position_helper(&mut sphere, &object.last_position());
            nodes.insert(object.id().clone(), sphere);
        }
        Self { nodes }
    }
}

impl RenderSink for MarkerSet {
    fn place_marker(&mut self, id: &ObjectId, position: &Point3<f64>) {
        if let Some(node) = self.nodes.get_mut(id) {
            set_position_helper(node, position);
        }
    }

    // kiss3d renders the whole scene graph once `step` returns
    fn draw(&mut self) {}
}
