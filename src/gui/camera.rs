use std::f32::consts::{FRAC_PI_2, PI};

use kiss3d::camera::Camera;
use kiss3d::event::{Action, Key, MouseButton, WindowEvent};
use kiss3d::resource::ShaderUniform;
use kiss3d::window::Canvas;
use nalgebra::{Isometry3, Matrix4, Perspective3, Point3, Vector2, Vector3};

const KEY_CAMERA_MOVE_UP: Key = Key::W;
const KEY_CAMERA_MOVE_DOWN: Key = Key::S;
const KEY_CAMERA_MOVE_LEFT: Key = Key::A;
const KEY_CAMERA_MOVE_RIGHT: Key = Key::D;
const KEY_CAMERA_ZOOM_IN: Key = Key::Equals;
const KEY_CAMERA_ZOOM_OUT: Key = Key::Minus;

const KEY_ANGLE_STEP: f32 = 0.1;
const KEY_ZOOM_STEP: f32 = 1.2;

// Orbits the globe at the origin, dragged to turn and scrolled to zoom. Unlike
// ArcBall, the up axis is +y (through the north pole), and the clipping planes
// follow the zoom so the globe never gets clipped at close range.
//
// Azimuth 0 puts the eye on +z, which with our longitude convention is above
// 90W on the equator.
pub struct GlobeCamera {
    // -- position --
    azimuth: f32,
    elevation: f32,
    distance: f32,
    // -- perspective --
    width: u32,
    height: u32,
    fovy: f32,
    // -- other --
    last_cursor_pos: Vector2<f32>,
    // -- knobs to fiddle with --
    angle_step: f32,
    scroll_ratio: f32,
    elevation_limit: f32,
    distance_limits: (f32, f32),
    z_near_multiplier: f32,
    z_far_multiplier: f32,
}

impl GlobeCamera {
    pub fn new(distance: f32) -> Self {
        GlobeCamera {
            azimuth: 0.0,
            elevation: 0.0,
            distance,
            width: 800,
            height: 600,
            fovy: PI / 4.0,
            last_cursor_pos: Vector2::zeros(),
            angle_step: 0.005,
            scroll_ratio: 1.1,
            elevation_limit: FRAC_PI_2 - 0.001,
            distance_limits: (0.0, f32::MAX),
            z_near_multiplier: 0.01,
            z_far_multiplier: 16.0,
        }
    }

    /// Keeps the eye between `min` and `max` from the centre of the globe.
    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.distance_limits = (min, max);
        self.distance = nalgebra::clamp(self.distance, min, max);
        self
    }

    fn projection(&self) -> Perspective3<f32> {
        Perspective3::new(
            self.width as f32 / self.height.max(1) as f32,
            self.fovy,
            self.distance * self.z_near_multiplier,
            self.distance * self.z_far_multiplier,
        )
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection().into_inner()
    }

    fn view_matrix(&self) -> Matrix4<f32> {
        self.view_transform().to_homogeneous()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotate(&mut self, dazimuth: f32, delevation: f32) {
        self.azimuth = (self.azimuth + dazimuth) % (2.0 * PI);
        self.elevation = nalgebra::clamp(
            self.elevation + delevation,
            -self.elevation_limit,
            self.elevation_limit,
        );
    }

    pub fn zoom(&mut self, factor: f32) {
        self.distance = nalgebra::clamp(
            self.distance * factor,
            self.distance_limits.0,
            self.distance_limits.1,
        );
    }
}

impl Camera for GlobeCamera {
    fn handle_event(&mut self, canvas: &Canvas, event: &WindowEvent) {
        match *event {
            WindowEvent::CursorPos(x, y, _) => {
                let curr_pos = Vector2::new(x as f32, y as f32);

                if canvas.get_mouse_button(MouseButton::Button1) == Action::Press {
                    // Drag the globe along with the cursor
                    let dpos = curr_pos - self.last_cursor_pos;
                    self.rotate(-dpos.x * self.angle_step, dpos.y * self.angle_step);
                }

                self.last_cursor_pos = curr_pos;
            }
            WindowEvent::Scroll(_, off, _) => {
                // scroll up == zoom in
                if off < 0.0 {
                    self.zoom(self.scroll_ratio);
                } else if off > 0.0 {
                    self.zoom(self.scroll_ratio.recip())
                }
            }
            WindowEvent::FramebufferSize(w, h) => self.set_viewport(w, h),
            WindowEvent::Key(KEY_CAMERA_MOVE_UP, Action::Press, _) => {
                self.rotate(0.0, KEY_ANGLE_STEP)
            }
            WindowEvent::Key(KEY_CAMERA_MOVE_DOWN, Action::Press, _) => {
                self.rotate(0.0, -KEY_ANGLE_STEP)
            }
            WindowEvent::Key(KEY_CAMERA_MOVE_LEFT, Action::Press, _) => {
                self.rotate(-KEY_ANGLE_STEP, 0.0)
            }
            WindowEvent::Key(KEY_CAMERA_MOVE_RIGHT, Action::Press, _) => {
                self.rotate(KEY_ANGLE_STEP, 0.0)
            }
            WindowEvent::Key(KEY_CAMERA_ZOOM_IN, Action::Press, _) => {
                self.zoom(KEY_ZOOM_STEP.recip())
            }
            WindowEvent::Key(KEY_CAMERA_ZOOM_OUT, Action::Press, _) => self.zoom(KEY_ZOOM_STEP),
            _ => {}
        }
    }

    fn eye(&self) -> Point3<f32> {
        Point3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        )
    }

    fn view_transform(&self) -> Isometry3<f32> {
        Isometry3::look_at_rh(&self.eye(), &Point3::origin(), &Vector3::y())
    }

    fn transformation(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    fn inverse_transformation(&self) -> Matrix4<f32> {
        // Only singular for a degenerate viewport
        self.transformation()
            .try_inverse()
            .unwrap_or_else(Matrix4::identity)
    }

    fn clip_planes(&self) -> (f32, f32) {
        (self.projection().znear(), self.projection().zfar())
    }

    // Framebuffer size, which is what cursor positions are reported in
    fn update(&mut self, canvas: &Canvas) {
        let (width, height) = canvas.size();
        self.set_viewport(width, height);
    }

    fn upload(
        &self,
        _: usize,
        proj: &mut ShaderUniform<Matrix4<f32>>,
        view: &mut ShaderUniform<Matrix4<f32>>,
    ) {
        proj.upload(&self.projection_matrix());
        view.upload(&self.view_matrix());
    }
}
