use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

pub const NEAR: f32 = 0.01;
pub const FAR: f32 = 100.0;
pub const PITCH_LIMIT_DEG: f32 = 89.0;
pub const MIN_FOV_DEG: f32 = 1.0;
pub const MAX_FOV_DEG: f32 = 45.0;

/// Fly camera driven by yaw and pitch.
///
/// Angles are degrees at the public boundary and radians internally. The
/// basis vectors are derived from yaw and pitch and refreshed by every
/// setter, so `front`, `right` and `up` are always orthonormal.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    /// Viewport width / height, set on resize and used verbatim.
    pub aspect_ratio: f32,

    pitch: f32,
    yaw: f32,
    fov: f32,

    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
}

impl Camera {
    /// Camera looking down -Z (yaw -90°, pitch 0°) with a 45° field of view.
    pub fn new(position: Point3<f32>, aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position,
            aspect_ratio,
            pitch: 0.0,
            yaw: -90.0_f32.to_radians(),
            fov: MAX_FOV_DEG.to_radians(),
            front: -Vector3::z(),
            right: Vector3::x(),
            up: Vector3::y(),
        };
        camera.update_vectors();
        camera
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Pitch in degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch.to_degrees()
    }

    /// Sets pitch in degrees, clamped to [-89, 89] so the view never flips.
    pub fn set_pitch(&mut self, degrees: f32) {
        self.pitch = degrees.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG).to_radians();
        self.update_vectors();
    }

    /// Yaw in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw.to_degrees()
    }

    pub fn set_yaw(&mut self, degrees: f32) {
        self.yaw = degrees.to_radians();
        self.update_vectors();
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov.to_degrees()
    }

    /// Sets the field of view in degrees, clamped to [1, 45].
    pub fn set_fov(&mut self, degrees: f32) {
        self.fov = degrees.clamp(MIN_FOV_DEG, MAX_FOV_DEG).to_radians();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::look_at(&self.position, &(self.position + self.front), &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        TransformFactory::perspective(self.fov, self.aspect_ratio, NEAR, FAR)
    }

    fn update_vectors(&mut self) {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();

        self.front = Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize();
        self.right = self.front.cross(&Vector3::y()).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }
}
