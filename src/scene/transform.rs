use crate::core::math::transform::TransformFactory;
use log::debug;
use nalgebra::{Matrix4, Vector3};

/// Units per second applied by every incremental mutator.
pub const RATE: f32 = 1.0;

/// User-driven model transform: a Y rotation, a translation and a
/// component-wise scale, each nudged by `RATE * dt` per input event.
///
/// No value is clamped. Scale can reach zero or go negative, which
/// collapses or mirrors the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    /// Rotation about +Y, radians.
    pub rotation: f32,
    pub translation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            translation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl ModelTransform {
    pub fn new(rotation: f32, translation: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    pub fn rotate_y(&mut self, dt: f32) {
        self.rotation += RATE * dt;
    }

    pub fn rotate_y_reverse(&mut self, dt: f32) {
        self.rotation -= RATE * dt;
    }

    /// Moves along `direction`, which is not normalized.
    pub fn translate(&mut self, direction: Vector3<f32>, dt: f32) {
        self.translation += direction * (RATE * dt);
    }

    pub fn translate_up(&mut self, dt: f32) {
        self.translate(Vector3::y(), dt);
    }

    pub fn translate_down(&mut self, dt: f32) {
        self.translate(-Vector3::y(), dt);
    }

    pub fn translate_left(&mut self, dt: f32) {
        self.translate(-Vector3::x(), dt);
    }

    pub fn translate_right(&mut self, dt: f32) {
        self.translate(Vector3::x(), dt);
    }

    pub fn translate_forward(&mut self, dt: f32) {
        self.translate(-Vector3::z(), dt);
    }

    pub fn translate_backward(&mut self, dt: f32) {
        self.translate(Vector3::z(), dt);
    }

    /// Adds `direction * RATE * dt` to the scale factors, per axis.
    pub fn rescale(&mut self, direction: Vector3<f32>, dt: f32) {
        self.scale += direction * (RATE * dt);
        debug!("Model scale: {:?}", self.scale);
    }

    pub fn scale_up(&mut self, dt: f32) {
        self.rescale(Vector3::repeat(1.0), dt);
    }

    pub fn scale_down(&mut self, dt: f32) {
        self.rescale(Vector3::repeat(-1.0), dt);
    }

    /// Rebuilds the model matrix from scratch. Points are rotated about Y,
    /// then translated, then scaled, so the column-vector product is
    /// `S * T * RotY`.
    ///
    /// The order is fixed; changing it changes what users see.
    pub fn compose(&self) -> Matrix4<f32> {
        TransformFactory::scaling_nonuniform(&self.scale)
            * TransformFactory::translation(&self.translation)
            * TransformFactory::rotation_y(self.rotation)
    }
}
