use nalgebra::Vector3;

/// Phong surface constants, pushed to the program as `material.*` uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
}

impl Default for Material {
    /// Coral, the classic lighting-tutorial surface.
    fn default() -> Self {
        Self {
            ambient: Vector3::new(1.0, 0.5, 0.31),
            diffuse: Vector3::new(1.0, 0.5, 0.31),
            specular: Vector3::new(0.5, 0.5, 0.5),
            shininess: 32.0,
        }
    }
}
