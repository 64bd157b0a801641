use crate::core::rasterizer::CullMode;
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::material::Material;
use crate::scene::transform::ModelTransform;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub material: MaterialConfig,
    #[serde(default)]
    pub light: LightConfig,
}

#[derive(Debug, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_target_fps")]
    pub target_fps: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            target_fps: default_target_fps(),
        }
    }
}

fn default_width() -> usize {
    800
}
fn default_height() -> usize {
    600
}
fn default_title() -> String {
    "Mesh Viewer".to_string()
}
fn default_target_fps() -> usize {
    60
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_background")]
    pub background: [f32; 3],
    #[serde(default = "default_cull_mode")]
    pub cull_mode: String, // "back", "front", "none"
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            cull_mode: default_cull_mode(),
        }
    }
}

impl RenderConfig {
    pub fn cull_mode(&self) -> CullMode {
        CullMode::from_name(&self.cull_mode)
    }
}

fn default_background() -> [f32; 3] {
    [0.2, 0.3, 0.3]
}
fn default_cull_mode() -> String {
    "none".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default = "default_yaw")]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            yaw: default_yaw(),
            pitch: 0.0,
            fov: default_fov(),
            speed: default_speed(),
            sensitivity: default_sensitivity(),
            zoom_speed: default_zoom_speed(),
        }
    }
}

impl CameraConfig {
    /// Builds the camera through its clamping setters.
    pub fn to_camera(&self, aspect_ratio: f32) -> Camera {
        let mut camera = Camera::new(Point3::from(self.position), aspect_ratio);
        camera.set_yaw(self.yaw);
        camera.set_pitch(self.pitch);
        camera.set_fov(self.fov);
        camera
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 3.0]
}
fn default_yaw() -> f32 {
    -90.0
}
fn default_fov() -> f32 {
    45.0
}
fn default_speed() -> f32 {
    1.5
}
fn default_sensitivity() -> f32 {
    0.2
}
fn default_zoom_speed() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub path: Option<String>,
    /// Radians about +Y.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub fit_to_unit: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            rotation: 0.0,
            translation: [0.0; 3],
            scale: default_scale(),
            fit_to_unit: false,
        }
    }
}

impl ModelConfig {
    pub fn to_transform(&self) -> ModelTransform {
        ModelTransform {
            rotation: self.rotation,
            translation: Vector3::from(self.translation),
            scale: Vector3::from(self.scale),
        }
    }
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Deserialize)]
pub struct MaterialConfig {
    #[serde(default = "default_coral")]
    pub ambient: [f32; 3],
    #[serde(default = "default_coral")]
    pub diffuse: [f32; 3],
    #[serde(default = "default_specular")]
    pub specular: [f32; 3],
    #[serde(default = "default_shininess")]
    pub shininess: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            ambient: default_coral(),
            diffuse: default_coral(),
            specular: default_specular(),
            shininess: default_shininess(),
        }
    }
}

impl MaterialConfig {
    pub fn to_material(&self) -> Material {
        Material {
            ambient: Vector3::from(self.ambient),
            diffuse: Vector3::from(self.diffuse),
            specular: Vector3::from(self.specular),
            shininess: self.shininess,
        }
    }
}

fn default_coral() -> [f32; 3] {
    [1.0, 0.5, 0.31]
}
fn default_specular() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}
fn default_shininess() -> f32 {
    32.0
}

#[derive(Debug, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],
    #[serde(default = "default_light_color")]
    pub color: [f32; 3],
    /// Cycle the color over time instead of using `color`.
    #[serde(default = "default_true")]
    pub animate: bool,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: default_light_position(),
            color: default_light_color(),
            animate: true,
        }
    }
}

impl LightConfig {
    /// The light as seen `seconds` after start.
    pub fn light_at(&self, seconds: f32) -> Light {
        let position = Point3::from(self.position);
        if self.animate {
            Light::pulsing(position, seconds)
        } else {
            Light::from_color(position, Vector3::from(self.color))
        }
    }
}

fn default_light_position() -> [f32; 3] {
    [1.2, 1.0, 2.0]
}
fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
fn default_true() -> bool {
    true
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
