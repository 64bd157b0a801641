use nalgebra::{Point3, Vector3};

/// A point light with separate Phong terms, pushed as `light.*` uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub position: Point3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl Light {
    /// Derives the Phong terms from one color: ambient 0.2x, diffuse 0.5x,
    /// specular full white.
    pub fn from_color(position: Point3<f32>, color: Vector3<f32>) -> Self {
        Self {
            position,
            ambient: color * 0.2,
            diffuse: color * 0.5,
            specular: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// The color-cycling light: each channel follows its own sine of `seconds`.
    pub fn pulsing(position: Point3<f32>, seconds: f32) -> Self {
        let color = Vector3::new(
            (seconds * 2.0).sin(),
            (seconds * 0.7).sin(),
            (seconds * 1.3).sin(),
        );
        Self::from_color(position, color)
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::from_color(Point3::new(1.2, 1.0, 2.0), Vector3::new(1.0, 1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_scale_from_color() {
        let light = Light::from_color(Point3::origin(), Vector3::new(1.0, 0.5, 0.0));
        assert_eq!(light.ambient, Vector3::new(0.2, 0.1, 0.0));
        assert_eq!(light.diffuse, Vector3::new(0.5, 0.25, 0.0));
        assert_eq!(light.specular, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn pulsing_follows_per_channel_sines() {
        let t = 1.25;
        let light = Light::pulsing(Point3::origin(), t);
        let expected = Vector3::new((t * 2.0).sin(), (t * 0.7).sin(), (t * 1.3).sin()) * 0.5;
        assert!((light.diffuse - expected).norm() < 1e-6);
        assert_eq!(Light::pulsing(Point3::origin(), 0.0).diffuse, Vector3::zeros());
    }
}
