use crate::core::geometry::Vertex;
use crate::core::pipeline::Shader;
use crate::pipeline::device::UniformKind;
use crate::scene::light::Light;
use crate::scene::material::Material;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};

/// Name the program is linked under.
pub const NAME: &str = "gouraud";

/// Every uniform the program declares, in location order.
pub const UNIFORMS: &[(&str, UniformKind)] = &[
    ("model", UniformKind::Mat4),
    ("view", UniformKind::Mat4),
    ("projection", UniformKind::Mat4),
    ("viewPos", UniformKind::Vec3),
    ("material.ambient", UniformKind::Vec3),
    ("material.diffuse", UniformKind::Vec3),
    ("material.specular", UniformKind::Vec3),
    ("material.shininess", UniformKind::Float),
    ("light.position", UniformKind::Vec3),
    ("light.ambient", UniformKind::Vec3),
    ("light.diffuse", UniformKind::Vec3),
    ("light.specular", UniformKind::Vec3),
];

/// Phong lighting evaluated once per vertex; fragments get the
/// interpolated color.
pub struct GouraudShader {
    model: Matrix4<f32>,
    view_projection: Matrix4<f32>,
    normal_matrix: Matrix3<f32>,
    view_pos: Point3<f32>,
    material: Material,
    light: Light,
}

impl GouraudShader {
    pub fn new(
        model: Matrix4<f32>,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
        view_pos: Point3<f32>,
        material: Material,
        light: Light,
    ) -> Self {
        let linear: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
        // Inverse transpose keeps normals perpendicular under non-uniform scale.
        let normal_matrix = linear
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or(linear);

        Self {
            model,
            view_projection: projection * view,
            normal_matrix,
            view_pos,
            material,
            light,
        }
    }

    fn lighting(&self, world_pos: &Point3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
        let m = &self.material;
        let l = &self.light;

        let ambient = l.ambient.component_mul(&m.ambient);

        let light_dir = (l.position - world_pos)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros);
        let diff = normal.dot(&light_dir).max(0.0);
        let diffuse = l.diffuse.component_mul(&(m.diffuse * diff));

        let view_dir = (self.view_pos - world_pos)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros);
        let reflected = normal * (2.0 * normal.dot(&light_dir)) - light_dir;
        let spec = view_dir.dot(&reflected).max(0.0).powf(m.shininess);
        let specular = l.specular.component_mul(&(m.specular * spec));

        ambient + diffuse + specular
    }
}

impl Shader for GouraudShader {
    type Varying = Vector3<f32>;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let world = self.model * vertex.position.to_homogeneous();
        let world_pos = Point3::from(world.xyz());
        let normal = (self.normal_matrix * vertex.normal)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros);

        (self.view_projection * world, self.lighting(&world_pos, &normal))
    }

    fn fragment(&self, color: Self::Varying) -> Vector3<f32> {
        color.map(|c| c.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader(model: Matrix4<f32>, light: Light) -> GouraudShader {
        GouraudShader::new(
            model,
            Matrix4::identity(),
            Matrix4::identity(),
            Point3::new(0.0, 0.0, 5.0),
            Material::default(),
            light,
        )
    }

    #[test]
    fn facing_vertex_gets_all_three_terms() {
        let light = Light::from_color(Point3::new(0.0, 0.0, 5.0), Vector3::new(1.0, 1.0, 1.0));
        let s = shader(Matrix4::identity(), light.clone());
        let (_, color) = s.vertex(&Vertex::new(Point3::origin(), Vector3::z()));

        let m = Material::default();
        let expected = light.ambient.component_mul(&m.ambient)
            + light.diffuse.component_mul(&m.diffuse)
            + light.specular.component_mul(&m.specular);
        assert!((color - expected).norm() < 1e-5);
    }

    #[test]
    fn back_lit_vertex_keeps_only_ambient() {
        let light = Light::from_color(Point3::new(0.0, 0.0, -5.0), Vector3::new(1.0, 1.0, 1.0));
        let s = shader(Matrix4::identity(), light.clone());
        let (_, color) = s.vertex(&Vertex::new(Point3::origin(), Vector3::z()));
        let ambient = light.ambient.component_mul(&Material::default().ambient);
        assert!((color - ambient).norm() < 1e-5);
    }

    #[test]
    fn normals_use_inverse_transpose() {
        // Stretch x by 4: a 45° normal must tilt towards +y, not +x.
        let model = Matrix4::new_nonuniform_scaling(&Vector3::new(4.0, 1.0, 1.0));
        let s = shader(model, Light::default());
        let n = (s.normal_matrix * Vector3::new(1.0, 1.0, 0.0)).normalize();
        assert!(n.y > n.x);
        assert!((n - Vector3::new(0.25, 1.0, 0.0).normalize()).norm() < 1e-5);
    }

    #[test]
    fn fragment_clamps_to_displayable_range() {
        let s = shader(Matrix4::identity(), Light::default());
        assert_eq!(
            s.fragment(Vector3::new(-0.5, 0.5, 3.0)),
            Vector3::new(0.0, 0.5, 1.0)
        );
    }
}
