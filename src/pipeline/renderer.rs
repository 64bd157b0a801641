use crate::pipeline::device::{DeviceError, GraphicsDevice, ProgramHandle, ProgramUniforms, Uniforms};
use crate::pipeline::mesh_buffer::MeshBuffer;
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::material::Material;
use nalgebra::{Matrix4, Vector3};

/// Everything the render step pushes besides the matrices.
pub struct Renderer {
    pub program: ProgramHandle,
    pub material: Material,
    pub light: Light,
    pub clear_color: Vector3<f32>,
}

impl Renderer {
    pub fn new(program: ProgramHandle, material: Material, light: Light) -> Self {
        Self {
            program,
            material,
            light,
            clear_color: Vector3::new(0.2, 0.3, 0.3),
        }
    }

    /// Draws one frame: clear, push uniforms, draw the mesh.
    pub fn render_frame<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        mesh: &MeshBuffer,
        model: &Matrix4<f32>,
        camera: &Camera,
    ) -> Result<(), DeviceError> {
        device.clear(self.clear_color);
        self.push_uniforms(&mut ProgramUniforms::new(device, self.program), model, camera)?;
        mesh.draw(device, self.program)
    }

    /// Sets every uniform the lighting program reads.
    pub fn push_uniforms<U: Uniforms + ?Sized>(
        &self,
        uniforms: &mut U,
        model: &Matrix4<f32>,
        camera: &Camera,
    ) -> Result<(), DeviceError> {
        uniforms.set_model_matrix(model)?;
        uniforms.set_view_matrix(&camera.view_matrix())?;
        uniforms.set_projection_matrix(&camera.projection_matrix())?;
        uniforms.set_vector3("viewPos", &camera.position.coords)?;

        let m = &self.material;
        uniforms.set_vector3("material.ambient", &m.ambient)?;
        uniforms.set_vector3("material.diffuse", &m.diffuse)?;
        uniforms.set_vector3("material.specular", &m.specular)?;
        uniforms.set_float("material.shininess", m.shininess)?;

        let l = &self.light;
        uniforms.set_vector3("light.position", &l.position.coords)?;
        uniforms.set_vector3("light.ambient", &l.ambient)?;
        uniforms.set_vector3("light.diffuse", &l.diffuse)?;
        uniforms.set_vector3("light.specular", &l.specular)
    }
}
