//! CPU implementation of [`GraphicsDevice`].
//!
//! Buffers live in host memory keyed by handle. Programs are the built-in
//! shaders under `pipeline::shaders`; linking one resolves its declared
//! uniform names to locations once, so setting a uniform is a map lookup
//! and a type check.

use crate::core::framebuffer::FrameBuffer;
use crate::core::geometry::Vertex;
use crate::core::pipeline::Shader;
use crate::core::rasterizer::{CullMode, Rasterizer};
use crate::pipeline::device::{
    BufferData, BufferHandle, DeviceError, GraphicsDevice, ProgramHandle, UniformKind,
    UniformValue, VertexLayout,
};
use crate::pipeline::shaders::gouraud::{self, GouraudShader};
use crate::scene::light::Light;
use crate::scene::material::Material;
use log::{debug, warn};
use nalgebra::{Matrix4, Point3, Vector3};
use rayon::prelude::*;
use std::collections::HashMap;

enum Storage {
    Vec3(Vec<[f32; 3]>),
    Index(Vec<u32>),
}

impl Storage {
    fn byte_len(&self) -> usize {
        match self {
            Storage::Vec3(data) => std::mem::size_of_val(data.as_slice()),
            Storage::Index(data) => std::mem::size_of_val(data.as_slice()),
        }
    }
}

/// A linked program: its uniform locations and current values.
struct LinkedProgram {
    locations: HashMap<&'static str, usize>,
    values: Vec<UniformValue>,
}

impl LinkedProgram {
    fn link(declared: &'static [(&'static str, UniformKind)]) -> Self {
        Self {
            locations: declared
                .iter()
                .enumerate()
                .map(|(location, (name, _))| (*name, location))
                .collect(),
            values: declared.iter().map(|(_, kind)| kind.zero()).collect(),
        }
    }

    fn mat4(&self, name: &str) -> Matrix4<f32> {
        match self.get(name) {
            Some(UniformValue::Mat4(m)) => m,
            _ => Matrix4::zeros(),
        }
    }

    fn vec3(&self, name: &str) -> Vector3<f32> {
        match self.get(name) {
            Some(UniformValue::Vec3(v)) => v,
            _ => Vector3::zeros(),
        }
    }

    fn float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(UniformValue::Float(f)) => f,
            _ => 0.0,
        }
    }

    fn get(&self, name: &str) -> Option<UniformValue> {
        self.locations.get(name).map(|&loc| self.values[loc])
    }

    fn gouraud(&self) -> GouraudShader {
        GouraudShader::new(
            self.mat4("model"),
            self.mat4("view"),
            self.mat4("projection"),
            Point3::from(self.vec3("viewPos")),
            Material {
                ambient: self.vec3("material.ambient"),
                diffuse: self.vec3("material.diffuse"),
                specular: self.vec3("material.specular"),
                shininess: self.float("material.shininess"),
            },
            Light {
                position: Point3::from(self.vec3("light.position")),
                ambient: self.vec3("light.ambient"),
                diffuse: self.vec3("light.diffuse"),
                specular: self.vec3("light.specular"),
            },
        )
    }
}

pub struct SoftwareDevice {
    framebuffer: FrameBuffer,
    rasterizer: Rasterizer,
    buffers: HashMap<BufferHandle, Storage>,
    programs: HashMap<ProgramHandle, LinkedProgram>,
    next_id: u32,
}

impl SoftwareDevice {
    pub fn new(width: usize, height: usize, cull_mode: CullMode) -> Self {
        Self {
            framebuffer: FrameBuffer::new(width, height),
            rasterizer: Rasterizer::new(cull_mode),
            buffers: HashMap::new(),
            programs: HashMap::new(),
            next_id: 0,
        }
    }

    /// Resizes the render targets. A zero dimension is ignored.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) != (self.framebuffer.width, self.framebuffer.height) {
            debug!("Resizing framebuffer to {}x{}", width, height);
            self.framebuffer.resize(width, height);
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Copies the last frame into a window buffer as 0RGB words.
    pub fn present(&self, out: &mut Vec<u32>) {
        self.framebuffer.write_argb(out);
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

fn vec3_storage(
    buffers: &HashMap<BufferHandle, Storage>,
    handle: BufferHandle,
) -> Result<&[[f32; 3]], DeviceError> {
    match buffers.get(&handle) {
        Some(Storage::Vec3(data)) => Ok(data),
        Some(Storage::Index(_)) => Err(DeviceError::BufferKind(handle)),
        None => Err(DeviceError::UnknownBuffer(handle)),
    }
}

fn index_storage(
    buffers: &HashMap<BufferHandle, Storage>,
    handle: BufferHandle,
) -> Result<&[u32], DeviceError> {
    match buffers.get(&handle) {
        Some(Storage::Index(data)) => Ok(data),
        Some(Storage::Vec3(_)) => Err(DeviceError::BufferKind(handle)),
        None => Err(DeviceError::UnknownBuffer(handle)),
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, DeviceError> {
        let storage = match data {
            BufferData::Vec3(data) => Storage::Vec3(data.to_vec()),
            BufferData::Index(data) => Storage::Index(data.to_vec()),
        };
        let handle = BufferHandle(self.next_id());
        debug!("Created buffer {} ({} bytes)", handle.0, storage.byte_len());
        self.buffers.insert(handle, storage);
        Ok(handle)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_some() {
            debug!("Deleted buffer {}", buffer.0);
        }
    }

    fn buffer_size(&self, buffer: BufferHandle) -> Result<usize, DeviceError> {
        self.buffers
            .get(&buffer)
            .map(Storage::byte_len)
            .ok_or(DeviceError::UnknownBuffer(buffer))
    }

    fn create_program(&mut self, name: &str) -> Result<ProgramHandle, DeviceError> {
        let declared = match name {
            gouraud::NAME => gouraud::UNIFORMS,
            _ => return Err(DeviceError::UnknownProgram(name.to_string())),
        };
        let handle = ProgramHandle(self.next_id());
        self.programs.insert(handle, LinkedProgram::link(declared));
        debug!(
            "Linked program '{}' as {} ({} uniforms)",
            name,
            handle.0,
            declared.len()
        );
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_some() {
            debug!("Deleted program {}", program.0);
        }
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), DeviceError> {
        let linked = self
            .programs
            .get_mut(&program)
            .ok_or(DeviceError::UnknownProgramHandle(program))?;
        let location = *linked
            .locations
            .get(name)
            .ok_or_else(|| DeviceError::UnknownUniform {
                program,
                name: name.to_string(),
            })?;
        let slot = &mut linked.values[location];
        if slot.kind() != value.kind() {
            return Err(DeviceError::UniformType {
                name: name.to_string(),
            });
        }
        *slot = value;
        Ok(())
    }

    fn clear(&mut self, color: Vector3<f32>) {
        self.framebuffer.clear(color);
    }

    fn draw_indexed(
        &mut self,
        program: ProgramHandle,
        layout: &VertexLayout,
        index_count: usize,
    ) -> Result<(), DeviceError> {
        let shader = self
            .programs
            .get(&program)
            .ok_or(DeviceError::UnknownProgramHandle(program))?
            .gouraud();

        let positions = vec3_storage(&self.buffers, layout.positions)?;
        let normals = match layout.normals {
            Some(handle) => vec3_storage(&self.buffers, handle)?,
            None => &[][..],
        };
        let indices = index_storage(&self.buffers, layout.indices)?;

        let count = index_count.min(indices.len());
        if count < index_count {
            warn!(
                "Draw of {} indices clamped to the {} stored",
                index_count,
                indices.len()
            );
        }
        let indices = &indices[..count - count % 3];

        let vertex_count = positions.len();
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(DeviceError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        // Vertex stage runs once per vertex, not once per reference.
        let shaded: Vec<_> = positions
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let normal = normals.get(i).copied().unwrap_or([0.0; 3]);
                shader.vertex(&Vertex::new(Point3::from(*p), Vector3::from(normal)))
            })
            .collect();

        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [shaded[tri[0] as usize], shaded[tri[1] as usize], shaded[tri[2] as usize]];
            self.rasterizer.draw_triangle(
                &mut self.framebuffer,
                &shader,
                [a.0, b.0, c.0],
                [a.1, b.1, c.1],
            );
        }
        Ok(())
    }
}
