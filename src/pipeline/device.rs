//! The explicit graphics-device context.
//!
//! Nothing here is ambient: every operation names the device and the
//! buffers/programs it touches, so several meshes and programs can live on
//! one device at once.

use log::{debug, warn};
use nalgebra::{Matrix4, Vector3};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Attribute slot of vertex positions.
pub const POSITION_SLOT: usize = 0;
/// Attribute slot of vertex normals.
pub const NORMAL_SLOT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramHandle(pub u32);

/// Tightly packed data for a new device buffer.
#[derive(Debug, Clone, Copy)]
pub enum BufferData<'a> {
    /// Three `f32` per element (positions, normals).
    Vec3(&'a [[f32; 3]]),
    /// One `u32` per element (triangle-list indices).
    Index(&'a [u32]),
}

impl BufferData<'_> {
    pub fn byte_len(&self) -> usize {
        match self {
            BufferData::Vec3(data) => std::mem::size_of_val(*data),
            BufferData::Index(data) => std::mem::size_of_val(*data),
        }
    }
}

/// The buffers bound to each attribute slot plus the index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Slot [`POSITION_SLOT`].
    pub positions: BufferHandle,
    /// Slot [`NORMAL_SLOT`], absent when the mesh has no normals.
    pub normals: Option<BufferHandle>,
    pub indices: BufferHandle,
}

impl VertexLayout {
    /// Buffer bound to an attribute slot, if any.
    pub fn attribute(&self, slot: usize) -> Option<BufferHandle> {
        match slot {
            POSITION_SLOT => Some(self.positions),
            NORMAL_SLOT => self.normals,
            _ => None,
        }
    }

    /// Every buffer referenced by the layout.
    pub fn buffers(&self) -> impl Iterator<Item = BufferHandle> {
        [Some(self.positions), self.normals, Some(self.indices)]
            .into_iter()
            .flatten()
    }
}

/// A value for a named uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vector3<f32>),
    Mat4(Matrix4<f32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec3,
    Mat4,
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

impl UniformKind {
    /// The value a uniform holds before it is first set.
    pub fn zero(self) -> UniformValue {
        match self {
            UniformKind::Float => UniformValue::Float(0.0),
            UniformKind::Vec3 => UniformValue::Vec3(Vector3::zeros()),
            UniformKind::Mat4 => UniformValue::Mat4(Matrix4::zeros()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// No program with this name can be built by the device.
    UnknownProgram(String),
    /// The handle was never created or was already released.
    UnknownBuffer(BufferHandle),
    UnknownProgramHandle(ProgramHandle),
    /// The program declares no uniform with this name.
    UnknownUniform { program: ProgramHandle, name: String },
    /// A uniform was given a value of the wrong type.
    UniformType { name: String },
    /// A buffer was bound to a slot expecting another element type.
    BufferKind(BufferHandle),
    /// An index refers past the end of the bound vertex buffers.
    IndexOutOfRange { index: u32, vertex_count: usize },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::UnknownProgram(name) => write!(f, "failed to link program '{name}'"),
            DeviceError::UnknownBuffer(h) => write!(f, "unknown buffer {}", h.0),
            DeviceError::UnknownProgramHandle(h) => write!(f, "unknown program {}", h.0),
            DeviceError::UnknownUniform { program, name } => {
                write!(f, "program {} has no uniform named '{name}'", program.0)
            }
            DeviceError::UniformType { name } => write!(f, "wrong value type for uniform '{name}'"),
            DeviceError::BufferKind(h) => write!(f, "buffer {} has the wrong element type", h.0),
            DeviceError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(f, "index {index} out of range for {vertex_count} vertices"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// A graphics device holding buffers and linked programs.
pub trait GraphicsDevice {
    fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, DeviceError>;

    /// Releases a buffer. Releasing an unknown handle is a no-op.
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Size of the buffer's storage in bytes.
    fn buffer_size(&self, buffer: BufferHandle) -> Result<usize, DeviceError>;

    /// Compiles and links the named program, caching its uniform locations.
    fn create_program(&mut self, name: &str) -> Result<ProgramHandle, DeviceError>;

    /// Releases a program. Releasing an unknown handle is a no-op.
    fn delete_program(&mut self, program: ProgramHandle);

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), DeviceError>;

    fn clear(&mut self, color: Vector3<f32>);

    /// Draws `index_count` indices of `layout` as a triangle list.
    fn draw_indexed(
        &mut self,
        program: ProgramHandle,
        layout: &VertexLayout,
        index_count: usize,
    ) -> Result<(), DeviceError>;
}

/// String-keyed access to a program's uniforms.
///
/// Every setter fails with [`DeviceError::UnknownUniform`] when the program
/// declares no uniform of that name.
pub trait Uniforms {
    fn set_matrix4(&mut self, name: &str, value: &Matrix4<f32>) -> Result<(), DeviceError>;
    fn set_vector3(&mut self, name: &str, value: &Vector3<f32>) -> Result<(), DeviceError>;
    fn set_float(&mut self, name: &str, value: f32) -> Result<(), DeviceError>;

    fn set_model_matrix(&mut self, value: &Matrix4<f32>) -> Result<(), DeviceError> {
        self.set_matrix4("model", value)
    }

    fn set_view_matrix(&mut self, value: &Matrix4<f32>) -> Result<(), DeviceError> {
        self.set_matrix4("view", value)
    }

    fn set_projection_matrix(&mut self, value: &Matrix4<f32>) -> Result<(), DeviceError> {
        self.set_matrix4("projection", value)
    }
}

/// A program on a device, borrowed for setting uniforms.
pub struct ProgramUniforms<'a, D: GraphicsDevice + ?Sized> {
    device: &'a mut D,
    program: ProgramHandle,
}

impl<'a, D: GraphicsDevice + ?Sized> ProgramUniforms<'a, D> {
    pub fn new(device: &'a mut D, program: ProgramHandle) -> Self {
        Self { device, program }
    }
}

impl<D: GraphicsDevice + ?Sized> Uniforms for ProgramUniforms<'_, D> {
    fn set_matrix4(&mut self, name: &str, value: &Matrix4<f32>) -> Result<(), DeviceError> {
        self.device
            .set_uniform(self.program, name, UniformValue::Mat4(*value))
    }

    fn set_vector3(&mut self, name: &str, value: &Vector3<f32>) -> Result<(), DeviceError> {
        self.device
            .set_uniform(self.program, name, UniformValue::Vec3(*value))
    }

    fn set_float(&mut self, name: &str, value: f32) -> Result<(), DeviceError> {
        self.device
            .set_uniform(self.program, name, UniformValue::Float(value))
    }
}

/// Owns a device and releases every buffer and program created through it
/// exactly once: either explicitly, or when the scope is dropped.
///
/// Drop runs on every exit path, including an early `?` out of the frame loop.
pub struct DeviceScope<D: GraphicsDevice> {
    device: D,
    buffers: BTreeSet<BufferHandle>,
    programs: BTreeSet<ProgramHandle>,
}

impl<D: GraphicsDevice> DeviceScope<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            buffers: BTreeSet::new(),
            programs: BTreeSet::new(),
        }
    }

    /// Number of buffers and programs not yet released.
    pub fn live_resources(&self) -> usize {
        self.buffers.len() + self.programs.len()
    }
}

impl<D: GraphicsDevice> Deref for DeviceScope<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.device
    }
}

impl<D: GraphicsDevice> DerefMut for DeviceScope<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: GraphicsDevice> GraphicsDevice for DeviceScope<D> {
    fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, DeviceError> {
        let handle = self.device.create_buffer(data)?;
        self.buffers.insert(handle);
        Ok(handle)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer) {
            self.device.delete_buffer(buffer);
        } else {
            warn!("Buffer {} released twice or never owned; ignoring", buffer.0);
        }
    }

    fn buffer_size(&self, buffer: BufferHandle) -> Result<usize, DeviceError> {
        self.device.buffer_size(buffer)
    }

    fn create_program(&mut self, name: &str) -> Result<ProgramHandle, DeviceError> {
        let handle = self.device.create_program(name)?;
        self.programs.insert(handle);
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program) {
            self.device.delete_program(program);
        } else {
            warn!("Program {} released twice or never owned; ignoring", program.0);
        }
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), DeviceError> {
        self.device.set_uniform(program, name, value)
    }

    fn clear(&mut self, color: Vector3<f32>) {
        self.device.clear(color);
    }

    fn draw_indexed(
        &mut self,
        program: ProgramHandle,
        layout: &VertexLayout,
        index_count: usize,
    ) -> Result<(), DeviceError> {
        self.device.draw_indexed(program, layout, index_count)
    }
}

impl<D: GraphicsDevice> Drop for DeviceScope<D> {
    fn drop(&mut self) {
        if self.live_resources() > 0 {
            debug!(
                "Releasing {} buffers and {} programs",
                self.buffers.len(),
                self.programs.len()
            );
        }
        for buffer in std::mem::take(&mut self.buffers) {
            self.device.delete_buffer(buffer);
        }
        for program in std::mem::take(&mut self.programs) {
            self.device.delete_program(program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Records deletions in a log shared with the test.
    #[derive(Default)]
    struct Recording {
        next: u32,
        sizes: HashMap<u32, usize>,
        deleted: Rc<RefCell<Vec<String>>>,
    }

    impl GraphicsDevice for Recording {
        fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, DeviceError> {
            self.next += 1;
            self.sizes.insert(self.next, data.byte_len());
            Ok(BufferHandle(self.next))
        }
        fn delete_buffer(&mut self, buffer: BufferHandle) {
            self.deleted.borrow_mut().push(format!("buffer {}", buffer.0));
        }
        fn buffer_size(&self, buffer: BufferHandle) -> Result<usize, DeviceError> {
            self.sizes.get(&buffer.0).copied().ok_or(DeviceError::UnknownBuffer(buffer))
        }
        fn create_program(&mut self, _name: &str) -> Result<ProgramHandle, DeviceError> {
            self.next += 1;
            Ok(ProgramHandle(self.next))
        }
        fn delete_program(&mut self, program: ProgramHandle) {
            self.deleted.borrow_mut().push(format!("program {}", program.0));
        }
        fn set_uniform(&mut self, program: ProgramHandle, name: &str, _: UniformValue) -> Result<(), DeviceError> {
            Err(DeviceError::UnknownUniform { program, name: name.to_string() })
        }
        fn clear(&mut self, _color: Vector3<f32>) {}
        fn draw_indexed(&mut self, _: ProgramHandle, _: &VertexLayout, _: usize) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    #[test]
    fn byte_len_is_tightly_packed() {
        assert_eq!(BufferData::Vec3(&[[0.0; 3]; 4]).byte_len(), 48);
        assert_eq!(BufferData::Index(&[0, 1, 2]).byte_len(), 12);
    }

    #[test]
    fn scope_releases_leftovers_on_drop() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut scope = DeviceScope::new(Recording {
                deleted: log.clone(),
                ..Default::default()
            });
            let a = scope.create_buffer(BufferData::Index(&[0, 1, 2])).unwrap();
            let _b = scope.create_buffer(BufferData::Index(&[3])).unwrap();
            let _p = scope.create_program("anything").unwrap();
            scope.delete_buffer(a);
            assert_eq!(scope.live_resources(), 2);
        }
        assert_eq!(*log.borrow(), vec!["buffer 1", "buffer 2", "program 3"]);
    }

    #[test]
    fn double_release_reaches_the_device_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scope = DeviceScope::new(Recording {
            deleted: log.clone(),
            ..Default::default()
        });
        let a = scope.create_buffer(BufferData::Index(&[0])).unwrap();
        scope.delete_buffer(a);
        scope.delete_buffer(a);
        drop(scope);
        assert_eq!(*log.borrow(), vec!["buffer 1"]);
    }

    #[test]
    fn uniform_failures_surface_the_name() {
        let mut device = Recording::default();
        let mut uniforms = ProgramUniforms::new(&mut device, ProgramHandle(7));
        let err = uniforms.set_view_matrix(&Matrix4::identity()).unwrap_err();
        assert_eq!(
            err,
            DeviceError::UnknownUniform {
                program: ProgramHandle(7),
                name: "view".to_string()
            }
        );
    }
}
