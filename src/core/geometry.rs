use nalgebra::{Point3, Vector3};

/// A vertex as fetched from device buffers by the vertex stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector for lighting calculations.
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// One triangle of a mesh: three 0-based indices into the vertex list.
///
/// The order of the indices is the winding order and decides which side
/// of the triangle faces forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub indices: [u32; 3],
}

impl Face {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }

    /// Largest index referenced by this face.
    pub fn max_index(&self) -> u32 {
        self.indices[0].max(self.indices[1]).max(self.indices[2])
    }
}
