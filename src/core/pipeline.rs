use crate::core::geometry::Vertex;
use nalgebra::{Vector3, Vector4};
use std::ops::{Add, Mul};

/// Values that can be blended across a triangle with barycentric weights.
///
/// `Send + Sync` because fragments of one triangle are shaded on several
/// rayon workers at once.
pub trait Interpolatable:
    Copy + Add<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
}

impl Interpolatable for Vector3<f32> {}

/// The programmable stages of the software pipeline.
pub trait Shader: Send + Sync {
    /// Per-vertex outputs interpolated for each fragment.
    type Varying: Interpolatable;

    /// Transforms a vertex into homogeneous clip space and produces its varying.
    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying);

    /// Returns the linear RGB color of a fragment.
    fn fragment(&self, varying: Self::Varying) -> Vector3<f32>;
}
