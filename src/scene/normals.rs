use crate::core::geometry::Face;
use log::warn;
use nalgebra::{Point3, Vector3};

/// Accumulated normals shorter than this are treated as undefined.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Direction assigned to vertices whose accumulated normal is undefined.
pub fn fallback_normal() -> Vector3<f32> {
    Vector3::y()
}

/// Computes smooth per-vertex normals from face geometry.
///
/// Each face adds its unnormalized cross product `(b - a) x (c - a)` to all
/// three of its vertices, so larger triangles weigh more. The sums are then
/// normalized. Vertices whose sum is zero (only degenerate faces, or no face
/// at all) get [`fallback_normal`].
///
/// Every face index must be in range; [`crate::scene::mesh::Mesh`] checks
/// this before calling.
pub fn generate_normals(positions: &[Point3<f32>], faces: &[Face]) -> Vec<Vector3<f32>> {
    let mut normals = vec![Vector3::zeros(); positions.len()];

    for face in faces {
        let [a, b, c] = face.indices.map(|i| i as usize);
        let edge0 = positions[b] - positions[a];
        let edge1 = positions[c] - positions[a];
        let weighted = edge0.cross(&edge1);

        normals[a] += weighted;
        normals[b] += weighted;
        normals[c] += weighted;
    }

    let mut degenerate = 0usize;
    for normal in &mut normals {
        match normal.try_normalize(DEGENERATE_EPSILON) {
            Some(unit) => *normal = unit,
            None => {
                *normal = fallback_normal();
                degenerate += 1;
            }
        }
    }

    if degenerate > 0 {
        warn!(
            "{} of {} vertices have no defined normal; using {:?}",
            degenerate,
            normals.len(),
            fallback_normal()
        );
    }

    normals
}
