use crate::scene::mesh::Mesh;
use nalgebra::{Point3, Vector3};

/// Recenters the mesh on the origin and scales it so its largest extent is
/// `size`. Normals are direction-only and stay untouched.
///
/// Returns the original bounding-box center and the scale factor applied.
pub fn fit_to_unit(mesh: &mut Mesh, size: f32) -> (Point3<f32>, f32) {
    let Some(first) = mesh.positions.first().copied() else {
        return (Point3::origin(), 1.0);
    };

    let (min, max) = mesh
        .positions
        .iter()
        .fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));

    let center = nalgebra::center(&min, &max);
    let extent: Vector3<f32> = max - min;
    let largest = extent.max();
    let factor = if largest > 1e-6 { size / largest } else { 1.0 };

    for p in &mut mesh.positions {
        *p = Point3::from((*p - center) * factor);
    }

    (center, factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recenters_and_rescales() {
        let mut mesh = Mesh::from_source("v 2 2 2\nv 6 4 2\nv 2 2 3\nf 1 2 3\n").unwrap();
        let (center, factor) = fit_to_unit(&mut mesh, 2.0);

        assert_eq!(center, Point3::new(4.0, 3.0, 2.5));
        assert!((factor - 0.5).abs() < 1e-6);
        assert_eq!(mesh.positions[0], Point3::new(-1.0, -0.5, -0.25));
        assert_eq!(mesh.positions[1], Point3::new(1.0, 0.5, -0.25));
    }

    #[test]
    fn empty_mesh_is_left_alone() {
        let mut mesh = Mesh::from_source("").unwrap();
        assert_eq!(fit_to_unit(&mut mesh, 2.0), (Point3::origin(), 1.0));
    }
}
