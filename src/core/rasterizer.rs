use crate::core::framebuffer::FrameBuffer;
use crate::core::math::transform::{ndc_to_screen, perspective_divide};
use crate::core::pipeline::{Interpolatable, Shader};
use nalgebra::{Point2, Point3, Vector4};
use rayon::prelude::*;

/// Which triangles are discarded before rasterization.
///
/// Front faces are counter-clockwise in normalized device coordinates.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub enum CullMode {
    #[default]
    None,
    Back,
    Front,
}

impl CullMode {
    /// Parses the configuration spelling. Unknown names disable culling.
    pub fn from_name(name: &str) -> Self {
        match name {
            "back" => CullMode::Back,
            "front" => CullMode::Front,
            _ => CullMode::None,
        }
    }
}

type ClipVertex<V> = (Vector4<f32>, V);

/// Frustum planes as (axis, sign): a point is inside when `sign * p[axis] <= p.w`.
const CLIP_PLANES: [(usize, f32); 6] = [
    (2, -1.0), // near
    (2, 1.0),  // far
    (0, -1.0), // left
    (0, 1.0),  // right
    (1, -1.0), // bottom
    (1, 1.0),  // top
];

/// Turns clip-space triangles into shaded, depth-tested pixels.
#[derive(Debug, Default)]
pub struct Rasterizer {
    pub cull_mode: CullMode,
}

impl Rasterizer {
    pub fn new(cull_mode: CullMode) -> Self {
        Self { cull_mode }
    }

    /// Clips the triangle against the view frustum in homogeneous space,
    /// then fans the resulting convex polygon into triangles.
    pub fn draw_triangle<S: Shader>(
        &self,
        framebuffer: &mut FrameBuffer,
        shader: &S,
        clip: [Vector4<f32>; 3],
        varyings: [S::Varying; 3],
    ) {
        let mut polygon: Vec<ClipVertex<S::Varying>> =
            clip.into_iter().zip(varyings).collect();
        let mut scratch = Vec::with_capacity(9);

        for &(axis, sign) in &CLIP_PLANES {
            clip_against_plane(&polygon, &mut scratch, axis, sign);
            std::mem::swap(&mut polygon, &mut scratch);
            if polygon.len() < 3 {
                return;
            }
        }

        let anchor = polygon[0];
        for pair in polygon[1..].windows(2) {
            self.fill_triangle(framebuffer, shader, [anchor, pair[0], pair[1]]);
        }
    }

    /// Rasterizes a triangle already inside the frustum.
    fn fill_triangle<S: Shader>(
        &self,
        framebuffer: &mut FrameBuffer,
        shader: &S,
        corners: [ClipVertex<S::Varying>; 3],
    ) {
        let width = framebuffer.width as f32;
        let height = framebuffer.height as f32;

        let mut ndc = [Point3::origin(); 3];
        for (slot, (pos, _)) in ndc.iter_mut().zip(&corners) {
            match perspective_divide(pos) {
                Some(p) => *slot = p,
                None => return,
            }
        }

        // Winding is judged in NDC, where +Y points up.
        let ndc_area = (ndc[1].x - ndc[0].x) * (ndc[2].y - ndc[0].y)
            - (ndc[2].x - ndc[0].x) * (ndc[1].y - ndc[0].y);
        let culled = match self.cull_mode {
            CullMode::None => ndc_area == 0.0,
            CullMode::Back => ndc_area <= 0.0,
            CullMode::Front => ndc_area >= 0.0,
        };
        if culled {
            return;
        }

        let screen = ndc.map(|p| ndc_to_screen(&p, width, height));
        let area = edge(&screen[0], &screen[1], &screen[2]);
        if area.abs() < 1e-8 {
            return;
        }
        let inv_area = 1.0 / area;
        let inv_w = corners.map(|(pos, _)| 1.0 / pos.w);
        let varyings = corners.map(|(_, v)| v);

        let min_x = screen.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
        let max_x = screen.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil().min(width - 1.0);
        let min_y = screen.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
        let max_y = screen.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil().min(height - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as usize, max_y as usize);

        framebuffer.rows_mut(min_y, max_y + 1).for_each(|(y, mut row)| {
            for x in min_x..=max_x {
                let p = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                let b0 = edge(&screen[1], &screen[2], &p) * inv_area;
                let b1 = edge(&screen[2], &screen[0], &p) * inv_area;
                let b2 = edge(&screen[0], &screen[1], &p) * inv_area;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }

                // NDC depth is affine in screen space; attributes are not.
                let z_ndc = b0 * ndc[0].z + b1 * ndc[1].z + b2 * ndc[2].z;
                let depth = z_ndc * 0.5 + 0.5;

                let (c0, c1, c2) = (b0 * inv_w[0], b1 * inv_w[1], b2 * inv_w[2]);
                let sum = c0 + c1 + c2;
                if sum.abs() < 1e-12 {
                    continue;
                }
                let norm = 1.0 / sum;
                let varying =
                    varyings[0] * (c0 * norm) + varyings[1] * (c1 * norm) + varyings[2] * (c2 * norm);

                if row.depth.get(x).is_some_and(|stored| depth < *stored) {
                    row.depth_test_and_set(x, depth, shader.fragment(varying));
                }
            }
        });
    }
}

/// Twice the signed area of (a, b, p).
#[inline(always)]
fn edge(a: &Point2<f32>, b: &Point2<f32>, p: &Point2<f32>) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// One Sutherland-Hodgman pass. `output` is cleared first.
fn clip_against_plane<V: Interpolatable>(
    input: &[ClipVertex<V>],
    output: &mut Vec<ClipVertex<V>>,
    axis: usize,
    sign: f32,
) {
    output.clear();
    let Some(&last) = input.last() else {
        return;
    };

    // Signed distance to the plane, positive inside.
    let distance = |p: &Vector4<f32>| p.w - sign * p[axis];

    let mut prev = last;
    let mut prev_dist = distance(&prev.0);
    for &curr in input {
        let curr_dist = distance(&curr.0);
        if (prev_dist >= 0.0) != (curr_dist >= 0.0) {
            let t = prev_dist / (prev_dist - curr_dist);
            output.push((
                prev.0 + (curr.0 - prev.0) * t,
                prev.1 * (1.0 - t) + curr.1 * t,
            ));
        }
        if curr_dist >= 0.0 {
            output.push(curr);
        }
        prev = curr;
        prev_dist = curr_dist;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vertex;
    use nalgebra::Vector3;

    /// Passes clip coordinates straight through and paints everything white.
    struct Flat;

    impl Shader for Flat {
        type Varying = Vector3<f32>;

        fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Vector3<f32>) {
            (vertex.position.to_homogeneous(), Vector3::zeros())
        }

        fn fragment(&self, _varying: Vector3<f32>) -> Vector3<f32> {
            Vector3::new(1.0, 1.0, 1.0)
        }
    }

    fn triangle(winding_ccw: bool) -> [Vector4<f32>; 3] {
        let a = Vector4::new(-0.5, -0.5, 0.0, 1.0);
        let b = Vector4::new(0.5, -0.5, 0.0, 1.0);
        let c = Vector4::new(0.0, 0.5, 0.0, 1.0);
        if winding_ccw { [a, b, c] } else { [a, c, b] }
    }

    fn lit_pixels(fb: &FrameBuffer) -> usize {
        (0..fb.height)
            .flat_map(|y| (0..fb.width).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.get_pixel(x, y).is_some_and(|c| c.x > 0.5))
            .count()
    }

    #[test]
    fn fills_center_of_visible_triangle() {
        let mut fb = FrameBuffer::new(32, 32);
        Rasterizer::new(CullMode::None).draw_triangle(&mut fb, &Flat, triangle(true), [Vector3::zeros(); 3]);
        assert_eq!(fb.get_pixel(16, 16), Some(Vector3::new(1.0, 1.0, 1.0)));
        assert_eq!(fb.get_pixel(1, 1), Some(Vector3::zeros()));
    }

    #[test]
    fn back_face_culling_follows_winding() {
        let raster = Rasterizer::new(CullMode::Back);

        let mut front = FrameBuffer::new(32, 32);
        raster.draw_triangle(&mut front, &Flat, triangle(true), [Vector3::zeros(); 3]);
        assert!(lit_pixels(&front) > 0);

        let mut back = FrameBuffer::new(32, 32);
        raster.draw_triangle(&mut back, &Flat, triangle(false), [Vector3::zeros(); 3]);
        assert_eq!(lit_pixels(&back), 0);
    }

    #[test]
    fn triangle_behind_the_camera_is_clipped_away() {
        let mut fb = FrameBuffer::new(16, 16);
        let behind = triangle(true).map(|mut v| {
            v.w = -1.0;
            v
        });
        Rasterizer::default().draw_triangle(&mut fb, &Flat, behind, [Vector3::zeros(); 3]);
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn clipping_a_corner_yields_a_quad() {
        let poly = [
            (Vector4::new(0.0, 0.0, 0.0, 1.0), Vector3::zeros()),
            (Vector4::new(2.0, 0.0, 0.0, 1.0), Vector3::zeros()),
            (Vector4::new(0.0, 0.5, 0.0, 1.0), Vector3::zeros()),
        ];
        let mut out = Vec::new();
        clip_against_plane(&poly, &mut out, 0, 1.0);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|(p, _)| p.x <= p.w + 1e-6));
    }
}
