use nalgebra::Vector3;
use rayon::prelude::*;

/// Color + depth targets of the software device.
///
/// Rows are handed out as disjoint mutable slices so that a triangle's rows
/// can be shaded in parallel without any locking.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    color: Vec<Vector3<f32>>,
    depth: Vec<f32>,
}

/// One scanline of the color and depth buffers.
pub struct RowMut<'a> {
    pub color: &'a mut [Vector3<f32>],
    pub depth: &'a mut [f32],
}

impl RowMut<'_> {
    /// Writes `color` at column `x` if `depth` is closer than what is stored.
    #[inline]
    pub fn depth_test_and_set(&mut self, x: usize, depth: f32, color: Vector3<f32>) -> bool {
        match self.depth.get_mut(x) {
            Some(stored) if depth < *stored => {
                *stored = depth;
                self.color[x] = color;
                true
            }
            _ => false,
        }
    }
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let size = width * height;
        Self {
            width,
            height,
            color: vec![Vector3::zeros(); size],
            depth: vec![f32::INFINITY; size],
        }
    }

    /// Reallocates the targets for a new viewport size. Contents are lost.
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self, color: Vector3<f32>) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.color[self.index(x, y)])
    }

    pub fn get_depth(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.depth[self.index(x, y)])
    }

    /// Parallel iterator over rows `first..last` (exclusive), clamped to the buffer.
    pub fn rows_mut(
        &mut self,
        first: usize,
        last: usize,
    ) -> impl IndexedParallelIterator<Item = (usize, RowMut<'_>)> {
        let width = self.width;
        let last = last.min(self.height);
        let first = first.min(last);
        let span = first * width..last * width;

        self.color[span.clone()]
            .par_chunks_mut(width)
            .zip(self.depth[span].par_chunks_mut(width))
            .enumerate()
            .map(move |(i, (color, depth))| (first + i, RowMut { color, depth }))
    }

    /// Packs the color buffer as 0RGB words, the layout minifb presents.
    pub fn write_argb(&self, out: &mut Vec<u32>) {
        out.clear();
        out.extend(self.color.iter().map(|c| {
            let [r, g, b] = to_rgb8(c);
            ((r as u32) << 16) | ((g as u32) << 8) | b as u32
        }));
    }

    /// Tightly packed RGB8 bytes, row-major from the top-left corner.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.color.iter().flat_map(to_rgb8).collect()
    }
}

#[inline]
fn to_rgb8(color: &Vector3<f32>) -> [u8; 3] {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(color.x), channel(color.y), channel(color.z)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_test_keeps_the_closest_fragment() {
        let mut fb = FrameBuffer::new(4, 2);
        let red = Vector3::new(1.0, 0.0, 0.0);
        let blue = Vector3::new(0.0, 0.0, 1.0);

        fb.rows_mut(1, 2).for_each(|(_, mut row)| {
            assert!(row.depth_test_and_set(3, 0.5, red));
            assert!(!row.depth_test_and_set(3, 0.7, blue));
        });

        assert_eq!(fb.get_pixel(3, 1), Some(red));
        assert_eq!(fb.get_depth(3, 1), Some(0.5));
        assert_eq!(fb.get_depth(3, 0), Some(f32::INFINITY));
    }

    #[test]
    fn rows_are_clamped_to_height() {
        let mut fb = FrameBuffer::new(3, 3);
        let rows: Vec<usize> = fb.rows_mut(2, 10).map(|(y, _)| y).collect();
        assert_eq!(rows, vec![2]);
    }

    #[test]
    fn argb_packing_clamps_channels() {
        let mut fb = FrameBuffer::new(1, 1);
        fb.clear(Vector3::new(2.0, 0.5, -1.0));
        let mut out = Vec::new();
        fb.write_argb(&mut out);
        assert_eq!(out, vec![0x00FF_8000]);
        assert_eq!(fb.to_rgb8(), vec![255, 128, 0]);
    }
}
