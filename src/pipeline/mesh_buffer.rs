use crate::core::geometry::Face;
use crate::pipeline::device::{
    BufferData, BufferHandle, DeviceError, GraphicsDevice, ProgramHandle, VertexLayout,
};
use crate::scene::mesh::Mesh;
use log::debug;
use nalgebra::{Point3, Vector3};

/// A mesh resident on the device: position, normal and index buffers plus
/// the layout binding them to attribute slots.
///
/// Uploading is the constructor, so a buffer is never filled twice; drawing
/// reads the index count back from the device.
#[derive(Debug, PartialEq, Eq)]
pub struct MeshBuffer {
    layout: VertexLayout,
}

impl MeshBuffer {
    /// Uploads positions to slot 0, normals to slot 1 (when present) and
    /// the flattened faces to the index buffer.
    ///
    /// On failure every buffer created so far is released again.
    pub fn upload<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        positions: &[Point3<f32>],
        normals: &[Vector3<f32>],
        faces: &[Face],
    ) -> Result<Self, DeviceError> {
        let position_data: Vec<[f32; 3]> = positions.iter().map(|p| [p.x, p.y, p.z]).collect();
        let normal_data: Vec<[f32; 3]> = normals.iter().map(|n| [n.x, n.y, n.z]).collect();
        let index_data: Vec<u32> = faces.iter().flat_map(|f| f.indices).collect();

        let positions = device.create_buffer(BufferData::Vec3(&position_data))?;

        let normals = if normal_data.is_empty() {
            None
        } else {
            match device.create_buffer(BufferData::Vec3(&normal_data)) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    device.delete_buffer(positions);
                    return Err(e);
                }
            }
        };

        let indices = match device.create_buffer(BufferData::Index(&index_data)) {
            Ok(handle) => handle,
            Err(e) => {
                device.delete_buffer(positions);
                if let Some(normals) = normals {
                    device.delete_buffer(normals);
                }
                return Err(e);
            }
        };

        debug!(
            "Uploaded {} vertices and {} indices",
            position_data.len(),
            index_data.len()
        );

        Ok(Self {
            layout: VertexLayout {
                positions,
                normals,
                indices,
            },
        })
    }

    pub fn from_mesh<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        mesh: &Mesh,
    ) -> Result<Self, DeviceError> {
        Self::upload(device, &mesh.positions, &mesh.normals, &mesh.faces)
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.layout.indices
    }

    /// Number of indices, derived from the index buffer's byte size.
    pub fn index_count<D: GraphicsDevice + ?Sized>(&self, device: &D) -> Result<usize, DeviceError> {
        Ok(device.buffer_size(self.layout.indices)? / std::mem::size_of::<u32>())
    }

    /// Issues one indexed triangle-list draw with `program`.
    pub fn draw<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        program: ProgramHandle,
    ) -> Result<(), DeviceError> {
        let count = self.index_count(device)?;
        device.draw_indexed(program, &self.layout, count)
    }

    /// Releases all buffers. Consumes the handle so it cannot be drawn again.
    pub fn release<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        for buffer in self.layout.buffers() {
            device.delete_buffer(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::device::UniformValue;
    use std::collections::HashMap;

    /// Stores byte sizes only; fails `create_buffer` after `budget` calls.
    #[derive(Default)]
    struct Counting {
        next: u32,
        budget: Option<usize>,
        sizes: HashMap<u32, usize>,
        draws: Vec<(ProgramHandle, VertexLayout, usize)>,
    }

    impl GraphicsDevice for Counting {
        fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, DeviceError> {
            if let Some(budget) = self.budget.as_mut() {
                if *budget == 0 {
                    return Err(DeviceError::BufferKind(BufferHandle(0)));
                }
                *budget -= 1;
            }
            self.next += 1;
            self.sizes.insert(self.next, data.byte_len());
            Ok(BufferHandle(self.next))
        }
        fn delete_buffer(&mut self, buffer: BufferHandle) {
            self.sizes.remove(&buffer.0);
        }
        fn buffer_size(&self, buffer: BufferHandle) -> Result<usize, DeviceError> {
            self.sizes.get(&buffer.0).copied().ok_or(DeviceError::UnknownBuffer(buffer))
        }
        fn create_program(&mut self, name: &str) -> Result<ProgramHandle, DeviceError> {
            Err(DeviceError::UnknownProgram(name.to_string()))
        }
        fn delete_program(&mut self, _: ProgramHandle) {}
        fn set_uniform(&mut self, _: ProgramHandle, _: &str, _: UniformValue) -> Result<(), DeviceError> {
            Ok(())
        }
        fn clear(&mut self, _: Vector3<f32>) {}
        fn draw_indexed(
            &mut self,
            program: ProgramHandle,
            layout: &VertexLayout,
            index_count: usize,
        ) -> Result<(), DeviceError> {
            self.draws.push((program, *layout, index_count));
            Ok(())
        }
    }

    fn quad() -> Mesh {
        Mesh::from_source("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n").unwrap()
    }

    #[test]
    fn draw_uses_index_count_from_buffer_size() {
        let mut device = Counting::default();
        let buffer = MeshBuffer::from_mesh(&mut device, &quad()).unwrap();

        assert_eq!(device.buffer_size(buffer.layout().positions).unwrap(), 4 * 12);
        assert!(buffer.layout().normals.is_some());
        assert_eq!(buffer.index_count(&device).unwrap(), 6);

        buffer.draw(&mut device, ProgramHandle(9)).unwrap();
        assert_eq!(device.draws.len(), 1);
        assert_eq!(device.draws[0].0, ProgramHandle(9));
        assert_eq!(device.draws[0].2, 6);
    }

    #[test]
    fn normal_slot_stays_empty_without_normals() {
        let mut device = Counting::default();
        let mesh = quad();
        let buffer = MeshBuffer::upload(&mut device, &mesh.positions, &[], &mesh.faces).unwrap();
        assert_eq!(buffer.layout().normals, None);
        assert_eq!(device.sizes.len(), 2);
    }

    #[test]
    fn failed_upload_releases_partial_buffers() {
        let mut device = Counting {
            budget: Some(2),
            ..Default::default()
        };
        let err = MeshBuffer::from_mesh(&mut device, &quad()).unwrap_err();
        assert!(matches!(err, DeviceError::BufferKind(_)));
        assert!(device.sizes.is_empty());
    }

    #[test]
    fn release_frees_every_buffer() {
        let mut device = Counting::default();
        let buffer = MeshBuffer::from_mesh(&mut device, &quad()).unwrap();
        assert_eq!(device.sizes.len(), 3);
        buffer.release(&mut device);
        assert!(device.sizes.is_empty());
    }
}
