//! Mesh uploaded to device-local vertex and index buffers

use ash::{vk, Device};

use super::buffer::{IndexBuffer, VertexBuffer};
use super::commands::{CommandPool, CommandRecorder};
use super::context::{PhysicalDeviceInfo, VulkanResult};
use crate::render::primitives::Mesh;

/// GPU copy of a [`Mesh`]
pub struct GpuMesh {
    vertices: VertexBuffer,
    indices: IndexBuffer,
}

impl GpuMesh {
    /// Upload `mesh`
    pub fn new(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        command_pool: &CommandPool,
        queue: vk::Queue,
        mesh: &Mesh,
    ) -> VulkanResult<Self> {
        let vertices = VertexBuffer::new(device.clone(), physical_device, command_pool, queue, &mesh.vertices)?;
        let indices = IndexBuffer::new(device, physical_device, command_pool, queue, &mesh.indices)?;

        log::debug!(
            "Uploaded mesh: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(Self { vertices, indices })
    }

    /// Bind both buffers and draw every index
    pub fn draw(&self, recorder: &mut CommandRecorder) {
        recorder.bind_vertex_buffers(0, &[self.vertices.handle()], &[0]);
        recorder.bind_index_buffer(self.indices.handle());
        recorder.draw_indexed(self.indices.index_count());
    }
}
