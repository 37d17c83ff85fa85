//! Buffer management for vertex, index and uniform data

use ash::{vk, Device};

use super::commands::CommandPool;
use super::context::{PhysicalDeviceInfo, VulkanError, VulkanResult};

/// Buffer with its own memory allocation
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory to it
    pub fn new(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        if size == 0 {
            return Err(VulkanError::InvalidOperation {
                reason: "cannot create an empty buffer".to_string(),
            });
        }

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { device.create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory = physical_device
            .find_memory_type(requirements.memory_type_bits, properties)
            .and_then(|memory_type_index| {
                let alloc_info = vk::MemoryAllocateInfo::builder()
                    .allocation_size(requirements.size)
                    .memory_type_index(memory_type_index);
                Ok(unsafe { device.allocate_memory(&alloc_info, None)? })
            });

        let memory = match memory {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(err);
            }
        };

        if let Err(err) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
            unsafe {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
            }
            return Err(err.into());
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Host-visible, host-coherent buffer for CPU writes
    pub fn host_visible(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
    ) -> VulkanResult<Self> {
        Self::new(
            device,
            physical_device,
            size,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )
    }

    /// Staging buffer filled with `bytes`
    pub fn staging(device: Device, physical_device: &PhysicalDeviceInfo, bytes: &[u8]) -> VulkanResult<Self> {
        let buffer = Self::host_visible(
            device,
            physical_device,
            bytes.len() as vk::DeviceSize,
            vk::BufferUsageFlags::TRANSFER_SRC,
        )?;
        buffer.write_bytes(0, bytes)?;
        Ok(buffer)
    }

    /// Device-local buffer filled from `bytes` through a staging copy
    pub fn device_local_with_data(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        command_pool: &CommandPool,
        queue: vk::Queue,
        usage: vk::BufferUsageFlags,
        bytes: &[u8],
    ) -> VulkanResult<Self> {
        let staging = Self::staging(device.clone(), physical_device, bytes)?;
        let buffer = Self::new(
            device,
            physical_device,
            staging.size,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        command_pool.execute_one_time(queue, |recorder| {
            recorder.copy_buffer(staging.handle(), buffer.handle(), staging.size);
        })?;

        Ok(buffer)
    }

    /// Copy `bytes` into host-visible memory at `offset`
    pub fn write_bytes(&self, offset: vk::DeviceSize, bytes: &[u8]) -> VulkanResult<()> {
        let len = bytes.len() as vk::DeviceSize;
        if offset + len > self.size {
            return Err(VulkanError::InvalidOperation {
                reason: format!("write of {} bytes at {} overflows buffer of {}", len, offset, self.size),
            });
        }

        unsafe {
            let ptr = self
                .device
                .map_memory(self.memory, offset, len, vk::MemoryMapFlags::empty())?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.cast::<u8>(), bytes.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Map the whole buffer until [`Buffer::unmap`]
    pub fn map(&self) -> VulkanResult<*mut u8> {
        let ptr = unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())?
        };
        Ok(ptr.cast())
    }

    /// Release a mapping made with [`Buffer::map`]
    pub fn unmap(&self) {
        unsafe { self.device.unmap_memory(self.memory) };
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Device-local vertex buffer
pub struct VertexBuffer {
    buffer: Buffer,
}

impl VertexBuffer {
    /// Upload plain-old-data vertices
    pub fn new<T: bytemuck::Pod>(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        command_pool: &CommandPool,
        queue: vk::Queue,
        vertices: &[T],
    ) -> VulkanResult<Self> {
        let buffer = Buffer::device_local_with_data(
            device,
            physical_device,
            command_pool,
            queue,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            bytemuck::cast_slice(vertices),
        )?;
        Ok(Self { buffer })
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

/// Device-local 32-bit index buffer
pub struct IndexBuffer {
    buffer: Buffer,
    index_count: u32,
}

impl IndexBuffer {
    /// Upload indices
    pub fn new(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        command_pool: &CommandPool,
        queue: vk::Queue,
        indices: &[u32],
    ) -> VulkanResult<Self> {
        let buffer = Buffer::device_local_with_data(
            device,
            physical_device,
            command_pool,
            queue,
            vk::BufferUsageFlags::INDEX_BUFFER,
            bytemuck::cast_slice(indices),
        )?;
        Ok(Self {
            buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Number of indices
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
