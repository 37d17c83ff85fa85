//! Per-draw uniform snapshots in a dynamic uniform buffer
//!
//! Every draw copies the program's current uniform block into the next slot
//! of the current frame's region and binds it with a dynamic offset, so
//! changing uniforms between draws never overwrites data an earlier draw in
//! the same command buffer still reads.

use ash::{vk, Device};

use super::buffer::Buffer;
use super::context::{PhysicalDeviceInfo, VulkanError, VulkanResult};
use crate::render::shader::align_up;

/// Slot bookkeeping for a ring of `frames` regions of `slots_per_frame` slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCursor {
    slot_size: usize,
    slots_per_frame: usize,
    frames: usize,
    frame: usize,
    next_slot: usize,
}

impl RingCursor {
    /// Slots of `block_size` bytes rounded up to `min_alignment`
    pub fn new(block_size: usize, min_alignment: usize, slots_per_frame: usize, frames: usize) -> Self {
        let alignment = min_alignment.max(1).next_power_of_two();
        Self {
            slot_size: align_up(block_size.max(1), alignment),
            slots_per_frame,
            frames,
            frame: 0,
            next_slot: 0,
        }
    }

    /// Total bytes the backing buffer needs
    pub fn buffer_size(&self) -> usize {
        self.slot_size * self.slots_per_frame * self.frames
    }

    /// Bytes per slot
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Start filling the region of `frame`
    pub fn begin_frame(&mut self, frame: usize) {
        self.frame = frame % self.frames;
        self.next_slot = 0;
    }

    /// Claim the next slot, returning its byte offset
    pub fn claim(&mut self) -> Option<usize> {
        if self.next_slot >= self.slots_per_frame {
            return None;
        }
        let offset = (self.frame * self.slots_per_frame + self.next_slot) * self.slot_size;
        self.next_slot += 1;
        Some(offset)
    }
}

/// Persistently mapped host-visible ring for one program's uniform block
pub struct UniformRing {
    cursor: RingCursor,
    block_size: usize,
    mapped: *mut u8,
    buffer: Buffer,
}

impl UniformRing {
    /// Allocate and map the ring
    pub fn new(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        block_size: usize,
        slots_per_frame: usize,
        frames: usize,
    ) -> VulkanResult<Self> {
        let min_alignment = physical_device.properties.limits.min_uniform_buffer_offset_alignment as usize;
        let cursor = RingCursor::new(block_size, min_alignment, slots_per_frame, frames);

        let buffer = Buffer::host_visible(
            device,
            physical_device,
            cursor.buffer_size() as vk::DeviceSize,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
        )?;
        let mapped = buffer.map()?;

        log::debug!(
            "Uniform ring: {} byte slots, {} per frame, {} frames",
            cursor.slot_size(),
            slots_per_frame,
            frames
        );

        Ok(Self {
            cursor,
            block_size,
            mapped,
            buffer,
        })
    }

    /// Start writing the region of `frame`
    pub fn begin_frame(&mut self, frame: usize) {
        self.cursor.begin_frame(frame);
    }

    /// Copy `block` into the next slot and return its dynamic offset
    pub fn push(&mut self, block: &[u8]) -> VulkanResult<u32> {
        if block.len() != self.block_size {
            return Err(VulkanError::InvalidOperation {
                reason: format!("uniform block is {} bytes, ring expects {}", block.len(), self.block_size),
            });
        }
        let offset = self.cursor.claim().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "too many draws this frame for the uniform ring; raise max_draws_per_frame".to_string(),
        })?;

        unsafe {
            std::ptr::copy_nonoverlapping(block.as_ptr(), self.mapped.add(offset), block.len());
        }
        Ok(offset as u32)
    }

    /// Backing buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Size of one block, the descriptor range
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl Drop for UniformRing {
    fn drop(&mut self) {
        self.buffer.unmap();
    }
}
