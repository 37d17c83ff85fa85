//! Synchronization primitives for frames in flight

use ash::{vk, Device};

use super::context::VulkanResult;

/// Binary semaphore with RAII cleanup
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create an unsignaled semaphore
    pub fn new(device: Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe { device.create_semaphore(&create_info, None)? };
        Ok(Self { device, semaphore })
    }

    /// Get the semaphore handle
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Fence with RAII cleanup
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a fence, optionally already signaled
    pub fn new(device: Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        let fence = unsafe { device.create_fence(&create_info, None)? };
        Ok(Self { device, fence })
    }

    /// Block until signaled or `timeout` nanoseconds pass
    pub fn wait(&self, timeout: u64) -> VulkanResult<()> {
        unsafe { self.device.wait_for_fences(&[self.fence], true, timeout)? };
        Ok(())
    }

    /// Return to the unsignaled state
    pub fn reset(&self) -> VulkanResult<()> {
        unsafe { self.device.reset_fences(&[self.fence])? };
        Ok(())
    }

    /// Get the fence handle
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// Synchronization objects for one frame in flight
///
/// The semaphore present waits on is kept per swapchain image instead, since
/// presentation of an image may still be pending when its frame slot comes
/// round again.
pub struct FrameSync {
    /// Signaled when the acquired swapchain image is ready
    pub image_available: Semaphore,
    /// Signaled when the frame's command buffer completed
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create the objects; the fence starts signaled so the first wait passes
    pub fn new(device: Device) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device.clone())?,
            in_flight: Fence::new(device, true)?,
        })
    }
}
