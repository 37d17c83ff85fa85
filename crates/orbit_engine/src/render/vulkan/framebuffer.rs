//! Framebuffers and the shared depth attachment

use ash::{vk, Device};

use super::context::{PhysicalDeviceInfo, VulkanResult};
use super::image::{Image, ImageSpec};
use super::render_pass::DEPTH_FORMAT;

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a framebuffer over `attachments`
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.create_framebuffer(&create_info, None)? };
        Ok(Self { device, framebuffer })
    }

    /// Get the framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// Depth image shared by every swapchain framebuffer
pub struct DepthBuffer {
    image: Image,
}

impl DepthBuffer {
    /// Create a depth buffer matching `extent`
    pub fn new(device: Device, physical_device: &PhysicalDeviceInfo, extent: vk::Extent2D) -> VulkanResult<Self> {
        let image = Image::new(device, physical_device, ImageSpec::depth(DEPTH_FORMAT, extent))?;
        Ok(Self { image })
    }

    /// Get the image view handle
    pub fn image_view(&self) -> vk::ImageView {
        self.image.view()
    }
}

/// Per-swapchain-image framebuffers plus their depth buffer
///
/// Rebuilt whenever the swapchain is recreated.
pub struct FramebufferSet {
    framebuffers: Vec<Framebuffer>,
    depth: DepthBuffer,
    extent: vk::Extent2D,
}

impl FramebufferSet {
    /// One framebuffer per swapchain image view
    pub fn new(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        render_pass: vk::RenderPass,
        color_views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let depth = DepthBuffer::new(device.clone(), physical_device, extent)?;
        let framebuffers = color_views
            .iter()
            .map(|&view| Framebuffer::new(device.clone(), render_pass, &[view, depth.image_view()], extent))
            .collect::<VulkanResult<Vec<_>>>()?;

        Ok(Self {
            framebuffers,
            depth,
            extent,
        })
    }

    /// Framebuffer for swapchain image `index`
    pub fn get(&self, index: usize) -> Option<&Framebuffer> {
        self.framebuffers.get(index)
    }

    /// Extent all framebuffers share
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Depth attachment view
    pub fn depth_view(&self) -> vk::ImageView {
        self.depth.image_view()
    }
}
