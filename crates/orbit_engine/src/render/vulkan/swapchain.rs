//! Vulkan swapchain management
//!
//! One constructor covers both first creation and recreation; pass the
//! previous handle as `old_swapchain` when replacing.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device};

use super::context::{PhysicalDeviceInfo, VulkanResult};

/// Swapchain with its image views
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain sized for `window_extent`
    pub fn new(
        device: Device,
        swapchain_loader: &SwapchainLoader,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
        physical_device_info: &PhysicalDeviceInfo,
        window_extent: vk::Extent2D,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        let physical = physical_device_info.device;
        let surface_caps =
            unsafe { surface_loader.get_physical_device_surface_capabilities(physical, surface)? };
        let surface_formats =
            unsafe { surface_loader.get_physical_device_surface_formats(physical, surface)? };
        let present_modes =
            unsafe { surface_loader.get_physical_device_surface_present_modes(physical, surface)? };

        let format = choose_format(&surface_formats);
        let present_mode = choose_present_mode(&present_modes);
        let extent = choose_extent(&surface_caps, window_extent);

        let image_count = if surface_caps.max_image_count > 0 {
            (surface_caps.min_image_count + 1).min(surface_caps.max_image_count)
        } else {
            surface_caps.min_image_count + 1
        };

        let queue_families = [physical_device_info.graphics_family, physical_device_info.present_family];
        let mut create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(surface_caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        create_info = if queue_families[0] == queue_families[1] {
            create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        } else {
            create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_families)
        };

        let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

        let mut result = Self {
            device,
            swapchain_loader: swapchain_loader.clone(),
            swapchain,
            image_views: Vec::new(),
            format,
            extent,
        };

        let images = unsafe { swapchain_loader.get_swapchain_images(swapchain)? };
        for image in images {
            let view = create_color_view(&result.device, image, format.format)?;
            result.image_views.push(view);
        }

        log::debug!(
            "Created swapchain {}x{} with {} images ({:?}, {:?})",
            extent.width,
            extent.height,
            result.image_views.len(),
            format.format,
            present_mode
        );

        Ok(result)
    }

    /// Image extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Surface format of the images
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// One view per swapchain image
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Raw handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Number of images
    pub fn image_count(&self) -> usize {
        self.image_views.len()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

fn choose_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .find(|sf| {
            sf.format == vk::Format::B8G8R8A8_SRGB && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
        .unwrap_or(vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        })
}

fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, window_extent: vk::Extent2D) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        vk::Extent2D {
            width: window_extent
                .width
                .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
            height: window_extent
                .height
                .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
        }
    }
}

fn create_color_view(device: &Device, image: vk::Image, format: vk::Format) -> VulkanResult<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping::default())
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    Ok(unsafe { device.create_image_view(&create_info, None)? })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_srgb_bgra() {
        let formats = [
            vk::SurfaceFormatKHR { format: vk::Format::R8G8B8A8_UNORM, color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR },
            vk::SurfaceFormatKHR { format: vk::Format::B8G8R8A8_SRGB, color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR },
        ];
        assert_eq!(choose_format(&formats).format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(choose_format(&formats[..1]).format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_present_mode_falls_back_to_fifo() {
        assert_eq!(choose_present_mode(&[vk::PresentModeKHR::IMMEDIATE]), vk::PresentModeKHR::FIFO);
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX]),
            vk::PresentModeKHR::MAILBOX
        );
    }

    #[test]
    fn test_extent_clamped_when_surface_defers() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 1024, height: 768 },
            ..Default::default()
        };
        let extent = choose_extent(&caps, vk::Extent2D { width: 4000, height: 600 });
        assert_eq!((extent.width, extent.height), (1024, 600));
    }
}
