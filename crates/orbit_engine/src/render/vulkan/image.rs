//! Device-local images with bound memory and a view

use ash::{vk, Device};

use super::context::{PhysicalDeviceInfo, VulkanResult};

/// Texel format of sampled color images
///
/// Image files hold sRGB-encoded bytes; sampling decodes them to linear so the
/// sRGB swapchain's encode on write reproduces the file's colors.
pub const COLOR_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Parameters for [`Image::new`]
#[derive(Debug, Clone, Copy)]
pub struct ImageSpec {
    /// Texel format
    pub format: vk::Format,
    /// Size of mip level 0
    pub extent: vk::Extent2D,
    /// Number of mip levels
    pub mip_levels: u32,
    /// Array layers; 6 for a cube map
    pub layers: u32,
    /// Usage flags
    pub usage: vk::ImageUsageFlags,
    /// Aspect used by the view
    pub aspect: vk::ImageAspectFlags,
    /// View type
    pub view_type: vk::ImageViewType,
}

impl ImageSpec {
    /// Sampled RGBA color image; add `TRANSFER_SRC` when mips are blitted
    pub fn color(extent: vk::Extent2D, mip_levels: u32) -> Self {
        let mut usage = vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED;
        if mip_levels > 1 {
            usage |= vk::ImageUsageFlags::TRANSFER_SRC;
        }
        Self {
            format: COLOR_FORMAT,
            extent,
            mip_levels,
            layers: 1,
            usage,
            aspect: vk::ImageAspectFlags::COLOR,
            view_type: vk::ImageViewType::TYPE_2D,
        }
    }

    /// Six-layer cube map with a single mip level
    pub fn cube(face_size: u32) -> Self {
        Self {
            layers: 6,
            view_type: vk::ImageViewType::CUBE,
            ..Self::color(vk::Extent2D { width: face_size, height: face_size }, 1)
        }
    }

    /// Depth attachment
    pub fn depth(format: vk::Format, extent: vk::Extent2D) -> Self {
        Self {
            format,
            extent,
            mip_levels: 1,
            layers: 1,
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            aspect: vk::ImageAspectFlags::DEPTH,
            view_type: vk::ImageViewType::TYPE_2D,
        }
    }

    /// Range covering every level and layer
    pub fn full_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect,
            base_mip_level: 0,
            level_count: self.mip_levels,
            base_array_layer: 0,
            layer_count: self.layers,
        }
    }
}

/// Image, its memory and a view over all levels and layers
pub struct Image {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    spec: ImageSpec,
}

impl Image {
    /// Create a device-local image described by `spec`
    pub fn new(device: Device, physical_device: &PhysicalDeviceInfo, spec: ImageSpec) -> VulkanResult<Self> {
        let flags = if spec.view_type == vk::ImageViewType::CUBE {
            vk::ImageCreateFlags::CUBE_COMPATIBLE
        } else {
            vk::ImageCreateFlags::empty()
        };

        let create_info = vk::ImageCreateInfo::builder()
            .flags(flags)
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: spec.extent.width,
                height: spec.extent.height,
                depth: 1,
            })
            .mip_levels(spec.mip_levels)
            .array_layers(spec.layers)
            .format(spec.format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(spec.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe { device.create_image(&create_info, None)? };

        // Partially built images are released by Drop on the error paths below
        let mut result = Self {
            device,
            image,
            memory: vk::DeviceMemory::null(),
            view: vk::ImageView::null(),
            spec,
        };

        let requirements = unsafe { result.device.get_image_memory_requirements(image) };
        let memory_type_index = physical_device
            .find_memory_type(requirements.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        result.memory = unsafe { result.device.allocate_memory(&alloc_info, None)? };
        unsafe { result.device.bind_image_memory(image, result.memory, 0)? };

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(spec.view_type)
            .format(spec.format)
            .subresource_range(spec.full_range());
        result.view = unsafe { result.device.create_image_view(&view_info, None)? };

        Ok(result)
    }

    /// Image handle
    pub fn handle(&self) -> vk::Image {
        self.image
    }

    /// View over all levels and layers
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Creation parameters
    pub fn spec(&self) -> &ImageSpec {
        &self.spec
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.device.destroy_image_view(self.view, None);
            }
            self.device.destroy_image(self.image, None);
            if self.memory != vk::DeviceMemory::null() {
                self.device.free_memory(self.memory, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_spec_usage() {
        let extent = vk::Extent2D { width: 64, height: 32 };
        assert!(!ImageSpec::color(extent, 1).usage.contains(vk::ImageUsageFlags::TRANSFER_SRC));
        assert!(ImageSpec::color(extent, 7).usage.contains(vk::ImageUsageFlags::TRANSFER_SRC));
    }

    #[test]
    fn test_color_images_are_srgb() {
        let extent = vk::Extent2D { width: 64, height: 32 };
        assert_eq!(ImageSpec::color(extent, 1).format, vk::Format::R8G8B8A8_SRGB);
        assert_eq!(ImageSpec::cube(256).format, vk::Format::R8G8B8A8_SRGB);
        assert_eq!(ImageSpec::depth(vk::Format::D32_SFLOAT, extent).format, vk::Format::D32_SFLOAT);
    }

    #[test]
    fn test_cube_spec() {
        let spec = ImageSpec::cube(256);
        assert_eq!(spec.layers, 6);
        assert_eq!(spec.mip_levels, 1);
        assert_eq!(spec.view_type, vk::ImageViewType::CUBE);
        assert_eq!(spec.full_range().layer_count, 6);
        assert_eq!((spec.extent.width, spec.extent.height), (256, 256));
    }
}
