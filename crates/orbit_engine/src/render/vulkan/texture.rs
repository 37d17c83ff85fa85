//! GPU textures: mipmapped 2D images and cube maps

use ash::{vk, Device};

use super::buffer::Buffer;
use super::commands::{CommandPool, CommandRecorder};
use super::context::{PhysicalDeviceInfo, VulkanError, VulkanResult};
use super::image::{Image, ImageSpec};
use crate::assets::{CubeMapImages, ImageData};
use crate::render::texture::{SamplerSettings, TextureFilter, TextureKind};

/// Sampler with RAII cleanup
pub struct Sampler {
    device: Device,
    sampler: vk::Sampler,
}

impl Sampler {
    /// Clamp-to-edge sampler for `settings` over `mip_levels` levels
    pub fn new(device: Device, settings: &SamplerSettings, mip_levels: u32) -> VulkanResult<Self> {
        let (filter, mipmap_mode) = filter_modes(settings.filter);
        let max_lod = if settings.mipmaps { mip_levels as f32 } else { 0.0 };

        let create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(filter)
            .min_filter(filter)
            .mipmap_mode(mipmap_mode)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .min_lod(0.0)
            .max_lod(max_lod);

        let sampler = unsafe { device.create_sampler(&create_info, None)? };
        Ok(Self { device, sampler })
    }

    /// Get the sampler handle
    pub fn handle(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
    }
}

/// Sampled image plus sampler
pub struct Texture {
    sampler: Sampler,
    image: Image,
    kind: TextureKind,
}

impl Texture {
    /// Upload a 2D RGBA8 image, generating mips when `settings.mipmaps` is set
    pub fn from_image(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        command_pool: &CommandPool,
        queue: vk::Queue,
        image_data: &ImageData,
        settings: &SamplerSettings,
    ) -> VulkanResult<Self> {
        check_rgba(image_data)?;

        let extent = vk::Extent2D {
            width: image_data.width,
            height: image_data.height,
        };
        let mip_levels = if settings.mipmaps { image_data.mip_levels() } else { 1 };
        log::debug!("Creating texture {}x{} with {} mip levels", extent.width, extent.height, mip_levels);

        let image = Image::new(device.clone(), physical_device, ImageSpec::color(extent, mip_levels))?;
        let staging = Buffer::staging(device.clone(), physical_device, &image_data.data)?;

        command_pool.execute_one_time(queue, |recorder| {
            let spec = *image.spec();
            transition(recorder, image.handle(), &spec, 0, mip_levels, Transition::UndefinedToTransferDst);
            recorder.copy_buffer_to_image(staging.handle(), image.handle(), &[copy_region(extent, 0, 0)]);
            if mip_levels > 1 {
                record_mip_chain(recorder, image.handle(), &spec);
            } else {
                transition(recorder, image.handle(), &spec, 0, 1, Transition::TransferDstToShaderRead);
            }
        })?;

        Ok(Self {
            sampler: Sampler::new(device, settings, mip_levels)?,
            image,
            kind: TextureKind::Texture2D,
        })
    }

    /// Upload six faces into a cube-compatible image
    pub fn cube_map(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        command_pool: &CommandPool,
        queue: vk::Queue,
        faces: &CubeMapImages,
        settings: &SamplerSettings,
    ) -> VulkanResult<Self> {
        for face in faces.faces() {
            check_rgba(face)?;
        }

        let size = faces.face_size();
        let face_bytes = faces.face_bytes();
        let mut packed = Vec::with_capacity(face_bytes * 6);
        for face in faces.faces() {
            packed.extend_from_slice(&face.data);
        }

        let spec = ImageSpec::cube(size);
        let image = Image::new(device.clone(), physical_device, spec)?;
        let staging = Buffer::staging(device.clone(), physical_device, &packed)?;

        let extent = vk::Extent2D { width: size, height: size };
        let regions: Vec<vk::BufferImageCopy> = (0..6u32)
            .map(|layer| copy_region(extent, layer, layer as u64 * face_bytes as u64))
            .collect();

        command_pool.execute_one_time(queue, |recorder| {
            transition(recorder, image.handle(), &spec, 0, 1, Transition::UndefinedToTransferDst);
            recorder.copy_buffer_to_image(staging.handle(), image.handle(), &regions);
            transition(recorder, image.handle(), &spec, 0, 1, Transition::TransferDstToShaderRead);
        })?;

        log::debug!("Created cube map with {}px faces", size);

        Ok(Self {
            sampler: Sampler::new(device, &SamplerSettings::single_level(settings.filter), 1)?,
            image,
            kind: TextureKind::CubeMap,
        })
    }

    /// View over the whole image
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Sampler handle
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler.handle()
    }

    /// 2D or cube
    pub fn kind(&self) -> TextureKind {
        self.kind
    }
}

fn check_rgba(image: &ImageData) -> VulkanResult<()> {
    let expected = image.width as usize * image.height as usize * 4;
    if image.channels != 4 || image.data.len() != expected || expected == 0 {
        return Err(VulkanError::InvalidOperation {
            reason: format!(
                "expected {}x{} RGBA8 pixels ({} bytes), got {} channels and {} bytes",
                image.width,
                image.height,
                expected,
                image.channels,
                image.data.len()
            ),
        });
    }
    Ok(())
}

fn filter_modes(filter: TextureFilter) -> (vk::Filter, vk::SamplerMipmapMode) {
    match filter {
        TextureFilter::Nearest => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST),
        TextureFilter::Linear => (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR),
    }
}

/// Size of mip `level` of an image whose level 0 is `extent`
fn mip_extent(extent: vk::Extent2D, level: u32) -> vk::Extent2D {
    vk::Extent2D {
        width: (extent.width >> level).max(1),
        height: (extent.height >> level).max(1),
    }
}

fn copy_region(extent: vk::Extent2D, layer: u32, buffer_offset: u64) -> vk::BufferImageCopy {
    vk::BufferImageCopy {
        buffer_offset,
        buffer_row_length: 0,
        buffer_image_height: 0,
        image_subresource: vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: layer,
            layer_count: 1,
        },
        image_offset: vk::Offset3D::default(),
        image_extent: vk::Extent3D {
            width: extent.width,
            height: extent.height,
            depth: 1,
        },
    }
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    UndefinedToTransferDst,
    TransferDstToTransferSrc,
    TransferDstToShaderRead,
    TransferSrcToShaderRead,
}

fn transition(
    recorder: &mut CommandRecorder,
    image: vk::Image,
    spec: &ImageSpec,
    base_level: u32,
    level_count: u32,
    kind: Transition,
) {
    use vk::{AccessFlags as A, ImageLayout as L, PipelineStageFlags as S};

    let (old, new, src_access, dst_access, src_stage, dst_stage) = match kind {
        Transition::UndefinedToTransferDst => {
            (L::UNDEFINED, L::TRANSFER_DST_OPTIMAL, A::empty(), A::TRANSFER_WRITE, S::TOP_OF_PIPE, S::TRANSFER)
        }
        Transition::TransferDstToTransferSrc => (
            L::TRANSFER_DST_OPTIMAL,
            L::TRANSFER_SRC_OPTIMAL,
            A::TRANSFER_WRITE,
            A::TRANSFER_READ,
            S::TRANSFER,
            S::TRANSFER,
        ),
        Transition::TransferDstToShaderRead => (
            L::TRANSFER_DST_OPTIMAL,
            L::SHADER_READ_ONLY_OPTIMAL,
            A::TRANSFER_WRITE,
            A::SHADER_READ,
            S::TRANSFER,
            S::FRAGMENT_SHADER,
        ),
        Transition::TransferSrcToShaderRead => (
            L::TRANSFER_SRC_OPTIMAL,
            L::SHADER_READ_ONLY_OPTIMAL,
            A::TRANSFER_READ,
            A::SHADER_READ,
            S::TRANSFER,
            S::FRAGMENT_SHADER,
        ),
    };

    let barrier = vk::ImageMemoryBarrier::builder()
        .old_layout(old)
        .new_layout(new)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            base_mip_level: base_level,
            level_count,
            ..spec.full_range()
        })
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
        .build();

    recorder.image_barrier(src_stage, dst_stage, barrier);
}

/// Blit each level from the previous one, leaving every level shader-readable
fn record_mip_chain(recorder: &mut CommandRecorder, image: vk::Image, spec: &ImageSpec) {
    for level in 1..spec.mip_levels {
        let src = mip_extent(spec.extent, level - 1);
        let dst = mip_extent(spec.extent, level);

        transition(recorder, image, spec, level - 1, 1, Transition::TransferDstToTransferSrc);

        let subresource = |mip_level| vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level,
            base_array_layer: 0,
            layer_count: 1,
        };
        let corner = |e: vk::Extent2D| vk::Offset3D {
            x: e.width as i32,
            y: e.height as i32,
            z: 1,
        };
        let region = vk::ImageBlit {
            src_subresource: subresource(level - 1),
            src_offsets: [vk::Offset3D::default(), corner(src)],
            dst_subresource: subresource(level),
            dst_offsets: [vk::Offset3D::default(), corner(dst)],
        };
        recorder.blit_image(image, region, vk::Filter::LINEAR);

        transition(recorder, image, spec, level - 1, 1, Transition::TransferSrcToShaderRead);
    }

    transition(recorder, image, spec, spec.mip_levels - 1, 1, Transition::TransferDstToShaderRead);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_extents_halve_to_one() {
        let base = vk::Extent2D { width: 2048, height: 1024 };
        let levels = ImageData::solid_color(2048, 1024, [0; 4]).mip_levels();
        assert_eq!(levels, 12);

        let last = mip_extent(base, levels - 1);
        assert_eq!((last.width, last.height), (1, 1));
        let tenth = mip_extent(base, 10);
        assert_eq!((tenth.width, tenth.height), (2, 1));
    }

    #[test]
    fn test_filter_modes() {
        assert_eq!(
            filter_modes(TextureFilter::Nearest),
            (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST)
        );
        assert_eq!(
            filter_modes(TextureFilter::Linear),
            (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR)
        );
    }

    #[test]
    fn test_rgba_check() {
        assert!(check_rgba(&ImageData::solid_color(4, 2, [1, 2, 3, 4])).is_ok());

        let mut truncated = ImageData::solid_color(4, 2, [1, 2, 3, 4]);
        truncated.data.pop();
        assert!(check_rgba(&truncated).is_err());
    }

    #[test]
    fn test_cube_face_offsets() {
        let extent = vk::Extent2D { width: 8, height: 8 };
        let region = copy_region(extent, 3, 3 * 256);
        assert_eq!(region.image_subresource.base_array_layer, 3);
        assert_eq!(region.buffer_offset, 768);
    }
}
