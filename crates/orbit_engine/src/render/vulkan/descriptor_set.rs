//! Descriptor set layouts, pools and writes
//!
//! Set 0 holds the per-draw uniform block as a dynamic uniform buffer; set 1
//! holds the bound texture as a combined image sampler.

use ash::{vk, Device};

use super::context::VulkanResult;

/// Builder for a descriptor set layout
#[derive(Default)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform buffer addressed with a dynamic offset at bind time
    pub fn add_dynamic_uniform_buffer(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add(binding, vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC, stage_flags)
    }

    /// Combined image sampler
    pub fn add_combined_image_sampler(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add(binding, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, stage_flags)
    }

    fn add(mut self, binding: u32, ty: vk::DescriptorType, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(ty)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Bindings added so far
    pub fn bindings(&self) -> &[vk::DescriptorSetLayoutBinding] {
        &self.bindings
    }

    /// Create the layout
    pub fn build(self, device: &Device) -> VulkanResult<DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);
        let layout = unsafe { device.create_descriptor_set_layout(&layout_info, None)? };

        Ok(DescriptorSetLayout {
            layout,
            device: device.clone(),
        })
    }
}

/// Descriptor set layout with RAII cleanup
pub struct DescriptorSetLayout {
    layout: vk::DescriptorSetLayout,
    device: Device,
}

impl DescriptorSetLayout {
    /// Get the layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// The two layouts every program uses
pub struct ProgramDescriptorLayouts {
    /// Set 0: dynamic uniform buffer visible to both stages
    pub uniforms: DescriptorSetLayout,
    /// Set 1: sampled texture for the fragment stage
    pub texture: DescriptorSetLayout,
}

impl ProgramDescriptorLayouts {
    /// Create both layouts
    pub fn new(device: &Device) -> VulkanResult<Self> {
        Ok(Self {
            uniforms: DescriptorSetLayoutBuilder::new()
                .add_dynamic_uniform_buffer(0, vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
                .build(device)?,
            texture: DescriptorSetLayoutBuilder::new()
                .add_combined_image_sampler(0, vk::ShaderStageFlags::FRAGMENT)
                .build(device)?,
        })
    }

    /// Handles in set order
    pub fn handles(&self) -> [vk::DescriptorSetLayout; 2] {
        [self.uniforms.handle(), self.texture.handle()]
    }
}

/// Descriptor pool with RAII cleanup
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    device: Device,
}

impl DescriptorPool {
    /// Pool sized for `uniform_sets` dynamic uniform buffers and `texture_sets` samplers
    pub fn new(device: Device, uniform_sets: u32, texture_sets: u32) -> VulkanResult<Self> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
                descriptor_count: uniform_sets.max(1),
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: texture_sets.max(1),
            },
        ];

        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets((uniform_sets + texture_sets).max(1))
            .pool_sizes(&pool_sizes);
        let pool = unsafe { device.create_descriptor_pool(&pool_info, None)? };

        Ok(Self { pool, device })
    }

    /// Allocate one set per layout
    pub fn allocate(&self, layouts: &[vk::DescriptorSetLayout]) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);
        Ok(unsafe { self.device.allocate_descriptor_sets(&alloc_info)? })
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

enum PendingWrite {
    Buffer {
        set: vk::DescriptorSet,
        binding: u32,
        ty: vk::DescriptorType,
        info: vk::DescriptorBufferInfo,
    },
    Image {
        set: vk::DescriptorSet,
        binding: u32,
        info: vk::DescriptorImageInfo,
    },
}

/// Batches descriptor writes
///
/// Infos are stored by value and the `vk::WriteDescriptorSet` structs are only
/// built inside [`DescriptorSetWriter::update`], so their pointers never
/// outlive the storage they reference.
#[derive(Default)]
pub struct DescriptorSetWriter {
    pending: Vec<PendingWrite>,
}

impl DescriptorSetWriter {
    /// Empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Point a dynamic uniform binding at `range` bytes of `buffer`
    pub fn write_dynamic_buffer(
        mut self,
        set: vk::DescriptorSet,
        binding: u32,
        buffer: vk::Buffer,
        range: vk::DeviceSize,
    ) -> Self {
        self.pending.push(PendingWrite::Buffer {
            set,
            binding,
            ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
            info: vk::DescriptorBufferInfo { buffer, offset: 0, range },
        });
        self
    }

    /// Point a sampler binding at a shader-readable image
    pub fn write_image(
        mut self,
        set: vk::DescriptorSet,
        binding: u32,
        image_view: vk::ImageView,
        sampler: vk::Sampler,
    ) -> Self {
        self.pending.push(PendingWrite::Image {
            set,
            binding,
            info: vk::DescriptorImageInfo {
                sampler,
                image_view,
                image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
        });
        self
    }

    /// Number of queued writes
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Apply all queued writes
    pub fn update(self, device: &Device) {
        let writes: Vec<vk::WriteDescriptorSet> = self
            .pending
            .iter()
            .map(|pending| match pending {
                PendingWrite::Buffer { set, binding, ty, info } => vk::WriteDescriptorSet::builder()
                    .dst_set(*set)
                    .dst_binding(*binding)
                    .descriptor_type(*ty)
                    .buffer_info(std::slice::from_ref(info))
                    .build(),
                PendingWrite::Image { set, binding, info } => vk::WriteDescriptorSet::builder()
                    .dst_set(*set)
                    .dst_binding(*binding)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(std::slice::from_ref(info))
                    .build(),
            })
            .collect();

        unsafe { device.update_descriptor_sets(&writes, &[]) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_bindings() {
        let builder = DescriptorSetLayoutBuilder::new()
            .add_dynamic_uniform_buffer(0, vk::ShaderStageFlags::VERTEX)
            .add_combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT);

        let bindings = builder.bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC);
        assert_eq!(bindings[1].binding, 1);
        assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn test_writer_queues_writes() {
        let writer = DescriptorSetWriter::new()
            .write_dynamic_buffer(vk::DescriptorSet::null(), 0, vk::Buffer::null(), 192)
            .write_image(vk::DescriptorSet::null(), 0, vk::ImageView::null(), vk::Sampler::null());
        assert_eq!(writer.len(), 2);
        assert!(DescriptorSetWriter::new().is_empty());
    }
}
