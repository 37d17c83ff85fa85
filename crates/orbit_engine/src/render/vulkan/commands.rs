//! Command buffer management
//!
//! [`CommandRecorder`] owns no lifetime, so a frame can be recorded across
//! several backend calls between `begin_frame` and `end_frame`.

use ash::{vk, Device};

use super::context::{VulkanError, VulkanResult};

/// Command pool wrapper with RAII cleanup
pub struct CommandPool {
    device: Device,
    command_pool: vk::CommandPool,
}

impl CommandPool {
    /// Create a pool whose buffers can be reset individually
    pub fn new(device: Device, queue_family_index: u32) -> VulkanResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);

        let command_pool = unsafe { device.create_command_pool(&create_info, None)? };
        Ok(Self { device, command_pool })
    }

    /// Allocate primary command buffers
    pub fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        Ok(unsafe { self.device.allocate_command_buffers(&alloc_info)? })
    }

    /// Record with `record`, submit to `queue` and block until it finishes
    ///
    /// Used for uploads and layout transitions during resource creation.
    pub fn execute_one_time<F>(&self, queue: vk::Queue, record: F) -> VulkanResult<()>
    where
        F: FnOnce(&mut CommandRecorder),
    {
        let command_buffer = self
            .allocate_command_buffers(1)?
            .pop()
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: "no command buffer allocated".to_string(),
            })?;

        let result = (|| {
            let mut recorder = CommandRecorder::new(command_buffer, self.device.clone());
            recorder.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;
            record(&mut recorder);
            recorder.end()?;

            let buffers = [command_buffer];
            let submit = vk::SubmitInfo::builder().command_buffers(&buffers).build();
            unsafe {
                self.device.queue_submit(queue, &[submit], vk::Fence::null())?;
                self.device.queue_wait_idle(queue)?;
            }
            Ok(())
        })();

        unsafe {
            self.device.free_command_buffers(self.command_pool, &[command_buffer]);
        }
        result
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Records commands into one command buffer
pub struct CommandRecorder {
    command_buffer: vk::CommandBuffer,
    device: Device,
    recording: bool,
    in_render_pass: bool,
}

impl CommandRecorder {
    /// Wrap an allocated command buffer
    pub fn new(command_buffer: vk::CommandBuffer, device: Device) -> Self {
        Self {
            command_buffer,
            device,
            recording: false,
            in_render_pass: false,
        }
    }

    /// Underlying command buffer
    pub fn handle(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Whether `begin` has been called without a matching `end`
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Reset and begin recording
    pub fn begin(&mut self, flags: vk::CommandBufferUsageFlags) -> VulkanResult<()> {
        if self.recording {
            return Err(VulkanError::InvalidOperation {
                reason: "Command buffer already recording".to_string(),
            });
        }

        let begin_info = vk::CommandBufferBeginInfo::builder().flags(flags);
        unsafe {
            self.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())?;
            self.device.begin_command_buffer(self.command_buffer, &begin_info)?;
        }

        self.recording = true;
        Ok(())
    }

    /// Finish recording, closing an open render pass first
    pub fn end(&mut self) -> VulkanResult<vk::CommandBuffer> {
        if !self.recording {
            return Err(VulkanError::InvalidOperation {
                reason: "Command buffer not recording".to_string(),
            });
        }
        if self.in_render_pass {
            self.end_render_pass();
        }

        unsafe { self.device.end_command_buffer(self.command_buffer)? };
        self.recording = false;
        Ok(self.command_buffer)
    }

    /// Begin an inline render pass
    pub fn begin_render_pass(
        &mut self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    ) -> VulkanResult<()> {
        if !self.recording || self.in_render_pass {
            return Err(VulkanError::InvalidOperation {
                reason: "Render pass needs a recording buffer outside another pass".to_string(),
            });
        }

        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(clear_values);

        unsafe {
            self.device
                .cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        self.in_render_pass = true;
        Ok(())
    }

    /// End the current render pass
    pub fn end_render_pass(&mut self) {
        if self.in_render_pass {
            unsafe { self.device.cmd_end_render_pass(self.command_buffer) };
            self.in_render_pass = false;
        }
    }

    /// Set viewport 0
    pub fn set_viewport(&mut self, viewport: vk::Viewport) {
        unsafe { self.device.cmd_set_viewport(self.command_buffer, 0, &[viewport]) };
    }

    /// Set scissor 0
    pub fn set_scissor(&mut self, scissor: vk::Rect2D) {
        unsafe { self.device.cmd_set_scissor(self.command_buffer, 0, &[scissor]) };
    }

    /// Bind a graphics pipeline
    pub fn bind_pipeline(&mut self, pipeline: vk::Pipeline) {
        unsafe {
            self.device
                .cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
    }

    /// Bind descriptor sets starting at `first_set`
    pub fn bind_descriptor_sets(
        &mut self,
        layout: vk::PipelineLayout,
        first_set: u32,
        sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                first_set,
                sets,
                dynamic_offsets,
            );
        }
    }

    /// Bind vertex buffers
    pub fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[vk::Buffer], offsets: &[vk::DeviceSize]) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(self.command_buffer, first_binding, buffers, offsets);
        }
    }

    /// Bind a 32-bit index buffer
    pub fn bind_index_buffer(&mut self, buffer: vk::Buffer) {
        unsafe {
            self.device
                .cmd_bind_index_buffer(self.command_buffer, buffer, 0, vk::IndexType::UINT32);
        }
    }

    /// Draw one instance of `index_count` indices
    pub fn draw_indexed(&mut self, index_count: u32) {
        unsafe { self.device.cmd_draw_indexed(self.command_buffer, index_count, 1, 0, 0, 0) };
    }

    /// Record an image memory barrier
    pub fn image_barrier(
        &mut self,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barrier: vk::ImageMemoryBarrier,
    ) {
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }

    /// Copy a whole buffer into another
    pub fn copy_buffer(&mut self, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) {
        let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size };
        unsafe { self.device.cmd_copy_buffer(self.command_buffer, src, dst, &[region]) };
    }

    /// Copy buffer regions into an image in TRANSFER_DST layout
    pub fn copy_buffer_to_image(&mut self, src: vk::Buffer, dst: vk::Image, regions: &[vk::BufferImageCopy]) {
        unsafe {
            self.device.cmd_copy_buffer_to_image(
                self.command_buffer,
                src,
                dst,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                regions,
            );
        }
    }

    /// Blit within one image, used for mip generation
    pub fn blit_image(&mut self, image: vk::Image, region: vk::ImageBlit, filter: vk::Filter) {
        unsafe {
            self.device.cmd_blit_image(
                self.command_buffer,
                image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
                filter,
            );
        }
    }
}
