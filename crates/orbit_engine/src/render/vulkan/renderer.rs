//! Vulkan implementation of [`RenderBackend`]
//!
//! Resources are kept in plain vectors indexed by their handles. A frame is
//! recorded across calls: `begin_frame` acquires an image and opens the render
//! pass, each `draw_mesh` snapshots the bound program's uniforms into its
//! uniform ring and records an indexed draw, and `end_frame` submits and
//! presents.

use ash::vk;

use super::commands::{CommandPool, CommandRecorder};
use super::context::{VulkanContext, VulkanError, VulkanResult};
use super::descriptor_set::{DescriptorPool, DescriptorSetWriter, ProgramDescriptorLayouts};
use super::framebuffer::FramebufferSet;
use super::gpu_mesh::GpuMesh;
use super::render_pass::RenderPass;
use super::shader::{GraphicsPipeline, ShaderModule};
use super::sync::{FrameSync, Semaphore};
use super::texture::Texture;
use super::uniform_ring::UniformRing;
use super::vertex_layout::VulkanVertexLayout;
use super::window::Window;
use crate::assets::{CubeMapImages, ImageData};
use crate::config::RenderConfig;
use crate::render::backend::{
    BackendResult, FrameStatus, MeshHandle, ProgramHandle, RenderBackend, TextureHandle,
};
use crate::render::primitives::{Mesh, Vertex};
use crate::render::shader::{ProgramDescriptor, ShaderProgram, ShaderStage, UniformBlock};
use crate::render::texture::{SamplerSettings, TextureKind};
use crate::render::RenderError;

/// Programs the descriptor pool has room for
const MAX_PROGRAMS: u32 = 8;
/// Textures the descriptor pool has room for
const MAX_TEXTURES: u32 = 32;

struct Program {
    pipeline: GraphicsPipeline,
    uniforms: UniformBlock,
    ring: UniformRing,
    uniform_set: vk::DescriptorSet,
    texture_kind: TextureKind,
}

struct BoundTexture {
    texture: Texture,
    set: vk::DescriptorSet,
}

/// State of the frame being recorded
struct ActiveFrame {
    image_index: u32,
    bound_pipeline: Option<usize>,
}

/// Vulkan renderer
pub struct VulkanRenderer {
    active: Option<ActiveFrame>,
    current_program: Option<usize>,
    current_texture: Option<usize>,
    current_frame: usize,
    max_frames_in_flight: usize,
    max_draws_per_frame: usize,

    programs: Vec<Program>,
    textures: Vec<BoundTexture>,
    meshes: Vec<GpuMesh>,
    descriptor_pool: DescriptorPool,
    layouts: ProgramDescriptorLayouts,

    recorders: Vec<CommandRecorder>,
    framebuffers: FramebufferSet,
    render_finished: Vec<Semaphore>,
    frame_sync: Vec<FrameSync>,
    command_pool: CommandPool,
    render_pass: RenderPass,

    // Everything above holds device handles and must drop first
    context: VulkanContext,
}

impl VulkanRenderer {
    /// Create the context, swapchain and per-frame objects for `window`
    pub fn new(window: &mut Window, config: &RenderConfig) -> BackendResult<Self> {
        Self::create(window, config).map_err(|e| RenderError::Initialization(e.to_string()))
    }

    fn create(window: &mut Window, config: &RenderConfig) -> VulkanResult<Self> {
        let context = VulkanContext::new(window, &config.application_name, config.validation_enabled())?;
        let device = context.raw_device().clone();
        let physical = &context.physical_device;

        let swapchain = context.swapchain()?;
        let render_pass = RenderPass::new_forward_pass(device.clone(), swapchain.format().format)?;
        let framebuffers = FramebufferSet::new(
            device.clone(),
            physical,
            render_pass.handle(),
            swapchain.image_views(),
            swapchain.extent(),
        )?;
        let render_finished = (0..swapchain.image_count())
            .map(|_| Semaphore::new(device.clone()))
            .collect::<VulkanResult<Vec<_>>>()?;

        let max_frames_in_flight = config.max_frames_in_flight.max(1);
        let frame_sync = (0..max_frames_in_flight)
            .map(|_| FrameSync::new(device.clone()))
            .collect::<VulkanResult<Vec<_>>>()?;

        let command_pool = CommandPool::new(device.clone(), context.graphics_queue_family())?;
        let recorders = command_pool
            .allocate_command_buffers(max_frames_in_flight as u32)?
            .into_iter()
            .map(|buffer| CommandRecorder::new(buffer, device.clone()))
            .collect();

        let layouts = ProgramDescriptorLayouts::new(&device)?;
        let descriptor_pool = DescriptorPool::new(device, MAX_PROGRAMS, MAX_TEXTURES)?;

        log::info!(
            "Vulkan renderer ready: {}x{}, {} frames in flight",
            swapchain.extent().width,
            swapchain.extent().height,
            max_frames_in_flight
        );

        Ok(Self {
            active: None,
            current_program: None,
            current_texture: None,
            current_frame: 0,
            max_frames_in_flight,
            max_draws_per_frame: config.max_draws_per_frame.max(1),
            programs: Vec::new(),
            textures: Vec::new(),
            meshes: Vec::new(),
            descriptor_pool,
            layouts,
            recorders,
            framebuffers,
            render_finished,
            frame_sync,
            command_pool,
            render_pass,
            context,
        })
    }

    fn upload_texture(&mut self, texture: Texture) -> VulkanResult<TextureHandle> {
        let set = self.allocate_set(self.layouts.texture.handle())?;
        DescriptorSetWriter::new()
            .write_image(set, 0, texture.view(), texture.sampler())
            .update(self.context.raw_device());

        self.textures.push(BoundTexture { texture, set });
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn allocate_set(&self, layout: vk::DescriptorSetLayout) -> VulkanResult<vk::DescriptorSet> {
        self.descriptor_pool
            .allocate(&[layout])?
            .pop()
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: "descriptor pool returned no set".to_string(),
            })
    }

    fn build_program(&mut self, descriptor: &ProgramDescriptor) -> BackendResult<ProgramHandle> {
        let device = self.context.raw_device().clone();

        let vertex = ShaderModule::new(device.clone(), &descriptor.vertex, ShaderStage::Vertex)?;
        let fragment = ShaderModule::new(device.clone(), &descriptor.fragment, ShaderStage::Fragment)?;
        let vertex_layout = VulkanVertexLayout::from_layout(&Vertex::layout())?;

        let pipeline = GraphicsPipeline::new(
            device.clone(),
            self.render_pass.handle(),
            &vertex,
            &fragment,
            &vertex_layout,
            descriptor.raster,
            &self.layouts.handles(),
        )?;

        let uniforms = UniformBlock::new(descriptor.uniforms.clone());
        let block_size = uniforms.bytes().len();
        let ring = UniformRing::new(
            device,
            &self.context.physical_device,
            block_size,
            self.max_draws_per_frame,
            self.max_frames_in_flight,
        )?;

        let uniform_set = self.allocate_set(self.layouts.uniforms.handle())?;
        DescriptorSetWriter::new()
            .write_dynamic_buffer(uniform_set, 0, ring.handle(), ring.block_size() as vk::DeviceSize)
            .update(self.context.raw_device());

        self.programs.push(Program {
            pipeline,
            uniforms,
            ring,
            uniform_set,
            texture_kind: descriptor.texture_kind,
        });

        let handle = ProgramHandle(self.programs.len() as u32 - 1);
        log::info!("Created program {:?} ({:?}, {} byte uniform block)", handle, descriptor.texture_kind, block_size);
        Ok(handle)
    }

    fn acquire(&mut self, clear_color: [f32; 4]) -> VulkanResult<FrameStatus> {
        if self.active.is_some() {
            log::warn!("begin_frame called while a frame was still open");
            self.flush_abandoned_frame();
        }

        let sync = &self.frame_sync[self.current_frame];
        sync.in_flight.wait(u64::MAX)?;

        let swapchain = self.context.swapchain()?;
        let acquired = unsafe {
            self.context.swapchain_loader().acquire_next_image(
                swapchain.handle(),
                u64::MAX,
                sync.image_available.handle(),
                vk::Fence::null(),
            )
        };
        let image_index = match acquired {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => return Ok(FrameStatus::SwapchainOutOfDate),
            Err(err) => return Err(err.into()),
        };

        // Only reset once work is certain to be submitted this frame
        sync.in_flight.reset()?;

        let framebuffer = self
            .framebuffers
            .get(image_index as usize)
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: format!("no framebuffer for swapchain image {image_index}"),
            })?
            .handle();
        let extent = self.framebuffers.extent();

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue { float32: clear_color },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        };

        let recorder = &mut self.recorders[self.current_frame];
        recorder.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;
        recorder.begin_render_pass(self.render_pass.handle(), framebuffer, render_area, &clear_values)?;
        recorder.set_viewport(vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        recorder.set_scissor(render_area);

        for program in &mut self.programs {
            program.ring.begin_frame(self.current_frame);
        }

        self.active = Some(ActiveFrame {
            image_index,
            bound_pipeline: None,
        });
        Ok(FrameStatus::Ready)
    }

    fn record_draw(&mut self, mesh: MeshHandle) -> BackendResult<()> {
        let frame = self
            .active
            .as_mut()
            .ok_or_else(|| RenderError::Backend("draw_mesh called outside begin_frame/end_frame".to_string()))?;
        let program_index = self
            .current_program
            .ok_or_else(|| RenderError::Backend("draw_mesh called with no program bound".to_string()))?;
        let texture_index = self
            .current_texture
            .ok_or_else(|| RenderError::Backend("draw_mesh called with no texture bound".to_string()))?;
        let gpu_mesh = self
            .meshes
            .get(mesh.0 as usize)
            .ok_or_else(|| RenderError::InvalidHandle(format!("{mesh:?}")))?;

        let program = &mut self.programs[program_index];
        let texture = &self.textures[texture_index];
        if texture.texture.kind() != program.texture_kind {
            return Err(RenderError::InvalidParameter(format!(
                "program samples {:?} but bound texture is {:?}",
                program.texture_kind,
                texture.texture.kind()
            )));
        }

        let offset = program.ring.push(program.uniforms.bytes())?;

        let recorder = &mut self.recorders[self.current_frame];
        if frame.bound_pipeline != Some(program_index) {
            recorder.bind_pipeline(program.pipeline.handle());
            frame.bound_pipeline = Some(program_index);
        }
        recorder.bind_descriptor_sets(
            program.pipeline.layout(),
            0,
            &[program.uniform_set, texture.set],
            &[offset],
        );
        gpu_mesh.draw(recorder);
        Ok(())
    }

    fn submit_and_present(&mut self) -> VulkanResult<FrameStatus> {
        let frame = self.active.take().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "end_frame called without begin_frame".to_string(),
        })?;

        let command_buffer = self.recorders[self.current_frame].end()?;
        let sync = &self.frame_sync[self.current_frame];
        let render_finished = self.render_finished[frame.image_index as usize].handle();

        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [render_finished];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.context.raw_device().queue_submit(
                self.context.graphics_queue(),
                &[submit_info],
                sync.in_flight.handle(),
            )?;
        }

        let swapchains = [self.context.swapchain()?.handle()];
        let image_indices = [frame.image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = unsafe {
            self.context
                .swapchain_loader()
                .queue_present(self.context.present_queue(), &present_info)
        };

        self.current_frame = (self.current_frame + 1) % self.max_frames_in_flight;
        present_status(presented)
    }

    /// Submit and present whatever a failed frame recorded
    ///
    /// The acquired image, its semaphore and the reset fence all expect a
    /// submission; skipping it would stall the next wait on this frame slot.
    fn flush_abandoned_frame(&mut self) {
        if let Err(err) = self.submit_and_present() {
            log::warn!("Failed to flush abandoned frame: {err}");
        }
    }

    fn rebuild_swapchain(&mut self, width: u32, height: u32) -> VulkanResult<()> {
        if self.active.is_some() {
            return Err(VulkanError::InvalidOperation {
                reason: "cannot resize while a frame is being recorded".to_string(),
            });
        }

        self.context.recreate_swapchain(vk::Extent2D { width, height })?;

        let device = self.context.raw_device().clone();
        let swapchain = self.context.swapchain()?;
        self.framebuffers = FramebufferSet::new(
            device.clone(),
            &self.context.physical_device,
            self.render_pass.handle(),
            swapchain.image_views(),
            swapchain.extent(),
        )?;

        if self.render_finished.len() != swapchain.image_count() {
            self.render_finished = (0..swapchain.image_count())
                .map(|_| Semaphore::new(device.clone()))
                .collect::<VulkanResult<Vec<_>>>()?;
        }

        let extent = swapchain.extent();
        log::info!("Swapchain recreated at {}x{}", extent.width, extent.height);
        Ok(())
    }
}

/// Map a present result to a frame status
fn present_status(result: Result<bool, vk::Result>) -> VulkanResult<FrameStatus> {
    match result {
        Ok(false) => Ok(FrameStatus::Ready),
        Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(FrameStatus::SwapchainOutOfDate),
        Err(err) => Err(err.into()),
    }
}

/// Whether a failed call left a recorded frame that nobody will end
fn leaves_frame_open<T>(result: &BackendResult<T>, active: Option<&ActiveFrame>) -> bool {
    result.is_err() && active.is_some()
}

fn resource_error(what: &str) -> impl FnOnce(VulkanError) -> RenderError + '_ {
    move |err| RenderError::ResourceLoad {
        path: what.to_string(),
        reason: err.to_string(),
    }
}

impl RenderBackend for VulkanRenderer {
    fn create_mesh(&mut self, mesh: &Mesh) -> BackendResult<MeshHandle> {
        mesh.validate()?;
        let gpu_mesh = GpuMesh::new(
            self.context.raw_device().clone(),
            &self.context.physical_device,
            &self.command_pool,
            self.context.graphics_queue(),
            mesh,
        )
        .map_err(resource_error("mesh"))?;

        self.meshes.push(gpu_mesh);
        Ok(MeshHandle(self.meshes.len() as u32 - 1))
    }

    fn create_texture(&mut self, image: &ImageData, sampler: &SamplerSettings) -> BackendResult<TextureHandle> {
        let texture = Texture::from_image(
            self.context.raw_device().clone(),
            &self.context.physical_device,
            &self.command_pool,
            self.context.graphics_queue(),
            image,
            sampler,
        )
        .map_err(resource_error("texture"))?;

        self.upload_texture(texture).map_err(resource_error("texture"))
    }

    fn create_cube_map(&mut self, faces: &CubeMapImages, sampler: &SamplerSettings) -> BackendResult<TextureHandle> {
        let texture = Texture::cube_map(
            self.context.raw_device().clone(),
            &self.context.physical_device,
            &self.command_pool,
            self.context.graphics_queue(),
            faces,
            sampler,
        )
        .map_err(resource_error("cube map"))?;

        self.upload_texture(texture).map_err(resource_error("cube map"))
    }

    fn create_program(&mut self, descriptor: &ProgramDescriptor) -> BackendResult<ProgramHandle> {
        self.build_program(descriptor)
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> BackendResult<FrameStatus> {
        Ok(self.acquire(clear_color)?)
    }

    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        if program.0 as usize >= self.programs.len() {
            return Err(RenderError::InvalidHandle(format!("{program:?}")));
        }
        self.current_program = Some(program.0 as usize);
        Ok(())
    }

    fn program(&mut self) -> BackendResult<&mut dyn ShaderProgram> {
        let index = self
            .current_program
            .ok_or_else(|| RenderError::Backend("no program bound".to_string()))?;
        Ok(&mut self.programs[index].uniforms)
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> BackendResult<()> {
        if texture.0 as usize >= self.textures.len() {
            return Err(RenderError::InvalidHandle(format!("{texture:?}")));
        }
        self.current_texture = Some(texture.0 as usize);
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) -> BackendResult<()> {
        let result = self.record_draw(mesh);
        if leaves_frame_open(&result, self.active.as_ref()) {
            log::warn!("Draw failed mid-frame, flushing the partial frame");
            self.flush_abandoned_frame();
        }
        result
    }

    fn end_frame(&mut self) -> BackendResult<FrameStatus> {
        Ok(self.submit_and_present()?)
    }

    fn resize(&mut self, width: u32, height: u32) -> BackendResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidParameter(format!("cannot resize to {width}x{height}")));
        }
        Ok(self.rebuild_swapchain(width, height)?)
    }

    fn wait_idle(&self) -> BackendResult<()> {
        unsafe { self.context.raw_device().device_wait_idle() }.map_err(VulkanError::from)?;
        Ok(())
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        log::debug!("Destroying Vulkan renderer");
        if let Err(err) = unsafe { self.context.raw_device().device_wait_idle() } {
            log::warn!("device_wait_idle failed during shutdown: {:?}", err);
        }
    }
}
