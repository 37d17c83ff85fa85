//! Shader modules and graphics pipelines
//!
//! Errors here are reported as [`RenderError::Compile`] for a bad stage and
//! [`RenderError::Link`] when the stages cannot be combined into a pipeline.

use std::ffi::CStr;
use std::io::Cursor;

use ash::{vk, Device};

use super::vertex_layout::VulkanVertexLayout;
use crate::render::shader::{CullMode, DepthCompare, RasterState, ShaderSource, ShaderStage};
use crate::render::{RenderError, RenderResult};

const ENTRY_POINT: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

/// Shader module with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
    stage: ShaderStage,
}

impl ShaderModule {
    /// Build a module from SPIR-V bytes or, with `runtime-glsl`, GLSL text
    pub fn new(device: Device, source: &ShaderSource, stage: ShaderStage) -> RenderResult<Self> {
        let code = match source {
            ShaderSource::Spirv(bytes) => decode_spirv(bytes, stage)?,
            ShaderSource::Glsl(text) => compile_glsl(text, stage)?,
        };

        let create_info = vk::ShaderModuleCreateInfo::builder().code(&code);
        let module = unsafe { device.create_shader_module(&create_info, None) }.map_err(|e| {
            RenderError::Compile {
                stage: stage.to_string(),
                message: format!("driver rejected module: {e:?}"),
            }
        })?;

        Ok(Self { device, module, stage })
    }

    /// Get the module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo {
        let flags = match self.stage {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        };
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(flags)
            .module(self.module)
            .name(ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

fn decode_spirv(bytes: &[u8], stage: ShaderStage) -> RenderResult<Vec<u32>> {
    ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|e| RenderError::Compile {
        stage: stage.to_string(),
        message: format!("invalid SPIR-V: {e}"),
    })
}

#[cfg(feature = "runtime-glsl")]
fn compile_glsl(source: &str, stage: ShaderStage) -> RenderResult<Vec<u32>> {
    let compile_error = |message: String| RenderError::Compile {
        stage: stage.to_string(),
        message,
    };

    let compiler = shaderc::Compiler::new().ok_or_else(|| compile_error("shaderc not available".to_string()))?;
    let mut options =
        shaderc::CompileOptions::new().ok_or_else(|| compile_error("shaderc options unavailable".to_string()))?;
    options.set_target_env(shaderc::TargetEnv::Vulkan, shaderc::EnvVersion::Vulkan1_0 as u32);

    let (kind, name) = match stage {
        ShaderStage::Vertex => (shaderc::ShaderKind::Vertex, "shader.vert"),
        ShaderStage::Fragment => (shaderc::ShaderKind::Fragment, "shader.frag"),
    };

    let artifact = compiler
        .compile_into_spirv(source, kind, name, "main", Some(&options))
        .map_err(|e| compile_error(e.to_string()))?;
    if artifact.get_num_warnings() > 0 {
        log::warn!("{} shader warnings: {}", stage, artifact.get_warning_messages());
    }
    Ok(artifact.as_binary().to_vec())
}

#[cfg(not(feature = "runtime-glsl"))]
fn compile_glsl(_source: &str, stage: ShaderStage) -> RenderResult<Vec<u32>> {
    Err(RenderError::Compile {
        stage: stage.to_string(),
        message: "GLSL source needs the runtime-glsl feature; point the config at .spv files".to_string(),
    })
}

/// Graphics pipeline plus its layout
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Link two stages into a triangle-list pipeline
    ///
    /// Viewport and scissor are dynamic so the pipeline survives swapchain
    /// recreation. Front faces are clockwise.
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
        vertex_layout: &VulkanVertexLayout,
        raster: RasterState,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> RenderResult<Self> {
        let shader_stages = [vertex_shader.stage_info(), fragment_shader.stage_info()];

        let bindings = [*vertex_layout.binding()];
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(vertex_layout.attributes());

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(cull_flags(raster.cull))
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(raster.depth_write)
            .depth_compare_op(compare_op(raster.depth_compare))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let layout_info = vk::PipelineLayoutCreateInfo::builder().set_layouts(set_layouts);
        let layout = unsafe { device.create_pipeline_layout(&layout_info, None) }
            .map_err(|e| RenderError::Link(format!("pipeline layout: {e:?}")))?;

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0)
            .build();

        let created = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        };
        let pipeline = match created {
            Ok(pipelines) if !pipelines.is_empty() => pipelines[0],
            Ok(_) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(RenderError::Link("driver returned no pipeline".to_string()));
            }
            Err((_, err)) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(RenderError::Link(format!("{err:?}")));
            }
        };

        Ok(Self {
            device,
            pipeline,
            layout,
        })
    }

    /// Get the pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get the pipeline layout
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

fn cull_flags(cull: CullMode) -> vk::CullModeFlags {
    match cull {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

fn compare_op(compare: DepthCompare) -> vk::CompareOp {
    match compare {
        DepthCompare::Less => vk::CompareOp::LESS,
        DepthCompare::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_state_translation() {
        let sky = RasterState::skybox();
        assert_eq!(cull_flags(sky.cull), vk::CullModeFlags::NONE);
        assert_eq!(compare_op(sky.depth_compare), vk::CompareOp::LESS_OR_EQUAL);

        let solid = RasterState::default();
        assert_eq!(cull_flags(solid.cull), vk::CullModeFlags::BACK);
        assert_eq!(compare_op(solid.depth_compare), vk::CompareOp::LESS);
    }

    #[test]
    fn test_bad_spirv_is_compile_error() {
        match decode_spirv(&[1, 2, 3], ShaderStage::Fragment) {
            Err(RenderError::Compile { stage, .. }) => assert_eq!(stage, "fragment"),
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn test_spirv_words_decoded() {
        let magic = 0x0723_0203u32.to_le_bytes();
        let words = decode_spirv(&magic, ShaderStage::Vertex).expect("aligned words");
        assert_eq!(words, vec![0x0723_0203]);
    }

    #[cfg(not(feature = "runtime-glsl"))]
    #[test]
    fn test_glsl_without_compiler_is_compile_error() {
        assert!(matches!(
            compile_glsl("#version 450\nvoid main() {}", ShaderStage::Vertex),
            Err(RenderError::Compile { .. })
        ));
    }
}
