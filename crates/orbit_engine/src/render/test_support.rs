//! In-memory backend for exercising frame logic without a GPU

#![allow(dead_code, missing_docs)]

use crate::assets::{CubeMapImages, ImageData};
use crate::foundation::math::Mat4;
use crate::render::backend::{
    BackendResult, FrameStatus, MeshHandle, ProgramHandle, RenderBackend, TextureHandle,
};
use crate::render::primitives::Mesh;
use crate::render::shader::{ProgramDescriptor, ShaderProgram, UniformBlock, UniformLayout};
use crate::render::texture::SamplerSettings;
use std::cell::Cell;

/// Backend calls that affect a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    BeginFrame,
    UseProgram(ProgramHandle),
    BindTexture(TextureHandle),
    Draw(MeshHandle),
    EndFrame,
    Resize(u32, u32),
}

/// Uniform values captured at a draw
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub mesh: MeshHandle,
    pub texture: Option<TextureHandle>,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub draws: Vec<DrawRecord>,
    /// Number of upcoming `begin_frame` calls that report out of date
    pub out_of_date_frames: u32,
    pub wait_idle_calls: Cell<u32>,
    uniforms: UniformBlock,
    bound_texture: Option<TextureHandle>,
    meshes: u32,
    textures: u32,
    programs: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::with_layout(UniformLayout::transforms())
    }

    pub fn with_layout(layout: UniformLayout) -> Self {
        Self {
            calls: Vec::new(),
            draws: Vec::new(),
            out_of_date_frames: 0,
            wait_idle_calls: Cell::new(0),
            uniforms: UniformBlock::new(layout),
            bound_texture: None,
            meshes: 0,
            textures: 0,
            programs: 0,
        }
    }

    fn read_mat4(&self, name: &str) -> Mat4 {
        self.uniforms
            .layout()
            .entry(name)
            .map_or_else(Mat4::zeros, |entry| {
                let bytes = &self.uniforms.bytes()[entry.offset..entry.offset + 64];
                let floats: Vec<f32> = bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Mat4::from_column_slice(&floats)
            })
    }
}

impl RenderBackend for RecordingBackend {
    fn create_mesh(&mut self, mesh: &Mesh) -> BackendResult<MeshHandle> {
        mesh.validate()?;
        self.meshes += 1;
        Ok(MeshHandle(self.meshes - 1))
    }

    fn create_texture(&mut self, _image: &ImageData, _sampler: &SamplerSettings) -> BackendResult<TextureHandle> {
        self.textures += 1;
        Ok(TextureHandle(self.textures - 1))
    }

    fn create_cube_map(&mut self, _faces: &CubeMapImages, _sampler: &SamplerSettings) -> BackendResult<TextureHandle> {
        self.textures += 1;
        Ok(TextureHandle(self.textures - 1))
    }

    fn create_program(&mut self, _descriptor: &ProgramDescriptor) -> BackendResult<ProgramHandle> {
        self.programs += 1;
        Ok(ProgramHandle(self.programs - 1))
    }

    fn begin_frame(&mut self, _clear_color: [f32; 4]) -> BackendResult<FrameStatus> {
        self.calls.push(Call::BeginFrame);
        if self.out_of_date_frames > 0 {
            self.out_of_date_frames -= 1;
            return Ok(FrameStatus::SwapchainOutOfDate);
        }
        Ok(FrameStatus::Ready)
    }

    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        self.calls.push(Call::UseProgram(program));
        Ok(())
    }

    fn program(&mut self) -> BackendResult<&mut dyn ShaderProgram> {
        Ok(&mut self.uniforms)
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> BackendResult<()> {
        self.bound_texture = Some(texture);
        self.calls.push(Call::BindTexture(texture));
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) -> BackendResult<()> {
        self.calls.push(Call::Draw(mesh));
        self.draws.push(DrawRecord {
            mesh,
            texture: self.bound_texture,
            model: self.read_mat4("model"),
            view: self.read_mat4("view"),
            projection: self.read_mat4("projection"),
        });
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<FrameStatus> {
        self.calls.push(Call::EndFrame);
        Ok(FrameStatus::Ready)
    }

    fn resize(&mut self, width: u32, height: u32) -> BackendResult<()> {
        self.calls.push(Call::Resize(width, height));
        Ok(())
    }

    fn wait_idle(&self) -> BackendResult<()> {
        self.wait_idle_calls.set(self.wait_idle_calls.get() + 1);
        Ok(())
    }
}
