//! Shader programs and named uniforms
//!
//! A program is described by a [`ProgramDescriptor`]: two shader stages, the
//! uniform block they share, the texture kind they sample and the raster state
//! they draw with. Uniforms are set by name through [`ShaderProgram`] and
//! packed into a CPU-side [`UniformBlock`] using std140 rules; the backend
//! copies the block to the GPU at each draw.

use std::fmt;
use std::path::Path;

use crate::config::ShaderConfig;
use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::texture::TextureKind;
use crate::render::{RenderError, RenderResult};

/// GLSL type of a uniform member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    /// `bool`, stored as a 32-bit integer
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat4`
    Mat4,
}

impl UniformType {
    /// std140 base alignment in bytes
    pub const fn alignment(self) -> usize {
        match self {
            Self::Bool | Self::Int | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 | Self::Vec4 | Self::Mat4 => 16,
        }
    }

    /// Bytes occupied by the value itself
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::Int | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

/// A uniform value to upload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `bool`
    Bool(bool),
    /// `int`
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat4`, column-major
    Mat4(Mat4),
}

impl UniformValue {
    /// GLSL type of this value
    pub const fn uniform_type(&self) -> UniformType {
        match self {
            Self::Bool(_) => UniformType::Bool,
            Self::Int(_) => UniformType::Int,
            Self::Float(_) => UniformType::Float,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::Mat4(_) => UniformType::Mat4,
        }
    }

    fn write_to(&self, dst: &mut [u8]) {
        match self {
            Self::Bool(v) => dst.copy_from_slice(&u32::from(*v).to_ne_bytes()),
            Self::Int(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Self::Float(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Self::Vec2(v) => dst.copy_from_slice(bytemuck::cast_slice(v.as_slice())),
            Self::Vec3(v) => dst.copy_from_slice(bytemuck::cast_slice(v.as_slice())),
            Self::Vec4(v) => dst.copy_from_slice(bytemuck::cast_slice(v.as_slice())),
            Self::Mat4(m) => dst.copy_from_slice(bytemuck::cast_slice(m.as_slice())),
        }
    }
}

/// A named member of a uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformEntry {
    /// Member name as written in the shader
    pub name: String,
    /// Member type
    pub ty: UniformType,
    /// Byte offset within the block
    pub offset: usize,
}

/// std140 layout of a single uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformLayout {
    entries: Vec<UniformEntry>,
    size: usize,
}

impl UniformLayout {
    /// Lay out members in declaration order
    pub fn new(fields: &[(&str, UniformType)]) -> Self {
        let mut offset = 0;
        let entries = fields
            .iter()
            .map(|&(name, ty)| {
                let aligned = align_up(offset, ty.alignment());
                offset = aligned + ty.size();
                UniformEntry {
                    name: name.to_string(),
                    ty,
                    offset: aligned,
                }
            })
            .collect();

        Self {
            entries,
            size: align_up(offset, 16),
        }
    }

    /// `model`, `view` and `projection` matrices
    pub fn transforms() -> Self {
        Self::new(&[
            ("model", UniformType::Mat4),
            ("view", UniformType::Mat4),
            ("projection", UniformType::Mat4),
        ])
    }

    /// Look up a member by name
    pub fn entry(&self, name: &str) -> Option<&UniformEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Members in declaration order
    pub fn entries(&self) -> &[UniformEntry] {
        &self.entries
    }

    /// Total block size, rounded up to 16 bytes
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Round `value` up to a multiple of `alignment` (a power of two)
pub const fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// CPU copy of a uniform block's contents
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    data: Vec<u8>,
}

impl UniformBlock {
    /// Zero-initialized block for `layout`
    pub fn new(layout: UniformLayout) -> Self {
        let data = vec![0; layout.size()];
        Self { layout, data }
    }

    /// Block layout
    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Packed bytes ready for upload
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Typed, named uniform setters
///
/// Only [`ShaderProgram::set_uniform`] is required; the typed setters wrap
/// it. Setting a name the program does not declare is an error rather than
/// a silent no-op.
pub trait ShaderProgram {
    /// Set a uniform by name
    ///
    /// # Errors
    /// `UnknownUniform` if the program has no such member,
    /// `UniformTypeMismatch` if the value's type differs from the declaration.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()>;

    /// Set a `bool` uniform
    fn set_bool(&mut self, name: &str, value: bool) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Bool(value))
    }

    /// Set an `int` uniform
    fn set_int(&mut self, name: &str, value: i32) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Int(value))
    }

    /// Set a `float` uniform
    fn set_float(&mut self, name: &str, value: f32) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Float(value))
    }

    /// Set a `vec2` uniform
    fn set_vec2(&mut self, name: &str, value: Vec2) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Vec2(value))
    }

    /// Set a `vec3` uniform
    fn set_vec3(&mut self, name: &str, value: Vec3) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Vec3(value))
    }

    /// Set a `vec4` uniform
    fn set_vec4(&mut self, name: &str, value: Vec4) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Vec4(value))
    }

    /// Set a `mat4` uniform
    fn set_mat4(&mut self, name: &str, value: &Mat4) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Mat4(*value))
    }
}

impl ShaderProgram for UniformBlock {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()> {
        let entry = self
            .layout
            .entry(name)
            .ok_or_else(|| RenderError::UnknownUniform(name.to_string()))?;

        let actual = value.uniform_type();
        if entry.ty != actual {
            return Err(RenderError::UniformTypeMismatch {
                name: name.to_string(),
                expected: entry.ty,
                actual,
            });
        }

        let range = entry.offset..entry.offset + actual.size();
        value.write_to(&mut self.data[range]);
        Ok(())
    }
}

/// Pipeline stage a shader belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader code for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// Compiled SPIR-V bytecode
    Spirv(Vec<u8>),
    /// GLSL source text, compiled when the program is created
    Glsl(String),
}

impl ShaderSource {
    /// Read a stage from disk; `.spv` files are SPIR-V, anything else is GLSL
    pub fn from_path(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let load_error = |e: std::io::Error| RenderError::ResourceLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if path.extension().is_some_and(|ext| ext == "spv") {
            std::fs::read(path).map(Self::Spirv).map_err(load_error)
        } else {
            std::fs::read_to_string(path).map(Self::Glsl).map_err(load_error)
        }
    }
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// Draw both faces
    None,
    /// Discard front faces
    Front,
    /// Discard back faces
    Back,
}

/// Depth comparison for the depth test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCompare {
    /// Pass when nearer
    Less,
    /// Pass when nearer or equal, for geometry pinned to the far plane
    LessOrEqual,
}

/// Fixed-function state a program draws with
///
/// Front faces are clockwise in screen space for every program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    /// Which faces to discard
    pub cull: CullMode,
    /// Write depth values
    pub depth_write: bool,
    /// Depth comparison
    pub depth_compare: DepthCompare,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull: CullMode::Back,
            depth_write: true,
            depth_compare: DepthCompare::Less,
        }
    }
}

impl RasterState {
    /// Background drawn last at maximum depth, visible from inside
    pub const fn skybox() -> Self {
        Self {
            cull: CullMode::None,
            depth_write: false,
            depth_compare: DepthCompare::LessOrEqual,
        }
    }
}

/// Everything needed to build a program
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    /// Vertex stage
    pub vertex: ShaderSource,
    /// Fragment stage
    pub fragment: ShaderSource,
    /// Uniform block bound at set 0, binding 0
    pub uniforms: UniformLayout,
    /// Texture sampled at set 1, binding 0
    pub texture_kind: TextureKind,
    /// Fixed-function state
    pub raster: RasterState,
}

impl ProgramDescriptor {
    /// Textured sphere program with `model`, `view`, `projection` uniforms
    pub fn sphere(shaders: &ShaderConfig) -> RenderResult<Self> {
        Ok(Self {
            vertex: ShaderSource::from_path(&shaders.vertex_shader_path)?,
            fragment: ShaderSource::from_path(&shaders.fragment_shader_path)?,
            uniforms: UniformLayout::transforms(),
            texture_kind: TextureKind::Texture2D,
            raster: RasterState::default(),
        })
    }

    /// Cube-mapped sky box program with the same uniforms
    pub fn skybox(shaders: &ShaderConfig) -> RenderResult<Self> {
        Ok(Self {
            vertex: ShaderSource::from_path(&shaders.vertex_shader_path)?,
            fragment: ShaderSource::from_path(&shaders.fragment_shader_path)?,
            uniforms: UniformLayout::transforms(),
            texture_kind: TextureKind::CubeMap,
            raster: RasterState::skybox(),
        })
    }
}
