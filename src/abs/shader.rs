//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for building shader
//! programs through a [`GraphicsContext`], along with the [`Uniform`] trait for setting
//! uniform variables.

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3, Vec4};

use super::context::{GraphicsContext, ShaderStage};

/// Maximum number of characters kept from a compile or link diagnostic.
pub const INFO_LOG_CAPACITY: usize = 512;

/// Errors that can occur while building a [`ShaderProgram`].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ShaderError {
    #[error("failed to read shader source {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create {0} shader object: {1}")]
    CreateShader(ShaderStage, String),

    #[error("failed to create shader program object: {0}")]
    CreateProgram(String),

    #[error("{}", join_failures(.0))]
    Compile(Vec<CompileFailure>),

    #[error("shader program failed to link:\n{0}")]
    Link(String),
}

/// The diagnostic of a single stage that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub stage: ShaderStage,
    pub log: String,
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shader failed to compile:\n{}", self.stage, self.log)
    }
}

fn join_failures(failures: &[CompileFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cuts a diagnostic down to [`INFO_LOG_CAPACITY`] characters.
pub fn truncate_info_log(mut log: String) -> String {
    if let Some((index, _)) = log.char_indices().nth(INFO_LOG_CAPACITY) {
        log.truncate(index);
    }
    log
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Represents an individual compiled shader stage.
///
/// Stages only live long enough to be linked; call [`Shader::release`] once done with them.
pub struct Shader<C: GraphicsContext> {
    id: C::Shader,
    stage: ShaderStage,
}

impl<C: GraphicsContext> Shader<C> {
    /// Compiles a new shader stage from the given source code.
    ///
    /// On failure the stage object is released and the (truncated) compiler log returned.
    pub fn new(ctx: &mut C, stage: ShaderStage, source: &str) -> Result<Self, ShaderError> {
        let id = ctx
            .create_shader(stage)
            .map_err(|e| ShaderError::CreateShader(stage, e))?;
        ctx.compile_shader(id, source);

        if !ctx.shader_compile_status(id) {
            let log = truncate_info_log(ctx.shader_info_log(id));
            ctx.delete_shader(id);
            log::error!("Failed to compile {} shader:\n{}", stage, log);
            return Err(ShaderError::Compile(vec![CompileFailure { stage, log }]));
        }

        Ok(Self { id, stage })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Deletes the stage object.
    pub fn release(self, ctx: &mut C) {
        ctx.delete_shader(self.id);
    }
}

/// Represents a uniform value that can be written to a shader program.
pub trait Uniform {
    /// Writes the value at the given location of the context's current program.
    fn set_uniform<C: GraphicsContext>(&self, ctx: &mut C, location: &C::UniformLocation);
}

impl Uniform for bool {
    fn set_uniform<C: GraphicsContext>(&self, ctx: &mut C, location: &C::UniformLocation) {
        ctx.uniform_i32(location, *self as i32);
    }
}

impl Uniform for i32 {
    fn set_uniform<C: GraphicsContext>(&self, ctx: &mut C, location: &C::UniformLocation) {
        ctx.uniform_i32(location, *self);
    }
}

impl Uniform for f32 {
    fn set_uniform<C: GraphicsContext>(&self, ctx: &mut C, location: &C::UniformLocation) {
        ctx.uniform_f32(location, &[*self]);
    }
}

impl Uniform for Vec2 {
    fn set_uniform<C: GraphicsContext>(&self, ctx: &mut C, location: &C::UniformLocation) {
        ctx.uniform_f32(location, &self.to_array());
    }
}

impl Uniform for Vec3 {
    fn set_uniform<C: GraphicsContext>(&self, ctx: &mut C, location: &C::UniformLocation) {
        ctx.uniform_f32(location, &self.to_array());
    }
}

impl Uniform for Vec4 {
    fn set_uniform<C: GraphicsContext>(&self, ctx: &mut C, location: &C::UniformLocation) {
        ctx.uniform_f32(location, &self.to_array());
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform<C: GraphicsContext>(&self, ctx: &mut C, location: &C::UniformLocation) {
        (*self).set_uniform(ctx, location);
    }
}

/// Represents a linked shader program made of one vertex and one fragment stage.
///
/// The program belongs to the context that built it and must be released with
/// [`ShaderProgram::delete`].
pub struct ShaderProgram<C: GraphicsContext> {
    id: C::Program,
    deleted: bool,
    _context: PhantomData<fn(&mut C)>,
}

impl<C: GraphicsContext> ShaderProgram<C> {
    /// Reads, compiles and links the vertex and fragment shaders at the given paths.
    pub fn from_files(
        ctx: &mut C,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_source = read_source(vertex_path.as_ref())?;
        let fragment_source = read_source(fragment_path.as_ref())?;
        log::debug!(
            "Building shader program from {} and {}",
            vertex_path.as_ref().display(),
            fragment_path.as_ref().display()
        );
        Self::from_sources(ctx, &vertex_source, &fragment_source)
    }

    /// Compiles and links a program from in-memory vertex and fragment sources.
    ///
    /// Both stages are always compiled, so a broken vertex shader still reports
    /// fragment shader errors.
    pub fn from_sources(
        ctx: &mut C,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = Shader::new(ctx, ShaderStage::Vertex, vertex_source);
        let fragment = Shader::new(ctx, ShaderStage::Fragment, fragment_source);

        let (vertex, fragment) = match (vertex, fragment) {
            (Ok(vertex), Ok(fragment)) => (vertex, fragment),
            (vertex, fragment) => {
                let mut failures = Vec::new();
                let mut other = None;
                for result in [vertex, fragment] {
                    match result {
                        Ok(shader) => shader.release(ctx),
                        Err(ShaderError::Compile(mut f)) => failures.append(&mut f),
                        Err(e) => {
                            other.get_or_insert(e);
                        }
                    }
                }
                return Err(other.unwrap_or(ShaderError::Compile(failures)));
            }
        };

        let result = Self::link(ctx, &[&vertex, &fragment]);
        vertex.release(ctx);
        fragment.release(ctx);
        result
    }

    /// Links a new shader program from the given stages. The stages are detached again
    /// afterwards but not released.
    pub fn link(ctx: &mut C, shaders: &[&Shader<C>]) -> Result<Self, ShaderError> {
        let program = ctx.create_program().map_err(ShaderError::CreateProgram)?;

        for shader in shaders {
            log::trace!("Attaching {} shader {:?} to {:?}", shader.stage(), shader.id, program);
            ctx.attach_shader(program, shader.id);
        }

        ctx.link_program(program);
        let linked = ctx.program_link_status(program);

        for shader in shaders {
            ctx.detach_shader(program, shader.id);
        }

        if !linked {
            let log = truncate_info_log(ctx.program_info_log(program));
            ctx.delete_program(program);
            log::error!("Failed to link shader program:\n{}", log);
            return Err(ShaderError::Link(log));
        }

        Ok(Self {
            id: program,
            deleted: false,
            _context: PhantomData,
        })
    }

    /// The context handle of this program.
    pub fn id(&self) -> C::Program {
        self.id
    }

    /// Binds the shader program for use.
    pub fn use_program(&self, ctx: &mut C) {
        ctx.use_program(Some(self.id));
    }

    pub fn is_current(&self, ctx: &C) -> bool {
        ctx.current_program() == Some(self.id)
    }

    /// Sets a uniform variable in the shader program.
    ///
    /// Unknown names are ignored. If another program is in use, this one is bound for the
    /// write and the previous binding restored afterwards.
    pub fn set_uniform<T: Uniform>(&self, ctx: &mut C, name: &str, value: T) {
        let Some(location) = ctx.uniform_location(self.id, name) else {
            log::trace!("Uniform {name:?} not found in program {:?}", self.id);
            return;
        };
        let previous = ctx.current_program();
        if previous != Some(self.id) {
            ctx.use_program(Some(self.id));
        }
        value.set_uniform(ctx, &location);
        if previous != Some(self.id) {
            ctx.use_program(previous);
        }
    }

    pub fn set_bool(&self, ctx: &mut C, name: &str, value: bool) {
        self.set_uniform(ctx, name, value);
    }

    pub fn set_int(&self, ctx: &mut C, name: &str, value: i32) {
        self.set_uniform(ctx, name, value);
    }

    pub fn set_float(&self, ctx: &mut C, name: &str, value: f32) {
        self.set_uniform(ctx, name, value);
    }

    /// Deletes the program, unbinding it first if it is in use.
    pub fn delete(mut self, ctx: &mut C) {
        if self.is_current(ctx) {
            ctx.use_program(None);
        }
        ctx.delete_program(self.id);
        self.deleted = true;
    }
}

impl<C: GraphicsContext> Drop for ShaderProgram<C> {
    fn drop(&mut self) {
        if !self.deleted {
            log::warn!("Shader program {:?} dropped without being deleted", self.id);
        }
    }
}
