//! Graphics context abstraction.
//!
//! [`GraphicsContext`] is the set of operations [`ShaderProgram`](super::ShaderProgram)
//! needs from the graphics API. [`GlContext`] implements it on top of [`glow`] and keeps
//! track of the currently bound program itself instead of relying on global GL state.

use std::fmt;
use std::sync::Arc;

use glow::HasContext;

/// The kind of a shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// The matching OpenGL shader type enum.
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Operations a graphics context must provide to build and drive shader programs.
///
/// Handles are only meaningful for the context that produced them.
pub trait GraphicsContext {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + PartialEq + fmt::Debug;
    type UniformLocation: Clone;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn compile_shader(&mut self, shader: Self::Shader, source: &str);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self) -> Result<Self::Program, String>;
    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn link_program(&mut self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&mut self, program: Self::Program);

    /// Resolves a uniform by name. `None` means the program has no such uniform.
    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    /// Writes integer data to a uniform of the current program.
    fn uniform_i32(&mut self, location: &Self::UniformLocation, value: i32);
    /// Writes float data (1 to 4 components) to a uniform of the current program.
    fn uniform_f32(&mut self, location: &Self::UniformLocation, values: &[f32]);
    fn get_uniform_i32(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        out: &mut [i32],
    );
    fn get_uniform_f32(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        out: &mut [f32],
    );

    fn use_program(&mut self, program: Option<Self::Program>);
    fn current_program(&self) -> Option<Self::Program>;
}

/// A [`GraphicsContext`] backed by an OpenGL context loaded through [`glow`].
///
/// Must only be used on the thread that owns the GL context.
pub struct GlContext {
    gl: Arc<glow::Context>,
    current_program: Option<glow::Program>,
}

impl GlContext {
    pub fn new(gl: &Arc<glow::Context>) -> Self {
        Self {
            gl: Arc::clone(gl),
            current_program: None,
        }
    }

    /// The underlying glow context, for calls outside the shader API.
    pub fn gl(&self) -> &Arc<glow::Context> {
        &self.gl
    }
}

impl GraphicsContext for GlContext {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage.gl_enum()) }
    }

    fn compile_shader(&mut self, shader: Self::Shader, source: &str) {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
        }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&mut self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&mut self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        if self.current_program == Some(program) {
            self.use_program(None);
        }
        unsafe { self.gl.delete_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn uniform_i32(&mut self, location: &Self::UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    fn uniform_f32(&mut self, location: &Self::UniformLocation, values: &[f32]) {
        unsafe {
            match *values {
                [x] => self.gl.uniform_1_f32(Some(location), x),
                [x, y] => self.gl.uniform_2_f32(Some(location), x, y),
                [x, y, z] => self.gl.uniform_3_f32(Some(location), x, y, z),
                [x, y, z, w] => self.gl.uniform_4_f32(Some(location), x, y, z, w),
                _ => log::warn!("Unsupported uniform component count: {}", values.len()),
            }
        }
    }

    fn get_uniform_i32(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        out: &mut [i32],
    ) {
        unsafe { self.gl.get_uniform_i32(program, location, out) }
    }

    fn get_uniform_f32(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        out: &mut [f32],
    ) {
        unsafe { self.gl.get_uniform_f32(program, location, out) }
    }

    fn use_program(&mut self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
        self.current_program = program;
    }

    fn current_program(&self) -> Option<Self::Program> {
        self.current_program
    }
}
