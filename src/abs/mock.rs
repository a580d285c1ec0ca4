//! In-memory [`GraphicsContext`] used by the tests.
//!
//! The "compiler" only checks for a leading `#version` directive, balanced braces and a
//! `main` function, and records `in`/`out`/`uniform` declarations. Linking matches every
//! fragment input against a vertex output of the same name and type.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Once;

use super::context::{GraphicsContext, ShaderStage};

#[derive(Debug, Clone, PartialEq)]
struct Declaration {
    ty: String,
    name: String,
}

#[derive(Debug, Default, Clone)]
struct Interface {
    inputs: Vec<Declaration>,
    outputs: Vec<Declaration>,
    uniforms: Vec<Declaration>,
}

struct MockShader {
    stage: ShaderStage,
    compiled: Option<Interface>,
    log: String,
}

struct MockUniform {
    name: String,
    is_int: bool,
    ints: Vec<i32>,
    floats: Vec<f32>,
}

#[derive(Default)]
struct MockProgram {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<MockUniform>,
}

#[derive(Default)]
pub struct MockContext {
    next_id: u32,
    shaders: HashMap<u32, MockShader>,
    programs: HashMap<u32, MockProgram>,
    current_program: Option<u32>,
    compile_history: Vec<ShaderStage>,
    /// Uniform writes that matched no uniform of the current program.
    pub rejected_writes: usize,
}

impl MockContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Stages that were handed a source to compile, in call order.
    pub fn compiled_stages(&self) -> &[ShaderStage] {
        &self.compile_history
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

thread_local! {
    static CAPTURED: RefCell<Option<Vec<(log::Level, String)>>> = const { RefCell::new(None) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        CAPTURED.with(|captured| {
            if let Some(records) = captured.borrow_mut().as_mut() {
                records.push((record.level(), record.args().to_string()));
            }
        });
    }

    fn flush(&self) {}
}

static CAPTURE_LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Runs `f` and returns the log records it emitted on the current thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<(log::Level, String)>) {
    INSTALL.call_once(|| {
        log::set_logger(&CAPTURE_LOGGER).expect("no other logger in tests");
        log::set_max_level(log::LevelFilter::Trace);
    });
    CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
    let result = f();
    let records = CAPTURED.with(|captured| captured.borrow_mut().take().unwrap_or_default());
    (result, records)
}

fn component_count(ty: &str) -> Option<(bool, usize)> {
    match ty {
        "bool" | "int" | "sampler2D" => Some((true, 1)),
        "float" => Some((false, 1)),
        "vec2" => Some((false, 2)),
        "vec3" => Some((false, 3)),
        "vec4" => Some((false, 4)),
        "mat4" => Some((false, 16)),
        _ => None,
    }
}

fn parse_declaration(line: &str) -> Option<(&str, Declaration)> {
    let mut line = line.trim();
    if line.starts_with("layout") {
        let close = line.find(')')?;
        line = line[close + 1..].trim();
    }
    let statement = line.strip_suffix(';')?;
    let mut words = statement.split_whitespace();
    let qualifier = words.next()?;
    if !matches!(qualifier, "in" | "out" | "uniform") {
        return None;
    }
    let ty = words.next()?.to_string();
    let name = words.next()?.to_string();
    if words.next().is_some() {
        return None;
    }
    Some((qualifier, Declaration { ty, name }))
}

fn compile(source: &str) -> Result<Interface, String> {
    let first = source.lines().find(|l| !l.trim().is_empty());
    if !first.is_some_and(|l| l.trim_start().starts_with("#version")) {
        return Err("0:1: error: missing #version directive".to_string());
    }

    let mut depth = 0i32;
    for (number, line) in source.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(format!("0:{}: error: syntax error, unexpected '}}'", number + 1));
            }
        }
    }
    if depth != 0 {
        return Err("0:0: error: syntax error, unexpected end of file".to_string());
    }

    if !source.contains("void main(") {
        return Err("0:0: error: function 'main' is not defined".to_string());
    }

    let mut interface = Interface::default();
    for line in source.lines() {
        if let Some((qualifier, decl)) = parse_declaration(line) {
            match qualifier {
                "in" => interface.inputs.push(decl),
                "out" => interface.outputs.push(decl),
                _ => interface.uniforms.push(decl),
            }
        }
    }
    Ok(interface)
}

impl GraphicsContext for MockContext {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = u32;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<u32, String> {
        let id = self.alloc_id();
        self.shaders.insert(
            id,
            MockShader {
                stage,
                compiled: None,
                log: String::new(),
            },
        );
        Ok(id)
    }

    fn compile_shader(&mut self, shader: u32, source: &str) {
        let Some(entry) = self.shaders.get_mut(&shader) else {
            return;
        };
        self.compile_history.push(entry.stage);
        match compile(source) {
            Ok(interface) => {
                entry.compiled = Some(interface);
                entry.log.clear();
            }
            Err(log) => {
                entry.compiled = None;
                entry.log = log;
            }
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.shaders
            .get(&shader)
            .is_some_and(|s| s.compiled.is_some())
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: u32) {
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Result<u32, String> {
        let id = self.alloc_id();
        self.programs.insert(id, MockProgram::default());
        Ok(id)
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        if let Some(p) = self.programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&mut self, program: u32, shader: u32) {
        if let Some(p) = self.programs.get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&mut self, program: u32) {
        let Some(p) = self.programs.get(&program) else {
            return;
        };

        let mut vertex = None;
        let mut fragment = None;
        for id in &p.attached {
            if let Some(shader) = self.shaders.get(id) {
                match shader.stage {
                    ShaderStage::Vertex => vertex = Some(shader),
                    ShaderStage::Fragment => fragment = Some(shader),
                }
            }
        }

        let result = match (vertex, fragment) {
            (Some(v), Some(f)) => match (&v.compiled, &f.compiled) {
                (Some(v), Some(f)) => link(v, f),
                _ => Err("error: attached shader is not compiled".to_string()),
            },
            _ => Err("error: program needs a vertex and a fragment shader".to_string()),
        };

        let p = self.programs.get_mut(&program).expect("program exists");
        match result {
            Ok(uniforms) => {
                p.linked = true;
                p.log.clear();
                p.uniforms = uniforms;
            }
            Err(log) => {
                p.linked = false;
                p.log = log;
                p.uniforms.clear();
            }
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.programs.get(&program).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: u32) {
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.programs.remove(&program);
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let p = self.programs.get(&program)?;
        p.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(|i| i as u32)
    }

    fn uniform_i32(&mut self, location: &u32, value: i32) {
        let uniform = self
            .current_program
            .and_then(|id| self.programs.get_mut(&id))
            .and_then(|p| p.uniforms.get_mut(*location as usize));
        match uniform {
            Some(u) if u.is_int => u.ints[0] = value,
            _ => self.rejected_writes += 1,
        }
    }

    fn uniform_f32(&mut self, location: &u32, values: &[f32]) {
        let uniform = self
            .current_program
            .and_then(|id| self.programs.get_mut(&id))
            .and_then(|p| p.uniforms.get_mut(*location as usize));
        match uniform {
            Some(u) if !u.is_int && u.floats.len() == values.len() => {
                u.floats.copy_from_slice(values)
            }
            _ => self.rejected_writes += 1,
        }
    }

    fn get_uniform_i32(&self, program: u32, location: &u32, out: &mut [i32]) {
        if let Some(u) = self
            .programs
            .get(&program)
            .and_then(|p| p.uniforms.get(*location as usize))
        {
            for (dst, src) in out.iter_mut().zip(&u.ints) {
                *dst = *src;
            }
        }
    }

    fn get_uniform_f32(&self, program: u32, location: &u32, out: &mut [f32]) {
        if let Some(u) = self
            .programs
            .get(&program)
            .and_then(|p| p.uniforms.get(*location as usize))
        {
            for (dst, src) in out.iter_mut().zip(&u.floats) {
                *dst = *src;
            }
        }
    }

    fn use_program(&mut self, program: Option<u32>) {
        self.current_program = program;
    }

    fn current_program(&self) -> Option<u32> {
        self.current_program
    }
}

fn link(vertex: &Interface, fragment: &Interface) -> Result<Vec<MockUniform>, String> {
    for input in &fragment.inputs {
        if !vertex.outputs.contains(input) {
            return Err(format!(
                "error: fragment shader input '{}' of type {} is not written by the vertex shader",
                input.name, input.ty
            ));
        }
    }

    let mut uniforms: Vec<MockUniform> = Vec::new();
    for decl in vertex.uniforms.iter().chain(&fragment.uniforms) {
        let Some((is_int, count)) = component_count(&decl.ty) else {
            return Err(format!("error: unsupported uniform type '{}'", decl.ty));
        };
        if let Some(existing) = uniforms.iter().find(|u| u.name == decl.name) {
            if existing.is_int != is_int || existing.ints.len() + existing.floats.len() != count {
                return Err(format!("error: uniform '{}' declared with different types", decl.name));
            }
            continue;
        }
        uniforms.push(MockUniform {
            name: decl.name.clone(),
            is_int,
            ints: if is_int { vec![0; count] } else { Vec::new() },
            floats: if is_int { Vec::new() } else { vec![0.0; count] },
        });
    }
    Ok(uniforms)
}
