//! The two demo scenes: a pair of triangles with their own programs, and an indexed
//! rectangle built from inline shader sources.

use std::path::Path;

use glam::vec3;
use glow::HasContext;

use crate::abs::*;
use crate::settings::SceneKind;

const RECTANGLE_VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
    gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

const RECTANGLE_FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;
void main()
{
    FragColor = vec4(1.0f, 0.5f, 0.2f, 1.0f);
}
";

const LEFT_TRIANGLE: [ColorVertex; 3] = [
    ColorVertex::new(vec3(-0.5, -0.5, 0.0), vec3(0.0, 1.0, 0.0)),
    ColorVertex::new(vec3(0.0, -0.5, 0.0), vec3(1.0, 0.0, 0.0)),
    ColorVertex::new(vec3(-0.25, 0.0, 0.0), vec3(0.0, 0.0, 1.0)),
];

const RIGHT_TRIANGLE: [ColorVertex; 3] = [
    ColorVertex::new(vec3(0.0, -0.5, 0.0), vec3(0.3, 0.6, 0.9)),
    ColorVertex::new(vec3(0.5, -0.5, 0.0), vec3(0.9, 0.6, 0.3)),
    ColorVertex::new(vec3(0.25, 0.0, 0.0), vec3(0.6, 0.9, 0.3)),
];

const RECTANGLE: [PositionVertex; 4] = [
    PositionVertex { position: vec3(0.25, 0.25, 0.0) },
    PositionVertex { position: vec3(0.25, -0.25, 0.0) },
    PositionVertex { position: vec3(-0.25, -0.25, 0.0) },
    PositionVertex { position: vec3(-0.25, 0.25, 0.0) },
];

const RECTANGLE_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Brightness of the triangles at time `t`, oscillating in `[0, 1]`.
pub fn pulse(t: f32) -> f32 {
    t.sin() / 2.0 + 0.5
}

/// Builds the shader programs of a scene, in draw order.
pub fn build_programs<C: GraphicsContext>(
    ctx: &mut C,
    kind: SceneKind,
    shader_dir: &Path,
) -> Result<Vec<ShaderProgram<C>>, ShaderError> {
    match kind {
        SceneKind::Triangles => {
            let flipped = ShaderProgram::from_files(
                ctx,
                shader_dir.join("flip.vert"),
                shader_dir.join("test.frag"),
            )?;
            let plain = match ShaderProgram::from_files(
                ctx,
                shader_dir.join("test.vert"),
                shader_dir.join("test.frag"),
            ) {
                Ok(program) => program,
                Err(e) => {
                    flipped.delete(ctx);
                    return Err(e);
                }
            };
            Ok(vec![flipped, plain])
        }
        SceneKind::Rectangle => Ok(vec![ShaderProgram::from_sources(
            ctx,
            RECTANGLE_VERTEX_SHADER,
            RECTANGLE_FRAGMENT_SHADER,
        )?]),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("failed to create mesh: {0}")]
    Mesh(String),
}

/// A scene ready to be drawn: each program draws the mesh at the same position.
pub struct Scene {
    kind: SceneKind,
    programs: Vec<ShaderProgram<GlContext>>,
    meshes: Vec<Mesh>,
    wireframe: bool,
}

impl Scene {
    pub fn new(
        ctx: &mut GlContext,
        kind: SceneKind,
        shader_dir: &Path,
        wireframe: bool,
    ) -> Result<Self, SceneError> {
        let programs = build_programs(ctx, kind, shader_dir)?;

        let gl = ctx.gl().clone();
        let meshes = match kind {
            SceneKind::Triangles => [LEFT_TRIANGLE, RIGHT_TRIANGLE]
                .iter()
                .map(|triangle| Mesh::new(&gl, triangle, &[], glow::TRIANGLES))
                .collect::<Result<Vec<_>, _>>(),
            SceneKind::Rectangle => {
                Mesh::new(&gl, &RECTANGLE, &RECTANGLE_INDICES, glow::TRIANGLES).map(|m| vec![m])
            }
        };
        let meshes = match meshes {
            Ok(meshes) => meshes,
            Err(e) => {
                for program in programs {
                    program.delete(ctx);
                }
                return Err(SceneError::Mesh(e));
            }
        };

        log::info!("Loaded {:?} scene", kind);

        Ok(Self {
            kind,
            programs,
            meshes,
            wireframe,
        })
    }

    /// Draws every mesh with its program. `time` is the number of seconds since start.
    pub fn draw(&self, ctx: &mut GlContext, time: f32) {
        let wireframe = self.wireframe && self.kind == SceneKind::Rectangle;
        if wireframe {
            unsafe { ctx.gl().polygon_mode(glow::FRONT_AND_BACK, glow::LINE) };
        }

        for (program, mesh) in self.programs.iter().zip(&self.meshes) {
            program.use_program(ctx);
            program.set_float(ctx, "brightness", pulse(time));
            program.set_bool(ctx, "invert", false);
            mesh.draw();
        }

        if wireframe {
            unsafe { ctx.gl().polygon_mode(glow::FRONT_AND_BACK, glow::FILL) };
        }
    }

    /// Deletes the scene's programs. Meshes release their buffers when dropped.
    pub fn delete(self, ctx: &mut GlContext) {
        for program in self.programs {
            program.delete(ctx);
        }
    }
}
