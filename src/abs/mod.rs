//! This module contains the core components of the program,
//! including application setup, the graphics context, shader management and meshes.

pub mod app;
pub mod context;
pub mod mesh;
pub mod shader;

#[cfg(test)]
pub(crate) mod mock;

pub use app::*;
pub use context::*;
pub use mesh::*;
pub use shader::*;
