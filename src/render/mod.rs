//! Module for anything related to rendering.
//!
//! This module contains the command list scenes record into, the resource store with its
//! handles, and the OpenGL executor. The built-in shaders live in `shaders/<scene>/`.

pub mod commands;
pub mod renderer;
pub mod resources;

pub use commands::*;
pub use renderer::*;
pub use resources::*;
