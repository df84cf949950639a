//! A small OpenGL sandbox.
//!
//! Each scene is a classic tutorial program (a triangle, a cursor driven triangle, a textured
//! quad, ten textured cubes) configured on top of one shared setup path: build a shader
//! program, upload meshes and textures, then run the frame loop until the close key is pressed.

pub mod abs;
pub mod error;
pub mod frame;
pub mod input;
pub mod logger;
pub mod render;
pub mod scenes;
pub mod settings;
