//! Startup errors.
//!
//! Everything that can go wrong before the first frame is collected in [`StartupError`], so
//! `main` can report the failed stage and exit with a nonzero status.

use crate::{
    abs::{MeshError, ShaderError, TextureError},
    settings::SettingsError,
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to initialize SDL: {0}")]
    Sdl(String),
    #[error("failed to create window: {0}")]
    Window(String),
    #[error("failed to create OpenGL context: {0}")]
    Context(String),
    #[error("OpenGL 3.3 or newer is required, the driver provides {major}.{minor}")]
    GlVersion { major: u32, minor: u32 },
    #[error("unknown close key '{0}'")]
    CloseKey(String),
    #[error("unknown scene '{0}'")]
    UnknownScene(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("shader setup failed: {0}")]
    Shader(#[from] ShaderError),
    #[error("mesh setup failed: {0}")]
    Mesh(#[from] MeshError),
    #[error("texture setup failed: {0}")]
    Texture(#[from] TextureError),
}
