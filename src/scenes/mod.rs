//! Module providing the `Scene` trait and all scene implementations.
//!
//! Every scene is set up once through a [`SetupContext`] and then records its draw calls each
//! frame. Scenes only keep handles; the GPU objects live in [`Resources`].

use std::{fmt, str::FromStr, sync::Arc};

use glam::Vec4;

use crate::{
    abs::{Mesh, MeshData, ShaderProgramBuilder, ShaderStage, Texture, TextureData},
    error::StartupError,
    frame::FrameState,
    render::{CommandList, MeshHandle, ProgramHandle, Resources, TextureHandle},
    settings::Settings,
};

pub mod cubes;
pub mod offset;
pub mod quad;
pub mod triangle;

/// Expands to the `(vertex, fragment)` sources of a built-in shader pair in
/// `src/render/shaders/<name>/`.
#[macro_export]
macro_rules! builtin_shaders {
    ($name:ident) => {
        (
            include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/src/render/shaders/",
                stringify!($name),
                "/vert.glsl"
            )),
            include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/src/render/shaders/",
                stringify!($name),
                "/frag.glsl"
            )),
        )
    };
}

/// How a scene wants the frame cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    pub color: Vec4,
    /// Also clears depth and enables depth testing.
    pub depth: bool,
}

/// The Scene trait defines the common interface for all scenes.
pub trait Scene {
    fn name(&self) -> &'static str;

    fn clear(&self) -> ClearState;

    /// Records the frame's uniform uploads, bindings and draw calls.
    fn record(&mut self, frame: &FrameState, commands: &mut CommandList);
}

/// Everything a scene needs to create its GPU resources.
pub struct SetupContext<'a> {
    pub gl: &'a Arc<glow::Context>,
    pub resources: &'a mut Resources,
    pub settings: &'a Settings,
}

impl SetupContext<'_> {
    /// Builds the program for `scene`, preferring files from the configured shader directory
    /// over the built-in sources.
    pub fn program(
        &mut self,
        scene: &str,
        (vertex, fragment): (&'static str, &'static str),
    ) -> Result<ProgramHandle, StartupError> {
        let mut builder = ShaderProgramBuilder::new();
        builder = match self.settings.shader_path(scene, "vert.glsl") {
            Some(path) => builder.attach_file(ShaderStage::Vertex, path),
            None => builder.attach_source(ShaderStage::Vertex, vertex),
        };
        builder = match self.settings.shader_path(scene, "frag.glsl") {
            Some(path) => builder.attach_file(ShaderStage::Fragment, path),
            None => builder.attach_source(ShaderStage::Fragment, fragment),
        };
        let program = builder.build(self.gl)?;
        log::info!("linked shader program for '{scene}'");
        Ok(self.resources.add_program(program))
    }

    pub fn mesh(&mut self, data: &MeshData) -> Result<MeshHandle, StartupError> {
        let mesh = Mesh::new(self.gl, data, glow::TRIANGLES)?;
        Ok(self.resources.add_mesh(mesh))
    }

    /// Uploads the configured texture, or a generated brick pattern when none is configured.
    pub fn texture(&mut self) -> Result<TextureHandle, StartupError> {
        let data = match &self.settings.texture {
            Some(path) => {
                log::info!("loading texture '{}'", path.display());
                TextureData::load(path)?
            }
            None => brick_texture()?,
        };
        let texture = Texture::new(self.gl, &data)?;
        Ok(self.resources.add_texture(texture))
    }
}

/// A 64x64 brick wall, used when no texture file is configured.
pub fn brick_texture() -> Result<TextureData, StartupError> {
    const SIZE: u32 = 64;
    const BRICK_W: u32 = 16;
    const BRICK_H: u32 = 8;
    let image = image::RgbImage::from_fn(SIZE, SIZE, |x, y| {
        let row = y / BRICK_H;
        let shift = if row % 2 == 0 { 0 } else { BRICK_W / 2 };
        let mortar = y % BRICK_H == 0 || (x + shift) % BRICK_W == 0;
        if mortar {
            image::Rgb([200, 196, 188])
        } else {
            // slight per-brick variation
            let brick = ((x + shift) / BRICK_W + row * 7) % 5;
            image::Rgb([150 + brick as u8 * 8, 62 + brick as u8 * 3, 44])
        }
    });
    Ok(TextureData::from_image(&image::DynamicImage::ImageRgb8(image))?)
}

/// The available scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneKind {
    #[default]
    Triangle,
    Offset,
    Quad,
    Cubes,
}

impl SceneKind {
    pub const ALL: [SceneKind; 4] = [
        SceneKind::Triangle,
        SceneKind::Offset,
        SceneKind::Quad,
        SceneKind::Cubes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Triangle => "triangle",
            SceneKind::Offset => "offset",
            SceneKind::Quad => "quad",
            SceneKind::Cubes => "cubes",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SceneKind::Triangle => "orange triangle from inline shaders",
            SceneKind::Offset => "colored triangle following the cursor at half scale",
            SceneKind::Quad => "textured quad drawn from four indexed vertices",
            SceneKind::Cubes => "ten textured cubes, the first one spinning",
        }
    }

    /// Creates the scene's GPU resources.
    pub fn setup(self, ctx: &mut SetupContext) -> Result<Box<dyn Scene>, StartupError> {
        log::info!("setting up scene '{}'", self.name());
        Ok(match self {
            SceneKind::Triangle => Box::new(triangle::TriangleScene::setup(ctx)?),
            SceneKind::Offset => Box::new(offset::OffsetScene::setup(ctx)?),
            SceneKind::Quad => Box::new(quad::QuadScene::setup(ctx)?),
            SceneKind::Cubes => Box::new(cubes::CubesScene::setup(ctx)?),
        })
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneKind {
    type Err = StartupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SceneKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| StartupError::UnknownScene(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_names_round_trip() {
        for kind in SceneKind::ALL {
            assert_eq!(kind.name().parse::<SceneKind>().unwrap(), kind);
        }
        assert_eq!("Cubes".parse::<SceneKind>().unwrap(), SceneKind::Cubes);
        assert!(matches!(
            "teapot".parse::<SceneKind>(),
            Err(StartupError::UnknownScene(name)) if name == "teapot"
        ));
    }

    #[test]
    fn test_brick_texture_is_rgb() {
        let data = brick_texture().unwrap();
        assert_eq!((data.width(), data.height(), data.channels()), (64, 64, 3));
        // top left corner is mortar
        assert_eq!(&data.pixels()[..3], &[200, 196, 188]);
    }

    #[test]
    fn test_builtin_shaders_target_gl_33() {
        for (vertex, fragment) in [
            builtin_shaders!(offset),
            builtin_shaders!(quad),
            builtin_shaders!(cubes),
        ] {
            assert!(vertex.starts_with("#version 330 core"));
            assert!(fragment.starts_with("#version 330 core"));
        }
    }
}
