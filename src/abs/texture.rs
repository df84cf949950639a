//! Structs and functions for handling textures.
//!
//! The module provides [`TextureData`], decoded pixels waiting for upload, and the [`Texture`]
//! struct which is a CPU representation of a GPU texture.

use std::{path::Path, sync::Arc};

use glow::HasContext;
use image::{DynamicImage, GenericImageView};

/// Errors produced while decoding or validating texture data.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("unsupported channel count {0}")]
    Channels(u8),
    #[error("expected {expected} bytes of pixel data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("failed to create texture object: {0}")]
    Create(String),
}

/// Decoded pixel data, tightly packed rows starting at the top of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl TextureData {
    /// Wraps raw pixels after checking that they match the given dimensions.
    pub fn from_raw(pixels: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self, TextureError> {
        if !(1..=4).contains(&channels) {
            return Err(TextureError::Channels(channels));
        }
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            channels,
        })
    }

    /// Converts a decoded [`image::DynamicImage`], keeping 8-bit gray, RGB and RGBA as they are.
    pub fn from_image(image: &DynamicImage) -> Result<Self, TextureError> {
        let (width, height) = image.dimensions();
        match image {
            DynamicImage::ImageLuma8(img) => Self::from_raw(img.as_raw().clone(), width, height, 1),
            DynamicImage::ImageRgb8(img) => Self::from_raw(img.as_raw().clone(), width, height, 3),
            _ => Self::from_raw(image.to_rgba8().into_raw(), width, height, 4),
        }
    }

    /// Decodes an image file.
    ///
    /// The image is flipped vertically so that texture coordinate `(0, 0)` is its bottom left
    /// corner, as OpenGL expects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| TextureError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_image(&image.flipv())
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// The OpenGL pixel format matching the channel count.
    pub fn gl_format(&self) -> u32 {
        match self.channels {
            1 => glow::RED,
            2 => glow::RG,
            3 => glow::RGB,
            _ => glow::RGBA,
        }
    }
}

/// Represents a texture stored on the GPU side.
pub struct Texture {
    gl: Arc<glow::Context>,
    id: glow::Texture,
}

impl Texture {
    /// Uploads the given pixel data as a mipmapped, repeating 2D texture.
    pub fn new(gl: &Arc<glow::Context>, data: &TextureData) -> Result<Self, TextureError> {
        let format = data.gl_format();
        unsafe {
            let texture = gl.create_texture().map_err(TextureError::Create)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            // rows of RGB and gray images are not 4-byte aligned in general
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                data.width() as i32,
                data.height() as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(data.pixels())),
            );
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
            gl.generate_mipmap(glow::TEXTURE_2D);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.bind_texture(glow::TEXTURE_2D, None);

            log::debug!(
                "uploaded texture {}x{} with {} channels",
                data.width(),
                data.height(),
                data.channels()
            );

            Ok(Self {
                gl: Arc::clone(gl),
                id: texture,
            })
        }
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(self.id));
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        log::debug!("deleting texture {:?}", self.id);
        unsafe {
            self.gl.delete_texture(self.id);
        }
    }
}
