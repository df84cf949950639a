//! OpenGL Shaders
//!
//! This module defines the [`Shader`], [`ShaderProgramBuilder`] and [`ShaderProgram`] structs
//! for compiling and linking OpenGL shaders. This module also provides the [`Uniform`] trait and
//! the [`UniformValue`] enum for setting uniform variables in shader programs.

use std::{
    borrow::Cow,
    cell::RefCell,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use fxhash::FxHashMap;
use glam::{Mat4, Vec2, Vec3, Vec4};
use glow::HasContext;

/// Driver info logs are cut to this many bytes before being reported.
pub const MAX_INFO_LOG_LEN: usize = 512;

/// One half of a shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Returns the OpenGL enum for this stage.
    pub fn gl_type(self) -> u32 {
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

/// Errors produced while building a [`ShaderProgram`].
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("no {0} shader was attached")]
    MissingStage(ShaderStage),
    #[error("failed to read {stage} shader '{}': {source}", .path.display())]
    Read {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create {stage} shader object: {reason}")]
    Create { stage: ShaderStage, reason: String },
    #[error("{stage} shader compilation failed:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("failed to create program object: {0}")]
    CreateProgram(String),
    #[error("program linking failed:\n{log}")]
    Link { log: String },
}

impl ShaderError {
    /// Returns the stage the error belongs to, if it is tied to a single stage.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            ShaderError::MissingStage(stage)
            | ShaderError::Read { stage, .. }
            | ShaderError::Create { stage, .. }
            | ShaderError::Compile { stage, .. } => Some(*stage),
            ShaderError::CreateProgram(_) | ShaderError::Link { .. } => None,
        }
    }
}

/// Cuts a driver info log down to at most `max` bytes without splitting a character.
pub fn truncate_log(log: &str, max: usize) -> String {
    let log = log.trim_end_matches(['\0', '\n', '\r', ' ']);
    if log.len() <= max {
        return log.to_string();
    }
    let mut end = max;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_string()
}

/// Where the text of a shader stage comes from.
#[derive(Debug, Clone)]
pub enum ShaderSource {
    Inline(Cow<'static, str>),
    File(PathBuf),
}

impl ShaderSource {
    /// Returns the source text, reading it from disk if needed.
    pub fn load(&self, stage: ShaderStage) -> Result<Cow<'_, str>, ShaderError> {
        match self {
            ShaderSource::Inline(text) => Ok(Cow::Borrowed(text.as_ref())),
            ShaderSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| ShaderError::Read {
                    stage,
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// Represents an individual compiled OpenGL shader.
pub struct Shader {
    gl: Arc<glow::Context>,
    id: glow::Shader,
    stage: ShaderStage,
}

impl Shader {
    /// Compiles a new shader of the given stage from source code.
    pub fn new(gl: &Arc<glow::Context>, stage: ShaderStage, source: &str) -> Result<Self, ShaderError> {
        unsafe {
            let shader = gl
                .create_shader(stage.gl_type())
                .map_err(|reason| ShaderError::Create { stage, reason })?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = truncate_log(&gl.get_shader_info_log(shader), MAX_INFO_LOG_LEN);
                gl.delete_shader(shader);
                return Err(ShaderError::Compile { stage, log });
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
                stage,
            })
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        log::trace!("deleting {} shader {:?}", self.stage, self.id);
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

/// Collects one source per stage and links them into a [`ShaderProgram`].
#[derive(Debug, Clone, Default)]
pub struct ShaderProgramBuilder {
    vertex: Option<ShaderSource>,
    fragment: Option<ShaderSource>,
}

impl ShaderProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source of a stage, replacing any previous one.
    pub fn attach(mut self, stage: ShaderStage, source: ShaderSource) -> Self {
        match stage {
            ShaderStage::Vertex => self.vertex = Some(source),
            ShaderStage::Fragment => self.fragment = Some(source),
        }
        self
    }

    pub fn attach_source(self, stage: ShaderStage, source: impl Into<Cow<'static, str>>) -> Self {
        self.attach(stage, ShaderSource::Inline(source.into()))
    }

    pub fn attach_file(self, stage: ShaderStage, path: impl AsRef<Path>) -> Self {
        self.attach(stage, ShaderSource::File(path.as_ref().to_path_buf()))
    }

    /// Resolves the text of both stages. Fails if a stage is missing or unreadable.
    pub fn sources(&self) -> Result<(Cow<'_, str>, Cow<'_, str>), ShaderError> {
        let vertex = self
            .vertex
            .as_ref()
            .ok_or(ShaderError::MissingStage(ShaderStage::Vertex))?
            .load(ShaderStage::Vertex)?;
        let fragment = self
            .fragment
            .as_ref()
            .ok_or(ShaderError::MissingStage(ShaderStage::Fragment))?
            .load(ShaderStage::Fragment)?;
        Ok((vertex, fragment))
    }

    /// Compiles both stages and links them.
    pub fn build(&self, gl: &Arc<glow::Context>) -> Result<ShaderProgram, ShaderError> {
        let (vertex_src, fragment_src) = self.sources()?;
        let vertex = Shader::new(gl, ShaderStage::Vertex, &vertex_src)?;
        let fragment = Shader::new(gl, ShaderStage::Fragment, &fragment_src)?;
        ShaderProgram::new(gl, &[&vertex, &fragment])
    }
}

/// A typed value that can be uploaded to a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    I32(i32),
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

macro_rules! uniform_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value)
                }
            }
        )*
    };
}

uniform_value_from! {
    bool => Bool,
    i32 => I32,
    f32 => F32,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat4 => Mat4,
}

/// Represents a uniform variable in a shader program.
pub trait Uniform {
    /// Uploads the value to an already resolved location of the currently bound program.
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation);
}

impl Uniform for bool {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_i32(Some(location), *self as i32) }
    }
}

impl Uniform for i32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_i32(Some(location), *self) }
    }
}

impl Uniform for f32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_f32(Some(location), *self) }
    }
}

impl Uniform for Vec2 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_2_f32(Some(location), self.x, self.y) }
    }
}

impl Uniform for Vec3 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_3_f32(Some(location), self.x, self.y, self.z) }
    }
}

impl Uniform for Vec4 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_4_f32(Some(location), self.x, self.y, self.z, self.w) }
    }
}

impl Uniform for Mat4 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_matrix_4_f32_slice(Some(location), false, &self.to_cols_array()) }
    }
}

impl Uniform for UniformValue {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        match self {
            UniformValue::Bool(v) => v.set_uniform(gl, location),
            UniformValue::I32(v) => v.set_uniform(gl, location),
            UniformValue::F32(v) => v.set_uniform(gl, location),
            UniformValue::Vec2(v) => v.set_uniform(gl, location),
            UniformValue::Vec3(v) => v.set_uniform(gl, location),
            UniformValue::Vec4(v) => v.set_uniform(gl, location),
            UniformValue::Mat4(v) => v.set_uniform(gl, location),
        }
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        (*self).set_uniform(gl, location);
    }
}

/// Represents a linked OpenGL shader program.
///
/// Uniform locations are resolved by name the first time they are set and cached afterwards.
pub struct ShaderProgram {
    gl: Arc<glow::Context>,
    id: glow::Program,
    locations: RefCell<FxHashMap<String, Option<glow::UniformLocation>>>,
}

impl ShaderProgram {
    /// Links a new shader program from the given shaders.
    ///
    /// The shaders are detached again once linking succeeded, so dropping them afterwards
    /// releases them right away.
    pub fn new(gl: &Arc<glow::Context>, shaders: &[&Shader]) -> Result<Self, ShaderError> {
        unsafe {
            let program = gl.create_program().map_err(ShaderError::CreateProgram)?;

            for shader in shaders {
                gl.attach_shader(program, shader.id);
            }

            gl.link_program(program);

            if !gl.get_program_link_status(program) {
                let log = truncate_log(&gl.get_program_info_log(program), MAX_INFO_LOG_LEN);
                gl.delete_program(program);
                return Err(ShaderError::Link { log });
            }

            for shader in shaders {
                gl.detach_shader(program, shader.id);
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: program,
                locations: RefCell::new(FxHashMap::default()),
            })
        }
    }

    /// Binds the shader program for use.
    pub fn use_program(&self) {
        unsafe {
            self.gl.use_program(Some(self.id));
        }
    }

    /// Resolves the location of a uniform, consulting the cache first.
    pub fn uniform_location(&self, name: &str) -> Option<glow::UniformLocation> {
        if let Some(cached) = self.locations.borrow().get(name) {
            return cached.clone();
        }
        let location = unsafe { self.gl.get_uniform_location(self.id, name) };
        if location.is_none() {
            log::warn!("uniform '{name}' is not active in program {:?}", self.id);
        }
        self.locations
            .borrow_mut()
            .insert(name.to_string(), location.clone());
        location
    }

    /// Sets a uniform variable in the shader program. The program must be bound.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        if let Some(location) = self.uniform_location(name) {
            value.set_uniform(&self.gl, &location);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        log::debug!("deleting program {:?}", self.id);
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_log_caps_length() {
        let log = "x".repeat(2000);
        assert_eq!(truncate_log(&log, MAX_INFO_LOG_LEN).len(), MAX_INFO_LOG_LEN);
        assert_eq!(truncate_log("0:1(1): error\n\0", MAX_INFO_LOG_LEN), "0:1(1): error");
    }

    #[test]
    fn test_truncate_log_keeps_char_boundary() {
        // 'é' is two bytes, so byte 3 falls inside the second one.
        let truncated = truncate_log("éé", 3);
        assert_eq!(truncated, "é");
    }

    #[test]
    fn test_builder_reports_missing_stage() {
        let builder =
            ShaderProgramBuilder::new().attach_source(ShaderStage::Vertex, "void main() {}");
        let err = builder.sources().unwrap_err();
        assert!(matches!(err, ShaderError::MissingStage(ShaderStage::Fragment)));
        assert_eq!(err.stage(), Some(ShaderStage::Fragment));
    }

    #[test]
    fn test_builder_unreadable_file_names_stage() {
        let builder = ShaderProgramBuilder::new()
            .attach_source(ShaderStage::Vertex, "void main() {}")
            .attach_file(ShaderStage::Fragment, "/nonexistent/glsteps/frag.glsl");
        let err = builder.sources().unwrap_err();
        assert_eq!(err.stage(), Some(ShaderStage::Fragment));
        assert!(err.to_string().starts_with("failed to read fragment shader"));
    }

    #[test]
    fn test_builder_reads_file_source() {
        let path = std::env::temp_dir().join(format!("glsteps-vert-{}.glsl", std::process::id()));
        std::fs::write(&path, "#version 330 core\nvoid main() {}\n").unwrap();
        let builder = ShaderProgramBuilder::new()
            .attach_file(ShaderStage::Vertex, &path)
            .attach_source(ShaderStage::Fragment, "frag");
        let (vertex, fragment) = builder.sources().unwrap();
        assert!(vertex.starts_with("#version 330 core"));
        assert_eq!(fragment, "frag");
        std::fs::remove_file(path).unwrap();
    }

    fn hidden_app() -> crate::abs::App {
        let settings = crate::settings::WindowSettings {
            hidden: true,
            ..Default::default()
        };
        crate::abs::App::new(&settings).unwrap()
    }

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 a_pos;
out vec3 v_color;
void main() {
    v_color = a_pos;
    gl_Position = vec4(a_pos, 1.0);
}
";

    #[test]
    #[ignore = "requires an OpenGL 3.3 context"]
    fn test_malformed_fragment_names_its_stage() {
        let app = hidden_app();
        let builder = ShaderProgramBuilder::new()
            .attach_source(ShaderStage::Vertex, VERTEX)
            .attach_source(
                ShaderStage::Fragment,
                "#version 330 core\nout vec4 color;\nvoid main() { color = vec4(1.0) }\n",
            );
        let Err(err) = builder.build(&app.gl) else {
            panic!("malformed fragment shader compiled");
        };
        match &err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(*stage, ShaderStage::Fragment);
                assert!(log.len() <= MAX_INFO_LOG_LEN);
            }
            other => panic!("expected a compile error, got {other}"),
        }
        assert!(err.to_string().contains("fragment"));
    }

    #[test]
    #[ignore = "requires an OpenGL 3.3 context"]
    fn test_mismatched_stages_fail_to_link() {
        let app = hidden_app();
        let builder = ShaderProgramBuilder::new()
            .attach_source(ShaderStage::Vertex, VERTEX)
            .attach_source(
                ShaderStage::Fragment,
                "#version 330 core\nin vec4 v_missing;\nout vec4 color;\nvoid main() { color = v_missing; }\n",
            );
        let Err(err) = builder.build(&app.gl) else {
            panic!("stages with mismatched varyings linked");
        };
        assert!(matches!(err, ShaderError::Link { .. }), "got {err}");
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_uniform_value_conversions() {
        assert_eq!(UniformValue::from(0.5f32), UniformValue::F32(0.5));
        assert_eq!(UniformValue::from(true), UniformValue::Bool(true));
        assert_eq!(
            UniformValue::from(Mat4::IDENTITY),
            UniformValue::Mat4(Mat4::IDENTITY)
        );
    }
}
