//! Per-frame command recording.
//!
//! Scenes do not touch OpenGL while rendering. They append [`Command`]s to a [`CommandList`],
//! which the frame loop hands to an executor afterwards. Resources are referred to by handle.

use std::collections::BTreeMap;

use fxhash::FxHashMap;
use glam::Vec4;

use crate::{
    abs::UniformValue,
    render::resources::{MeshHandle, ProgramHandle, TextureHandle},
};

/// A single recorded GPU operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Viewport { width: u32, height: u32 },
    Clear { color: Vec4, depth: bool },
    UseProgram(ProgramHandle),
    SetUniform { name: &'static str, value: UniformValue },
    BindTexture { unit: u32, texture: TextureHandle },
    Draw(MeshHandle),
}

/// The commands of one frame, in submission order.
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    commands: Vec<Command>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every recorded command, keeping the allocation.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn viewport(&mut self, width: u32, height: u32) {
        self.commands.push(Command::Viewport { width, height });
    }

    /// Clears the color buffer, and the depth buffer with depth testing on if `depth` is set.
    pub fn clear(&mut self, color: Vec4, depth: bool) {
        self.commands.push(Command::Clear { color, depth });
    }

    pub fn use_program(&mut self, program: ProgramHandle) {
        self.commands.push(Command::UseProgram(program));
    }

    pub fn set_uniform(&mut self, name: &'static str, value: impl Into<UniformValue>) {
        self.commands.push(Command::SetUniform {
            name,
            value: value.into(),
        });
    }

    pub fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    pub fn draw(&mut self, mesh: MeshHandle) {
        self.commands.push(Command::Draw(mesh));
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::Draw(_)))
            .count()
    }

    /// Replays the list the way OpenGL tracks state and returns what each draw call sees.
    ///
    /// Uniform values belong to the program they were set on, so switching programs back and
    /// forth keeps earlier values. Draws without a bound program are skipped, like the executor
    /// does.
    pub fn resolve(&self) -> Vec<ResolvedDraw> {
        let mut uniforms: FxHashMap<ProgramHandle, BTreeMap<&'static str, UniformValue>> =
            FxHashMap::default();
        let mut textures: BTreeMap<u32, TextureHandle> = BTreeMap::new();
        let mut program = None;
        let mut draws = Vec::new();

        for command in &self.commands {
            match command {
                Command::Viewport { .. } | Command::Clear { .. } => {}
                Command::UseProgram(handle) => program = Some(*handle),
                Command::SetUniform { name, value } => {
                    if let Some(handle) = program {
                        uniforms.entry(handle).or_default().insert(*name, *value);
                    }
                }
                Command::BindTexture { unit, texture } => {
                    textures.insert(*unit, *texture);
                }
                Command::Draw(mesh) => {
                    if let Some(handle) = program {
                        draws.push(ResolvedDraw {
                            program: handle,
                            mesh: *mesh,
                            uniforms: uniforms.get(&handle).cloned().unwrap_or_default(),
                            textures: textures.clone(),
                        });
                    }
                }
            }
        }
        draws
    }
}

/// The state a single draw call is issued with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDraw {
    pub program: ProgramHandle,
    pub mesh: MeshHandle,
    pub uniforms: BTreeMap<&'static str, UniformValue>,
    pub textures: BTreeMap<u32, TextureHandle>,
}

impl ResolvedDraw {
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }
}
