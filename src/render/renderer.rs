//! Executes recorded command lists against OpenGL.

use std::sync::Arc;

use glow::HasContext;

use crate::{
    frame::Executor,
    render::{
        commands::{Command, CommandList},
        resources::{ProgramHandle, Resources},
    },
};

/// Owns the GPU resources and replays each frame's commands on the GL context.
pub struct GlRenderer {
    gl: Arc<glow::Context>,
    resources: Resources,
    program: Option<ProgramHandle>,
    depth_test: bool,
    warned_unbound: bool,
}

impl GlRenderer {
    pub fn new(gl: &Arc<glow::Context>) -> Self {
        Self {
            gl: Arc::clone(gl),
            resources: Resources::new(),
            program: None,
            depth_test: false,
            warned_unbound: false,
        }
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    fn set_depth_test(&mut self, enabled: bool) {
        if enabled == self.depth_test {
            return;
        }
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
        self.depth_test = enabled;
    }

    fn warn_unbound(&mut self, what: &str) {
        if !self.warned_unbound {
            log::warn!("{what} issued without a bound program, skipping");
            self.warned_unbound = true;
        }
    }
}

impl Executor for GlRenderer {
    fn execute(&mut self, commands: &CommandList) {
        for command in commands.commands() {
            match command {
                Command::Viewport { width, height } => unsafe {
                    self.gl.viewport(0, 0, *width as i32, *height as i32);
                },
                Command::Clear { color, depth } => {
                    self.set_depth_test(*depth);
                    let mut mask = glow::COLOR_BUFFER_BIT;
                    if *depth {
                        mask |= glow::DEPTH_BUFFER_BIT;
                    }
                    unsafe {
                        self.gl.clear_color(color.x, color.y, color.z, color.w);
                        self.gl.clear(mask);
                    }
                }
                Command::UseProgram(handle) => match self.resources.program(*handle) {
                    Some(program) => {
                        program.use_program();
                        self.program = Some(*handle);
                    }
                    None => {
                        log::warn!("unknown program {handle:?}");
                        unsafe { self.gl.use_program(None) };
                        self.program = None;
                    }
                },
                Command::SetUniform { name, value } => {
                    match self.program.and_then(|h| self.resources.program(h)) {
                        Some(program) => program.set_uniform(name, value),
                        None => self.warn_unbound("uniform upload"),
                    }
                }
                Command::BindTexture { unit, texture } => match self.resources.texture(*texture) {
                    Some(texture) => texture.bind(*unit),
                    None => log::warn!("unknown texture {texture:?}"),
                },
                Command::Draw(handle) => {
                    if self.program.is_none() {
                        self.warn_unbound("draw call");
                        continue;
                    }
                    match self.resources.mesh(*handle) {
                        Some(mesh) => mesh.draw(),
                        None => log::warn!("unknown mesh {handle:?}"),
                    }
                }
            }
        }
    }
}
