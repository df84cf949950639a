//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2 window and the OpenGL
//! context, and implements [`Surface`] for it so the frame loop can drive it.

use std::{sync::Arc, time::Instant};

use glow::HasContext;

use crate::{error::StartupError, frame::Surface, input::InputState, settings::WindowSettings};

/// The [`App`] struct encapsulates the SDL2 and OpenGL context.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub gl: Arc<glow::Context>,
    pub event_pump: sdl2::EventPump,
    started: Instant,
}

impl App {
    /// Creates the window with an OpenGL 3.3 core context made current on it.
    pub fn new(settings: &WindowSettings) -> Result<Self, StartupError> {
        let sdl = sdl2::init().map_err(StartupError::Sdl)?;
        let video_subsystem = sdl.video().map_err(StartupError::Sdl)?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        gl_attr.set_depth_size(24);

        let mut builder = video_subsystem.window(&settings.title, settings.width, settings.height);
        builder.opengl().resizable();
        if settings.hidden {
            builder.hidden();
        }
        let window = builder
            .build()
            .map_err(|e| StartupError::Window(e.to_string()))?;

        let gl_context = window.gl_create_context().map_err(StartupError::Context)?;
        window
            .gl_make_current(&gl_context)
            .map_err(StartupError::Context)?;

        let interval = if settings.vsync {
            sdl2::video::SwapInterval::VSync
        } else {
            sdl2::video::SwapInterval::Immediate
        };
        if let Err(e) = video_subsystem.gl_set_swap_interval(interval) {
            log::warn!("could not set swap interval: {e}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let version = gl.version();
        if version.is_embedded || (version.major, version.minor) < (3, 3) {
            return Err(StartupError::GlVersion {
                major: version.major,
                minor: version.minor,
            });
        }
        log::info!(
            "OpenGL {}.{} ({})",
            version.major,
            version.minor,
            unsafe { gl.get_parameter_string(glow::RENDERER) }
        );

        let event_pump = sdl.event_pump().map_err(StartupError::Sdl)?;
        let gl = Arc::new(gl);

        Ok(Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            gl,
            event_pump,
            started: Instant::now(),
        })
    }
}

impl Surface for App {
    fn framebuffer_size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }

    fn elapsed(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    fn poll_events(&mut self, input: &mut InputState) {
        for event in self.event_pump.poll_iter() {
            input.handle_event(&event);
        }
    }

    fn present(&mut self) {
        self.window.gl_swap_window();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        log::debug!("destroying window and OpenGL context");
    }
}
