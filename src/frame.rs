//! The frame loop.
//!
//! [`FrameLoop`] drives a [`Scene`] until the close condition is met. The window system and the
//! GPU are reached through the [`Surface`] and [`Executor`] traits, so the loop itself can run
//! against anything that implements them.

use glam::{UVec2, Vec2, Vec4};
use sdl2::keyboard::Keycode;

use crate::{input::InputState, render::CommandList, scenes::Scene};

/// The window side of the loop: size queries, input, and presentation.
pub trait Surface {
    /// Size of the drawable area in pixels.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Seconds since the surface was created.
    fn elapsed(&self) -> f32;

    /// Feeds every pending event into `input`. Never blocks.
    fn poll_events(&mut self, input: &mut InputState);

    /// Shows the finished frame.
    fn present(&mut self);
}

/// Something that turns a recorded [`CommandList`] into GPU work.
pub trait Executor {
    fn execute(&mut self, commands: &CommandList);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closed,
}

/// Values recomputed at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameState {
    pub viewport: UVec2,
    /// Seconds since startup.
    pub elapsed: f32,
    /// Cursor position in window pixels, origin at the top left.
    pub cursor: Vec2,
    /// Cursor position in normalized device coordinates.
    pub cursor_offset: Vec2,
    pub frame: u64,
}

impl FrameState {
    pub fn update(&mut self, viewport: (u32, u32), elapsed: f32, cursor: Vec2) {
        self.viewport = UVec2::new(viewport.0, viewport.1);
        self.elapsed = elapsed;
        self.cursor = cursor;
        self.cursor_offset = cursor_to_ndc(cursor, self.viewport);
    }

    /// Width over height, or 1 while the window is minimized.
    pub fn aspect_ratio(&self) -> f32 {
        if self.viewport.y == 0 {
            1.0
        } else {
            self.viewport.x as f32 / self.viewport.y as f32
        }
    }
}

/// Maps window pixels to `[-1, 1]` with y pointing up.
pub fn cursor_to_ndc(cursor: Vec2, viewport: UVec2) -> Vec2 {
    if viewport.x == 0 || viewport.y == 0 {
        return Vec2::ZERO;
    }
    let size = viewport.as_vec2();
    Vec2::new(
        cursor.x / size.x * 2.0 - 1.0,
        1.0 - cursor.y / size.y * 2.0,
    )
}

/// The signal that ends the loop: the close key going down, or the window asking to quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseCondition {
    key: Keycode,
}

impl CloseCondition {
    pub fn new(key: Keycode) -> Self {
        Self { key }
    }

    pub fn is_met(&self, input: &InputState) -> bool {
        input.quit_requested || input.was_pressed(self.key)
    }
}

impl Default for CloseCondition {
    fn default() -> Self {
        Self::new(Keycode::Return)
    }
}

/// Runs the clear, record, execute, poll, present cycle.
pub struct FrameLoop {
    state: LoopState,
    frame: FrameState,
    input: InputState,
    commands: CommandList,
    close: CloseCondition,
    clear_color: Option<Vec4>,
}

impl FrameLoop {
    pub fn new(close: CloseCondition) -> Self {
        Self {
            state: LoopState::Running,
            frame: FrameState::default(),
            input: InputState::default(),
            commands: CommandList::new(),
            close,
            clear_color: None,
        }
    }

    /// Uses `color` instead of the scene's clear color.
    pub fn with_clear_color(mut self, color: Option<Vec4>) -> Self {
        self.clear_color = color;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    /// Runs one iteration. Does nothing once the loop is closed.
    pub fn step<S, E>(&mut self, surface: &mut S, scene: &mut dyn Scene, executor: &mut E) -> LoopState
    where
        S: Surface + ?Sized,
        E: Executor + ?Sized,
    {
        if self.state == LoopState::Closed {
            return self.state;
        }

        self.frame.update(
            surface.framebuffer_size(),
            surface.elapsed(),
            self.input.mouse.position,
        );

        self.commands.reset();
        self.commands
            .viewport(self.frame.viewport.x, self.frame.viewport.y);
        let clear = scene.clear();
        self.commands
            .clear(self.clear_color.unwrap_or(clear.color), clear.depth);
        scene.record(&self.frame, &mut self.commands);
        executor.execute(&self.commands);

        self.input.begin_frame();
        surface.poll_events(&mut self.input);
        if self.close.is_met(&self.input) {
            log::info!("close requested after frame {}", self.frame.frame);
            self.state = LoopState::Closed;
        }

        surface.present();
        self.frame.frame += 1;
        self.state
    }

    /// Runs until closed and returns the number of frames drawn.
    pub fn run<S, E>(&mut self, surface: &mut S, scene: &mut dyn Scene, executor: &mut E) -> u64
    where
        S: Surface + ?Sized,
        E: Executor + ?Sized,
    {
        log::info!("entering frame loop for scene '{}'", scene.name());
        while self.step(surface, scene, executor) == LoopState::Running {}
        self.frame.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        render::{Command, MeshHandle, ProgramHandle},
        scenes::ClearState,
    };

    /// Replays scripted input, one closure per frame.
    struct ScriptedSurface {
        size: (u32, u32),
        time: f32,
        script: Vec<Box<dyn Fn(&mut InputState)>>,
        polled: usize,
        presented: usize,
    }

    impl ScriptedSurface {
        fn new(script: Vec<Box<dyn Fn(&mut InputState)>>) -> Self {
            Self {
                size: (800, 600),
                time: 0.0,
                script,
                polled: 0,
                presented: 0,
            }
        }
    }

    impl Surface for ScriptedSurface {
        fn framebuffer_size(&self) -> (u32, u32) {
            self.size
        }

        fn elapsed(&self) -> f32 {
            self.time
        }

        fn poll_events(&mut self, input: &mut InputState) {
            if let Some(event) = self.script.get(self.polled) {
                event(input);
            }
            self.polled += 1;
            self.time += 0.016;
        }

        fn present(&mut self) {
            self.presented += 1;
        }
    }

    #[derive(Default)]
    struct CountingExecutor {
        frames: Vec<Vec<Command>>,
    }

    impl CountingExecutor {
        fn draws(&self) -> usize {
            self.frames
                .iter()
                .flatten()
                .filter(|c| matches!(c, Command::Draw(_)))
                .count()
        }
    }

    impl Executor for CountingExecutor {
        fn execute(&mut self, commands: &CommandList) {
            self.frames.push(commands.commands().to_vec());
        }
    }

    struct OneDraw;

    impl Scene for OneDraw {
        fn name(&self) -> &'static str {
            "one-draw"
        }

        fn clear(&self) -> ClearState {
            ClearState {
                color: Vec4::new(0.2, 0.3, 0.3, 1.0),
                depth: false,
            }
        }

        fn record(&mut self, _frame: &FrameState, commands: &mut CommandList) {
            commands.use_program(ProgramHandle(0));
            commands.draw(MeshHandle(0));
        }
    }

    fn on(f: impl Fn(&mut InputState) + 'static) -> Box<dyn Fn(&mut InputState)> {
        Box::new(f)
    }

    fn idle() -> Box<dyn Fn(&mut InputState)> {
        on(|_| {})
    }

    #[test]
    fn test_close_key_stops_within_the_same_iteration() {
        let mut surface = ScriptedSurface::new(vec![
            idle(),
            idle(),
            on(|input| input.key_down(Keycode::Return)),
        ]);
        let mut executor = CountingExecutor::default();
        let mut frame_loop = FrameLoop::new(CloseCondition::default());

        let frames = frame_loop.run(&mut surface, &mut OneDraw, &mut executor);

        assert_eq!(frames, 3);
        assert_eq!(frame_loop.state(), LoopState::Closed);
        assert_eq!(executor.draws(), 3);
        assert_eq!(surface.presented, 3);

        // Stepping a closed loop records and draws nothing.
        assert_eq!(
            frame_loop.step(&mut surface, &mut OneDraw, &mut executor),
            LoopState::Closed
        );
        assert_eq!(executor.draws(), 3);
        assert_eq!(surface.polled, 3);
    }

    #[test]
    fn test_close_key_tapped_within_one_poll_stops_the_loop() {
        let mut surface = ScriptedSurface::new(vec![on(|input| {
            input.key_down(Keycode::Return);
            input.key_up(Keycode::Return);
        })]);
        let mut executor = CountingExecutor::default();
        let mut frame_loop = FrameLoop::new(CloseCondition::default());

        assert_eq!(
            frame_loop.step(&mut surface, &mut OneDraw, &mut executor),
            LoopState::Closed
        );
        assert_eq!(executor.draws(), 1);
    }

    #[test]
    fn test_other_keys_do_not_close() {
        let mut surface = ScriptedSurface::new(vec![
            on(|input| input.key_down(Keycode::Escape)),
            on(|input| input.request_quit()),
        ]);
        let mut executor = CountingExecutor::default();
        let mut frame_loop = FrameLoop::new(CloseCondition::default());

        assert_eq!(
            frame_loop.step(&mut surface, &mut OneDraw, &mut executor),
            LoopState::Running
        );
        assert_eq!(
            frame_loop.step(&mut surface, &mut OneDraw, &mut executor),
            LoopState::Closed
        );
    }

    #[test]
    fn test_frame_starts_with_viewport_and_clear() {
        let mut surface = ScriptedSurface::new(vec![on(|input| input.request_quit())]);
        let mut executor = CountingExecutor::default();
        let mut frame_loop =
            FrameLoop::new(CloseCondition::default()).with_clear_color(Some(Vec4::ONE));
        frame_loop.run(&mut surface, &mut OneDraw, &mut executor);

        let frame = &executor.frames[0];
        assert_eq!(frame[0], Command::Viewport { width: 800, height: 600 });
        assert_eq!(
            frame[1],
            Command::Clear {
                color: Vec4::ONE,
                depth: false
            }
        );
    }

    #[test]
    fn test_cursor_offset_is_used_on_the_next_frame() {
        let mut surface = ScriptedSurface::new(vec![on(|input| {
            input.cursor_moved(Vec2::new(600.0, 150.0))
        })]);
        let mut executor = CountingExecutor::default();
        let mut frame_loop = FrameLoop::new(CloseCondition::default());

        frame_loop.step(&mut surface, &mut OneDraw, &mut executor);
        assert_eq!(frame_loop.frame().cursor_offset, Vec2::new(-1.0, 1.0));
        frame_loop.step(&mut surface, &mut OneDraw, &mut executor);
        assert_eq!(frame_loop.frame().cursor_offset, Vec2::new(0.5, 0.5));
        assert!((frame_loop.frame().elapsed - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_cursor_to_ndc() {
        let viewport = UVec2::new(800, 600);
        assert_eq!(cursor_to_ndc(Vec2::new(400.0, 300.0), viewport), Vec2::ZERO);
        assert_eq!(cursor_to_ndc(Vec2::new(0.0, 600.0), viewport), Vec2::new(-1.0, -1.0));
        assert_eq!(cursor_to_ndc(Vec2::new(5.0, 5.0), UVec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_aspect_ratio_survives_minimized_window() {
        let mut frame = FrameState::default();
        frame.update((800, 0), 0.0, Vec2::ZERO);
        assert_eq!(frame.aspect_ratio(), 1.0);
        frame.update((800, 400), 1.0, Vec2::ZERO);
        assert_eq!(frame.aspect_ratio(), 2.0);
    }
}
