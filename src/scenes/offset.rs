//! A colored triangle at half scale that follows the cursor.

use glam::Vec4;

use crate::{
    abs::{MeshData, VertexLayout},
    error::StartupError,
    frame::FrameState,
    render::{CommandList, MeshHandle, ProgramHandle},
    scenes::{ClearState, Scene, SetupContext},
};

pub const SCALE: f32 = 0.5;

/// Position followed by color.
#[rustfmt::skip]
pub const VERTICES: [f32; 18] = [
    -1.0, -1.0, 0.0,   1.0, 0.0, 0.0,
     1.0, -1.0, 0.0,   0.0, 1.0, 0.0,
     0.0,  1.0, 0.0,   0.0, 0.0, 1.0,
];

pub fn mesh_data() -> Result<MeshData, StartupError> {
    Ok(MeshData::new(
        VERTICES.to_vec(),
        VertexLayout::new().with_attribute(3).with_attribute(3),
        None,
    )?)
}

pub struct OffsetScene {
    program: ProgramHandle,
    mesh: MeshHandle,
}

impl OffsetScene {
    pub fn new(program: ProgramHandle, mesh: MeshHandle) -> Self {
        Self { program, mesh }
    }

    pub fn setup(ctx: &mut SetupContext) -> Result<Self, StartupError> {
        let program = ctx.program("offset", crate::builtin_shaders!(offset))?;
        let mesh = ctx.mesh(&mesh_data()?)?;
        Ok(Self::new(program, mesh))
    }
}

impl Scene for OffsetScene {
    fn name(&self) -> &'static str {
        "offset"
    }

    fn clear(&self) -> ClearState {
        ClearState {
            color: Vec4::new(0.2, 0.3, 0.3, 1.0),
            depth: false,
        }
    }

    fn record(&mut self, frame: &FrameState, commands: &mut CommandList) {
        commands.use_program(self.program);
        commands.set_uniform("u_offset", frame.cursor_offset);
        commands.set_uniform("u_scale", SCALE);
        commands.draw(self.mesh);
    }
}

#[cfg(test)]
mod tests {
    use glam::{UVec2, Vec2, Vec3};

    use super::*;
    use crate::abs::UniformValue;

    /// What `offset/vert.glsl` does to a position.
    fn vertex_stage(position: Vec3, scale: f32, offset: Vec2) -> Vec3 {
        position * scale + offset.extend(0.0)
    }

    fn frame_with_cursor(cursor: Vec2) -> FrameState {
        let mut frame = FrameState {
            viewport: UVec2::new(800, 600),
            ..Default::default()
        };
        frame.update((800, 600), 0.0, cursor);
        frame
    }

    #[test]
    fn test_scale_halves_vertex_positions() {
        let mut scene = OffsetScene::new(ProgramHandle(0), MeshHandle(0));
        let mut commands = CommandList::new();
        // cursor in the middle of the window means no offset
        scene.record(&frame_with_cursor(Vec2::new(400.0, 300.0)), &mut commands);

        let draw = &commands.resolve()[0];
        let UniformValue::F32(scale) = draw.uniform("u_scale").unwrap() else {
            panic!("u_scale is not a float");
        };
        let UniformValue::Vec2(offset) = draw.uniform("u_offset").unwrap() else {
            panic!("u_offset is not a vec2");
        };

        let data = mesh_data().unwrap();
        for vertex in 0..data.vertex_count() {
            let position = Vec3::from_slice(data.attribute(vertex, 0).unwrap());
            assert_eq!(vertex_stage(position, scale, offset), position * 0.5);
        }
    }

    #[test]
    fn test_offset_follows_cursor() {
        let mut scene = OffsetScene::new(ProgramHandle(0), MeshHandle(0));
        let mut commands = CommandList::new();
        scene.record(&frame_with_cursor(Vec2::new(800.0, 0.0)), &mut commands);
        assert_eq!(
            commands.resolve()[0].uniform("u_offset"),
            Some(UniformValue::Vec2(Vec2::new(1.0, 1.0)))
        );
    }
}
