//! A single orange triangle. The shaders are inline strings instead of files.

use glam::Vec4;

use crate::{
    abs::{MeshData, VertexLayout},
    error::StartupError,
    frame::FrameState,
    render::{CommandList, MeshHandle, ProgramHandle},
    scenes::{ClearState, Scene, SetupContext},
};

const VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;

void main()
{
    gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

const FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;

void main()
{
    FragColor = vec4(1.0, 0.5, 0.2, 1.0);
}
";

#[rustfmt::skip]
pub const VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0,
     0.5, -0.5, 0.0,
     0.0,  0.5, 0.0,
];

pub fn mesh_data() -> Result<MeshData, StartupError> {
    Ok(MeshData::new(
        VERTICES.to_vec(),
        VertexLayout::new().with_attribute(3),
        None,
    )?)
}

pub struct TriangleScene {
    program: ProgramHandle,
    mesh: MeshHandle,
}

impl TriangleScene {
    pub fn new(program: ProgramHandle, mesh: MeshHandle) -> Self {
        Self { program, mesh }
    }

    pub fn setup(ctx: &mut SetupContext) -> Result<Self, StartupError> {
        let program = ctx.program("triangle", (VERTEX_SHADER, FRAGMENT_SHADER))?;
        let mesh = ctx.mesh(&mesh_data()?)?;
        Ok(Self::new(program, mesh))
    }
}

impl Scene for TriangleScene {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn clear(&self) -> ClearState {
        ClearState {
            color: Vec4::new(0.2, 0.3, 0.3, 1.0),
            depth: false,
        }
    }

    fn record(&mut self, _frame: &FrameState, commands: &mut CommandList) {
        commands.use_program(self.program);
        commands.draw(self.mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Command;

    #[test]
    fn test_triangle_is_three_vertices_non_indexed() {
        let data = mesh_data().unwrap();
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.indices(), None);
        assert_eq!(data.element_count(), 3);
    }

    #[test]
    fn test_records_one_draw() {
        let mut scene = TriangleScene::new(ProgramHandle(0), MeshHandle(0));
        let mut commands = CommandList::new();
        scene.record(&FrameState::default(), &mut commands);
        assert_eq!(
            commands.commands(),
            &[Command::UseProgram(ProgramHandle(0)), Command::Draw(MeshHandle(0))]
        );
    }
}
