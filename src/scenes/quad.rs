//! A textured quad drawn from four vertices and six indices.

use glam::{Mat4, Vec3, Vec4};

use crate::{
    abs::{MeshData, VertexLayout},
    error::StartupError,
    frame::FrameState,
    render::{CommandList, MeshHandle, ProgramHandle, TextureHandle},
    scenes::{ClearState, Scene, SetupContext},
};

/// Position followed by texture coordinates.
#[rustfmt::skip]
pub const VERTICES: [f32; 20] = [
    -0.5, -0.5, 0.0,   0.0, 0.0,
     0.5, -0.5, 0.0,   1.0, 0.0,
    -0.5,  0.5, 0.0,   0.0, 1.0,
     0.5,  0.5, 0.0,   1.0, 1.0,
];

pub const INDICES: [u32; 6] = [0, 1, 2, 1, 2, 3];

pub fn mesh_data() -> Result<MeshData, StartupError> {
    Ok(MeshData::new(
        VERTICES.to_vec(),
        VertexLayout::from_attributes(&[(3, 0), (2, 12)])?,
        Some(INDICES.to_vec()),
    )?)
}

pub fn transform() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.3, 0.0, 0.0))
}

pub struct QuadScene {
    program: ProgramHandle,
    mesh: MeshHandle,
    texture: TextureHandle,
}

impl QuadScene {
    pub fn new(program: ProgramHandle, mesh: MeshHandle, texture: TextureHandle) -> Self {
        Self {
            program,
            mesh,
            texture,
        }
    }

    pub fn setup(ctx: &mut SetupContext) -> Result<Self, StartupError> {
        let program = ctx.program("quad", crate::builtin_shaders!(quad))?;
        let mesh = ctx.mesh(&mesh_data()?)?;
        let texture = ctx.texture()?;
        Ok(Self::new(program, mesh, texture))
    }
}

impl Scene for QuadScene {
    fn name(&self) -> &'static str {
        "quad"
    }

    fn clear(&self) -> ClearState {
        ClearState {
            color: Vec4::new(0.3, 0.4, 0.6, 1.0),
            depth: false,
        }
    }

    fn record(&mut self, _frame: &FrameState, commands: &mut CommandList) {
        commands.use_program(self.program);
        commands.set_uniform("u_texture", 0i32);
        commands.set_uniform("transform", transform());
        commands.bind_texture(0, self.texture);
        commands.draw(self.mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abs::UniformValue;

    #[test]
    fn test_two_triangles_share_an_edge() {
        let data = mesh_data().unwrap();
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.element_count(), 6);

        let triangles = data.triangles();
        assert_eq!(triangles, vec![[0, 1, 2], [1, 2, 3]]);

        let shared: Vec<u32> = triangles[0]
            .iter()
            .copied()
            .filter(|i| triangles[1].contains(i))
            .collect();
        assert_eq!(shared, vec![1, 2]);

        // the shared edge is the diagonal from bottom right to top left
        assert_eq!(data.attribute(1, 0), Some(&[0.5, -0.5, 0.0][..]));
        assert_eq!(data.attribute(2, 0), Some(&[-0.5, 0.5, 0.0][..]));
    }

    #[test]
    fn test_records_textured_draw() {
        let mut scene = QuadScene::new(ProgramHandle(0), MeshHandle(1), TextureHandle(2));
        let mut commands = CommandList::new();
        scene.record(&FrameState::default(), &mut commands);

        let draws = commands.resolve();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].mesh, MeshHandle(1));
        assert_eq!(draws[0].textures.get(&0), Some(&TextureHandle(2)));
        assert_eq!(draws[0].uniform("transform"), Some(UniformValue::Mat4(transform())));
    }
}
