//! Ten textured cubes seen through a perspective camera.
//!
//! One cube mesh is drawn ten times per frame, each time with its own model matrix. The first
//! cube spins with time, the others are tilted by a fixed angle that grows with their index.

use glam::{Mat4, Vec3, Vec4};

use crate::{
    abs::{MeshData, VertexLayout},
    error::StartupError,
    frame::FrameState,
    render::{CommandList, MeshHandle, ProgramHandle, TextureHandle},
    scenes::{ClearState, Scene, SetupContext},
};

pub const CUBE_POSITIONS: [Vec3; 10] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(2.0, 5.0, -15.0),
    Vec3::new(-1.5, -2.2, -2.5),
    Vec3::new(-3.8, -2.0, -12.3),
    Vec3::new(2.4, -0.4, -3.5),
    Vec3::new(-1.7, 3.0, -7.5),
    Vec3::new(1.3, -2.0, -2.5),
    Vec3::new(1.5, 2.0, -2.5),
    Vec3::new(1.5, 0.2, -1.5),
    Vec3::new(-1.3, 1.0, -1.5),
];

const FOV_Y_DEGREES: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// Six faces of two triangles each, position followed by texture coordinates.
#[rustfmt::skip]
pub const VERTICES: [f32; 180] = [
    -0.5, -0.5, -0.5,  0.0, 0.0,
     0.5, -0.5, -0.5,  1.0, 0.0,
     0.5,  0.5, -0.5,  1.0, 1.0,
     0.5,  0.5, -0.5,  1.0, 1.0,
    -0.5,  0.5, -0.5,  0.0, 1.0,
    -0.5, -0.5, -0.5,  0.0, 0.0,

    -0.5, -0.5,  0.5,  0.0, 0.0,
     0.5, -0.5,  0.5,  1.0, 0.0,
     0.5,  0.5,  0.5,  1.0, 1.0,
     0.5,  0.5,  0.5,  1.0, 1.0,
    -0.5,  0.5,  0.5,  0.0, 1.0,
    -0.5, -0.5,  0.5,  0.0, 0.0,

    -0.5,  0.5,  0.5,  1.0, 0.0,
    -0.5,  0.5, -0.5,  1.0, 1.0,
    -0.5, -0.5, -0.5,  0.0, 1.0,
    -0.5, -0.5, -0.5,  0.0, 1.0,
    -0.5, -0.5,  0.5,  0.0, 0.0,
    -0.5,  0.5,  0.5,  1.0, 0.0,

     0.5,  0.5,  0.5,  1.0, 0.0,
     0.5,  0.5, -0.5,  1.0, 1.0,
     0.5, -0.5, -0.5,  0.0, 1.0,
     0.5, -0.5, -0.5,  0.0, 1.0,
     0.5, -0.5,  0.5,  0.0, 0.0,
     0.5,  0.5,  0.5,  1.0, 0.0,

    -0.5, -0.5, -0.5,  0.0, 1.0,
     0.5, -0.5, -0.5,  1.0, 1.0,
     0.5, -0.5,  0.5,  1.0, 0.0,
     0.5, -0.5,  0.5,  1.0, 0.0,
    -0.5, -0.5,  0.5,  0.0, 0.0,
    -0.5, -0.5, -0.5,  0.0, 1.0,

    -0.5,  0.5, -0.5,  0.0, 1.0,
     0.5,  0.5, -0.5,  1.0, 1.0,
     0.5,  0.5,  0.5,  1.0, 0.0,
     0.5,  0.5,  0.5,  1.0, 0.0,
    -0.5,  0.5,  0.5,  0.0, 0.0,
    -0.5,  0.5, -0.5,  0.0, 1.0,
];

pub fn mesh_data() -> Result<MeshData, StartupError> {
    Ok(MeshData::new(
        VERTICES.to_vec(),
        VertexLayout::new().with_attribute(3).with_attribute(2),
        None,
    )?)
}

/// Model matrix of cube `index` at `elapsed` seconds.
pub fn model_matrix(index: usize, elapsed: f32) -> Mat4 {
    let translation = Mat4::from_translation(CUBE_POSITIONS[index]);
    let rotation = if index == 0 {
        Mat4::from_axis_angle(Vec3::ONE.normalize(), -elapsed)
    } else {
        let angle = (20.0 * index as f32).to_radians();
        Mat4::from_axis_angle(Vec3::new(1.0, 0.3, 0.5).normalize(), angle)
    };
    translation * rotation
}

pub fn view_matrix() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, -7.0))
}

pub fn projection_matrix(aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), aspect_ratio, Z_NEAR, Z_FAR)
}

pub struct CubesScene {
    program: ProgramHandle,
    mesh: MeshHandle,
    texture: TextureHandle,
}

impl CubesScene {
    pub fn new(program: ProgramHandle, mesh: MeshHandle, texture: TextureHandle) -> Self {
        Self {
            program,
            mesh,
            texture,
        }
    }

    pub fn setup(ctx: &mut SetupContext) -> Result<Self, StartupError> {
        let program = ctx.program("cubes", crate::builtin_shaders!(cubes))?;
        let mesh = ctx.mesh(&mesh_data()?)?;
        let texture = ctx.texture()?;
        Ok(Self::new(program, mesh, texture))
    }
}

impl Scene for CubesScene {
    fn name(&self) -> &'static str {
        "cubes"
    }

    fn clear(&self) -> ClearState {
        ClearState {
            color: Vec4::new(0.3, 0.4, 0.6, 1.0),
            depth: true,
        }
    }

    fn record(&mut self, frame: &FrameState, commands: &mut CommandList) {
        commands.use_program(self.program);
        commands.set_uniform("u_texture", 0i32);
        commands.set_uniform("view", view_matrix());
        commands.set_uniform("projection", projection_matrix(frame.aspect_ratio()));
        commands.bind_texture(0, self.texture);

        for index in 0..CUBE_POSITIONS.len() {
            commands.set_uniform("model", model_matrix(index, frame.elapsed));
            commands.draw(self.mesh);
        }
    }
}
