//! Owned GPU resources and the handles scenes use to refer to them.

use crate::abs::{Mesh, ShaderProgram, Texture};

/// Handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub(crate) usize);

/// Handle to an uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub(crate) usize);

/// Handle to an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) usize);

/// Every GPU resource created during setup. Nothing is created or destroyed while the frame loop
/// runs.
///
/// Dropping it releases meshes first, then textures, then programs.
#[derive(Default)]
pub struct Resources {
    meshes: Vec<Mesh>,
    textures: Vec<Texture>,
    programs: Vec<ShaderProgram>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_program(&mut self, program: ShaderProgram) -> ProgramHandle {
        self.programs.push(program);
        ProgramHandle(self.programs.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() - 1)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureHandle {
        self.textures.push(texture);
        TextureHandle(self.textures.len() - 1)
    }

    pub fn program(&self, handle: ProgramHandle) -> Option<&ShaderProgram> {
        self.programs.get(handle.0)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.0)
    }
}

impl Drop for Resources {
    fn drop(&mut self) {
        log::debug!(
            "releasing {} meshes, {} textures, {} programs",
            self.meshes.len(),
            self.textures.len(),
            self.programs.len()
        );
        self.meshes.clear();
        self.textures.clear();
        self.programs.clear();
    }
}
