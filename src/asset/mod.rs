pub mod cache;
pub mod handle;
pub mod mesh;

pub use cache::AssetCache;
pub use handle::Handle;
pub use mesh::{Mesh, Shape};

use std::collections::HashMap;

use crate::renderer::{BufferManager, BufferResult, GpuDevice, Texture};

/// Meshes and textures owned by one engine. Textures are keyed by name.
pub struct Assets<T> {
    meshes: HashMap<Shape, Mesh>,
    pub textures: AssetCache<Texture<T>>,
}

impl<T> Assets<T> {
    pub fn new() -> Self {
        Self {
            meshes: HashMap::new(),
            textures: AssetCache::new(),
        }
    }

    /// Mesh for `shape`, uploading it on first use.
    pub fn mesh_or_insert<D: GpuDevice>(
        &mut self,
        manager: &mut BufferManager<D>,
        shape: Shape,
    ) -> BufferResult<&Mesh> {
        if !self.meshes.contains_key(&shape) {
            let mesh = Mesh::from_shape(manager, shape)?;
            self.meshes.insert(shape, mesh);
        }
        Ok(&self.meshes[&shape])
    }

    pub fn mesh(&self, shape: Shape) -> Option<&Mesh> {
        self.meshes.get(&shape)
    }

    pub fn texture(&self, name: &str) -> Option<&Texture<T>> {
        self.textures.get_by_name(name)
    }
}

impl<T> Default for Assets<T> {
    fn default() -> Self {
        Self::new()
    }
}
