// engine.rs
//
// The context every construction call runs against: buffer manager, assets
// and scene graph of one rendering session. Nothing here is global; create
// one `Engine` per device.

use std::path::Path;

use crate::asset::{Assets, Handle, Shape};
use crate::renderer::{
    BufferManager, BufferResult, DrawCall, GpuDevice, ModelUniform, Texture, TextureError,
    TextureImage, TextureInstance,
};
use crate::scene::{DrawableInstance, SceneBuilder, SceneGraph, SceneRef, Transform};
use crate::settings::EngineSettings;

pub type TextureHandle<D> = Handle<Texture<<D as GpuDevice>::Texture>>;

pub struct Engine<D: GpuDevice> {
    buffers: BufferManager<D>,
    assets: Assets<D::Texture>,
    scene_graph: SceneGraph,
    settings: EngineSettings,
}

impl<D: GpuDevice> Engine<D> {
    pub fn new(device: D) -> Self {
        Self::with_settings(device, EngineSettings::default())
    }

    pub fn with_settings(device: D, settings: EngineSettings) -> Self {
        Self {
            buffers: BufferManager::new(device),
            assets: Assets::new(),
            scene_graph: SceneGraph::new(),
            settings,
        }
    }

    /// Root builder, named after the configured scene.
    pub fn new_scene_builder(&self) -> SceneBuilder {
        SceneBuilder::new(self.settings.scene_name.clone())
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn buffers(&self) -> &BufferManager<D> {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut BufferManager<D> {
        &mut self.buffers
    }

    pub fn assets(&self) -> &Assets<D::Texture> {
        &self.assets
    }

    pub fn scene_graph(&self) -> &SceneGraph {
        &self.scene_graph
    }

    pub(crate) fn scene_graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene_graph
    }

    /// Decode the image at `path` and register it as `name`. A name that is
    /// already registered is replaced.
    pub fn load_texture(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<TextureHandle<D>, TextureError> {
        let image = TextureImage::from_path(path)?;
        self.register_texture_image(name, &image)
    }

    pub fn register_texture_bytes(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<TextureHandle<D>, TextureError> {
        let image = TextureImage::from_bytes(name, bytes)?;
        self.register_texture_image(name, &image)
    }

    pub fn register_texture_image(
        &mut self,
        name: &str,
        image: &TextureImage,
    ) -> Result<TextureHandle<D>, TextureError> {
        let gpu = self.buffers.device_mut().create_texture(name, image)?;
        if self.assets.texture(name).is_some() {
            log::debug!("Replacing texture {:?}", name);
        }
        Ok(self
            .assets
            .textures
            .insert_named(name, Texture::new(name, image, gpu)))
    }

    /// Add one quad instance named `name` to a materiable. Returns `false`
    /// when the scene or material does not exist.
    pub(crate) fn add_quad(
        &mut self,
        scene: &SceneRef,
        material: usize,
        name: &str,
        transform: &Transform,
    ) -> BufferResult<bool> {
        if self
            .scene_graph
            .scene(scene)
            .and_then(|s| s.materiable(material))
            .is_none()
        {
            return Ok(false);
        }

        // Allocate everything that can fail before the graph is touched.
        self.assets.mesh_or_insert(&mut self.buffers, Shape::Quad)?;

        let model = ModelUniform::new(transform.matrix());
        let Some(materiable) = self
            .scene_graph
            .scene_mut(scene)
            .and_then(|s| s.materiable_mut(material))
        else {
            return Ok(false);
        };

        match materiable.drawable_mut(name) {
            Some(drawable) => {
                drawable.add_model(model);
            }
            None => {
                let drawable = DrawableInstance::new(
                    &mut self.buffers,
                    Shape::Quad,
                    name,
                    model,
                    self.settings.model_buffer_reserve,
                )?;
                materiable.insert_drawable(name, drawable);
            }
        }

        self.scene_graph.record_node();
        Ok(true)
    }

    pub(crate) fn bind_texture(&mut self, scene: &SceneRef, material: usize, texture: TextureInstance) {
        if self.assets.texture(&texture.texture).is_none() {
            log::warn!("Texture {:?} is not loaded yet", texture.texture);
        }
        if let Some(materiable) = self
            .scene_graph
            .scene_mut(scene)
            .and_then(|s| s.materiable_mut(material))
        {
            materiable.add_texture(texture);
        }
    }

    pub(crate) fn finish_material(&mut self, scene: &SceneRef, material: usize) -> BufferResult<()> {
        match self
            .scene_graph
            .scene_mut(scene)
            .and_then(|s| s.materiable_mut(material))
        {
            Some(materiable) => materiable.finish(&mut self.buffers),
            None => Ok(()),
        }
    }

    /// Traverse the graph and describe every instanced draw, flushing each
    /// model buffer on the way.
    pub fn draw_list(&mut self) -> BufferResult<Vec<DrawCall>> {
        let mut draws = Vec::new();
        if let Some(root) = self.scene_graph.root_mut() {
            root.collect_draws(0, &mut self.buffers, &self.assets, &mut draws)?;
        }
        Ok(draws)
    }

    /// Overwrite instance `index` of a drawable with a new transform, writing
    /// just that matrix to the GPU. Returns `false` when the drawable does not
    /// exist.
    ///
    /// # Panics
    /// Panics if `index` is not an existing instance of the drawable.
    pub fn update_instance(
        &mut self,
        scene: &SceneRef,
        material: usize,
        drawable: &str,
        index: usize,
        transform: &Transform,
    ) -> BufferResult<bool> {
        let Some(drawable) = self
            .scene_graph
            .scene_mut(scene)
            .and_then(|s| s.materiable_mut(material))
            .and_then(|m| m.drawable_mut(drawable))
        else {
            return Ok(false);
        };

        drawable.models_mut().replace_at(
            &mut self.buffers,
            index,
            ModelUniform::new(transform.matrix()),
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{HeadlessDevice, Material};

    #[test]
    fn registering_a_texture_twice_replaces_it() {
        let mut engine = Engine::new(HeadlessDevice::new());
        let first = engine
            .register_texture_image("tile", &TextureImage::solid(2, 2, [0; 4]))
            .unwrap();
        let second = engine
            .register_texture_image("tile", &TextureImage::solid(4, 4, [0; 4]))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.assets().textures.len(), 1);
        assert_eq!(engine.assets().texture("tile").unwrap().size(), (4, 4));
        assert_eq!(engine.buffers().device().stats().textures, 2);
    }

    #[test]
    fn texture_bytes_are_decoded_and_resolved_by_name() {
        let img = image::RgbaImage::from_pixel(5, 4, image::Rgba([0, 128, 255, 255]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let mut engine = Engine::new(HeadlessDevice::new());
        let handle = engine.register_texture_bytes("sky", &png).unwrap();

        let texture = engine.assets().texture("sky").unwrap();
        assert_eq!(texture.name(), "sky");
        assert_eq!(texture.size(), (5, 4));
        assert_eq!(texture.gpu().width, 5);
        assert_eq!(engine.assets().textures.handle_of("sky"), Some(handle));

        let err = engine.register_texture_bytes("broken", b"not a png").unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
        assert!(engine.assets().texture("broken").is_none());
    }

    #[test]
    fn missing_texture_file_is_a_hard_failure() {
        let mut engine = Engine::new(HeadlessDevice::new());
        let err = engine.load_texture("ghost", "no/such/ghost.png").unwrap_err();
        assert!(matches!(err, TextureError::Io { .. }));
        assert!(engine.assets().texture("ghost").is_none());
    }

    #[test]
    fn add_quad_on_unknown_material_does_nothing() {
        let mut engine = Engine::new(HeadlessDevice::new());
        let mut scene = engine
            .new_scene_builder()
            .create_scene(&mut engine, &Transform::viewport(800.0, 600.0));
        let _ = scene.add_material(&mut engine, Material::diffuse());
        let root = engine.scene_graph().root_ref().unwrap();

        assert!(!engine.add_quad(&root, 5, "ghost", &Transform::IDENTITY).unwrap());
        assert_eq!(engine.scene_graph().node_count(), 0);
    }

    #[test]
    fn empty_graph_has_no_draws() {
        let mut engine = Engine::new(HeadlessDevice::new());
        assert!(engine.draw_list().unwrap().is_empty());
    }
}
