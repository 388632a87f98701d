// scene/builder.rs
//
// Chained construction over an `Engine`. A builder value only remembers which
// node it is scoped to; all state lives in the engine passed to each call.

use crate::engine::Engine;
use crate::renderer::{BufferResult, GpuDevice, Material, TextureError, TextureInstance};
use crate::scene::{Camera, Materiable, Scene, SceneRef, Transform};

/// What a [`SceneBuilder`] is currently scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing yet; `create_scene` replaces the root.
    Root,
    SceneBound(SceneRef),
    /// A scene and the index of one of its materiables.
    MaterialBound(SceneRef, usize),
    /// The node this builder was created for no longer exists.
    Detached,
}

#[derive(Debug, Clone)]
pub struct SceneBuilder {
    name: String,
    state: BuilderState,
    next_material: usize,
}

impl SceneBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_state(name.into(), BuilderState::Root)
    }

    fn with_state(name: String, state: BuilderState) -> Self {
        Self {
            name,
            state,
            next_material: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    pub fn scene_ref(&self) -> Option<&SceneRef> {
        match &self.state {
            BuilderState::SceneBound(scene) | BuilderState::MaterialBound(scene, _) => Some(scene),
            BuilderState::Root | BuilderState::Detached => None,
        }
    }

    /// From the root state this replaces the whole graph; otherwise the new
    /// scene becomes a child of the bound one. The camera is sized from the
    /// transform's x/y scale.
    pub fn create_scene<D: GpuDevice>(
        &self,
        engine: &mut Engine<D>,
        transform: &Transform,
    ) -> SceneBuilder {
        let (width, height) = engine.settings().viewport_for(transform);
        let scene = Scene::new(Camera::with_viewport(width, height));

        let state = match &self.state {
            BuilderState::Root => {
                BuilderState::SceneBound(engine.scene_graph_mut().replace_root(scene))
            }
            BuilderState::SceneBound(parent) | BuilderState::MaterialBound(parent, _) => {
                match engine.scene_graph_mut().add_child(parent, scene) {
                    Some(child) => BuilderState::SceneBound(child),
                    None => BuilderState::Detached,
                }
            }
            BuilderState::Detached => BuilderState::Detached,
        };

        Self::with_state(self.name.clone(), state)
    }

    /// Register `<assets root>/<images>/<file_name>.<extension>` as `name`.
    pub fn new_texture<D: GpuDevice>(
        &self,
        engine: &mut Engine<D>,
        name: &str,
        file_name: &str,
        extension: &str,
    ) -> Result<(), TextureError> {
        let path = engine.settings().assets.image_path(file_name, extension);
        engine.load_texture(name, path)?;
        Ok(())
    }

    /// Place `material` in the bound scene under the next free index.
    pub fn add_material<D: GpuDevice>(
        &mut self,
        engine: &mut Engine<D>,
        material: Material,
    ) -> SceneBuilder {
        let Some(scene_ref) = self.scene_ref().cloned() else {
            return Self::with_state(self.name.clone(), BuilderState::Detached);
        };
        let Some(scene) = engine.scene_graph_mut().scene_mut(&scene_ref) else {
            return Self::with_state(self.name.clone(), BuilderState::Detached);
        };

        let index = self.next_material.max(scene.next_material_index());
        scene.insert_materiable(index, Materiable::new(material));
        self.next_material = index + 1;

        Self {
            name: self.name.clone(),
            state: BuilderState::MaterialBound(scene_ref, index),
            next_material: self.next_material,
        }
    }

    /// Add an instance of the quad drawable `name` to the bound material.
    pub fn add_quad<D: GpuDevice>(
        self,
        engine: &mut Engine<D>,
        name: &str,
        transform: &Transform,
    ) -> BufferResult<Self> {
        if let BuilderState::MaterialBound(scene, material) = &self.state {
            engine.add_quad(scene, *material, name, transform)?;
        }
        Ok(self)
    }

    /// Bind texture `name` to slot 0 of the bound material.
    pub fn set_texture<D: GpuDevice>(self, engine: &mut Engine<D>, name: &str) -> Self {
        if let BuilderState::MaterialBound(scene, material) = &self.state {
            engine.bind_texture(scene, *material, TextureInstance::new(0, name));
        }
        self
    }

    pub fn finish<D: GpuDevice>(self, engine: &mut Engine<D>) -> BufferResult<()> {
        if let BuilderState::MaterialBound(scene, material) = &self.state {
            engine.finish_material(scene, *material)?;
        }
        log::info!(
            "Scene: {} - nodes: {}",
            self.name,
            engine.scene_graph().node_count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HeadlessDevice;

    fn engine() -> Engine<HeadlessDevice> {
        Engine::new(HeadlessDevice::new())
    }

    #[test]
    fn root_builder_has_no_scene() {
        let builder = SceneBuilder::new("main");
        assert_eq!(builder.state(), &BuilderState::Root);
        assert!(builder.scene_ref().is_none());
    }

    #[test]
    fn camera_takes_size_from_transform_scale() {
        let mut engine = engine();
        let scene = SceneBuilder::new("main").create_scene(&mut engine, &Transform::viewport(800.0, 600.0));
        let camera = engine.scene_graph().scene(scene.scene_ref().unwrap()).unwrap().camera();
        assert_eq!((camera.size.x, camera.size.y), (800.0, 600.0));
    }

    #[test]
    fn add_material_on_root_is_detached() {
        let mut engine = engine();
        let mut root = SceneBuilder::new("main");
        let material = root.add_material(&mut engine, Material::diffuse());
        assert_eq!(material.state(), &BuilderState::Detached);
        assert!(engine.scene_graph().root().is_none());
    }

    #[test]
    fn stale_builder_becomes_detached() {
        let mut engine = engine();
        let old = SceneBuilder::new("main").create_scene(&mut engine, &Transform::IDENTITY);
        let _new = SceneBuilder::new("main").create_scene(&mut engine, &Transform::IDENTITY);

        let child = old.create_scene(&mut engine, &Transform::IDENTITY);
        assert_eq!(child.state(), &BuilderState::Detached);
        assert!(engine.scene_graph().root().unwrap().children().is_empty());
    }

    #[test]
    fn material_bound_builder_continues_numbering() {
        let mut engine = engine();
        let mut scene = SceneBuilder::new("main").create_scene(&mut engine, &Transform::IDENTITY);
        let mut first = scene.add_material(&mut engine, Material::diffuse());
        let second = first.add_material(&mut engine, Material::diffuse());
        let third = scene.add_material(&mut engine, Material::diffuse());

        let root = engine.scene_graph().root_ref().unwrap();
        assert_eq!(first.state(), &BuilderState::MaterialBound(root.clone(), 0));
        assert_eq!(second.state(), &BuilderState::MaterialBound(root.clone(), 1));
        assert_eq!(third.state(), &BuilderState::MaterialBound(root, 2));
    }
}
