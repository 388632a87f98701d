// scene/graph.rs
//
// Ownership is strictly parent -> child: the graph owns the root scene, a
// scene owns its materiables and child scenes, a materiable owns its
// drawables, a drawable owns its model buffer.

use std::collections::BTreeMap;

use crate::asset::{Assets, Shape};
use crate::renderer::{
    BufferManager, BufferOptions, BufferResult, BufferUsage, DrawCall, GpuDevice, Material,
    ModelUniform, TextureInstance, TypedBuffer,
};
use crate::scene::Camera;

/// Locates a scene inside a [`SceneGraph`]: the child indices leading from
/// the root, stamped with the graph generation it was issued for. A
/// reference from before the root was replaced no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneRef {
    generation: u64,
    path: Vec<usize>,
}

impl SceneRef {
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    fn child(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self {
            generation: self.generation,
            path,
        }
    }
}

/// A shape plus one model matrix per instance of it. The model buffer is
/// bound as an instance-rate vertex buffer laid out by [`ModelUniform::layout`].
#[derive(Debug)]
pub struct DrawableInstance {
    shape: Shape,
    models: TypedBuffer<ModelUniform>,
}

impl DrawableInstance {
    pub fn new<D: GpuDevice>(
        manager: &mut BufferManager<D>,
        shape: Shape,
        name: &str,
        model: ModelUniform,
        reserve: usize,
    ) -> BufferResult<Self> {
        let models = TypedBuffer::with_value(
            manager,
            model,
            BufferOptions::new(format!("{name} ModelBuffer"))
                .with_binding(1)
                .with_usage(BufferUsage::Vertex)
                .with_reserve(reserve),
        )?;
        Ok(Self { shape, models })
    }

    /// Queue another instance; uploaded on the next read or finish.
    pub fn add_model(&mut self, model: ModelUniform) -> usize {
        self.models.append(model)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn models(&self) -> &TypedBuffer<ModelUniform> {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut TypedBuffer<ModelUniform> {
        &mut self.models
    }

    pub fn instance_count(&self) -> usize {
        self.models.len()
    }
}

/// A material placed in a scene, with the drawables and textures using it.
#[derive(Debug)]
pub struct Materiable {
    material: Material,
    drawables: BTreeMap<String, DrawableInstance>,
    textures: Vec<TextureInstance>,
}

impl Materiable {
    pub fn new(material: Material) -> Self {
        Self {
            material,
            drawables: BTreeMap::new(),
            textures: Vec::new(),
        }
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn drawable(&self, name: &str) -> Option<&DrawableInstance> {
        self.drawables.get(name)
    }

    pub fn drawable_mut(&mut self, name: &str) -> Option<&mut DrawableInstance> {
        self.drawables.get_mut(name)
    }

    /// Drawables in name order.
    pub fn drawables(&self) -> impl Iterator<Item = (&str, &DrawableInstance)> {
        self.drawables.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    pub fn textures(&self) -> &[TextureInstance] {
        &self.textures
    }

    pub(crate) fn insert_drawable(&mut self, name: &str, drawable: DrawableInstance) {
        self.drawables.insert(name.to_string(), drawable);
    }

    pub(crate) fn add_texture(&mut self, texture: TextureInstance) {
        self.textures.push(texture);
    }

    /// Flush every drawable's model buffer.
    pub fn finish<D: GpuDevice>(&mut self, manager: &mut BufferManager<D>) -> BufferResult<()> {
        for drawable in self.drawables.values_mut() {
            drawable.models.finish(manager)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Scene {
    materiables: BTreeMap<usize, Materiable>,
    children: Vec<Scene>,
    camera: Camera,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            materiables: BTreeMap::new(),
            children: Vec::new(),
            camera,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn materiable(&self, index: usize) -> Option<&Materiable> {
        self.materiables.get(&index)
    }

    pub fn materiable_mut(&mut self, index: usize) -> Option<&mut Materiable> {
        self.materiables.get_mut(&index)
    }

    /// Materiables in index order.
    pub fn materiables(&self) -> impl Iterator<Item = (usize, &Materiable)> {
        self.materiables.iter().map(|(&index, m)| (index, m))
    }

    pub fn material_count(&self) -> usize {
        self.materiables.len()
    }

    /// Smallest index above every materiable already in the scene.
    pub fn next_material_index(&self) -> usize {
        self.materiables
            .keys()
            .next_back()
            .map_or(0, |&last| last + 1)
    }

    pub fn children(&self) -> &[Scene] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&Scene> {
        self.children.get(index)
    }

    /// Quad instances in this scene and every descendant.
    pub fn quad_count(&self) -> usize {
        let own: usize = self
            .materiables
            .values()
            .flat_map(|m| m.drawables.values())
            .map(DrawableInstance::instance_count)
            .sum();
        own + self.children.iter().map(Scene::quad_count).sum::<usize>()
    }

    pub(crate) fn insert_materiable(&mut self, index: usize, materiable: Materiable) {
        debug_assert!(!self.materiables.contains_key(&index));
        self.materiables.insert(index, materiable);
    }

    /// Depth-first: this scene's materials in index order, their drawables in
    /// name order, then each child scene.
    pub(crate) fn collect_draws<D: GpuDevice>(
        &mut self,
        depth: usize,
        manager: &mut BufferManager<D>,
        assets: &Assets<D::Texture>,
        out: &mut Vec<DrawCall>,
    ) -> BufferResult<()> {
        let view_proj = self.camera.uniform();
        for (&material_index, materiable) in self.materiables.iter_mut() {
            for (name, drawable) in materiable.drawables.iter_mut() {
                let Some(mesh) = assets.mesh(drawable.shape) else {
                    log::warn!("No mesh uploaded for {:?}, skipping {:?}", drawable.shape, name);
                    continue;
                };

                let model_buffer = drawable.models.buffer(manager)?;
                out.push(DrawCall {
                    scene_depth: depth,
                    material_index,
                    shader: materiable.material.shader.clone(),
                    base_color: materiable.material.color_f32(),
                    blended: materiable.material.requires_separate_pass(),
                    view_proj,
                    drawable: name.clone(),
                    shape: drawable.shape,
                    vertex_buffer: mesh.vertex_buffer().handle(),
                    index_buffer: mesh.index_buffer().handle(),
                    index_count: mesh.index_count(),
                    model_buffer,
                    model_binding: drawable.models.binding(),
                    model_offset: drawable.models.offset(),
                    instance_count: drawable.models.len() as u32,
                    textures: materiable.textures.clone(),
                });
            }
        }

        for child in &mut self.children {
            child.collect_draws(depth + 1, manager, assets, out)?;
        }
        Ok(())
    }
}

/// The live scene tree of one engine.
#[derive(Debug, Default)]
pub struct SceneGraph {
    root: Option<Scene>,
    node_count: usize,
    generation: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<&Scene> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut Scene> {
        self.root.as_mut()
    }

    pub fn root_ref(&self) -> Option<SceneRef> {
        self.root.as_ref().map(|_| SceneRef {
            generation: self.generation,
            path: Vec::new(),
        })
    }

    /// Quad instances added since the root was last replaced.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn scene(&self, scene: &SceneRef) -> Option<&Scene> {
        if scene.generation != self.generation {
            return None;
        }
        let mut current = self.root.as_ref()?;
        for &index in &scene.path {
            current = current.children.get(index)?;
        }
        Some(current)
    }

    pub fn scene_mut(&mut self, scene: &SceneRef) -> Option<&mut Scene> {
        if scene.generation != self.generation {
            return None;
        }
        let mut current = self.root.as_mut()?;
        for &index in &scene.path {
            current = current.children.get_mut(index)?;
        }
        Some(current)
    }

    /// Swap in a new root. Everything about the old tree is dropped,
    /// including references to it.
    pub(crate) fn replace_root(&mut self, scene: Scene) -> SceneRef {
        self.root = Some(scene);
        self.node_count = 0;
        self.generation += 1;
        SceneRef {
            generation: self.generation,
            path: Vec::new(),
        }
    }

    pub(crate) fn add_child(&mut self, parent: &SceneRef, scene: Scene) -> Option<SceneRef> {
        let parent_scene = self.scene_mut(parent)?;
        parent_scene.children.push(scene);
        Some(parent.child(parent_scene.children.len() - 1))
    }

    pub(crate) fn record_node(&mut self) {
        self.node_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HeadlessDevice;

    fn scene() -> Scene {
        Scene::new(Camera::default())
    }

    #[test]
    fn child_refs_resolve_through_the_tree() {
        let mut graph = SceneGraph::new();
        let root = graph.replace_root(scene());
        let child = graph.add_child(&root, scene()).unwrap();
        let grandchild = graph.add_child(&child, scene()).unwrap();

        assert_eq!(grandchild.depth(), 2);
        assert!(graph.scene(&grandchild).is_some());
        assert_eq!(graph.root().unwrap().children().len(), 1);
        assert_eq!(graph.root().unwrap().child(0).unwrap().children().len(), 1);
    }

    #[test]
    fn replacing_the_root_invalidates_old_refs() {
        let mut graph = SceneGraph::new();
        let old = graph.replace_root(scene());
        graph.record_node();

        let new = graph.replace_root(scene());
        assert!(graph.scene(&old).is_none());
        assert!(graph.scene_mut(&new).is_some());
        assert!(graph.add_child(&old, scene()).is_none());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.root_ref(), Some(new));
    }

    #[test]
    fn next_material_index_follows_highest_key() {
        let mut s = scene();
        assert_eq!(s.next_material_index(), 0);
        s.insert_materiable(0, Materiable::new(Material::diffuse()));
        s.insert_materiable(3, Materiable::new(Material::diffuse()));
        assert_eq!(s.next_material_index(), 4);
        assert_eq!(s.materiables().map(|(i, _)| i).collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn drawable_appends_models() {
        let mut manager = BufferManager::new(HeadlessDevice::new());
        let mut drawable =
            DrawableInstance::new(&mut manager, Shape::Quad, "hero", ModelUniform::default(), 4)
                .unwrap();
        assert_eq!(drawable.add_model(ModelUniform::default()), 1);
        assert_eq!(drawable.instance_count(), 2);
        assert!(drawable.models().is_dirty());
        assert_eq!(drawable.models().usage(), BufferUsage::Vertex);
        assert!(BufferUsage::Vertex.to_wgpu().contains(wgpu::BufferUsages::VERTEX));

        let mut materiable = Materiable::new(Material::diffuse());
        materiable.insert_drawable("hero", drawable);
        materiable.finish(&mut manager).unwrap();
        assert!(!materiable.drawable("hero").unwrap().models().is_dirty());
    }
}
