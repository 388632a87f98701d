// scene/mod.rs

pub mod builder;
pub mod camera;
pub mod graph;
pub mod transform;

pub use builder::{BuilderState, SceneBuilder};
pub use camera::Camera;
pub use graph::{DrawableInstance, Materiable, Scene, SceneGraph, SceneRef};
pub use transform::Transform;
