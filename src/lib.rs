pub mod asset;
pub mod engine;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use engine::Engine;
pub use renderer::{BufferError, BufferHandle, BufferManager, GpuDevice, HeadlessDevice, Material, TypedBuffer, WgpuDevice};
pub use scene::{BuilderState, SceneBuilder, SceneGraph, SceneRef, Transform};
pub use settings::EngineSettings;

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    // Set panic hook to get better error messages
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
