use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::scene::Transform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "EngineSettings::default_scene_name")]
    pub scene_name: String,
    #[serde(default)]
    pub viewport: Viewport,
    /// Model matrices preallocated for every new drawable.
    #[serde(default = "EngineSettings::default_model_buffer_reserve")]
    pub model_buffer_reserve: usize,
    #[serde(default)]
    pub assets: AssetPaths,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            scene_name: Self::default_scene_name(),
            viewport: Viewport::default(),
            model_buffer_reserve: Self::default_model_buffer_reserve(),
            assets: AssetPaths::default(),
        }
    }
}

impl EngineSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default engine settings.",
                    path, err
                );
                EngineSettings::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Engine settings file {:?} not found. Using default settings.",
                    path
                );
                EngineSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default engine settings.",
                    path, err
                );
                EngineSettings::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<EngineSettings>(contents).map(Self::validate)
    }

    fn validate(mut self) -> Self {
        if self.scene_name.trim().is_empty() {
            warn!("Scene name must not be empty. Using default name.");
            self.scene_name = Self::default_scene_name();
        }

        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            warn!("Viewport must be greater than zero. Using default viewport.");
            self.viewport = Viewport::default();
        }

        if self.model_buffer_reserve == 0 {
            warn!("Model buffer reserve must be greater than zero. Using 1 instead.");
            self.model_buffer_reserve = 1;
        }

        self
    }

    /// Viewport size for a scene created with `transform`: its x/y scale, or
    /// the configured viewport when either component is not positive.
    pub fn viewport_for(&self, transform: &Transform) -> (f32, f32) {
        let size = transform.planar_scale();
        if size.x > 0.0 && size.y > 0.0 {
            (size.x, size.y)
        } else {
            (self.viewport.width, self.viewport.height)
        }
    }

    fn default_scene_name() -> String {
        "main".to_string()
    }

    const fn default_model_buffer_reserve() -> usize {
        16
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub images: PathBuf,
}

impl AssetPaths {
    pub fn image_path(&self, file_name: &str, extension: &str) -> PathBuf {
        self.root
            .join(&self.images)
            .join(format!("{file_name}.{extension}"))
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Assets"),
            images: PathBuf::from("images"),
        }
    }
}
