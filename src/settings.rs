//! User settings.
//!
//! Settings are read from `settings.json` in the platform config directory (or a path given on
//! the command line). Every field has a default, so the file only needs the keys that differ.

use std::path::{Path, PathBuf};

use glam::Vec4;
use serde::Deserialize;

/// Errors produced while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Window and context options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Creates the window without showing it.
    pub hidden: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "glsteps".to_string(),
            width: 800,
            height: 600,
            vsync: true,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    /// SDL key name that closes the window, e.g. `"Return"` or `"Escape"`.
    pub close_key: String,
    /// Overrides the clear color of every scene.
    pub clear_color: Option<[f32; 4]>,
    pub log_level: log::LevelFilter,
    /// Image used by textured scenes. A generated brick pattern is used when unset.
    pub texture: Option<PathBuf>,
    /// Directory with `<scene>/vert.glsl` and `<scene>/frag.glsl` overriding the built-in shaders.
    pub shader_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            close_key: "Return".to_string(),
            clear_color: None,
            log_level: log::LevelFilter::Info,
            texture: None,
            shader_dir: None,
        }
    }
}

impl Settings {
    /// The settings file used when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("glsteps").join("settings.json"))
    }

    /// Parses settings from JSON text.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Loads settings from `path`, which must exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the explicit settings file, or the default one if it exists, or the defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn clear_color_override(&self) -> Option<Vec4> {
        self.clear_color.map(Vec4::from_array)
    }

    /// Path of a shader stage file for `scene` inside the shader directory, if one is set.
    pub fn shader_path(&self, scene: &str, file: &str) -> Option<PathBuf> {
        self.shader_dir
            .as_ref()
            .map(|dir| dir.join(scene).join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings =
            Settings::from_json(r#"{ "window": { "width": 1280 }, "log_level": "debug" }"#)
                .unwrap();
        assert_eq!(settings.window.width, 1280);
        assert_eq!(settings.window.height, 600);
        assert_eq!(settings.log_level, log::LevelFilter::Debug);
        assert_eq!(settings.close_key, "Return");
        assert_eq!(settings.texture, None);
    }

    #[test]
    fn test_clear_color_override() {
        let settings = Settings::from_json(r#"{ "clear_color": [0.1, 0.2, 0.3, 1.0] }"#).unwrap();
        assert_eq!(
            settings.clear_color_override(),
            Some(Vec4::new(0.1, 0.2, 0.3, 1.0))
        );
    }

    #[test]
    fn test_shader_path() {
        let settings = Settings::from_json(r#"{ "shader_dir": "shaders" }"#).unwrap();
        assert_eq!(
            settings.shader_path("quad", "vert.glsl"),
            Some(PathBuf::from("shaders/quad/vert.glsl"))
        );
        assert_eq!(Settings::default().shader_path("quad", "vert.glsl"), None);
    }

    #[test]
    fn test_malformed_settings_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("glsteps-settings-{}.json", std::process::id()));
        std::fs::write(&path, "{ \"window\": 3 }").unwrap();
        let err = Settings::load_or_default(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        std::fs::remove_file(path).unwrap();
    }
}
