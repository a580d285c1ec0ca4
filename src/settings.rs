//! User settings.
//!
//! Settings are read from `settings.json` in the platform config directory. Every field
//! is optional and falls back to its default.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// The scene to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// Two colored triangles, each drawn with its own shader program loaded from files.
    #[default]
    Triangles,
    /// An indexed rectangle drawn with an inline shader program.
    Rectangle,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
    pub scene: SceneKind,
    pub shader_dir: PathBuf,
    pub clear_color: [f32; 4],
    pub wireframe: bool,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "OpenGL Test".to_string(),
            width: 800,
            height: 800,
            fullscreen: false,
            vsync: true,
            scene: SceneKind::default(),
            shader_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders")),
            clear_color: [0.2, 0.3, 0.3, 1.0],
            wireframe: true,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Settings {
    /// Where the settings file is expected, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hello-window").join("settings.json"))
    }

    /// Loads the settings from [`Settings::default_path`]. A missing file yields the defaults.
    pub fn load() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&contents).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured log level, `Info` if it doesn't parse.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
