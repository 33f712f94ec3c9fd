//! User configuration read from `config.toml`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::Error;

const CONFIG_ENV: &str = "GUID_CONFIG";

/// Theme selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Auto,
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub path: Option<PathBuf>,
    pub size: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileSelectionConfig {
    pub bookmarks: Vec<PathBuf>,
    pub show_hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeChoice,
    pub font: FontConfig,
    pub file_selection: FileSelectionConfig,
}

impl Config {
    /// Loads the config from `$GUID_CONFIG` or the user config directory.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, Error> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str::<Config>(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("guid").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            theme = "light"
            [font]
            path = "/usr/share/fonts/TTF/DejaVuSans.ttf"
            size = 14.0
            [file_selection]
            bookmarks = ["/tmp", "/srv/data"]
            show_hidden = true
            "#,
        )
        .unwrap();

        assert_eq!(config.theme, ThemeChoice::Light);
        assert_eq!(config.font.size, Some(14.0));
        assert_eq!(config.file_selection.bookmarks.len(), 2);
        assert!(config.file_selection.show_hidden);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.theme, ThemeChoice::Auto);
    }

    #[test]
    fn missing_file_is_default() {
        let config = Config::load_from(Path::new("/nonexistent/guid/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "theme = 42").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config { .. })));
    }
}
