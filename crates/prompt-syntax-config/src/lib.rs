use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        source: glob::PatternError,
    },
}

/// Source folders to search for each kind of prompt file.
///
/// Entries may be relative (joined against every workspace root), absolute,
/// or carry glob segments such as `.github/**/prompts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locations {
    pub prompt: Vec<String>,
    pub instructions: Vec<String>,
    pub mode: Vec<String>,
}

impl Default for Locations {
    fn default() -> Self {
        Self {
            prompt: vec![".github/prompts".to_string()],
            instructions: vec![".github/instructions".to_string()],
            mode: vec![".github/chatmodes".to_string()],
        }
    }
}

/// Settings forwarded to the file search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Glob patterns excluded from searches.
    pub exclude: Vec<String>,
    /// Whether `.gitignore`-style ignore files should be honoured.
    pub use_ignore_files: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            exclude: vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()],
            use_ignore_files: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub locations: Locations,
    /// Root of the user-scoped prompt storage.
    #[serde(default = "Config::default_user_data_dir")]
    pub user_data_dir: PathBuf,
    #[serde(default)]
    pub search: SearchSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locations: Locations::default(),
            user_data_dir: Self::default_user_data_dir(),
            search: SearchSettings::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.expand_paths();
        config.validate()?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Loads the config file, falling back to defaults when there is none.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/prompt-syntax");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn default_user_data_dir() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.config/prompt-syntax/user");
        PathBuf::from(data_dir.as_ref())
    }

    /// Expands shell variables and tilde in every configured path.
    fn expand_paths(&mut self) {
        self.user_data_dir =
            Self::expand_path(&self.user_data_dir).unwrap_or_else(|| self.user_data_dir.clone());

        let locations = &mut self.locations;
        for folder in locations
            .prompt
            .iter_mut()
            .chain(locations.instructions.iter_mut())
            .chain(locations.mode.iter_mut())
        {
            if let Ok(expanded) = shellexpand::full(folder.as_str()) {
                *folder = expanded.into_owned();
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for pattern in &self.search.exclude {
            glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidExcludePattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/prompt-syntax/config.toml"));
    }

    #[test]
    fn test_default_locations() {
        let config = Config::default();
        assert_eq!(config.locations.prompt, vec![".github/prompts"]);
        assert_eq!(config.locations.instructions, vec![".github/instructions"]);
        assert_eq!(config.locations.mode, vec![".github/chatmodes"]);
        assert!(config.search.use_ignore_files);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            locations: Locations {
                prompt: vec!["prompts".to_string()],
                instructions: vec![],
                mode: vec!["/abs/modes".to_string()],
            },
            user_data_dir: PathBuf::from("/tmp/user"),
            search: SearchSettings::default(),
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[locations]
prompt = ["my-prompts"]
"#,
        )
        .unwrap();

        assert_eq!(config.locations.prompt, vec!["my-prompts"]);
        assert_eq!(config.locations.instructions, vec![".github/instructions"]);
        assert_eq!(config.search, SearchSettings::default());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_relative_path() {
        let path = PathBuf::from("relative/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        let test_config = Config {
            user_data_dir: PathBuf::from("/tmp/prompt-user"),
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_locations_expand_env_vars() {
        unsafe {
            env::set_var("PROMPT_SYNTAX_TEST_ROOT", "/custom/root");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            r#"
[locations]
prompt = ["$PROMPT_SYNTAX_TEST_ROOT/prompts", ".github/prompts"]
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(
            config.locations.prompt,
            vec!["/custom/root/prompts", ".github/prompts"]
        );

        unsafe {
            env::remove_var("PROMPT_SYNTAX_TEST_ROOT");
        }
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "locations = [").unwrap();

        let result = Config::load_from_path(&config_file);
        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_invalid_exclude_pattern_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            r#"
[search]
exclude = ["***"]
"#,
        )
        .unwrap();

        let result = Config::load_from_path(&config_file);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidExcludePattern { .. })
        ));
    }
}
