use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::{Config, ConfigError, parse_config};

/// Environment variable naming a config file that replaces the project
/// lookup.
pub const CONFIG_ENV: &str = "HARBOR_CONFIG";

/// Project config file names, most preferred first.
const PROJECT_FILE_NAMES: [&str; 2] = ["harbor.yml", "harbor.yaml"];

pub trait ConfigLoader {
    fn load(&self, cwd: &Path) -> Result<Config, ConfigError>;
}

/// Reads up to two layers from disk: a user-wide file, then either the file
/// named by `HARBOR_CONFIG` or `harbor.yml`/`harbor.yaml` in the working
/// directory. The second layer wins field by field.
#[derive(Debug)]
pub struct DefaultConfigLoader {
    user_config: Option<PathBuf>,
    override_config: Option<PathBuf>,
}

impl Default for DefaultConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultConfigLoader {
    pub fn new() -> Self {
        Self::from_env_vars(|name| std::env::var_os(name))
    }

    /// Resolve both layers from an environment lookup.
    ///
    /// The user-wide file lives at `$XDG_CONFIG_HOME/harbor/harbor.yml`,
    /// falling back to `~/.config/harbor/harbor.yml`. Empty variables count
    /// as unset.
    pub fn from_env_vars(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let config_home = var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| var("HOME").map(|home| PathBuf::from(home).join(".config")));
        Self {
            user_config: config_home.map(|dir| dir.join("harbor").join("harbor.yml")),
            override_config: var(CONFIG_ENV).map(PathBuf::from),
        }
    }

    /// Use `path` as the user-wide file regardless of the environment.
    pub fn with_global_path(path: PathBuf) -> Self {
        Self {
            user_config: Some(path),
            override_config: None,
        }
    }

    /// Read `path` instead of looking for a project file. Unlike the other
    /// layers it must exist.
    pub fn with_override(mut self, path: PathBuf) -> Self {
        self.override_config = Some(path);
        self
    }

    fn project_layer(&self, cwd: &Path) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(path) = &self.override_config {
            if !path.is_file() {
                return Err(ConfigError::OverrideMissing(path.clone()));
            }
            return Ok(Some(path.clone()));
        }
        Ok(PROJECT_FILE_NAMES
            .into_iter()
            .map(|name| cwd.join(name))
            .find(|path| path.is_file()))
    }

    fn read_layer(path: &Path) -> Result<Config, ConfigError> {
        tracing::debug!(path = %path.display(), "reading config layer");
        parse_config(&std::fs::read_to_string(path)?)
    }
}

impl ConfigLoader for DefaultConfigLoader {
    fn load(&self, cwd: &Path) -> Result<Config, ConfigError> {
        let user = match self.user_config.as_deref().filter(|p| p.is_file()) {
            Some(path) => Self::read_layer(path)?,
            None => Config::default(),
        };
        let project = match self.project_layer(cwd)? {
            Some(path) => Self::read_layer(&path)?,
            None => Config::default(),
        };

        let config = user.merge(project);
        config.validate()?;
        Ok(config)
    }
}
