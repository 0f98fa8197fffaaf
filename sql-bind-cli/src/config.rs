use std::{
    env,
    error::Error,
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

const CONNECTION_STRING: &str = "CONNECTION_STRING";
pub const CONFIG_FILE: &str = "sql-bind.toml";

#[derive(Debug)]
pub enum ConfigError {
    ConnectionStringNotFound,
    UnreadableConfig {
        path: PathBuf,
        source: Box<dyn Error>,
    },
    UnreadableDirectory {
        path: PathBuf,
        source: io::Error,
    },
    UnreadableFile {
        path: PathBuf,
        source: io::Error,
    },
    InvalidFileName {
        path: PathBuf,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConnectionStringNotFound => write!(
                f,
                "Connection string not found, please set the {CONNECTION_STRING} environment variable."
            ),
            ConfigError::UnreadableConfig { path, source } => {
                write!(f, "encountered '{source}' attempting to read {}", path.display())
            }
            ConfigError::UnreadableDirectory { path, source } => {
                write!(f, "encountered '{source}' attempting to list {}", path.display())
            }
            ConfigError::UnreadableFile { path, source } => {
                write!(f, "encountered '{source}' attempting to read {}", path.display())
            }
            ConfigError::InvalidFileName { path } => write!(
                f,
                "{} does not name a valid function, rename the file",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

fn default_package() -> String {
    "database".to_string()
}

fn default_target() -> PathBuf {
    PathBuf::from("output.go")
}

fn default_embed_dir() -> String {
    "sql".to_string()
}

fn default_extension() -> String {
    "sql".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeGenerator {
    Json,
    #[serde(rename_all = "kebab-case")]
    Go {
        #[serde(default = "default_package")]
        package: String,
        /// Take a `context.Context` as the first argument of every accessor.
        #[serde(default = "enabled")]
        context: bool,
    },
}

fn enabled() -> bool {
    true
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::Go {
            package: default_package(),
            context: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[must_use]
pub struct TomlConfig {
    #[serde(default = "default_target")]
    target: PathBuf,
    #[serde(default = "default_embed_dir")]
    embed_dir: String,
    #[serde(default = "default_extension")]
    extension: String,
    #[serde(default = "Default::default")]
    mode: CodeGenerator,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            embed_dir: default_embed_dir(),
            extension: default_extension(),
            mode: CodeGenerator::default(),
        }
    }
}

impl TomlConfig {
    /// Reads `path`, or the default config file when it exists, or falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None if Path::new(CONFIG_FILE).is_file() => PathBuf::from(CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        Self::read(&path).map_err(|source| ConfigError::UnreadableConfig { path, source })
    }

    fn read(path: &Path) -> Result<Self, Box<dyn Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[derive(Debug, Clone)]
pub struct SqlBindConfig {
    pub source: PathBuf,
    pub target: PathBuf,
    pub embed_dir: String,
    pub extension: String,
    pub mode: CodeGenerator,
}

impl SqlBindConfig {
    pub fn from_toml_config(source: PathBuf, config: TomlConfig) -> Self {
        Self {
            source,
            target: config.target,
            embed_dir: config.embed_dir,
            extension: config.extension,
            mode: config.mode,
        }
    }
}

pub fn connection_string() -> Result<String, ConfigError> {
    if let Err(err) = dotenv() {
        tracing::debug!("No .env file loaded: {err}");
    }
    env::var(CONNECTION_STRING).map_err(|_| ConfigError::ConnectionStringNotFound)
}
