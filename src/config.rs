use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name searched for in the working directory and next to the executable
pub const CONFIG_FILE_NAME: &str = "dashboard.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory of the file this config came from; relative paths resolve against it
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
    #[serde(skip)]
    pub source: ConfigSource,
}

/// Where a loaded config came from. Logged by callers once logging is up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    #[default]
    Embedded,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Embedded => f.write_str("embedded default"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DatasetConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: default_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Optional log file; the TUI always needs one since stdout is the terminal
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            file: None,
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[dataset]
path = "data/supermarket_sales.csv"

[server]
addr = "0.0.0.0:3000"

[logging]
level = "info"
file = "logs/dashboard.log"
"#;

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse config")?;
        Ok(config)
    }

    /// Dataset path, resolved against the config file's directory when relative
    pub fn dataset_path(&self) -> PathBuf {
        self.resolve(&self.dataset.path)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(|f| self.resolve(f))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            return p.to_path_buf();
        }
        match &self.base_dir {
            Some(dir) => dir.join(p),
            None => p.to_path_buf(),
        }
    }
}

/// Load configuration
///
/// Search order:
/// 1. Explicit path (from `--config`)
/// 2. dashboard.toml in the working directory
/// 3. dashboard.toml next to the executable
/// 4. Embedded default config
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let local = Path::new(CONFIG_FILE_NAME);
    if local.exists() {
        return read_config(local);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return read_config(&config_path);
            }
        }
    }

    Config::from_toml(DEFAULT_CONFIG)
}

fn read_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let mut config = Config::from_toml(&contents)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .filter(|dir| !dir.as_os_str().is_empty());
    config.source = ConfigSource::File(path.to_path_buf());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_loads() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();

        assert_eq!(config.dataset.path, "data/supermarket_sales.csv");
        assert_eq!(config.server.addr, "0.0.0.0:3000");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.dataset_path(), PathBuf::from("data/supermarket_sales.csv"));
        assert_eq!(config.source, ConfigSource::Embedded);
        assert_eq!(config.source.to_string(), "embedded default");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::from_toml("[dataset]\npath = \"sales.csv\"\n").unwrap();

        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.log_file(), None);
    }

    #[test]
    fn test_missing_dataset_section_is_an_error() {
        assert!(Config::from_toml("[server]\naddr = \"127.0.0.1:8080\"\n").is_err());
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[dataset]\npath = \"sales.csv\"\n\n[logging]\nfile = \"logs/app.log\"").unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.dataset_path(), dir.path().join("sales.csv"));
        assert_eq!(config.log_file(), Some(dir.path().join("logs/app.log")));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.source, ConfigSource::File(path.clone()));
        assert_eq!(config.source.to_string(), path.display().to_string());
    }

    #[test]
    fn test_absolute_dataset_path_kept() {
        let mut config = Config::from_toml("[dataset]\npath = \"/srv/data/sales.csv\"\n").unwrap();
        config.base_dir = Some(PathBuf::from("/etc/dashboard"));

        assert_eq!(config.dataset_path(), PathBuf::from("/srv/data/sales.csv"));
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/dashboard.toml"))).is_err());
    }
}
