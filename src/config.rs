use anyhow::{Result, anyhow};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "phi4";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root URL of the Ollama-compatible completion server.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    /// Program invoked as `<shell> -c <command>` for approved commands.
    pub shell: String,
    /// Cap on consecutive reviewer rejections for one request. Unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_review_rounds: Option<u32>,
    pub show_transitions: bool,
    pub use_mock: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            request_timeout_secs: 120,
            shell: "sh".to_string(),
            max_review_rounds: None,
            show_transitions: false,
            use_mock: false,
        }
    }
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::get_config_path()
            .and_then(|path| Self::load_from_file(&path))
            .unwrap_or_else(|_| {
                info!("No config file found, using defaults");
                Self::default()
            });

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Environment variables override config file
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("SHELL_COMMANDER_BASE_URL") {
            self.base_url = base_url;
        }

        if let Some(model) = lookup("SHELL_COMMANDER_MODEL") {
            self.model = model;
        }

        if lookup("SHELL_COMMANDER_USE_MOCK").is_some() {
            self.use_mock = true;
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            info!("Loaded config from: {}", path.display());
            Ok(config)
        } else {
            Err(anyhow!("Config file not found"))
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".shell-commander"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_mock_mode(&self) -> bool {
        self.use_mock
    }

    pub fn show_config_info(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        println!("Configuration file: {}", config_path.display());

        if config_path.exists() {
            println!("Status: Found");
        } else {
            println!("Status: Not found (using defaults)");
        }

        println!("Server: {}", self.base_url);
        println!("Model: {}", self.model);
        println!("Shell: {}", self.shell);
        match self.max_review_rounds {
            Some(limit) => println!("Max review rounds: {}", limit),
            None => println!("Max review rounds: unlimited"),
        }
        println!("Mock mode: {}", self.use_mock);

        println!("\nTo write a default config file:");
        println!("  shellcmd --init-config");
        println!("\nOr set environment variables:");
        println!("  export SHELL_COMMANDER_BASE_URL=http://localhost:11434");
        println!("  export SHELL_COMMANDER_MODEL=phi4");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_point_at_local_ollama() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "phi4");
        assert_eq!(config.shell, "sh");
        assert!(config.max_review_rounds.is_none());
        assert!(!config.is_mock_mode());
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            model: "llama3".to_string(),
            max_review_rounds: Some(3),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = \"mistral\"\n").unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.model, "mistral");
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);
        assert_eq!(loaded.request_timeout_secs, 120);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_file(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [
            ("SHELL_COMMANDER_BASE_URL", "http://gpu-box:11434"),
            ("SHELL_COMMANDER_MODEL", "qwen2.5-coder"),
            ("SHELL_COMMANDER_USE_MOCK", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.model, "qwen2.5-coder");
        assert!(config.use_mock);
    }

    #[test]
    fn test_no_env_leaves_config_untouched() {
        let mut config = Config::default();
        config.apply_env_overrides(|_| None);
        assert_eq!(config, Config::default());
    }
}
