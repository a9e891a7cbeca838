use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub provider: String,
    pub model: String,
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub output_dir: String,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".codeloom")
            .join("config.yaml")
    }

    /// Read the user config if it exists and parses; fall back to defaults
    /// otherwise.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            if let Ok(config) = Self::load_from_file(&path) {
                return Ok(config);
            }
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_file(Self::config_path())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-7-sonnet-20250219".to_string(),
            api_url: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            temperature: 0.2,
            max_tokens: 4000,
            output_dir: "generated_project".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Stock endpoint for a known provider name; `None` for custom providers,
    /// which keep whatever URL is configured.
    pub fn default_endpoint(provider: &str) -> Option<&'static str> {
        match provider.to_lowercase().as_str() {
            "claude" | "anthropic" => Some("https://api.anthropic.com"),
            "openai" => Some("https://api.openai.com/v1"),
            _ => None,
        }
    }

    /// Name of the environment variable consulted when no key is configured.
    pub fn credential_env(&self) -> &'static str {
        match self.provider.to_lowercase().as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "ANTHROPIC_API_KEY",
        }
    }

    /// Explicit key wins; otherwise the provider's environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(self.credential_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
