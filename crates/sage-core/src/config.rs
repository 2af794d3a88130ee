use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (sage.toml + SAGE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SageConfig {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model addressed by default until changed at runtime.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.sage/sage.db", home)
}

impl SageConfig {
    /// Load config from a TOML file with SAGE_* env var overrides.
    ///
    /// Checks in order: explicit path argument, then ./sage.toml.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("sage.toml");

        let config: SageConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SAGE_").split("_"))
            .extract()
            .map_err(|e| crate::error::SageError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: SageConfig = Figment::new()
            .merge(Toml::string("[discord]\nbot_token = \"t\""))
            .extract()
            .unwrap();
        assert_eq!(config.agent.model, "llama3.1");
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert!(config.database.path.ends_with("sage.db"));
    }

    #[test]
    fn explicit_values_win() {
        let config: SageConfig = Figment::new()
            .merge(Toml::string(
                "[discord]\nbot_token = \"t\"\n[agent]\nmodel = \"mistral\"\n[ollama]\nbase_url = \"http://10.0.0.2:11434\"",
            ))
            .extract()
            .unwrap();
        assert_eq!(config.agent.model, "mistral");
        assert_eq!(config.ollama.base_url, "http://10.0.0.2:11434");
    }
}
