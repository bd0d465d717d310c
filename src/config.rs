//! TOML configuration parsing and validation.
//!
//! Brand Chat is configured via a TOML file (default: `config/brandchat.toml`).
//! Secrets never live in the file: the admin password and the OpenAI API
//! key are read from environment variables.
//!
//! ```toml
//! [store]
//! path = "./data/knowledge.json"
//!
//! [retrieval]
//! top_k = 15
//!
//! [persona]
//! name = "Nicola Harvey"
//! role = "AI & Web3 Strategist"
//! description = "Strategist at the intersection of AI, blockchain, and human agency."
//!
//! [admin]
//! password_env = "BRANDCHAT_ADMIN_PASSWORD"
//!
//! [llm]
//! provider = "openai"
//! model = "gpt-4o-mini"
//!
//! [server]
//! bind = "127.0.0.1:8501"
//!
//! [taxonomy.speaking]
//! keywords = ["keynote", "podcast", "talk"]
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use brand_chat_core::search::{RelevanceEngine, DEFAULT_TOP_K};
use brand_chat_core::taxonomy::CategoryTaxonomy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub persona: PersonaConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Extra trigger keywords per category, merged into the built-in table.
    #[serde(default)]
    pub taxonomy: BTreeMap<String, TaxonomyEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Additional stop words on top of the built-in list.
    #[serde(default)]
    pub extra_stop_words: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            extra_stop_words: Vec::new(),
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersonaConfig {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password_env: default_password_env(),
        }
    }
}

fn default_password_env() -> String {
    "BRANDCHAT_ADMIN_PASSWORD".to_string()
}

impl AdminConfig {
    /// The configured admin password, if the environment provides a
    /// non-empty one.
    pub fn password(&self) -> Option<String> {
        std::env::var(&self.password_env)
            .ok()
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Connect and per-read timeout. A streamed reply may take longer in
    /// total.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            temperature: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    60
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TaxonomyEntry {
    pub keywords: Vec<String>,
}

impl Config {
    /// Defaults used when no config file exists (e.g. `brandchat init`).
    pub fn minimal() -> Self {
        Self {
            store: StoreConfig {
                path: PathBuf::from("./data/knowledge.json"),
            },
            retrieval: RetrievalConfig::default(),
            persona: PersonaConfig {
                name: "Brand Owner".to_string(),
                role: String::new(),
                description: String::new(),
            },
            admin: AdminConfig::default(),
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
            taxonomy: BTreeMap::new(),
        }
    }

    /// Built-in taxonomy with the `[taxonomy.*]` extensions applied.
    pub fn taxonomy(&self) -> CategoryTaxonomy {
        let mut taxonomy = CategoryTaxonomy::default();
        for (name, entry) in &self.taxonomy {
            taxonomy.extend(name, entry.keywords.iter().map(String::as_str));
        }
        taxonomy
    }

    /// Relevance engine configured for this persona and retrieval settings.
    pub fn engine(&self) -> RelevanceEngine {
        RelevanceEngine::new(self.taxonomy(), self.retrieval.top_k)
            .with_subject_name(&self.persona.name)
            .with_stop_words(self.retrieval.extra_stop_words.iter().map(String::as_str))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }

    if config.persona.name.trim().is_empty() {
        bail!("persona.name must not be empty");
    }

    if config.admin.password_env.trim().is_empty() {
        bail!("admin.password_env must not be empty");
    }

    match config.llm.provider.as_str() {
        "disabled" | "openai" => {}
        other => bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if config.llm.is_enabled() && config.llm.model.trim().is_empty() {
        bail!("llm.model must be specified when provider is '{}'", config.llm.provider);
    }

    if let Some(t) = config.llm.temperature {
        if !(0.0..=2.0).contains(&t) {
            bail!("llm.temperature must be in [0.0, 2.0]");
        }
    }

    for (name, entry) in &config.taxonomy {
        if entry.keywords.iter().all(|k| k.trim().is_empty()) {
            bail!("taxonomy.{} must list at least one keyword", name);
        }
    }

    Ok(())
}
