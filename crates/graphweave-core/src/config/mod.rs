//! Configuration system for graphweave.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{WeaveError, WeaveResult};
use crate::graph::{MergeConfig, OntologyConfig};
use crate::traits::LlmConfig;

/// Where extraction records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Replay the gold standard dataset.
    #[default]
    Mock,
    /// Call an LLM for every chunk.
    Live,
}

impl std::str::FromStr for Mode {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "live" => Ok(Self::Live),
            other => Err(WeaveError::Configuration(format!(
                "Unknown mode '{}', expected 'mock' or 'live'",
                other
            ))),
        }
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenAI,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash",
            Self::OpenAI => "gpt-4o-mini",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(WeaveError::UnsupportedProvider {
                provider: other.to_string(),
            }),
        }
    }
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            config: LlmConfig {
                model: LlmProvider::Gemini.default_model().to_string(),
                ..Default::default()
            },
        }
    }
}

/// Main pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extraction mode.
    pub mode: Mode,
    /// LLM configuration, used in live mode.
    pub llm: LlmProviderConfig,
    /// JSON array of `{id, text}` chunks.
    pub input_chunks_path: PathBuf,
    /// JSON object of gold standard records keyed `chunk_{id}`.
    pub gold_standard_path: PathBuf,
    /// Directory receiving the exports.
    pub output_dir: PathBuf,
    /// Node merge behaviour.
    pub merge: MergeConfig,
    /// Type, name and relation aliases.
    pub ontology: OntologyConfig,
    /// Write `graph.mmd`.
    pub write_mermaid: bool,
    /// Write `diagnostics.json`.
    pub write_diagnostics: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Mock,
            llm: LlmProviderConfig::default(),
            input_chunks_path: PathBuf::from("data/input_chunks.json"),
            gold_standard_path: PathBuf::from("data/gold_standard.json"),
            output_dir: PathBuf::from("output"),
            merge: MergeConfig::default(),
            ontology: OntologyConfig::default(),
            write_mermaid: true,
            write_diagnostics: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> WeaveResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| WeaveError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| WeaveError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| WeaveError::Configuration(e.to_string())),
            _ => Err(WeaveError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> WeaveResult<Self> {
        Self::default().apply_env()
    }

    /// Overlay environment variables onto this configuration.
    pub fn apply_env(self) -> WeaveResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay variables from an arbitrary lookup onto this configuration.
    pub fn apply_env_from<F>(mut self, lookup: F) -> WeaveResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("GRAPHWEAVE_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(provider) = lookup("GRAPHWEAVE_PROVIDER") {
            let provider: LlmProvider = provider.parse()?;
            if provider != self.llm.provider
                && self.llm.config.model == self.llm.provider.default_model()
            {
                self.llm.config.model = provider.default_model().to_string();
            }
            self.llm.provider = provider;
        }
        if let Some(model) = lookup("GRAPHWEAVE_MODEL") {
            self.llm.config.model = model;
        }
        if let Some(path) = lookup("GRAPHWEAVE_INPUT") {
            self.input_chunks_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("GRAPHWEAVE_GOLD_STANDARD") {
            self.gold_standard_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("GRAPHWEAVE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(path);
        }
        if self.llm.config.api_key.is_none() {
            self.llm.config.api_key = lookup(self.llm.provider.api_key_var())
                .filter(|key| !key.trim().is_empty());
        }
        Ok(self)
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> WeaveResult<()> {
        if self.mode == Mode::Live && self.llm.config.api_key.is_none() {
            return Err(WeaveError::Configuration(format!(
                "Live mode requested but {} is not set",
                self.llm.provider.api_key_var()
            )));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for PipelineConfig.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set extraction mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Set the input chunks file.
    pub fn input_chunks_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_chunks_path = path.into();
        self
    }

    /// Set the gold standard file.
    pub fn gold_standard_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.gold_standard_path = path.into();
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_dir = path.into();
        self
    }

    /// Set merge configuration.
    pub fn merge(mut self, config: MergeConfig) -> Self {
        self.config.merge = config;
        self
    }

    /// Set ontology aliases.
    pub fn ontology(mut self, config: OntologyConfig) -> Self {
        self.config.ontology = config;
        self
    }

    /// Enable or disable the Mermaid export.
    pub fn write_mermaid(mut self, enabled: bool) -> Self {
        self.config.write_mermaid = enabled;
        self
    }

    /// Enable or disable the diagnostics export.
    pub fn write_diagnostics(mut self, enabled: bool) -> Self {
        self.config.write_diagnostics = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
