//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::graph::DEFAULT_MAX_DEPTH;
use crate::domain::tracker::{
    ConceptRule, ExtractionRules, DEFAULT_DOCUMENT_PATTERN, DEFAULT_FIX_REFERENCE_PATTERN,
};
use crate::storage::database::default_database_path;

/// Upper bound accepted for `traversal.default_max_depth`
const MAX_TRAVERSAL_DEPTH: u32 = 32;

/// Skillgraph configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub traversal: TraversalConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; the platform data directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    pub default_max_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub document_pattern: String,
    pub fix_reference_pattern: String,
    pub concepts: Vec<ConceptRule>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            default_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            document_pattern: DEFAULT_DOCUMENT_PATTERN.to_string(),
            fix_reference_pattern: DEFAULT_FIX_REFERENCE_PATTERN.to_string(),
            concepts: ConceptRule::defaults(),
        }
    }
}

impl StorageConfig {
    /// The configured database path, or the default location
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_database_path)
    }
}

impl ExtractionConfig {
    /// Compile the configured rules
    pub fn rules(&self) -> crate::error::Result<ExtractionRules> {
        ExtractionRules::new(
            self.concepts.clone(),
            &self.document_pattern,
            &self.fix_reference_pattern,
        )
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("SKILLGRAPH_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("skillgraph")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or the defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let depth = self.traversal.default_max_depth;
        if depth == 0 || depth > MAX_TRAVERSAL_DEPTH {
            return Err(anyhow!(
                "traversal.default_max_depth must be between 1 and {}, got {}",
                MAX_TRAVERSAL_DEPTH,
                depth
            ));
        }

        self.extraction
            .rules()
            .map_err(|e| anyhow!(e))
            .context("Invalid extraction rules")?;
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "storage.path" => Ok(self.storage.resolved_path().display().to_string()),
            "traversal.default_max_depth" => Ok(self.traversal.default_max_depth.to_string()),
            "extraction.document_pattern" => Ok(self.extraction.document_pattern.clone()),
            "extraction.fix_reference_pattern" => {
                Ok(self.extraction.fix_reference_pattern.clone())
            }
            "extraction.concepts" => Ok(self
                .extraction
                .concepts
                .iter()
                .map(|rule| format!("{}={}", rule.keyword, rule.concept))
                .collect::<Vec<_>>()
                .join(", ")),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `skillgraph config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    ///
    /// The concept table is edited in the file directly.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "storage.path" => {
                self.storage.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "traversal.default_max_depth" => {
                let depth: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid default_max_depth value: {}", value))?;
                if depth == 0 || depth > MAX_TRAVERSAL_DEPTH {
                    return Err(anyhow!(
                        "default_max_depth must be between 1 and {}",
                        MAX_TRAVERSAL_DEPTH
                    ));
                }
                self.traversal.default_max_depth = depth;
            }
            "extraction.document_pattern" => {
                regex::Regex::new(value)
                    .with_context(|| format!("Invalid document pattern: {}", value))?;
                self.extraction.document_pattern = value.to_string();
            }
            "extraction.fix_reference_pattern" => {
                let candidate = ExtractionConfig {
                    fix_reference_pattern: value.to_string(),
                    ..self.extraction.clone()
                };
                candidate
                    .rules()
                    .map_err(|e| anyhow!(e))
                    .with_context(|| format!("Invalid fix reference pattern: {}", value))?;
                self.extraction.fix_reference_pattern = value.to_string();
            }
            "extraction.concepts" => {
                return Err(anyhow!(
                    "extraction.concepts is edited in the config file: {}",
                    Self::config_path()?.display()
                ));
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `skillgraph config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "storage.path",
            "traversal.default_max_depth",
            "extraction.document_pattern",
            "extraction.fix_reference_pattern",
            "extraction.concepts",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
