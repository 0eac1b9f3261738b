use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const DEFAULT_MAX_TOKENS: usize = 128;

/// Strategy selection plus its parameters
///
/// Serialized with a `"strategy"` tag, e.g.
/// `{"strategy": "fixed_size", "max_tokens": 256, "overlap": 16}`.
/// Omitted parameters take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyConfig {
    FixedSize(FixedSizeConfig),
    Recursive(RecursiveConfig),
    Semantic(SemanticConfig),
    Hierarchical(HierarchicalConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedSizeConfig {
    pub max_tokens: usize,
    /// Tokens repeated at the start of the next chunk
    pub overlap: usize,
}

impl Default for FixedSizeConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            overlap: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecursiveConfig {
    pub max_tokens: usize,
    pub overlap: usize,
}

impl Default for RecursiveConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            overlap: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub max_tokens: usize,
    /// Percentile of sentence distances used as the breakpoint threshold
    pub similarity_threshold_percentile: u32,
    /// A chunk is only closed once it holds at least this many tokens
    pub min_tokens: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            similarity_threshold_percentile: 95,
            min_tokens: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchicalConfig {
    pub max_tokens: usize,
    /// Share of a chunk that ancestor headers may take up
    pub max_parent_token_ratio: f64,
}

impl HierarchicalConfig {
    pub fn max_parent_tokens(&self) -> usize {
        (self.max_tokens as f64 * self.max_parent_token_ratio).floor() as usize
    }
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            max_parent_token_ratio: 0.5,
        }
    }
}

impl StrategyConfig {
    /// Load a config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| ChunkError::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FixedSize(_) => "fixed_size",
            Self::Recursive(_) => "recursive",
            Self::Semantic(_) => "semantic",
            Self::Hierarchical(_) => "hierarchical",
        }
    }

    pub fn max_tokens(&self) -> usize {
        match self {
            Self::FixedSize(c) => c.max_tokens,
            Self::Recursive(c) => c.max_tokens,
            Self::Semantic(c) => c.max_tokens,
            Self::Hierarchical(c) => c.max_tokens,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tokens() == 0 {
            return Err(ChunkError::Configuration(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        match self {
            Self::FixedSize(FixedSizeConfig { max_tokens, overlap })
            | Self::Recursive(RecursiveConfig { max_tokens, overlap }) => {
                if overlap >= max_tokens {
                    return Err(ChunkError::Configuration(format!(
                        "overlap ({}) must be smaller than max_tokens ({})",
                        overlap, max_tokens
                    )));
                }
            }
            Self::Semantic(c) => {
                if c.similarity_threshold_percentile > 100 {
                    return Err(ChunkError::Configuration(format!(
                        "similarity_threshold_percentile must be within 0..=100, got {}",
                        c.similarity_threshold_percentile
                    )));
                }
            }
            Self::Hierarchical(c) => {
                let ratio = c.max_parent_token_ratio;
                if !(ratio > 0.0 && ratio < 1.0) {
                    return Err(ChunkError::Configuration(format!(
                        "max_parent_token_ratio must be within (0, 1), got {}",
                        ratio
                    )));
                }
            }
        }

        Ok(())
    }

    /// Parameters in declaration order, as recorded in result metadata
    pub fn parameters(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.shift_remove("strategy");
                map
            }
            _ => Map::new(),
        }
    }

    /// Output sub-directory naming the strategy and its parameter values
    ///
    /// `FixedSize { max_tokens: 128, overlap: 32 }` gives `fixed_size/128_32`.
    pub fn config_dir(&self) -> String {
        let values: Vec<String> = self
            .parameters()
            .values()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();

        format!("{}/{}", self.name(), values.join("_"))
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::FixedSize(FixedSizeConfig::default())
    }
}
