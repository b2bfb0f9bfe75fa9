//! Advisor Configuration
//!
//! Environment-driven settings for the retention agent. Defaults favor
//! reproducible runs: greedy sampling with a fixed seed.

use std::str::FromStr;

use agent_core::{AgentConfig, GenerationOptions};
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};

pub const DEFAULT_MODEL: &str = "qwen2.5";
pub const DEFAULT_MAX_STEPS: usize = 10;
pub const DEFAULT_MEMORY_TOKENS: usize = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_SEED: i32 = 42;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub model: String,
    pub max_steps: usize,
    pub memory_token_budget: usize,
    pub temperature: f32,
    pub seed: Option<i32>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            max_steps: DEFAULT_MAX_STEPS,
            memory_token_budget: DEFAULT_MEMORY_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            seed: Some(DEFAULT_SEED),
        }
    }
}

impl AdvisorConfig {
    /// Read `AGENT_MODEL`, `AGENT_MAX_STEPS`, `AGENT_MEMORY_TOKENS` and
    /// `AGENT_TEMPERATURE`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            model: lookup("AGENT_MODEL").unwrap_or(defaults.model),
            max_steps: parse_var(&lookup, "AGENT_MAX_STEPS")?.unwrap_or(defaults.max_steps),
            memory_token_budget: parse_var(&lookup, "AGENT_MEMORY_TOKENS")?
                .unwrap_or(defaults.memory_token_budget),
            temperature: parse_var(&lookup, "AGENT_TEMPERATURE")?.unwrap_or(defaults.temperature),
            seed: defaults.seed,
        })
    }

    /// Loop configuration for the agent
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            max_steps: self.max_steps,
            memory_token_budget: self.memory_token_budget,
            generation: GenerationOptions {
                model: self.model.clone(),
                temperature: self.temperature,
                seed: self.seed,
                ..GenerationOptions::default()
            },
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| AdvisorError::Config(format!("{key} has an invalid value: {raw}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdvisorConfig::from_lookup(lookup(&[])).unwrap();
        let agent = config.agent_config();

        assert_eq!(agent.max_steps, 10);
        assert_eq!(agent.memory_token_budget, 4000);
        assert_eq!(agent.generation.seed, Some(42));
        assert!(agent.generation.temperature.abs() < f32::EPSILON);
    }

    #[test]
    fn test_overrides() {
        let config = AdvisorConfig::from_lookup(lookup(&[
            ("AGENT_MODEL", "llama3.2"),
            ("AGENT_MAX_STEPS", " 4 "),
            ("AGENT_TEMPERATURE", "0.3"),
        ]))
        .unwrap();

        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.max_steps, 4);
        assert_eq!(config.memory_token_budget, 4000);
    }

    #[test]
    fn test_invalid_number() {
        let err = AdvisorConfig::from_lookup(lookup(&[("AGENT_MAX_STEPS", "ten")])).unwrap_err();
        assert!(err.to_string().contains("AGENT_MAX_STEPS"));
    }
}
