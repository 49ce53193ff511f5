//! Configuration management for VQL.
//!
//! Provides the settings that select and drive the rule-based optimizer.
//! Rule names are kept as strings here; the optimizer resolves them against
//! its rule catalog and rejects unknown names.

use std::path::Path;

use common_error::VqlResult;
use serde::{Deserialize, Serialize};

/// Names of every rule in the optimizer catalog, in priority order.
pub const DEFAULT_RULES: [&str; 5] = [
    "PROJECTION_PUSHDOWN_JOIN",
    "PROJECTION_PUSHDOWN_SELECT",
    "PREDICATE_PUSHDOWN",
    "JOIN_ELIMINATION",
    "SIMPLIFY_PREDICATE",
];

/// Global VQL configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VqlConfig {
    /// Optimizer configuration.
    pub optimizer: OptimizerSettings,
}

impl VqlConfig {
    /// Parse a configuration from a JSON document.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> VqlResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> VqlResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Serialize this configuration as pretty-printed JSON.
    pub fn to_json(&self) -> VqlResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Rule-based optimizer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Enabled rule names. An empty list runs the identity transform.
    pub rules: Vec<String>,
    /// Validate plan invariants before and after optimization.
    pub validate: bool,
    /// Record a before/after trace for every rule application.
    pub trace: bool,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.iter().map(|r| (*r).to_string()).collect(),
            validate: true,
            trace: false,
        }
    }
}

impl OptimizerSettings {
    /// Replace the enabled rule names.
    #[must_use]
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.rules = rules.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable tracing.
    #[must_use]
    pub fn with_trace(mut self, enable: bool) -> Self {
        self.trace = enable;
        self
    }

    /// Enable or disable invariant validation.
    #[must_use]
    pub fn with_validation(mut self, enable: bool) -> Self {
        self.validate = enable;
        self
    }
}
