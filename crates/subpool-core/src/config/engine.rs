//! Slot assignment engine configuration.

use serde::{Deserialize, Serialize};

/// Settings governing slot assignment behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Candidate ordering: `fewest_available_first` or `most_available_first`.
    ///
    /// The default consolidates members onto the fullest compatible
    /// subscription, keeping emptier accounts free for future batches.
    #[serde(default = "default_selection_policy")]
    pub selection_policy: String,
    /// How many times a lost reservation race is retried before the
    /// request degrades to PENDING.
    #[serde(default = "default_reserve_attempts")]
    pub max_reserve_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selection_policy: default_selection_policy(),
            max_reserve_attempts: default_reserve_attempts(),
        }
    }
}

fn default_selection_policy() -> String {
    "fewest_available_first".to_string()
}

fn default_reserve_attempts() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.selection_policy, "fewest_available_first");
        assert_eq!(cfg.max_reserve_attempts, 3);
    }
}
