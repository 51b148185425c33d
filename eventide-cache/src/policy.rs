//! Key-to-policy resolution.

use eventide_core::{CacheConfig, CachePolicy, PolicyRule};

/// Maps cache keys to their [`CachePolicy`].
///
/// Rules are checked in configuration order and the first whose prefix
/// the key starts with wins. Keys matching nothing get the default policy.
#[derive(Clone, Debug)]
pub struct PolicyResolver {
    rules: Vec<PolicyRule>,
    default_policy: CachePolicy,
}

impl PolicyResolver {
    /// Creates a resolver from ordered rules and a fallback policy.
    pub fn new(rules: Vec<PolicyRule>, default_policy: CachePolicy) -> Self {
        Self {
            rules,
            default_policy,
        }
    }

    /// Creates a resolver from the rules of a configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.rules.clone(), config.default_policy)
    }

    /// Returns the policy for `key`.
    pub fn resolve(&self, key: &str) -> CachePolicy {
        self.rules
            .iter()
            .find(|rule| rule.matches(key))
            .map_or(self.default_policy, |rule| rule.policy)
    }

    /// Configured rules, in match order.
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Policy for keys no rule matches.
    pub fn default_policy(&self) -> CachePolicy {
        self.default_policy
    }
}

impl Default for PolicyResolver {
    fn default() -> Self {
        Self::new(Vec::new(), CachePolicy::default())
    }
}
