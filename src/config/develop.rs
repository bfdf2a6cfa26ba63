//! `[develop]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[develop]` section in folio.toml, used by `folio develop`.
///
/// ```toml
/// [develop]
/// debounce_ms = 500
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct DevelopConfig {
    /// Quiet period before a burst of file changes triggers a rebuild.
    #[serde(default = "defaults::develop::debounce_ms")]
    #[educe(Default = defaults::develop::debounce_ms())]
    pub debounce_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_develop_config() {
        let config: SiteConfig = toml::from_str("[develop]\ndebounce_ms = 50\n").unwrap();
        assert_eq!(config.develop.debounce_ms, 50);

        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.develop.debounce_ms, 300);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str("[develop]\nport = 8080\n");
        assert!(result.is_err());
    }
}
