//! Session configuration
//!
//! Loaded from TOML. Every key is optional; unknown keys are rejected so a
//! misspelt option fails loudly instead of silently taking its default.

use std::path::Path;

use livetree_core::logging_facility::{self, Profile};
use livetree_core::{LiveTreeError, PathCasing, Result};
use serde::{Deserialize, Serialize};

/// Path comparison rule for document paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasingSetting {
    /// Follow the platform: insensitive on Windows and macOS
    #[default]
    Auto,
    Sensitive,
    Insensitive,
}

impl CasingSetting {
    pub fn resolve(self) -> PathCasing {
        match self {
            CasingSetting::Auto => PathCasing::platform(),
            CasingSetting::Sensitive => PathCasing::Sensitive,
            CasingSetting::Insensitive => PathCasing::Insensitive,
        }
    }
}

/// Behaviour switches for one inspector session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Owner id the tree publishes outbound selections under
    pub tree_owner: String,
    pub path_casing: CasingSetting,
    /// Maintain and consult the per-document line index
    pub spatial_index: bool,
    /// Retry descriptor resolution against other associated documents
    pub cross_document_retry: bool,
    /// Expand collapsed ancestors when an inbound selection is applied
    pub expand_on_sync: bool,
    /// Drop a filter that hides an inbound selection target
    pub clear_filter_on_sync: bool,
    pub log_profile: Profile,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tree_owner: "inspector-tree".to_string(),
            path_casing: CasingSetting::Auto,
            spatial_index: true,
            cross_document_retry: true,
            expand_on_sync: true,
            clear_filter_on_sync: true,
            log_profile: Profile::Development,
        }
    }
}

impl SyncConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed TOML, unknown keys, or a blank
    /// `tree_owner`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SyncConfig =
            toml::from_str(text).map_err(|e| LiveTreeError::InvalidConfig {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `InvalidConfig` if it does
    /// not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            component = module_path!(),
            path = %path.display(),
            tree_owner = config.tree_owner.as_str(),
            "sync config loaded"
        );
        Ok(config)
    }

    /// Install the global log subscriber for `log_profile`
    pub fn init_logging(&self) {
        logging_facility::init(self.log_profile);
    }

    pub fn casing(&self) -> PathCasing {
        self.path_casing.resolve()
    }

    fn validate(&self) -> Result<()> {
        if self.tree_owner.trim().is_empty() {
            return Err(LiveTreeError::InvalidConfig {
                reason: "tree_owner must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_takes_defaults() {
        let config = SyncConfig::from_toml_str("").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.tree_owner, "inspector-tree");
    }

    #[test]
    fn test_partial_document_overrides() {
        let config = SyncConfig::from_toml_str(
            r#"
            tree_owner = "tree"
            path_casing = "insensitive"
            spatial_index = false
            log_profile = "production"
            "#,
        )
        .unwrap();

        assert_eq!(config.tree_owner, "tree");
        assert_eq!(config.casing(), PathCasing::Insensitive);
        assert!(!config.spatial_index);
        assert!(config.cross_document_retry);
        assert_eq!(config.log_profile, Profile::Production);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = SyncConfig::from_toml_str("spatial_idx = true").unwrap_err();
        assert!(matches!(err, LiveTreeError::InvalidConfig { .. }));
    }

    #[test]
    fn test_blank_owner_rejected() {
        let err = SyncConfig::from_toml_str("tree_owner = \"  \"").unwrap_err();
        assert!(matches!(err, LiveTreeError::InvalidConfig { .. }));
    }
}
