//! Configuration for the synchronization layer.
//!
//! Every field has a default matching the stock "My Top-10 Styles" node
//! family, so an empty TOML document is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::ControllerKind;
use crate::error::{SyncError, SyncResult};

/// Node class names that select a controller kind.
///
/// A node matches when the first whitespace-separated token of its class
/// equals one of these names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    /// Chained style nodes with a channel ("My Top-10 Styles").
    pub styles: String,
    /// Standalone selector nodes.
    pub selector: String,
    /// Top-styles list editors (producers).
    pub editor: String,
    /// Nodes with a category combo that filters a style combo.
    pub category: Vec<String>,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            styles: "MyTop10Styles".to_string(),
            selector: "MyTop10StylesSelector".to_string(),
            editor: "MyTop10StylesEditor".to_string(),
            category: vec![
                "StylePromptEncoder".to_string(),
                "StyleStringInjector".to_string(),
            ],
        }
    }
}

/// Configuration for [`StyleSync`](crate::StyleSync).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum interval between poll rounds, in milliseconds.
    pub poll_period_ms: u64,

    /// Prefix identifying style widgets ("style_1", "style_2", ...).
    pub style_widget_prefix: String,

    /// Input socket linking a node to its chain predecessor.
    pub chain_input: String,

    /// Output socket linking a node to its chain successors.
    pub chain_output: String,

    /// Consumer input socket for the top-styles list.
    pub top_styles_input: String,

    /// Producer output socket for the top-styles list.
    pub top_styles_output: String,

    /// Widget holding the channel value ("custom_1" .. "custom_N").
    pub channel_widget: String,

    /// Number of valid channels.
    pub channel_count: u8,

    /// Label shown for empty or invalid style slots.
    pub placeholder_label: String,

    /// Initial label of selector style slots before any list arrives.
    pub selector_initial_label: String,

    /// Category combo of category controllers.
    pub category_widget: String,

    /// Style combo refilled by category controllers.
    pub category_style_widget: String,

    /// Class names per controller kind.
    pub classes: ClassNames,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 1000,
            style_widget_prefix: "style_".to_string(),
            chain_input: "input".to_string(),
            chain_output: "output".to_string(),
            top_styles_input: "top_styles".to_string(),
            top_styles_output: "TOP_STYLES".to_string(),
            channel_widget: "output_to".to_string(),
            channel_count: 4,
            placeholder_label: "-".to_string(),
            selector_initial_label: "\"Style Name\"".to_string(),
            category_widget: "category".to_string(),
            category_style_widget: "style".to_string(),
            classes: ClassNames::default(),
        }
    }
}

impl SyncConfig {
    /// Create a config for quick iteration (short poll period).
    pub fn fast() -> Self {
        Self {
            poll_period_ms: 100,
            ..Default::default()
        }
    }

    /// Create a config that polls rarely, for large graphs.
    pub fn relaxed() -> Self {
        Self {
            poll_period_ms: 5000,
            ..Default::default()
        }
    }

    /// Poll period as a [`Duration`].
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> SyncResult<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> SyncResult<()> {
        if self.channel_count == 0 {
            return Err(SyncError::InvalidConfig {
                message: "channel_count must be >= 1".to_string(),
            });
        }
        if self.style_widget_prefix.is_empty() {
            return Err(SyncError::InvalidConfig {
                message: "style_widget_prefix must not be empty".to_string(),
            });
        }
        if self.chain_input.is_empty() || self.chain_output.is_empty() {
            return Err(SyncError::InvalidConfig {
                message: "chain sockets must be named".to_string(),
            });
        }
        Ok(())
    }

    /// Controller kind for a node class, if any.
    pub fn kind_for_class(&self, class: &str) -> Option<ControllerKind> {
        let base = class.split_whitespace().next().unwrap_or("");
        let classes = &self.classes;
        if base == classes.styles {
            Some(ControllerKind::Styles)
        } else if base == classes.selector {
            Some(ControllerKind::Selector)
        } else if base == classes.editor {
            Some(ControllerKind::Editor)
        } else if classes.category.iter().any(|c| c == base) {
            Some(ControllerKind::Category)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.poll_period(), Duration::from_secs(1));
        assert_eq!(config.channel_count, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
poll_period_ms = 250
chain_input = "chain_in"

[classes]
styles = "MyTop5Styles"
"#;
        let config = SyncConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.poll_period(), Duration::from_millis(250));
        assert_eq!(config.chain_input, "chain_in");
        assert_eq!(config.chain_output, "output");
        assert_eq!(config.classes.styles, "MyTop5Styles");
        assert_eq!(config.classes.editor, "MyTop10StylesEditor");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = SyncConfig::from_toml_str("").unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn test_invalid_channel_count() {
        let err = SyncConfig::from_toml_str("channel_count = 0").unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SyncConfig::from_toml_str("poll_period_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, SyncError::ConfigParse(_)));
    }

    #[test]
    fn test_kind_for_class() {
        let config = SyncConfig::default();
        assert_eq!(
            config.kind_for_class("MyTop10Styles //ZImage"),
            Some(ControllerKind::Styles)
        );
        assert_eq!(
            config.kind_for_class("MyTop10StylesSelector //ZImage"),
            Some(ControllerKind::Selector)
        );
        assert_eq!(
            config.kind_for_class("MyTop10StylesEditor //ZImage"),
            Some(ControllerKind::Editor)
        );
        assert_eq!(
            config.kind_for_class("StylePromptEncoder //ZImage"),
            Some(ControllerKind::Category)
        );
        assert_eq!(config.kind_for_class("KSampler"), None);
    }

    #[test]
    fn test_presets() {
        assert!(SyncConfig::fast().poll_period() < SyncConfig::default().poll_period());
        assert!(SyncConfig::relaxed().poll_period() > SyncConfig::default().poll_period());
    }
}
