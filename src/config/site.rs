//! Site configuration (_config.yml)

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // URL
    pub url: String,

    // Directory holding journal/ and pages/ roots
    pub content_dir: String,

    // Code highlighting
    pub highlight: HighlightConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Journal".to_string(),
            description: String::new(),
            author: String::new(),
            url: "http://localhost:4000".to_string(),
            content_dir: "static/content".to_string(),
            highlight: HighlightConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
        serde_yaml::from_str(&content).map_err(|e| ContentError::Config {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// syntect theme name; a light theme so the site's CSS owns backgrounds
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: crate::content::DEFAULT_THEME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.content_dir, "static/content");
        assert_eq!(config.highlight.theme, "InspiredGitHub");
    }

    #[test]
    fn test_load_partial_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("_config.yml");
        std::fs::write(&path, "title: My Corner\ncontent_dir: content\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "My Corner");
        assert_eq!(config.content_dir, "content");
        // Unspecified fields fall back to defaults
        assert_eq!(config.highlight.theme, "InspiredGitHub");
    }

    #[test]
    fn test_load_invalid_yaml_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("_config.yml");
        std::fs::write(&path, "title: [unclosed\n").unwrap();

        let err = SiteConfig::load(&path).unwrap_err();
        assert!(matches!(err, ContentError::Config { .. }));
    }
}
