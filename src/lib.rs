//! journal-rs: markdown content engine for a personal journal site
//!
//! Reads frontmatter-bearing markdown from disk, validates the metadata,
//! compiles bodies to HTML (syntax highlighting, heading anchors, image-path
//! rewriting) and exposes sorted/filtered collections of journal entries and
//! static pages to the route layer in `server`.

pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod server;

use std::path::{Path, PathBuf};

use error::ContentError;

/// The site: resolved configuration and content directories.
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory served under `/content` (entry media lives here)
    pub content_dir: PathBuf,
    /// Journal root: one subdirectory per entry, each with an `index.md`
    pub journal_dir: PathBuf,
    /// Pages root: one `<slug>.md` per static page
    pub pages_dir: PathBuf,
}

impl Site {
    /// Create a site from a base directory, loading `_config.yml` when
    /// present and falling back to defaults otherwise.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, ContentError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let journal_dir = content_dir.join("journal");
        let pages_dir = content_dir.join("pages");

        Ok(Self {
            config,
            base_dir,
            content_dir,
            journal_dir,
            pages_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_resolves_content_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();
        assert_eq!(site.journal_dir, tmp.path().join("static/content/journal"));
        assert_eq!(site.pages_dir, tmp.path().join("static/content/pages"));
    }

    #[test]
    fn test_site_honors_config_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("_config.yml"), "content_dir: content\n").unwrap();
        let site = Site::new(tmp.path()).unwrap();
        assert_eq!(site.journal_dir, tmp.path().join("content/journal"));
    }
}
