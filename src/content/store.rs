//! Content store - scans, compiles and caches journal entries and pages
//!
//! The store is the explicit cache object: journal entries are compiled at
//! most once per store and served from memory thereafter, so a fresh store is
//! a fresh cache (tests construct a new store instead of restarting the
//! process). Pages are never cached and re-read on every call.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

use super::frontmatter;
use super::markdown::MarkdownRenderer;
use super::metadata::{JournalEntryMetadata, PageMetadata};
use super::model::{JournalEntry, Page};
use crate::error::ContentError;
use crate::Site;

/// Scans and compiles content, caching journal entries for its lifetime.
pub struct ContentStore {
    journal_dir: PathBuf,
    pages_dir: PathBuf,
    renderer: Arc<MarkdownRenderer>,
    entries: OnceCell<Vec<JournalEntry>>,
    slug_index: OnceCell<HashMap<String, usize>>,
}

impl ContentStore {
    /// Create a store for a site's content directories.
    pub fn new(site: &Site) -> Self {
        Self::from_dirs_with_renderer(
            site.journal_dir.clone(),
            site.pages_dir.clone(),
            Arc::new(MarkdownRenderer::with_theme(&site.config.highlight.theme)),
        )
    }

    /// Create a store over explicit directories with the default renderer.
    pub fn from_dirs(journal_dir: PathBuf, pages_dir: PathBuf) -> Self {
        Self::from_dirs_with_renderer(journal_dir, pages_dir, Arc::new(MarkdownRenderer::new()))
    }

    fn from_dirs_with_renderer(
        journal_dir: PathBuf,
        pages_dir: PathBuf,
        renderer: Arc<MarkdownRenderer>,
    ) -> Self {
        Self {
            journal_dir,
            pages_dir,
            renderer,
            entries: OnceCell::new(),
            slug_index: OnceCell::new(),
        }
    }

    /// All non-archived entries: pinned first, then descending by date.
    pub async fn published_entries(&self) -> Result<Vec<JournalEntry>, ContentError> {
        let mut entries: Vec<JournalEntry> = self
            .all_entries()
            .await?
            .iter()
            .filter(|e| !e.metadata.archived)
            .cloned()
            .collect();
        entries.sort_by(|a, b| match (a.metadata.pinned, b.metadata.pinned) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b.metadata.date.cmp(&a.metadata.date),
        });
        Ok(entries)
    }

    /// All archived entries, descending by date.
    pub async fn archived_entries(&self) -> Result<Vec<JournalEntry>, ContentError> {
        let mut entries: Vec<JournalEntry> = self
            .all_entries()
            .await?
            .iter()
            .filter(|e| e.metadata.archived)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.metadata.date.cmp(&a.metadata.date));
        Ok(entries)
    }

    /// Exact-match lookup by slug. Absence is `Ok(None)`, not an error.
    pub async fn entry_by_slug(&self, slug: &str) -> Result<Option<JournalEntry>, ContentError> {
        let index = self.slug_index().await?;
        let entries = self.all_entries().await?;
        Ok(index.get(slug).map(|&i| entries[i].clone()))
    }

    /// Read and compile a static page. Uncached: every call re-reads disk,
    /// so on-disk edits are visible immediately. Absence is `Ok(None)`.
    pub async fn page(&self, slug: &str) -> Result<Option<Page>, ContentError> {
        // A path parameter must stay inside the pages root.
        if slug.contains('/') || slug.contains('\\') || slug.contains("..") {
            return Ok(None);
        }

        let path = self.pages_dir.join(format!("{slug}.md"));
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ContentError::io(&path, e)),
        };

        let (matter, body) = frontmatter::split(&raw);
        let metadata = PageMetadata::parse(matter.unwrap_or(""))?;
        let content_html = self.renderer.render(body, slug);

        Ok(Some(Page {
            metadata,
            content_html,
        }))
    }

    /// The cached journal collection, compiled on first access.
    async fn all_entries(&self) -> Result<&[JournalEntry], ContentError> {
        self.entries
            .get_or_try_init(|| self.load_entries())
            .await
            .map(Vec::as_slice)
    }

    /// Slug-to-entry index, built lazily from the entry cache.
    async fn slug_index(&self) -> Result<&HashMap<String, usize>, ContentError> {
        self.slug_index
            .get_or_try_init(|| async {
                let entries = self.all_entries().await?;
                Ok(entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| (e.slug.clone(), i))
                    .collect())
            })
            .await
    }

    /// Scan the journal root and compile every qualifying entry concurrently.
    ///
    /// A subdirectory qualifies iff it contains an `index.md`; files, empty
    /// directories and directories without one are silently skipped. A
    /// malformed entry is skipped with a warning rather than failing the
    /// whole collection. A missing journal root is an empty collection.
    async fn load_entries(&self) -> Result<Vec<JournalEntry>, ContentError> {
        let mut dir = match fs::read_dir(&self.journal_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ContentError::io(&self.journal_dir, e)),
        };

        let mut tasks = JoinSet::new();
        loop {
            let dirent = match dir.next_entry().await {
                Ok(Some(dirent)) => dirent,
                Ok(None) => break,
                Err(e) => return Err(ContentError::io(&self.journal_dir, e)),
            };

            match dirent.file_type().await {
                Ok(ft) if ft.is_dir() => {}
                _ => continue,
            }
            // The directory name is the slug
            let Some(slug) = dirent.file_name().to_str().map(String::from) else {
                continue;
            };

            let index_path = dirent.path().join("index.md");
            let renderer = Arc::clone(&self.renderer);
            tasks.spawn(async move {
                let compiled = compile_entry(&index_path, &slug, &renderer).await;
                (slug, compiled)
            });
        }

        let mut entries = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(Some(entry)))) => entries.push(entry),
                // Directory without an index.md
                Ok((_, Ok(None))) => {}
                Ok((slug, Err(e))) => {
                    tracing::warn!(slug = %slug, error = %e, "skipping journal entry");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "journal compile task failed");
                }
            }
        }

        tracing::debug!(count = entries.len(), "journal cache populated");
        Ok(entries)
    }
}

/// Compile one journal entry from its `index.md`.
async fn compile_entry(
    path: &Path,
    slug: &str,
    renderer: &MarkdownRenderer,
) -> Result<Option<JournalEntry>, ContentError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ContentError::io(path, e)),
    };

    let (matter, body) = frontmatter::split(&raw);
    let metadata = JournalEntryMetadata::parse(matter.unwrap_or(""))?;

    let content_html = renderer.render(body, slug);
    let deprecation_note_html = metadata
        .deprecation_note
        .as_deref()
        .map(|note| renderer.render_note(note));

    Ok(Some(JournalEntry {
        slug: slug.to_string(),
        metadata,
        content_html,
        deprecation_note_html,
        is_recently_updated: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn content_root() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let journal = tmp.path().join("journal");
        let pages = tmp.path().join("pages");
        std_fs::create_dir_all(&journal).unwrap();
        std_fs::create_dir_all(&pages).unwrap();
        (tmp, journal, pages)
    }

    fn write_entry(journal: &Path, slug: &str, matter: &str, body: &str) {
        let dir = journal.join(slug);
        std_fs::create_dir_all(&dir).unwrap();
        std_fs::write(dir.join("index.md"), format!("---\n{matter}---\n\n{body}\n")).unwrap();
    }

    fn minimal_matter(date: &str, pinned: bool, archived: bool) -> String {
        format!(
            "title: Entry\ndescription: A test entry\ndate: {date}\npinned: {pinned}\narchived: {archived}\n"
        )
    }

    #[tokio::test]
    async fn test_missing_journal_root_is_empty() {
        let (tmp, journal, pages) = content_root();
        std_fs::remove_dir_all(&journal).unwrap();
        let store = ContentStore::from_dirs(journal, pages);
        assert!(store.published_entries().await.unwrap().is_empty());
        assert!(store.archived_entries().await.unwrap().is_empty());
        drop(tmp);
    }

    #[tokio::test]
    async fn test_non_qualifying_children_are_skipped() {
        let (_tmp, journal, pages) = content_root();
        write_entry(&journal, "real", &minimal_matter("2024-01-01", false, false), "Body");
        // A stray file and a directory without index.md
        std_fs::write(journal.join("stray.md"), "not an entry").unwrap();
        std_fs::create_dir_all(journal.join("no-index")).unwrap();

        let store = ContentStore::from_dirs(journal, pages);
        let published = store.published_entries().await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "real");
        assert!(store.entry_by_slug("no-index").await.unwrap().is_none());
        assert!(store.entry_by_slug("stray").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_published_excludes_archived_and_vice_versa() {
        let (_tmp, journal, pages) = content_root();
        write_entry(&journal, "live", &minimal_matter("2024-01-01", false, false), "x");
        write_entry(&journal, "old", &minimal_matter("2023-01-01", false, true), "x");

        let store = ContentStore::from_dirs(journal, pages);
        let published = store.published_entries().await.unwrap();
        let archived = store.archived_entries().await.unwrap();
        assert!(published.iter().all(|e| !e.metadata.archived));
        assert!(archived.iter().all(|e| e.metadata.archived));
        assert_eq!(published.len(), 1);
        assert_eq!(archived.len(), 1);
    }

    #[tokio::test]
    async fn test_pinned_precedes_newer_unpinned() {
        let (_tmp, journal, pages) = content_root();
        write_entry(&journal, "pinned-old", &minimal_matter("2023-01-01", true, false), "x");
        write_entry(&journal, "newer", &minimal_matter("2024-06-01", false, false), "x");

        let store = ContentStore::from_dirs(journal, pages);
        let published = store.published_entries().await.unwrap();
        let slugs: Vec<&str> = published.iter().map(|e| e.slug.as_str()).collect();
        // Pin status dominates the sort key despite the later date
        assert_eq!(slugs, vec!["pinned-old", "newer"]);
    }

    #[tokio::test]
    async fn test_groups_sorted_descending_by_date() {
        let (_tmp, journal, pages) = content_root();
        write_entry(&journal, "a", &minimal_matter("2022-03-01", false, false), "x");
        write_entry(&journal, "b", &minimal_matter("2024-02-01", false, false), "x");
        write_entry(&journal, "c", &minimal_matter("2023-07-01", false, false), "x");
        write_entry(&journal, "arch-1", &minimal_matter("2021-01-01", false, true), "x");
        write_entry(&journal, "arch-2", &minimal_matter("2022-01-01", false, true), "x");

        let store = ContentStore::from_dirs(journal, pages);
        let published = store.published_entries().await.unwrap();
        let slugs: Vec<&str> = published.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "c", "a"]);

        let archived = store.archived_entries().await.unwrap();
        let slugs: Vec<&str> = archived.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["arch-2", "arch-1"]);
    }

    #[tokio::test]
    async fn test_entry_by_slug_absent_is_none() {
        let (_tmp, journal, pages) = content_root();
        write_entry(&journal, "here", &minimal_matter("2024-01-01", false, false), "x");

        let store = ContentStore::from_dirs(journal, pages);
        assert!(store.entry_by_slug("here").await.unwrap().is_some());
        assert!(store.entry_by_slug("missing-slug").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_journal_cache_survives_disk_edits() {
        let (_tmp, journal, pages) = content_root();
        write_entry(&journal, "entry", &minimal_matter("2024-01-01", false, false), "original");

        let store = ContentStore::from_dirs(journal.clone(), pages);
        let first = store.published_entries().await.unwrap();
        assert!(first[0].content_html.contains("original"));

        write_entry(&journal, "entry", &minimal_matter("2024-01-01", false, false), "edited");
        let second = store.published_entries().await.unwrap();
        assert!(second[0].content_html.contains("original"));
        assert!(!second[0].content_html.contains("edited"));
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped_not_fatal() {
        let (_tmp, journal, pages) = content_root();
        write_entry(&journal, "good", &minimal_matter("2024-01-01", false, false), "x");
        write_entry(&journal, "bad", "title: Broken\n", "x");

        let store = ContentStore::from_dirs(journal, pages);
        let published = store.published_entries().await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "good");
        assert!(store.entry_by_slug("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deprecation_note_compiled() {
        let (_tmp, journal, pages) = content_root();
        let matter = format!(
            "{}deprecated: true\ndeprecation_note: \"See the *new* version\"\n",
            minimal_matter("2024-01-01", false, false)
        );
        write_entry(&journal, "dep", &matter, "x");

        let store = ContentStore::from_dirs(journal, pages);
        let entry = store.entry_by_slug("dep").await.unwrap().unwrap();
        assert!(entry.metadata.deprecated);
        let note = entry.deprecation_note_html.unwrap();
        assert!(note.contains("<em>new</em>"));
    }

    #[tokio::test]
    async fn test_entry_images_rewritten_under_slug() {
        let (_tmp, journal, pages) = content_root();
        write_entry(
            &journal,
            "photos",
            &minimal_matter("2024-01-01", false, false),
            "![shot](./media/shot.jpg)",
        );

        let store = ContentStore::from_dirs(journal, pages);
        let entry = store.entry_by_slug("photos").await.unwrap().unwrap();
        assert!(entry
            .content_html
            .contains(r#"src="/content/journal/photos/media/shot.jpg""#));
    }

    #[tokio::test]
    async fn test_page_absent_is_none() {
        let (_tmp, journal, pages) = content_root();
        let store = ContentStore::from_dirs(journal, pages);
        assert!(store.page("missing-slug").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_page_rereads_on_every_call() {
        let (_tmp, journal, pages) = content_root();
        std_fs::write(pages.join("about.md"), "---\ntitle: About\n---\n\nfirst\n").unwrap();

        let store = ContentStore::from_dirs(journal, pages.clone());
        let first = store.page("about").await.unwrap().unwrap();
        assert_eq!(first.metadata.title, "About");
        assert!(first.content_html.contains("first"));

        std_fs::write(pages.join("about.md"), "---\ntitle: About\n---\n\nsecond\n").unwrap();
        let second = store.page("about").await.unwrap().unwrap();
        assert!(second.content_html.contains("second"));
    }

    #[tokio::test]
    async fn test_page_with_invalid_metadata_is_an_error() {
        let (_tmp, journal, pages) = content_root();
        std_fs::write(pages.join("broken.md"), "body without frontmatter\n").unwrap();

        let store = ContentStore::from_dirs(journal, pages);
        let err = store.page("broken").await.unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_page_slug_cannot_escape_pages_root() {
        let (_tmp, journal, pages) = content_root();
        let store = ContentStore::from_dirs(journal, pages);
        assert!(store.page("../secret").await.unwrap().is_none());
        assert!(store.page("..").await.unwrap().is_none());
    }
}
