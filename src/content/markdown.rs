//! Markdown rendering
//!
//! The full pipeline turns an entry or page body into HTML through a fixed
//! sequence of stages over the parsed event stream: rewrite relative image
//! paths under the content slug, give every heading a unique self-linked
//! anchor, then syntax-highlight fenced code blocks. Each stage is a plain
//! `Vec<Event> -> Vec<Event>` transform so it can be tested on its own.
//!
//! A second, minimal pipeline (parse and serialize only) exists for short
//! free-text fields such as deprecation notes.

use std::collections::HashMap;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::html::{append_highlighted_html_for_styled_line, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Fixed light theme used when none is configured.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Copy-to-clipboard affordance attached to every code block. Visibility on
/// hover and the 3000ms feedback window are driven by the site's CSS/JS off
/// these data attributes.
const COPY_BUTTON: &str = r#"<button type="button" class="copy-button" data-visibility="hover" data-feedback-duration="3000" aria-label="Copy code">Copy</button>"#;

/// Markdown renderer with syntax highlighting.
///
/// Construction loads syntect's syntax and theme sets, which is expensive;
/// build one renderer and share it.
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer with the default light theme.
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Create with a specific highlight theme.
    pub fn with_theme(theme: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
        }
    }

    /// Render an entry or page body to HTML under the given content slug.
    ///
    /// Raw embedded HTML passes through unescaped. Rendering never fails:
    /// the parser is permissive and highlighter errors degrade to escaped
    /// plain text.
    pub fn render(&self, markdown: &str, slug: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES;

        let events: Vec<Event> = Parser::new_ext(markdown, options).collect();
        let events = rewrite_image_paths(events, slug);
        let events = anchor_headings(events);
        let events = self.highlight_code_blocks(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Render a short free-text field (e.g. a deprecation note) to HTML.
    ///
    /// No image rewriting, heading anchors or highlighting.
    pub fn render_note(&self, markdown: &str) -> String {
        let mut html_output = String::new();
        html::push_html(&mut html_output, Parser::new(markdown));
        html_output
    }

    /// Replace fenced code blocks with pre-highlighted HTML.
    fn highlight_code_blocks<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        // (language, buffered code text) while inside a code block
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let highlighted = self.highlight_block(&code, lang.as_deref());
                        out.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                other => out.push(other),
            }
        }

        out
    }

    /// Highlight one code block, without the theme's background color so the
    /// site's CSS controls it.
    fn highlight_block(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .unwrap_or_else(|| {
                self.theme_set
                    .themes
                    .values()
                    .next()
                    .expect("No themes available")
            });

        let mut output = format!(r#"<figure class="code-block" data-language="{lang}">"#);
        output.push_str(COPY_BUTTON);
        output.push_str(&format!(r#"<pre><code class="language-{lang}">"#));

        let mut highlighter = HighlightLines::new(syntax, theme);
        for line in LinesWithEndings::from(code) {
            let highlighted = highlighter
                .highlight_line(line, &self.syntax_set)
                .ok()
                .and_then(|regions| {
                    let mut buf = String::new();
                    append_highlighted_html_for_styled_line(
                        &regions,
                        IncludeBackground::No,
                        &mut buf,
                    )
                    .ok()
                    .map(|_| buf)
                });
            match highlighted {
                Some(html_line) => output.push_str(&html_line),
                // Fallback to plain escaped text
                None => output.push_str(&html_escape(line)),
            }
        }

        output.push_str("</code></pre></figure>");
        output
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite relative image URLs under the content slug.
///
/// `./media/img.png` compiled under slug `foo` becomes
/// `/content/journal/foo/media/img.png`, with path separators normalized to
/// forward slashes. URLs starting with `/` or a scheme are left untouched.
fn rewrite_image_paths<'a>(events: Vec<Event<'a>>, slug: &str) -> Vec<Event<'a>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = match dest_url.strip_prefix("./") {
                    Some(rest) => {
                        let rewritten =
                            format!("/content/journal/{slug}/{rest}").replace('\\', "/");
                        CowStr::from(rewritten)
                    }
                    None => dest_url,
                };
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                })
            }
            other => other,
        })
        .collect()
}

/// Give every heading a unique, stable, URL-safe id and wrap its content in
/// a self-link anchor pointing at that id.
fn anchor_headings(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    // Start tag plus buffered inner events while inside a heading
    let mut heading: Option<(Tag, Vec<Event>)> = None;

    for event in events {
        match event {
            Event::Start(tag @ Tag::Heading { .. }) => {
                heading = Some((tag, Vec::new()));
            }
            Event::End(TagEnd::Heading(level)) => {
                let Some((tag, inner)) = heading.take() else {
                    out.push(Event::End(TagEnd::Heading(level)));
                    continue;
                };
                let heading_slug = unique_slug(&plain_text(&inner), &mut seen);

                if let Tag::Heading {
                    level,
                    classes,
                    attrs,
                    ..
                } = tag
                {
                    out.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(CowStr::from(heading_slug.clone())),
                        classes,
                        attrs,
                    }));
                }
                out.push(Event::Start(Tag::Link {
                    link_type: LinkType::Inline,
                    dest_url: CowStr::from(format!("#{heading_slug}")),
                    title: CowStr::Borrowed(""),
                    id: CowStr::Borrowed(""),
                }));
                out.extend(inner);
                out.push(Event::End(TagEnd::Link));
                out.push(Event::End(TagEnd::Heading(level)));
            }
            other => match heading.as_mut() {
                Some((_, inner)) => inner.push(other),
                None => out.push(other),
            },
        }
    }

    out
}

/// Concatenated text content of buffered inline events.
fn plain_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

/// Slugify heading text, suffixing duplicates with `-1`, `-2`, ...
fn unique_slug(text: &str, seen: &mut HashMap<String, usize>) -> String {
    let base = slug::slugify(text);
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };

    match seen.get_mut(&base) {
        Some(count) => {
            *count += 1;
            format!("{base}-{count}")
        }
        None => {
            seen.insert(base.clone(), 0);
            base
        }
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
