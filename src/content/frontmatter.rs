//! Front-matter splitting
//!
//! Splits the leading `---` delimited YAML block from the markdown body.
//! Interpreting the block is the validator's job; this module only finds it.

/// Split content into `(frontmatter, body)`.
///
/// Returns `None` for the frontmatter when the content does not open with a
/// `---` fence or the fence is never closed; the whole input is then body.
pub fn split(content: &str) -> (Option<&str>, &str) {
    let trimmed = content.trim_start();

    let Some(rest) = trimmed.strip_prefix("---") else {
        return (None, content);
    };

    // The opening fence must be a full line.
    let rest = match rest.strip_prefix('\n') {
        Some(rest) => rest,
        None => match rest.strip_prefix("\r\n") {
            Some(rest) => rest,
            None => return (None, content),
        },
    };

    if let Some(end_pos) = rest.find("\n---") {
        let matter = &rest[..end_pos];
        let body = &rest[end_pos + 4..];
        let body = body.trim_start_matches(['\n', '\r']);
        (Some(matter), body)
    } else {
        // No closing fence, treat as no front-matter
        (None, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let content = "---\ntitle: Hello\ndate: 2024-01-15\n---\n\nBody text.\n";
        let (matter, body) = split(content);
        assert_eq!(matter, Some("title: Hello\ndate: 2024-01-15"));
        assert_eq!(body, "Body text.\n");
    }

    #[test]
    fn test_split_no_frontmatter() {
        let content = "Just some markdown.\n";
        let (matter, body) = split(content);
        assert_eq!(matter, None);
        assert_eq!(body, content);
    }

    #[test]
    fn test_split_unterminated_block() {
        let content = "---\ntitle: Hello\n\nBody without closing fence.\n";
        let (matter, body) = split(content);
        assert_eq!(matter, None);
        assert_eq!(body, content);
    }

    #[test]
    fn test_split_empty_block() {
        let content = "---\n---\nBody.\n";
        let (matter, body) = split(content);
        assert_eq!(matter, Some(""));
        assert_eq!(body, "Body.\n");
    }

    #[test]
    fn test_split_inline_dashes_are_not_a_fence() {
        let content = "--- not a fence\ntext\n";
        let (matter, _) = split(content);
        assert_eq!(matter, None);
    }

    #[test]
    fn test_split_crlf() {
        let content = "---\r\ntitle: Hello\r\n---\r\nBody.\r\n";
        let (matter, body) = split(content);
        assert_eq!(matter, Some("title: Hello\r"));
        assert_eq!(body, "Body.\r\n");
    }
}
