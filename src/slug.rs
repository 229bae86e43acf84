//! Turns human-readable labels into slugs. There are two flavors:
//! [`normalize`] produces the key under which tags and categories are
//! counted, and [`title_slug`] produces file names for new posts.

/// Normalizes a tag or category label: trims it, lowercases it, and collapses
/// every run of interior whitespace into a single `-`. Normalizing an already
/// normalized label is a no-op.
pub fn normalize(label: &str) -> String {
    hyphenate(&label.trim().to_lowercase())
}

/// Converts a post title into a slug suitable for a file name. Unlike
/// [`normalize`], punctuation and symbols are dropped entirely; letters from
/// any script (e.g., CJK) and digits are kept.
pub fn title_slug(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    hyphenate(cleaned.trim())
}

// Replaces each whitespace run in `s` with one hyphen.
fn hyphenate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_whitespace = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Astro"), "astro");
        assert_eq!(normalize("  Rust  Lang "), "rust-lang");
        assert_eq!(normalize("a\t\n b"), "a-b");
        assert_eq!(normalize("already-slugged"), "already-slugged");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in &["Web Dev", " MixedCase  Words\t", "中文 标签", "x--y", ""] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_title_slug() {
        assert_eq!(title_slug("Hello, World 你好!"), "hello-world-你好");
        assert_eq!(title_slug("  My   First-Post  "), "my-first-post");
        assert_eq!(title_slug("?!"), "");
    }
}
