//! Filesystem-safe slugs for exported file names

use std::collections::HashSet;

/// Slug used when a title has no alphanumeric characters at all
pub const FALLBACK_SLUG: &str = "untitled";

/// Generate a filesystem-safe slug from a title.
///
/// Lowercases the text, collapses every run of non-alphanumeric characters
/// into a single hyphen, and trims leading/trailing hyphens. Letters outside
/// ASCII are kept.
///
/// # Examples
///
/// ```
/// use gdocmd_core::slug::slugify;
///
/// assert_eq!(slugify("Q1 2026: Rocks & Goals"), "q1-2026-rocks-goals");
/// assert_eq!(slugify("  --Hello--  "), "hello");
/// assert_eq!(slugify("???"), "untitled");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Hands out unique slugs, suffixing `-2`, `-3`, ... on collision
#[derive(Debug, Default)]
pub struct SlugAllocator {
    used: HashSet<String>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slug for `title`, disambiguating against earlier ones
    pub fn allocate(&mut self, title: &str) -> String {
        self.allocate_slug(slugify(title))
    }

    /// Reserve an already-computed slug
    pub fn allocate_slug(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
