//! Aggregates tag and category counts over a collection of [`PostRecord`]s.
//! This is what the tag and category listing pages are built from.
//!
//! Aggregation is a pure function of its input. Counts are keyed by the
//! normalized label (see [`crate::slug::normalize`]), so `Astro`, `astro`,
//! and ` ASTRO ` all land on the same tag. Each post contributes at most one
//! category; the display name of a category is the trimmed spelling of the
//! first post that used it.

use crate::post::PostRecord;
use crate::slug::normalize;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tracing::error;

/// A normalized tag and the number of posts' tag entries that map to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// A category, its display name, and the number of posts filed under it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// The normalized category, used as its key and in URLs.
    pub slug: String,

    /// The trimmed, original-case name of the first post filed under this
    /// slug.
    pub name: String,

    pub count: usize,
}

/// The result of aggregating a set of posts. `tags` is sorted by tag and
/// `categories` by display name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub tags: Vec<TagCount>,
    pub categories: Vec<CategorySummary>,
}

impl Aggregate {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.categories.is_empty()
    }
}

/// Aggregates `posts`, falling back to an empty [`Aggregate`] if aggregation
/// fails. Failures are logged rather than returned so that a listing page
/// can always be rendered. Use [`try_aggregate`] to handle them yourself.
pub fn aggregate(posts: &[PostRecord]) -> Aggregate {
    or_empty(try_aggregate(posts), posts.len())
}

fn or_empty(result: Result<Aggregate>, posts: usize) -> Aggregate {
    match result {
        Ok(aggregate) => aggregate,
        Err(err) => {
            error!(error = %err, posts, "aggregating content");
            Aggregate::default()
        }
    }
}

/// Aggregates `posts` into sorted tag counts and category summaries.
pub fn try_aggregate(posts: &[PostRecord]) -> Result<Aggregate> {
    let mut tag_counts: HashMap<String, usize> = HashMap::new();
    let mut category_counts: HashMap<String, CategorySummary> = HashMap::new();

    for post in posts {
        for tag in post.tags.iter().flatten() {
            let tag = normalize(tag);
            if tag.is_empty() {
                continue;
            }
            match tag_counts.get_mut(&tag) {
                Some(count) => *count = increment(*count, &tag)?,
                None => {
                    tag_counts.insert(tag, 1);
                }
            }
        }

        if let Some(name) = post.category_name() {
            let slug = normalize(name);
            match category_counts.get_mut(&slug) {
                Some(summary) => {
                    summary.count = increment(summary.count, &slug)?;
                }
                None => {
                    category_counts.insert(
                        slug.clone(),
                        CategorySummary {
                            slug,
                            name: name.to_owned(),
                            count: 1,
                        },
                    );
                }
            }
        }
    }

    let mut tags: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    tags.sort_by(|a, b| collate(&a.tag, &b.tag));

    let mut categories: Vec<CategorySummary> = category_counts.into_values().collect();
    categories.sort_by(|a, b| collate(&a.name, &b.name).then_with(|| a.slug.cmp(&b.slug)));

    Ok(Aggregate { tags, categories })
}

fn increment(count: usize, key: &str) -> Result<usize> {
    count
        .checked_add(1)
        .ok_or_else(|| Error::CountOverflow(key.to_owned()))
}

/// Compares the lowercased labels by Unicode code point, then orders
/// lowercase before uppercase when they tie. No locale rules apply, so
/// `"1a"` sorts before `"_a"` and `"Économie"` after `"zoo"`.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// The result of a fallible aggregation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to aggregate posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when a count no longer fits in a `usize`. Carries the key
    /// being counted.
    CountOverflow(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CountOverflow(key) => write!(f, "count overflow for `{}`", key),
        }
    }
}

impl std::error::Error for Error {}
