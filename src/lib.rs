//! The library code for the `taxon` blog tool. It has two jobs:
//!
//! 1. Summarizing the tags and categories of a blog's posts
//!    ([`crate::aggregate`])
//! 2. Scaffolding new posts ([`crate::scaffold`])
//!
//! The first is the heart of the crate. Post metadata is loaded from the
//! YAML frontmatter of Markdown files ([`crate::parser`]), validated into
//! [`post::PostRecord`]s ([`crate::post`]), and aggregated into tag counts
//! and category summaries keyed by their slugs ([`crate::slug`]). The result
//! is then rendered for listing pages ([`crate::render`]).
//!
//! Aggregation is a pure function of its input: it neither mutates the posts
//! nor keeps any state between calls, and a failure degrades to an empty
//! result rather than breaking the page that consumes it.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod aggregate;
pub mod config;
pub mod parser;
pub mod post;
pub mod render;
pub mod scaffold;
pub mod slug;
pub mod value;
