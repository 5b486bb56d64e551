//! # Simple Blog
//!
//! A minimal static site generator for a single-author blog. Posts are
//! Markdown files named `YYYY-MM-DD_Title.md`, optionally opening with a JSON
//! front-matter object; templates and pages use minijinja; stylesheets are
//! bundled and minified with lightningcss.
//!
//! # Architecture: One Build Graph
//!
//! A build is a single run of a fixed dependency graph (see [`pipeline`]):
//!
//! ```text
//! config → input dirs → output dirs → { styles, scripts, posts + templates }
//!                                        → rendered posts, rendered pages
//!                                        → files in the output tree
//! ```
//!
//! Independent branches run concurrently on the rayon pool. The first failure
//! stops every stage that hasn't started yet and becomes the build's error.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.json` loading, merging onto stock defaults, validation, build modes |
//! | [`naming`] | `YYYY-MM-DD_Title` file name parsing and URL-safe output names |
//! | [`frontmatter`] | Splitting a leading JSON object off a post |
//! | [`markdown`] | Markdown to HTML with syntax-highlighted code fences |
//! | [`scan`] | Loading posts and scripts from the input tree |
//! | [`templates`] | Template loading, the `post` template, page rendering |
//! | [`styles`] | Stylesheet bundling and minification |
//! | [`prepare`] | Resolving and creating input/output directories |
//! | [`files`] | Flat directory reads and parallel writes |
//! | [`types`] | Records passed between stages |
//! | [`pipeline`] | The build graph, progress events, and failure handling |
//! | [`output`] | CLI formatting of progress events and the build summary |
//!
//! # Design Decisions
//!
//! ## Settings Are Passed, Not Global
//!
//! The loaded config and command-line modes become one immutable
//! [`config::BuildSettings`] that is handed to every stage explicitly. Nothing
//! reads configuration from process-wide state, so tests can run many builds
//! side by side.
//!
//! ## Posts Render In Two Steps
//!
//! The loader produces [`types::Post`] with the Markdown body as HTML; the
//! `post` template then produces a [`types::RenderedPost`]. Page templates see
//! the loaded posts plus the posts link directory as `posts_dir`, never the
//! full rendered pages.

pub mod config;
pub mod files;
pub mod frontmatter;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod prepare;
pub mod scan;
pub mod styles;
pub mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
