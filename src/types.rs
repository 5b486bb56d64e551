//! Shared records passed between pipeline stages.
//!
//! Posts go through two stages: [`Post::body`] holds the Markdown-rendered
//! HTML produced by the loader, and [`RenderedPost::html`] the full page once
//! the `post` template has been applied. The two never share a field.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// One Markdown source document after loading.
///
/// Serialized into template contexts as `post` (and as items of `posts`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Source file path.
    pub path: PathBuf,
    /// Source file name, extension included.
    pub file_name: String,
    /// Front-matter fields; `None` when the file had no front-matter.
    pub meta: Option<Map<String, Value>>,
    /// Markdown body rendered to HTML.
    pub body: String,
    /// Text after the first underscore in the base name.
    pub title: String,
    /// Publish date from the base name, `None` if it didn't parse.
    pub date: Option<NaiveDate>,
    /// URL-safe output file name (`*.html`).
    pub url_name: String,
    /// Published link: posts link directory joined with `url_name`.
    pub url: String,
}

/// A post with its full-page HTML.
#[derive(Debug, Clone)]
pub struct RenderedPost<'a> {
    pub post: &'a Post,
    pub html: String,
}

/// A rendered site page (index, archive, about, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Output file name: page source stem + `.html`.
    pub name: String,
    pub html: String,
}

/// Final CSS for one configured stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    pub name: String,
    pub css: String,
}

/// A static script copied through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFile {
    pub name: String,
    pub data: String,
}

/// Anything the writer can put on disk.
pub trait OutputFile: Sync {
    fn file_name(&self) -> &str;
    fn contents(&self) -> &str;
}

impl OutputFile for RenderedPost<'_> {
    fn file_name(&self) -> &str {
        &self.post.url_name
    }
    fn contents(&self) -> &str {
        &self.html
    }
}

impl OutputFile for Page {
    fn file_name(&self) -> &str {
        &self.name
    }
    fn contents(&self) -> &str {
        &self.html
    }
}

impl OutputFile for Stylesheet {
    fn file_name(&self) -> &str {
        &self.name
    }
    fn contents(&self) -> &str {
        &self.css
    }
}

impl OutputFile for ScriptFile {
    fn file_name(&self) -> &str {
        &self.name
    }
    fn contents(&self) -> &str {
        &self.data
    }
}
