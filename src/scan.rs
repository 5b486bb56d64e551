//! Content loading for posts and scripts.
//!
//! ## Posts
//!
//! Every `.md` file directly inside the input `posts` directory becomes one
//! [`Post`]:
//!
//! ```text
//! src/posts/
//! ├── 2020-01-01_Hello World.md     # date 2020-01-01, title "Hello World"
//! └── 2021-03-14_Pi Day.md          # may open with {"description": ...}
//! ```
//!
//! A file starting with `{` has its JSON front-matter split off first; the
//! rest goes through the Markdown renderer. Name, date and URL come from the
//! file name (see [`crate::naming`]).
//!
//! ## Scripts
//!
//! `.js` files in the input `js` directory are passed through unchanged.

use crate::config::link_join;
use crate::files::{self, FileError, SourceFile};
use crate::frontmatter::{self, FrontmatterError};
use crate::markdown::{MarkdownError, MarkdownRenderer};
use crate::naming::parse_post_name;
use crate::types::{Post, ScriptFile};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error("bad front-matter in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },
    #[error("failed to render {path}: {source}")]
    Markdown {
        path: PathBuf,
        #[source]
        source: MarkdownError,
    },
}

/// Load and render every post in `dir`.
///
/// `posts_link_dir` is the published location posts are linked from; each
/// post's `url` is that joined with its URL name. Posts come back sorted by
/// file name. One bad post fails the whole load.
pub fn load_posts(
    dir: &Path,
    posts_link_dir: &str,
    markdown: &MarkdownRenderer,
) -> Result<Vec<Post>, ScanError> {
    let sources = files::read_files_in_dir(dir, files::has_extension("md"))?;
    sources
        .par_iter()
        .map(|source| build_post(source, posts_link_dir, markdown))
        .collect()
}

/// Turn one Markdown source file into a [`Post`].
pub fn build_post(
    source: &SourceFile,
    posts_link_dir: &str,
    markdown: &MarkdownRenderer,
) -> Result<Post, ScanError> {
    let (body, meta) = if frontmatter::has_frontmatter(&source.data) {
        let split = frontmatter::split(&source.data).map_err(|e| ScanError::Frontmatter {
            path: source.path.clone(),
            source: e,
        })?;
        (split.body, Some(split.metadata))
    } else {
        (source.data.as_str(), None)
    };

    let body = markdown.render(body).map_err(|e| ScanError::Markdown {
        path: source.path.clone(),
        source: e,
    })?;

    let name = parse_post_name(source.stem());
    let url = link_join(posts_link_dir, &name.url_name);

    Ok(Post {
        path: source.path.clone(),
        file_name: source.name.clone(),
        meta,
        body,
        title: name.title,
        date: name.date,
        url_name: name.url_name,
        url,
    })
}

/// Load every script in `dir` as-is.
pub fn load_scripts(dir: &Path) -> Result<Vec<ScriptFile>, ScanError> {
    Ok(files::read_files_in_dir(dir, files::has_extension("js"))?
        .into_iter()
        .map(|f| ScriptFile {
            name: f.name,
            data: f.data,
        })
        .collect())
}
