//! Stylesheet rendering with lightningcss.
//!
//! Each configured entry file in the input `css` role is bundled (local
//! `@import`s inlined), optionally minified, and printed as `<stem>.css`.

use crate::types::Stylesheet;
use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("failed to bundle {path}: {message}")]
    Bundle { path: PathBuf, message: String },
    #[error("failed to minify {path}: {message}")]
    Minify { path: PathBuf, message: String },
    #[error("failed to print {path}: {message}")]
    Print { path: PathBuf, message: String },
}

/// Render one stylesheet entry file to CSS text.
pub fn render_stylesheet(path: &Path, minify: bool) -> Result<String, StyleError> {
    let provider = FileProvider::new();
    let mut bundler = Bundler::new(&provider, None, ParserOptions::default());
    let mut sheet = bundler.bundle(path).map_err(|e| StyleError::Bundle {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if minify {
        sheet
            .minify(MinifyOptions::default())
            .map_err(|e| StyleError::Minify {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
    }

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            ..PrinterOptions::default()
        })
        .map_err(|e| StyleError::Print {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(printed.code)
}

/// Render every entry in `styles` (file names inside `css_dir`).
///
/// Output keeps the configured order. The first failure fails the batch.
pub fn render_styles(
    css_dir: &Path,
    styles: &[String],
    minify: bool,
) -> Result<Vec<Stylesheet>, StyleError> {
    styles
        .par_iter()
        .map(|entry| {
            let path = css_dir.join(entry);
            let css = render_stylesheet(&path, minify)?;
            let stem = Path::new(entry)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.clone());
            Ok(Stylesheet {
                name: format!("{stem}.css"),
                css,
            })
        })
        .collect()
}
