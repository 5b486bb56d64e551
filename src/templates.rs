//! Runtime templates: loading, applying the `post` template, rendering pages.
//!
//! Templates use [minijinja](https://docs.rs/minijinja) syntax and come from
//! two places:
//!
//! - **Reusable templates** (input `templates` role): layouts and partials,
//!   registered under their file stem. One of them must be `post`; every post
//!   is rendered through it.
//! - **Page sources** (input `content` role): single-use page definitions.
//!   Each renders to `<stem>.html` and can `extends`/`include` any reusable
//!   template by name.
//!
//! ## Contexts
//!
//! | Template | Variables |
//! |----------|-----------|
//! | `post`   | `filename`, `site`, `post`, `content` (body HTML), `pretty` |
//! | pages    | `site`, `posts`, `posts_dir`, `pretty` |
//!
//! Output is HTML-escaped by default; insert rendered HTML with
//! `{{ content|safe }}`.

use crate::config::{BuildSettings, SiteConfig};
use crate::files::{self, FileError, SourceFile};
use crate::types::{Page, Post, RenderedPost};
use minijinja::{AutoEscape, Environment, context};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the template every post is rendered through.
pub const POST_TEMPLATE: &str = "post";

/// Name prefix keeping page sources apart from reusable templates.
const PAGE_PREFIX: &str = "pages/";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error("failed to compile template {path}: {source}")]
    Compile {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },
    #[error("no template named '{0}'")]
    NotFound(String),
    #[error("failed to render {target}: {source}")]
    Render {
        target: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Compiled reusable templates.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    env: Environment<'static>,
    names: Vec<String>,
}

impl TemplateSet {
    /// Compile `sources`, each registered under its file stem.
    ///
    /// Stops at the first template that fails to compile.
    pub fn compile(
        sources: Vec<SourceFile>,
        settings: &BuildSettings,
    ) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_debug(settings.debug);
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        if settings.minify {
            env.set_trim_blocks(true);
            env.set_lstrip_blocks(true);
        }

        let mut set = Self {
            env,
            names: Vec::new(),
        };
        for source in sources {
            let name = source.stem().to_string();
            set.add(name, source)?;
        }
        Ok(set)
    }

    fn add(&mut self, name: String, source: SourceFile) -> Result<(), TemplateError> {
        self.env
            .add_template_owned(name.clone(), source.data)
            .map_err(|e| TemplateError::Compile {
                path: source.path,
                source: e,
            })?;
        self.names.push(name);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Reusable template names, in load order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Read and compile every `.html` template in `dir`.
pub fn load_templates(
    dir: &Path,
    settings: &BuildSettings,
) -> Result<TemplateSet, TemplateError> {
    let sources = files::read_files_in_dir(dir, files::has_extension("html"))?;
    TemplateSet::compile(sources, settings)
}

/// Render every post through the `post` template.
///
/// Fails on the first post that doesn't render; no partial output.
pub fn apply_post_template<'a>(
    posts: &'a [Post],
    templates: &TemplateSet,
    site: &SiteConfig,
    minify: bool,
) -> Result<Vec<RenderedPost<'a>>, TemplateError> {
    if !templates.contains(POST_TEMPLATE) {
        return Err(TemplateError::NotFound(POST_TEMPLATE.to_string()));
    }

    posts
        .par_iter()
        .map(|post| {
            let html = templates
                .env
                .get_template(POST_TEMPLATE)
                .and_then(|t| {
                    t.render(context! {
                        filename => &post.file_name,
                        site => site,
                        post => post,
                        content => &post.body,
                        pretty => !minify,
                    })
                })
                .map_err(|e| TemplateError::Render {
                    target: post.file_name.clone(),
                    source: e,
                })?;
            Ok(RenderedPost { post, html })
        })
        .collect()
}

/// Load the page sources in `dir` and render each one.
///
/// A source named `post` is skipped. Pages see every reusable template, the
/// full post list, and the posts link directory as `posts_dir`.
pub fn render_pages(
    dir: &Path,
    templates: &TemplateSet,
    site: &SiteConfig,
    posts: &[Post],
    posts_dir: &str,
    minify: bool,
) -> Result<Vec<Page>, TemplateError> {
    let sources: Vec<SourceFile> = files::read_files_in_dir(dir, files::has_extension("html"))?
        .into_iter()
        .filter(|s| s.stem() != POST_TEMPLATE)
        .collect();

    let mut set = templates.clone();
    let mut pages = Vec::with_capacity(sources.len());
    for source in sources {
        let stem = source.stem().to_string();
        set.add(format!("{PAGE_PREFIX}{stem}"), source)?;
        pages.push(stem);
    }

    pages
        .par_iter()
        .map(|stem| {
            let name = format!("{PAGE_PREFIX}{stem}");
            let output = format!("{stem}.html");
            let render_err = |e| TemplateError::Render {
                target: output.clone(),
                source: e,
            };
            let html = set
                .env
                .get_template(&name)
                .and_then(|t| {
                    t.render(context! {
                        site => site,
                        posts => posts,
                        posts_dir => posts_dir,
                        pretty => !minify,
                    })
                })
                .map_err(render_err)?;
            Ok(Page { name: output, html })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{sample_post, settings};
    use std::fs;
    use tempfile::TempDir;

    fn source(name: &str, data: &str) -> SourceFile {
        SourceFile {
            name: name.to_string(),
            path: PathBuf::from(name),
            data: data.to_string(),
        }
    }

    fn set(sources: &[(&str, &str)]) -> TemplateSet {
        let sources = sources.iter().map(|(n, d)| source(n, d)).collect();
        TemplateSet::compile(sources, &settings(false)).unwrap()
    }

    #[test]
    fn templates_are_named_by_stem() {
        let set = set(&[
            ("layout.html", "<main>{% block body %}{% endblock %}</main>"),
            ("post.html", "x"),
        ]);
        assert_eq!(set.names(), &["layout".to_string(), "post".to_string()]);
        assert!(set.contains("post"));
        assert!(!set.contains("post.html"));
    }

    #[test]
    fn compile_error_names_the_file() {
        let sources = vec![source("ok.html", "fine"), source("broken.html", "{% if %}")];
        let err = TemplateSet::compile(sources, &settings(false)).unwrap_err();
        match err {
            TemplateError::Compile { path, .. } => assert_eq!(path, PathBuf::from("broken.html")),
            other => panic!("expected compile error, got {other}"),
        }
    }

    #[test]
    fn post_template_receives_post_context() {
        let set = set(&[(
            "post.html",
            "{{ site.title }}|{{ post.title }}|{{ filename }}|{{ content|safe }}|{{ pretty }}",
        )]);
        let posts = vec![sample_post("2020-01-01_Hello", "<p>hi</p>")];
        let site = SiteConfig::default();

        let rendered = apply_post_template(&posts, &set, &site, true).unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(
            rendered[0].html,
            "My Blog|Hello|2020-01-01_Hello.md|<p>hi</p>|false"
        );
        assert_eq!(rendered[0].post.url_name, "2020-01-01-Hello.html");
    }

    #[test]
    fn post_values_are_escaped_unless_safe() {
        let set = set(&[("post.html", "{{ content }}")]);
        let posts = vec![sample_post("2020-01-01_x", "<b>")];
        let rendered = apply_post_template(&posts, &set, &SiteConfig::default(), true).unwrap();
        assert_eq!(rendered[0].html, "&lt;b&gt;");
    }

    #[test]
    fn missing_post_template_is_not_found() {
        let set = set(&[("layout.html", "x")]);
        let posts = vec![sample_post("2020-01-01_x", "")];
        let err = apply_post_template(&posts, &set, &SiteConfig::default(), true).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "post"));
    }

    #[test]
    fn missing_post_template_fails_even_without_posts() {
        let set = set(&[]);
        assert!(apply_post_template(&[], &set, &SiteConfig::default(), true).is_err());
    }

    #[test]
    fn one_failing_post_fails_the_batch() {
        let set = set(&[(
            "post.html",
            "{% if post.meta %}{% include \"missing\" %}{% endif %}{{ post.title }}",
        )]);
        let mut bad = sample_post("2020-01-02_bad", "");
        bad.meta = serde_json::json!({ "draft": true }).as_object().cloned();
        let posts = vec![sample_post("2020-01-01_ok", ""), bad];

        let err = apply_post_template(&posts, &set, &SiteConfig::default(), true).unwrap_err();
        match err {
            TemplateError::Render { target, .. } => assert_eq!(target, "2020-01-02_bad.md"),
            other => panic!("expected render error, got {other}"),
        }
    }

    #[test]
    fn pages_extend_templates_and_list_posts() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("index.html"),
            "{% extends \"layout\" %}{% block body %}{% for p in posts %}[{{ p.title }}:{{ p.url_name }}]{% endfor %}@{{ posts_dir|safe }}{% endblock %}",
        )
        .unwrap();
        fs::write(tmp.path().join("post.html"), "skipped").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let set = set(&[("layout.html", "<main>{% block body %}{% endblock %}</main>")]);
        let posts = vec![sample_post("2020-01-01_A", ""), sample_post("2020-01-02_B", "")];
        let pages = render_pages(
            tmp.path(),
            &set,
            &SiteConfig::default(),
            &posts,
            "https://example.com/posts",
            true,
        )
        .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].name, "index.html");
        assert_eq!(
            pages[0].html,
            "<main>[A:2020-01-01-A.html][B:2020-01-02-B.html]@https://example.com/posts</main>"
        );
    }

    #[test]
    fn page_render_failure_names_output() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("about.html"), "{% include \"missing\" %}").unwrap();

        let err = render_pages(tmp.path(), &set(&[]), &SiteConfig::default(), &[], "/posts", true)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Render { target, .. } if target == "about.html"));
    }

    #[test]
    fn page_sources_do_not_leak_into_template_set() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "i").unwrap();
        let templates = set(&[("post.html", "p")]);

        render_pages(tmp.path(), &templates, &SiteConfig::default(), &[], "/posts", true).unwrap();
        assert_eq!(templates.names(), &["post".to_string()]);
    }
}
