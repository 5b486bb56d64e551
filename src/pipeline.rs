//! Build orchestration.
//!
//! A build is a fixed graph of [`Stage`]s. Each stage runs once, after every
//! stage it depends on has completed:
//!
//! ```text
//! ConfigLoaded → InputDirsPrepared → OutputDirsPrepared ─┬─ StylesRendered → StylesWritten
//!                                                        ├─ ScriptsLoaded  → ScriptsWritten
//!                                                        ├─ PostsLoaded ─────┬─ TemplatesApplied → PostsWritten
//!                                                        └─ TemplatesLoaded ─┴─ PagesRendered    → PagesWritten
//!                                                                                       all writes → Complete
//! ```
//!
//! Independent branches run concurrently on the rayon pool via
//! [`rayon::join`]. Directory preparation is strictly sequential (see
//! [`crate::prepare`]).
//!
//! ## Failure
//!
//! The first failing stage is recorded and reported as a
//! [`BuildEvent::StageFailed`]. From then on no new stage starts; stages
//! already running on other threads finish, and [`build`] returns the first
//! error. A failed build never reports [`Stage::Complete`].
//!
//! ## Progress
//!
//! Progress is reported as [`BuildEvent`]s over an optional channel, so the
//! caller decides how (and whether) to display it. Events for a stage are
//! always sent before events of any stage depending on it.

use crate::config::{BuildSettings, ConfigError, DirSpec, Role};
use crate::files::{self, FileError};
use crate::markdown::{MarkdownError, MarkdownRenderer};
use crate::prepare::{self, PrepareError, ResolvedDirs};
use crate::scan::{self, ScanError};
use crate::styles::{self, StyleError};
use crate::templates::{self, TemplateError, TemplateSet};
use crate::types::{OutputFile, Post};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Prepare(#[from] PrepareError),
    #[error(transparent)]
    Markdown(#[from] MarkdownError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error(transparent)]
    File(#[from] FileError),
    #[error("no {0} directory configured")]
    MissingRole(Role),
    #[error("build aborted")]
    Aborted,
}

/// One node of the build graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ConfigLoaded,
    InputDirsPrepared,
    OutputDirsPrepared,
    PostsLoaded,
    TemplatesLoaded,
    ScriptsLoaded,
    StylesRendered,
    TemplatesApplied,
    PagesRendered,
    PostsWritten,
    PagesWritten,
    StylesWritten,
    ScriptsWritten,
    Complete,
}

impl Stage {
    /// Every stage, in an order where each appears after its dependencies.
    pub const ALL: [Stage; 14] = [
        Stage::ConfigLoaded,
        Stage::InputDirsPrepared,
        Stage::OutputDirsPrepared,
        Stage::PostsLoaded,
        Stage::TemplatesLoaded,
        Stage::ScriptsLoaded,
        Stage::StylesRendered,
        Stage::TemplatesApplied,
        Stage::PagesRendered,
        Stage::PostsWritten,
        Stage::PagesWritten,
        Stage::StylesWritten,
        Stage::ScriptsWritten,
        Stage::Complete,
    ];

    /// Stages that must complete before this one starts.
    ///
    /// This table describes the join structure hand-wired in `Run::branches`
    /// and `Run::content_branch`; it does not schedule anything. Tests check
    /// the emitted completion order against it.
    pub fn dependencies(self) -> &'static [Stage] {
        use Stage::*;
        match self {
            ConfigLoaded => &[],
            InputDirsPrepared => &[ConfigLoaded],
            OutputDirsPrepared => &[InputDirsPrepared],
            PostsLoaded | TemplatesLoaded | ScriptsLoaded | StylesRendered => {
                &[OutputDirsPrepared]
            }
            TemplatesApplied => &[PostsLoaded, TemplatesLoaded],
            PagesRendered => &[PostsLoaded, TemplatesLoaded, OutputDirsPrepared],
            PostsWritten => &[TemplatesApplied, OutputDirsPrepared],
            PagesWritten => &[PagesRendered, OutputDirsPrepared],
            StylesWritten => &[StylesRendered, OutputDirsPrepared],
            ScriptsWritten => &[ScriptsLoaded, OutputDirsPrepared],
            Complete => &[PostsWritten, PagesWritten, StylesWritten, ScriptsWritten],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ConfigLoaded => "config loaded",
            Stage::InputDirsPrepared => "input directories prepared",
            Stage::OutputDirsPrepared => "output directories prepared",
            Stage::PostsLoaded => "posts loaded",
            Stage::TemplatesLoaded => "templates loaded",
            Stage::ScriptsLoaded => "scripts loaded",
            Stage::StylesRendered => "styles rendered",
            Stage::TemplatesApplied => "templates applied",
            Stage::PagesRendered => "pages rendered",
            Stage::PostsWritten => "posts written",
            Stage::PagesWritten => "pages written",
            Stage::StylesWritten => "styles written",
            Stage::ScriptsWritten => "scripts written",
            Stage::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress events sent during a build.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// A configured directory exists and is ready for use.
    DirectoryReady { role: Role, path: PathBuf },
    StageCompleted(Stage),
    StageFailed { stage: Stage, message: String },
    /// An output file was written.
    FileWritten { role: Role, path: PathBuf },
}

/// Counts of what a successful build wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub posts: usize,
    pub pages: usize,
    pub stylesheets: usize,
    pub scripts: usize,
}

/// Run the whole pipeline for `settings`.
///
/// Progress goes to `events` when given; the sender is dropped on return so
/// a receiver loop ends with the build.
pub fn build(
    settings: &BuildSettings,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildSummary, BuildError> {
    let run = Run::new(events);
    let site = &settings.site;
    run.emit(BuildEvent::StageCompleted(Stage::ConfigLoaded));

    let summary = run
        .stage(Stage::InputDirsPrepared, || run.prepare(&site.input))
        .and_then(|input| {
            let output = run.stage(Stage::OutputDirsPrepared, || run.prepare(&site.output))?;
            run.branches(settings, &input, &output)
        });

    match summary {
        Some(summary) if !run.has_failed() => {
            run.emit(BuildEvent::StageCompleted(Stage::Complete));
            Ok(summary)
        }
        _ => Err(run.into_error()),
    }
}

/// Shared state of one build: the event channel and the first failure.
struct Run {
    events: Option<Sender<BuildEvent>>,
    failed: AtomicBool,
    error: Mutex<Option<BuildError>>,
}

impl Run {
    fn new(events: Option<Sender<BuildEvent>>) -> Self {
        Self {
            events,
            failed: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            // A receiver that hung up only loses progress output.
            let _ = tx.send(event);
        }
    }

    fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Run `stage` unless the build has already failed.
    ///
    /// Returns `None` when the stage was skipped or failed.
    fn stage<T>(&self, stage: Stage, f: impl FnOnce() -> Result<T, BuildError>) -> Option<T> {
        if self.has_failed() {
            log::debug!("skipping {stage}: build already failed");
            return None;
        }
        match f() {
            Ok(value) => {
                self.emit(BuildEvent::StageCompleted(stage));
                Some(value)
            }
            Err(err) => {
                self.fail(stage, err);
                None
            }
        }
    }

    fn fail(&self, stage: Stage, err: BuildError) {
        self.emit(BuildEvent::StageFailed {
            stage,
            message: err.to_string(),
        });
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
        self.failed.store(true, Ordering::SeqCst);
    }

    fn into_error(self) -> BuildError {
        self.error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(BuildError::Aborted)
    }

    fn prepare(&self, spec: &DirSpec) -> Result<ResolvedDirs, BuildError> {
        let dirs = prepare::prepare(spec)?;
        for (role, path) in dirs.iter() {
            self.emit(BuildEvent::DirectoryReady {
                role,
                path: path.to_path_buf(),
            });
        }
        Ok(dirs)
    }

    /// Everything after directory preparation: styles, scripts and content
    /// run side by side.
    fn branches(
        &self,
        settings: &BuildSettings,
        input: &ResolvedDirs,
        output: &ResolvedDirs,
    ) -> Option<BuildSummary> {
        let ((stylesheets, scripts), content) = rayon::join(
            || {
                rayon::join(
                    || self.styles_branch(settings, input, output),
                    || self.scripts_branch(input, output),
                )
            },
            || self.content_branch(settings, input, output),
        );
        let (posts, pages) = content?;
        Some(BuildSummary {
            posts,
            pages,
            stylesheets: stylesheets?,
            scripts: scripts?,
        })
    }

    fn styles_branch(
        &self,
        settings: &BuildSettings,
        input: &ResolvedDirs,
        output: &ResolvedDirs,
    ) -> Option<usize> {
        let sheets = self.stage(Stage::StylesRendered, || {
            let dir = dir_for(input, Role::Css)?;
            Ok(styles::render_styles(
                dir,
                &settings.site.styles,
                settings.minify,
            )?)
        })?;
        self.write(Stage::StylesWritten, Role::Css, output, &sheets)
    }

    fn scripts_branch(&self, input: &ResolvedDirs, output: &ResolvedDirs) -> Option<usize> {
        let scripts = self.stage(Stage::ScriptsLoaded, || {
            Ok(scan::load_scripts(dir_for(input, Role::Js)?)?)
        })?;
        self.write(Stage::ScriptsWritten, Role::Js, output, &scripts)
    }

    /// Posts and templates load together; post pages and site pages then
    /// render and write side by side.
    fn content_branch(
        &self,
        settings: &BuildSettings,
        input: &ResolvedDirs,
        output: &ResolvedDirs,
    ) -> Option<(usize, usize)> {
        let site = &settings.site;
        let posts_link_dir = site.posts_link_dir();

        let (posts, templates) = rayon::join(
            || {
                self.stage(Stage::PostsLoaded, || {
                    load_posts(input, &posts_link_dir, &site.highlight_theme)
                })
            },
            || {
                self.stage(Stage::TemplatesLoaded, || {
                    Ok(templates::load_templates(
                        dir_for(input, Role::Templates)?,
                        settings,
                    )?)
                })
            },
        );
        let (posts, templates) = (posts?, templates?);

        let (written_posts, written_pages) = rayon::join(
            || self.posts_output(settings, &posts, &templates, output),
            || self.pages_output(settings, &posts, &templates, input, output),
        );
        Some((written_posts?, written_pages?))
    }

    fn posts_output(
        &self,
        settings: &BuildSettings,
        posts: &[Post],
        templates: &TemplateSet,
        output: &ResolvedDirs,
    ) -> Option<usize> {
        let rendered = self.stage(Stage::TemplatesApplied, || {
            Ok(templates::apply_post_template(
                posts,
                templates,
                &settings.site,
                settings.minify,
            )?)
        })?;
        self.write(Stage::PostsWritten, Role::Posts, output, &rendered)
    }

    fn pages_output(
        &self,
        settings: &BuildSettings,
        posts: &[Post],
        templates: &TemplateSet,
        input: &ResolvedDirs,
        output: &ResolvedDirs,
    ) -> Option<usize> {
        let pages = self.stage(Stage::PagesRendered, || {
            Ok(templates::render_pages(
                dir_for(input, Role::Content)?,
                templates,
                &settings.site,
                posts,
                &settings.site.posts_link_dir(),
                settings.minify,
            )?)
        })?;
        self.write(Stage::PagesWritten, Role::Content, output, &pages)
    }

    /// Write `items` into the output directory for `role` as one stage.
    fn write<T: OutputFile>(
        &self,
        stage: Stage,
        role: Role,
        output: &ResolvedDirs,
        items: &[T],
    ) -> Option<usize> {
        self.stage(stage, || {
            let written = files::write_many(dir_for(output, role)?, items)?;
            for path in written {
                self.emit(BuildEvent::FileWritten { role, path });
            }
            Ok(items.len())
        })
    }
}

fn dir_for(dirs: &ResolvedDirs, role: Role) -> Result<&Path, BuildError> {
    dirs.get(role).ok_or(BuildError::MissingRole(role))
}

fn load_posts(
    input: &ResolvedDirs,
    posts_link_dir: &str,
    theme: &str,
) -> Result<Vec<Post>, BuildError> {
    let markdown = MarkdownRenderer::new(theme)?;
    Ok(scan::load_posts(
        dir_for(input, Role::Posts)?,
        posts_link_dir,
        &markdown,
    )?)
}
