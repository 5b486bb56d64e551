//! CLI output formatting for build progress.
//!
//! Format functions are pure (no I/O) and return display lines; the binary
//! decides where they go and at which log level.
//!
//! ```text
//! ==> input directories prepared
//!     posts: /site/src/posts
//! ==> posts written
//!     posts → /site/public/posts/2020-01-01-Hello.html
//! Published 2 posts, 1 page, 1 stylesheet, 1 script
//! ```

use crate::pipeline::{BuildEvent, BuildSummary};
use log::Level;

/// Format one build event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::DirectoryReady { role, path } => {
            vec![format!("    {}: {}", role, path.display())]
        }
        BuildEvent::StageCompleted(stage) => vec![format!("==> {stage}")],
        BuildEvent::StageFailed { stage, message } => {
            vec![format!("{stage} failed"), format!("    {message}")]
        }
        BuildEvent::FileWritten { role, path } => {
            vec![format!("    {} \u{2192} {}", role, path.display())]
        }
    }
}

/// Log level an event is shown at: failures are errors, the rest is
/// progress detail.
pub fn event_level(event: &BuildEvent) -> Level {
    match event {
        BuildEvent::StageFailed { .. } => Level::Error,
        _ => Level::Debug,
    }
}

/// One-line summary of a finished build.
pub fn format_summary(summary: &BuildSummary) -> String {
    format!(
        "Published {}, {}, {}, {}",
        count(summary.posts, "post"),
        count(summary.pages, "page"),
        count(summary.stylesheets, "stylesheet"),
        count(summary.scripts, "script"),
    )
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Role;
    use crate::pipeline::Stage;
    use std::path::PathBuf;

    #[test]
    fn stage_completed_is_a_header() {
        let lines = format_build_event(&BuildEvent::StageCompleted(Stage::PostsLoaded));
        assert_eq!(lines, vec!["==> posts loaded"]);
    }

    #[test]
    fn directory_ready_shows_role_and_path() {
        let lines = format_build_event(&BuildEvent::DirectoryReady {
            role: Role::Css,
            path: PathBuf::from("/site/public/css"),
        });
        assert_eq!(lines, vec!["    css: /site/public/css"]);
    }

    #[test]
    fn file_written_points_at_output() {
        let lines = format_build_event(&BuildEvent::FileWritten {
            role: Role::Posts,
            path: PathBuf::from("/site/public/posts/a.html"),
        });
        assert_eq!(lines, vec!["    posts \u{2192} /site/public/posts/a.html"]);
    }

    #[test]
    fn failure_carries_message_and_error_level() {
        let event = BuildEvent::StageFailed {
            stage: Stage::TemplatesLoaded,
            message: "failed to compile template post.html".to_string(),
        };
        assert_eq!(
            format_build_event(&event),
            vec![
                "templates loaded failed",
                "    failed to compile template post.html"
            ]
        );
        assert_eq!(event_level(&event), Level::Error);
        assert_eq!(
            event_level(&BuildEvent::StageCompleted(Stage::Complete)),
            Level::Debug
        );
    }

    #[test]
    fn summary_pluralizes() {
        let summary = BuildSummary {
            posts: 2,
            pages: 1,
            stylesheets: 0,
            scripts: 1,
        };
        assert_eq!(
            format_summary(&summary),
            "Published 2 posts, 1 page, 0 stylesheets, 1 script"
        );
    }
}
