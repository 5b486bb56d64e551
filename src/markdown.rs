//! Markdown rendering with syntax-highlighted code fences.
//!
//! Uses pulldown-cmark for parsing and HTML output. Fenced code blocks are
//! pulled out of the event stream and replaced by syntect's highlighted HTML.
//! A fence with no language, or one syntect doesn't know, is highlighted as
//! plain text. A highlighter failure is an error, never a silent fallback.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("unknown highlight theme '{0}'")]
    UnknownTheme(String),
    #[error("failed to highlight {lang} code block: {source}")]
    Highlight {
        lang: String,
        #[source]
        source: syntect::Error,
    },
}

/// Markdown → HTML renderer, built once per run and shared by all posts.
#[derive(Debug)]
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
    options: Options,
}

impl MarkdownRenderer {
    /// Create a renderer highlighting with one of syntect's default themes.
    pub fn new(theme_name: &str) -> Result<Self, MarkdownError> {
        let mut themes = ThemeSet::load_defaults();
        let theme = themes
            .themes
            .remove(theme_name)
            .ok_or_else(|| MarkdownError::UnknownTheme(theme_name.to_string()))?;

        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            options,
        })
    }

    /// Render a Markdown document to an HTML fragment.
    pub fn render(&self, markdown: &str) -> Result<String, MarkdownError> {
        let mut events = Vec::new();
        let mut fence: Option<(String, String)> = None;

        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                    fence = Some((lang.to_string(), String::new()));
                }
                Event::Text(text) if fence.is_some() => {
                    if let Some((_, code)) = fence.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                    if let Some((lang, code)) = fence.take() {
                        events.push(Event::Html(self.highlight(&code, &lang)?.into()));
                    }
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }

    /// Highlight one code block. `lang` is the fence info string.
    pub fn highlight(&self, code: &str, lang: &str) -> Result<String, MarkdownError> {
        // Info strings may carry attributes after the language: "rust,ignore".
        let token = lang
            .split(|c: char| c == ',' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        let syntax = self
            .syntax_set
            .find_syntax_by_token(token)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme).map_err(
            |source| MarkdownError::Highlight {
                lang: if token.is_empty() { "plain" } else { token }.to_string(),
                source,
            },
        )
    }
}
