//! JSON front-matter splitting.
//!
//! A post may open with a JSON object holding its metadata. There is no
//! delimiter line: the object ends where its braces balance.
//!
//! ```text
//! {"description": "First steps"}
//! # Hello
//! ```
//!
//! The scan is a brace counter, not a JSON tokenizer. A `{` or `}` directly
//! preceded by a backslash is not counted, which also means a backslash right
//! before a brace inside a string value suppresses that brace. Braces inside
//! string values are otherwise counted like any other.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("front-matter is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("front-matter braces never balance")]
    Unbalanced,
}

/// A document split into its metadata and the text that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<'a> {
    pub body: &'a str,
    pub metadata: Map<String, Value>,
}

/// Whether a document opens with front-matter and should go through [`split`].
pub fn has_frontmatter(raw: &str) -> bool {
    raw.starts_with('{')
}

/// Split a leading JSON object off `raw`.
///
/// Everything up to and including the brace that balances the opening `{`
/// is parsed as a JSON object; everything after it is the body, untouched.
pub fn split(raw: &str) -> Result<Split<'_>, FrontmatterError> {
    let end = balance_point(raw).ok_or(FrontmatterError::Unbalanced)?;
    let (head, body) = raw.split_at(end + 1);
    let metadata: Map<String, Value> = serde_json::from_str(head)?;
    Ok(Split { body, metadata })
}

/// Byte index of the character at which unescaped `{` and `}` counts first
/// become equal after at least one `{`.
fn balance_point(raw: &str) -> Option<usize> {
    let mut open = 0usize;
    let mut close = 0usize;
    let mut prev: Option<char> = None;

    for (idx, c) in raw.char_indices() {
        let escaped = prev == Some('\\');
        prev = Some(c);
        if escaped {
            continue;
        }
        match c {
            '{' => open += 1,
            '}' => close += 1,
            _ => continue,
        }
        if open > 0 && open == close {
            return Some(idx);
        }
    }
    None
}
