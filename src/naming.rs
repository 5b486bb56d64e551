//! Centralized filename parsing for the `DATE_Title` post convention.
//!
//! Every post lives in a file named after its publish date and title, joined
//! by the first underscore in the name:
//!
//! ```text
//! 2020-01-01_My Post #1.md
//! ^^^^^^^^^^ ^^^^^^^^^^
//!    date       title
//! ```
//!
//! This module derives everything the pipeline needs from that name: the
//! display title, the publish date, and the URL-safe output filename.
//!
//! ## Degenerate Names
//!
//! A name without an underscore still builds. The date segment is then empty
//! (so the date is `None`) and the title is the whole name. A name whose
//! date segment doesn't parse (e.g. `draft_Notes`) likewise keeps its title
//! and gets no date. Neither case fails the build.
//!
//! ## URL Names
//!
//! The URL name is built from the full base name, not from the title:
//! - the date/title underscore and every run of whitespace or `.` become `-`
//! - `#` becomes the word `Sharp`; a gap of only whitespace directly before
//!   it is dropped, while a gap holding `.` or the divider stays a `-`
//! - the characters `£ $ % ^ & ( ) + = , [ ]` are removed
//!
//! `2020-01-01_My Post #1` → `2020-01-01-My-PostSharp1.html`

use chrono::NaiveDate;

/// Characters removed outright from URL names.
const STRIPPED: &[char] = &[
    '£', '$', '%', '^', '&', '(', ')', '+', '=', ',', '[', ']',
];

/// Date format of the segment before the first underscore.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Result of parsing a post base name like `2020-01-01_My Post`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostName {
    /// Publish date, `None` when the date segment is missing or unparseable.
    pub date: Option<NaiveDate>,
    /// Everything after the first underscore (the whole name if there is none).
    pub title: String,
    /// URL-safe output filename, including the `.html` extension.
    pub url_name: String,
}

/// Derive date, title and URL name from a post's base name (no extension).
pub fn parse_post_name(base_name: &str) -> PostName {
    let (date_part, title) = match base_name.find('_') {
        Some(div) => (&base_name[..div], &base_name[div + 1..]),
        None => ("", base_name),
    };

    PostName {
        date: parse_date(date_part),
        title: title.to_string(),
        url_name: format!("{}.html", url_safe_name(base_name)),
    }
}

/// Parse a `YYYY-MM-DD` date segment. Anything else is `None`.
pub fn parse_date(segment: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(segment.trim(), DATE_FORMAT).ok()
}

/// Build the URL-safe form of a base name (without extension).
pub fn url_safe_name(base_name: &str) -> String {
    let mut out = String::with_capacity(base_name.len());
    let mut in_separator_run = false;
    // Whether the current separator run holds nothing but whitespace.
    let mut run_is_whitespace = false;
    // Only the date/title divider counts; later underscores are kept.
    let divider = base_name.find('_');

    for (idx, c) in base_name.char_indices() {
        let is_divider = Some(idx) == divider;
        if c.is_whitespace() || c == '.' || is_divider {
            let whitespace = c.is_whitespace() && !is_divider;
            if in_separator_run {
                run_is_whitespace &= whitespace;
            } else {
                out.push('-');
                in_separator_run = true;
                run_is_whitespace = whitespace;
            }
            continue;
        }
        let after_whitespace_run = in_separator_run && run_is_whitespace;
        in_separator_run = false;

        if c == '#' {
            // "Post #1" reads as one word: a pure whitespace gap before `#`
            // goes away. Runs holding a `.` or the divider keep their `-`.
            if after_whitespace_run {
                out.pop();
            }
            out.push_str("Sharp");
        } else if !STRIPPED.contains(&c) {
            out.push(c);
        }
    }
    out
}
