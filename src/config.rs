//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.json`, and turning the
//! command-line modes into the immutable [`BuildSettings`] every pipeline
//! stage receives.
//!
//! ## Config File
//!
//! ```json
//! {
//!   "title": "My Blog",
//!   "description": "Notes and essays",
//!   "url": "https://example.com",
//!   "nav": [{ "url": "/", "text": "Home" }],
//!   "styles": ["main.css"],
//!   "highlight_theme": "InspiredGitHub",
//!   "input":  { "dir": "src",    "paths": { "posts": "posts", "templates": "templates", "css": "css", "js": "js", "content": "content" } },
//!   "output": { "dir": "public", "paths": { "posts": "posts", "css": "css", "js": "js", "content": "." } },
//!   "test":   { "dir": "test",   "paths": { "posts": "posts", "css": "css", "js": "js", "content": "." } }
//! }
//! ```
//!
//! Each directory tree has a base `dir` and a mapping from [`Role`] to a
//! sub-path. Relative base dirs are resolved against the directory holding
//! the config file.
//!
//! ## Partial Configuration
//!
//! The file is sparse: user values are deep-merged on top of the stock
//! defaults, so overriding one role path keeps the others. Unknown keys are
//! rejected to catch typos early.
//!
//! ## Modes
//!
//! - `test`: write to the `test` tree instead of `output`, point the base URL
//!   at the local test directory, and skip minification.
//! - `debug`: verbose progress logging and template debug info. No other
//!   behavior change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Logical purpose of a directory inside an input or output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Posts,
    Templates,
    Css,
    Js,
    Content,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Posts => "posts",
            Role::Templates => "templates",
            Role::Css => "css",
            Role::Js => "js",
            Role::Content => "content",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles every input tree must define.
pub const INPUT_ROLES: &[Role] = &[
    Role::Posts,
    Role::Templates,
    Role::Css,
    Role::Js,
    Role::Content,
];

/// Roles every output tree must define.
pub const OUTPUT_ROLES: &[Role] = &[Role::Posts, Role::Css, Role::Js, Role::Content];

/// One navigation entry, rendered by templates in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavLink {
    pub url: String,
    pub text: String,
}

/// A base directory plus role sub-paths relative to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirSpec {
    pub dir: PathBuf,
    pub paths: BTreeMap<Role, String>,
}

impl DirSpec {
    fn with_paths(dir: &str, paths: &[(Role, &str)]) -> Self {
        Self {
            dir: PathBuf::from(dir),
            paths: paths
                .iter()
                .map(|(role, rel)| (*role, rel.to_string()))
                .collect(),
        }
    }

    fn validate(&self, tree: &str, required: &[Role]) -> Result<(), ConfigError> {
        for role in required {
            if !self.paths.contains_key(role) {
                return Err(ConfigError::Validation(format!(
                    "{tree}.paths.{role} is required"
                )));
            }
        }
        for (role, rel) in &self.paths {
            if Path::new(rel).is_absolute() {
                return Err(ConfigError::Validation(format!(
                    "{tree}.paths.{role} must be relative, got {rel}"
                )));
            }
        }
        Ok(())
    }
}

fn default_output_tree(dir: &str) -> DirSpec {
    DirSpec::with_paths(
        dir,
        &[
            (Role::Posts, "posts"),
            (Role::Css, "css"),
            (Role::Js, "js"),
            (Role::Content, "."),
        ],
    )
}

/// Site configuration loaded from `config.json`.
///
/// Immutable for the whole run; templates receive it as `site`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    /// Base URL that post links are built from.
    pub url: String,
    pub nav: Vec<NavLink>,
    /// Stylesheet entry files inside the input `css` role.
    pub styles: Vec<String>,
    /// Syntect theme for fenced code blocks.
    pub highlight_theme: String,
    pub input: DirSpec,
    pub output: DirSpec,
    /// Output tree used instead of `output` in test mode.
    pub test: DirSpec,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: "A blog".to_string(),
            url: "https://example.com".to_string(),
            nav: vec![NavLink {
                url: "/".to_string(),
                text: "Home".to_string(),
            }],
            styles: vec!["main.css".to_string()],
            highlight_theme: "InspiredGitHub".to_string(),
            input: DirSpec::with_paths(
                "src",
                &[
                    (Role::Posts, "posts"),
                    (Role::Templates, "templates"),
                    (Role::Css, "css"),
                    (Role::Js, "js"),
                    (Role::Content, "content"),
                ],
            ),
            output: default_output_tree("public"),
            test: default_output_tree("test"),
        }
    }
}

impl SiteConfig {
    /// Validate that every required role exists and paths are well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.input.validate("input", INPUT_ROLES)?;
        self.output.validate("output", OUTPUT_ROLES)?;
        self.test.validate("test", OUTPUT_ROLES)?;
        for style in &self.styles {
            let path = Path::new(style);
            if path.components().count() != 1 || path.is_absolute() {
                return Err(ConfigError::Validation(format!(
                    "styles entries must be plain file names, got {style}"
                )));
            }
        }
        Ok(())
    }

    /// Resolve relative tree bases against `root`.
    pub fn rebase(mut self, root: &Path) -> Self {
        for spec in [&mut self.input, &mut self.output, &mut self.test] {
            if spec.dir.is_relative() {
                spec.dir = root.join(&spec.dir);
            }
        }
        self
    }

    /// Link directory posts are published under: base URL plus the output
    /// `posts` sub-path.
    pub fn posts_link_dir(&self) -> String {
        let rel = self
            .output
            .paths
            .get(&Role::Posts)
            .map(String::as_str)
            .unwrap_or_default();
        link_join(&self.url, rel)
    }
}

/// Join a link base and a relative segment with exactly one `/`.
///
/// Empty and `.` segments leave the base unchanged.
pub fn link_join(base: &str, segment: &str) -> String {
    let segment = segment.trim_matches('/');
    if segment.is_empty() || segment == "." {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a JSON object.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Value {
    serde_json::to_value(SiteConfig::default()).unwrap_or(Value::Null)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Objects are merged key-by-key (overlay keys override base keys).
/// - Non-object values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_json(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_json(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw JSON value.
///
/// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but is
/// not valid JSON.
pub fn load_raw_config(path: &Path) -> Result<Option<Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(base: Value, overlay: Option<Value>) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_json(base, ov),
        None => base,
    };
    let config: SiteConfig = serde_json::from_value(merged)?;
    config.validate()?;
    Ok(config)
}

/// Load the config at `path`, merged over stock defaults, with tree bases
/// resolved against the file's directory.
///
/// Returns `Ok(None)` when the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<SiteConfig>, ConfigError> {
    let Some(overlay) = load_raw_config(path)? else {
        return Ok(None);
    };
    let config = resolve_config(stock_defaults_value(), Some(overlay))?;
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok(Some(config.rebase(root)))
}

/// The stock config as pretty-printed JSON.
pub fn stock_config_json() -> Result<String, ConfigError> {
    let mut json = serde_json::to_string_pretty(&SiteConfig::default())?;
    json.push('\n');
    Ok(json)
}

/// Write the stock config to `path`, creating parent directories.
pub fn write_stock_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, stock_config_json()?)?;
    Ok(())
}

// =============================================================================
// Build settings
// =============================================================================

/// Command-line build mode token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Debug,
    Test,
}

/// Everything a build needs, fixed before the first stage runs.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub site: SiteConfig,
    /// Compact CSS and ask templates for non-pretty output.
    pub minify: bool,
    /// Verbose progress and template debug info.
    pub debug: bool,
}

impl BuildSettings {
    /// Apply command-line modes to a loaded config.
    pub fn from_modes(mut site: SiteConfig, modes: &[Mode]) -> Self {
        let debug = modes.contains(&Mode::Debug);
        let test = modes.contains(&Mode::Test);
        if test {
            site.output = site.test.clone();
            site.url = std::path::absolute(&site.test.dir)
                .unwrap_or_else(|_| site.test.dir.clone())
                .to_string_lossy()
                .into_owned();
        }
        Self {
            site,
            minify: !test,
            debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.json")).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn load_config_merges_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{ "title": "Field Notes", "output": { "paths": { "posts": "blog" } } }"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.title, "Field Notes");
        assert_eq!(config.output.paths[&Role::Posts], "blog");
        // Unspecified values should be defaults
        assert_eq!(config.output.paths[&Role::Css], "css");
        assert_eq!(config.description, "A blog");
    }

    #[test]
    fn load_config_resolves_bases_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{}").unwrap();

        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.input.dir, tmp.path().join("src"));
        assert_eq!(config.output.dir, tmp.path().join("public"));
        assert_eq!(config.test.dir, tmp.path().join("test"));
    }

    #[test]
    fn load_config_invalid_json_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn load_config_rejects_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "titel": "typo" }"#).unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn missing_required_role_fails_validation() {
        let mut config = SiteConfig::default();
        config.input.paths.remove(&Role::Templates);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn absolute_role_path_fails_validation() {
        let mut config = SiteConfig::default();
        config
            .output
            .paths
            .insert(Role::Css, "/var/www/css".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn nested_style_entry_fails_validation() {
        let config = SiteConfig {
            styles: vec!["sub/main.css".to_string()],
            ..SiteConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // merge tests
    // =========================================================================

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let base = json!({ "nav": [{ "url": "/", "text": "Home" }], "title": "a" });
        let overlay = json!({ "nav": [] });
        assert_eq!(merge_json(base, overlay), json!({ "nav": [], "title": "a" }));
    }

    #[test]
    fn merge_is_deep_for_objects() {
        let base = json!({ "output": { "dir": "public", "paths": { "posts": "posts", "css": "css" } } });
        let overlay = json!({ "output": { "paths": { "css": "styles" } } });
        assert_eq!(
            merge_json(base, overlay),
            json!({ "output": { "dir": "public", "paths": { "posts": "posts", "css": "styles" } } })
        );
    }

    // =========================================================================
    // stock config tests
    // =========================================================================

    #[test]
    fn stock_config_roundtrips_to_defaults() {
        let json = stock_config_json().unwrap();
        let parsed: SiteConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, SiteConfig::default());
    }

    #[test]
    fn stock_defaults_are_valid() {
        SiteConfig::default().validate().unwrap();
    }

    #[test]
    fn write_stock_config_creates_loadable_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site/config.json");
        write_stock_config(&path).unwrap();

        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.input.dir, tmp.path().join("site/src"));
    }

    // =========================================================================
    // link and mode tests
    // =========================================================================

    #[test]
    fn link_join_normalizes_slashes() {
        assert_eq!(link_join("https://x.io/", "/posts/"), "https://x.io/posts");
        assert_eq!(link_join("https://x.io", "."), "https://x.io");
        assert_eq!(link_join("https://x.io", ""), "https://x.io");
    }

    #[test]
    fn posts_link_dir_uses_output_posts_role() {
        let config = SiteConfig::default();
        assert_eq!(config.posts_link_dir(), "https://example.com/posts");
    }

    #[test]
    fn default_modes_minify_and_keep_output() {
        let settings = BuildSettings::from_modes(SiteConfig::default(), &[]);
        assert!(settings.minify);
        assert!(!settings.debug);
        assert_eq!(settings.site.output.dir, PathBuf::from("public"));
        assert_eq!(settings.site.url, "https://example.com");
    }

    #[test]
    fn test_mode_swaps_output_tree_and_url() {
        let tmp = TempDir::new().unwrap();
        let site = SiteConfig::default().rebase(tmp.path());
        let settings = BuildSettings::from_modes(site, &[Mode::Test]);

        assert!(!settings.minify);
        assert_eq!(settings.site.output.dir, tmp.path().join("test"));
        assert_eq!(
            settings.site.url,
            tmp.path().join("test").to_string_lossy()
        );
    }

    #[test]
    fn debug_mode_changes_nothing_but_debug() {
        let plain = BuildSettings::from_modes(SiteConfig::default(), &[]);
        let debug = BuildSettings::from_modes(SiteConfig::default(), &[Mode::Debug, Mode::Debug]);
        assert!(debug.debug);
        assert_eq!(debug.minify, plain.minify);
        assert_eq!(debug.site, plain.site);
    }
}
