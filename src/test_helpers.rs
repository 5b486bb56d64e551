//! Shared test utilities.
//!
//! Builders for in-memory posts and settings, plus [`write_site`], which lays
//! out a small but complete site in a temp directory:
//!
//! ```text
//! <root>/
//! └── src/
//!     ├── posts/      2020-01-01_Hello World.md, 2020-02-02_Second.md
//!     ├── templates/  layout.html, post.html
//!     ├── content/    index.html
//!     ├── css/        main.css (imports base.css), base.css
//!     └── js/         site.js
//! ```

use crate::config::{BuildSettings, SiteConfig, link_join};
use crate::naming::parse_post_name;
use crate::types::Post;
use std::fs;
use std::path::Path;

/// Default settings with minification toggled.
pub fn settings(minify: bool) -> BuildSettings {
    BuildSettings {
        site: SiteConfig::default(),
        minify,
        debug: false,
    }
}

/// A post as the loader would produce it for `<stem>.md`, with `body`
/// standing in for the rendered Markdown.
pub fn sample_post(stem: &str, body: &str) -> Post {
    let name = parse_post_name(stem);
    Post {
        path: format!("{stem}.md").into(),
        file_name: format!("{stem}.md"),
        meta: None,
        body: body.to_string(),
        url: link_join("https://example.com/posts", &name.url_name),
        title: name.title,
        date: name.date,
        url_name: name.url_name,
    }
}

pub const LAYOUT: &str = "<html><head><title>{{ site.title }}</title></head>\
<body>{% block body %}{% endblock %}</body></html>";

pub const POST: &str = "{% extends \"layout\" %}{% block body %}\
<article><h1>{{ post.title }}</h1>{{ content|safe }}</article>{% endblock %}";

pub const INDEX: &str = "{% extends \"layout\" %}{% block body %}\
<ul>{% for p in posts %}<li>{{ p.title }}</li>{% endfor %}</ul>{% endblock %}";

/// Write the fixture site under `root` and return default-mode settings
/// for it.
pub fn write_site(root: &Path) -> BuildSettings {
    let src = root.join("src");
    for dir in ["posts", "templates", "content", "css", "js"] {
        fs::create_dir_all(src.join(dir)).unwrap();
    }

    fs::write(
        src.join("posts/2020-01-01_Hello World.md"),
        "{\"description\": \"The first post\"}\n# Hello\n\n```rust\nfn main() {}\n```\n",
    )
    .unwrap();
    fs::write(
        src.join("posts/2020-02-02_Second.md"),
        "Plain *text* post.\n",
    )
    .unwrap();

    fs::write(src.join("templates/layout.html"), LAYOUT).unwrap();
    fs::write(src.join("templates/post.html"), POST).unwrap();
    fs::write(src.join("content/index.html"), INDEX).unwrap();

    fs::write(src.join("css/base.css"), "body {\n  margin: 0;\n}\n").unwrap();
    fs::write(
        src.join("css/main.css"),
        "@import \"base.css\";\n\narticle {\n  max-width: 40em;\n}\n",
    )
    .unwrap();
    fs::write(src.join("js/site.js"), "console.log(\"hi\");\n").unwrap();

    BuildSettings::from_modes(SiteConfig::default().rebase(root), &[])
}
