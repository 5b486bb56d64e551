use clap::Parser;
use log::LevelFilter;
use simple_blog::config::{self, BuildSettings, Mode};
use simple_blog::output;
use simple_blog::pipeline::{self, BuildError};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "simple-blog")]
#[command(about = "Static site generator for a single-author blog")]
#[command(long_about = "\
Static site generator for a single-author blog

Posts are Markdown files named after their publish date and title, rendered
through your templates into a plain HTML site.

Input structure (paths configurable in config.json):

  src/
  ├── posts/
  │   └── 2020-01-01_Hello World.md   # → posts/2020-01-01-Hello-World.html
  ├── templates/
  │   ├── post.html                   # Every post renders through this
  │   └── layout.html                 # Reusable, extended by name
  ├── content/
  │   └── index.html                  # Page → index.html
  ├── css/
  │   └── main.css                    # Listed in config \"styles\"
  └── js/
      └── site.js                     # Copied as-is

Modes:
  debug   Verbose progress output
  test    Build into the test tree with local links, without minifying

If the config file doesn't exist, a stock one is written and nothing is built.")]
#[command(version)]
struct Cli {
    /// Path to the site config
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Build modes
    #[arg(value_enum)]
    modes: Vec<Mode>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.modes.contains(&Mode::Debug) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .without_timestamps()
        .init()
        .ok();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            let mut source = err.source();
            while let Some(cause) = source {
                log::error!("    caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), BuildError> {
    let Some(site) = config::load_config(&cli.config)? else {
        config::write_stock_config(&cli.config)?;
        log::info!(
            "No config found; wrote a default one to {}. Edit it and run again.",
            cli.config.display()
        );
        return Ok(());
    };
    let settings = BuildSettings::from_modes(site, &cli.modes);
    log::debug!("building into {}", settings.site.output.dir.display());

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            let level = output::event_level(&event);
            for line in output::format_build_event(&event) {
                log::log!(level, "{line}");
            }
        }
    });
    let result = pipeline::build(&settings, Some(tx));
    // The printer only ends once the sender is dropped by `build`.
    if printer.join().is_err() {
        log::warn!("progress printer panicked");
    }

    let summary = result?;
    log::info!("{}", output::format_summary(&summary));
    log::info!("Publish complete");
    Ok(())
}
