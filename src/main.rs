// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for fivedesc.
//!
//! This binary provides the `fivedesc` command for turning a project README
//! into a mod-hosting site description.

use fivedesc::changelog::{self, GitHubReleases};
use fivedesc::config::Environment;
use fivedesc::repository::{self, GitHubRepo};
use fivedesc::{description, document, footer, renderer};
use lexopt::prelude::*;
use snafu::prelude::*;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct Cli {
    input: PathBuf,
    output: Option<PathBuf>,
    changelog: bool,
    timeout: Duration,
    quiet: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("{} does not exist!", path.display()))]
    MissingInput { path: PathBuf },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: document::DocumentError,
    },

    #[snafu(display("failed to render the {section} section: {source}"))]
    Render {
        section: &'static str,
        source: renderer::RenderError,
    },

    #[snafu(display("failed to determine the working directory: {source}"))]
    WorkingDir { source: std::io::Error },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Generate mod-hosting site descriptions from a project README

Usage: {name} [OPTIONS] [INPUT] [OUTPUT]

Arguments:
  [INPUT]   The input markdown file (default: README.md)
  [OUTPUT]  The output html file (default: INPUT with an .html extension)

Options:
      --no-changelog     Don't include the changelog from GitHub releases
      --timeout <SECS>   Timeout for each GitHub API request (default: 120)
  -q, --quiet            Only print warnings and errors
  -h, --help             Print help
  -V, --version          Print version

Environment:
  GITHUB_REPOSITORY      Repository as owner/name, instead of the git remote
  GITHUB_TOKEN           Token for the GitHub API

The whole input must use supported markdown: headings, paragraphs, quotes,
lists, fenced code, emphasis, code spans and links. Images (including
badges), HTML, tables and thematic breaks fail the run even outside the
rendered sections.",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut include_changelog = true;
    let mut timeout = changelog::DEFAULT_TIMEOUT;
    let mut quiet = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Long("no-changelog") => include_changelog = false,
            Long("timeout") => {
                let secs: u64 = parser
                    .value()?
                    .parse()
                    .map_err(|_| "timeout must be a whole number of seconds")?;
                timeout = Duration::from_secs(secs);
            }
            Short('q') | Long("quiet") => quiet = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) if input.is_none() => input = Some(val.parse()?),
            Value(val) if output.is_none() => output = Some(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input: input.unwrap_or_else(|| PathBuf::from("README.md")),
        output,
        changelog: include_changelog,
        timeout,
        quiet,
    })
}

/// Logs progress messages to stderr, without timestamps or targets.
fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(cli.quiet);

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("html"));

    ensure!(
        cli.input.is_file(),
        MissingInputSnafu { path: &cli.input }
    );

    info!(
        "Using {} as the input file and {} as the output file",
        cli.input.display(),
        output.display()
    );

    let env = Environment::from_env();
    let cwd = std::env::current_dir().context(WorkingDirSnafu)?;

    let repo = find_repository(&env, &cwd);

    let contents = std::fs::read_to_string(&cli.input).context(ReadFileSnafu { path: &cli.input })?;
    let doc = document::parse_document(&contents).context(ParseFileSnafu { path: &cli.input })?;

    info!("Fetching Description...");
    let summary =
        renderer::extract_section(&doc, None).context(RenderSnafu { section: "description" })?;
    info!("Fetching Installation Instructions...");
    let installation = renderer::extract_section(&doc, Some(description::INSTALLATION_HEADING))
        .context(RenderSnafu {
            section: "installation",
        })?;

    info!("Building Footer...");
    let license = repo.as_ref().and_then(|_| footer::detect_license(&cwd));
    let footer_text = footer::build_footer(&doc.links, repo.as_ref(), license);

    let changelog_text = if cli.changelog {
        info!("Fetching releases for changelog...");
        fetch_changelog(repo.as_ref(), &env, cli.timeout)
    } else {
        warn!("Skipping changelog generation");
        None
    };

    info!("Constructing final text...");
    let text = description::assemble(
        &summary,
        &installation,
        &footer_text,
        changelog_text.as_deref(),
    );

    info!("Saving...");
    write_output(&output, &text)?;

    info!("Done");
    Ok(())
}

/// Resolves the GitHub repository, degrading to `None` with a warning.
fn find_repository(env: &Environment, cwd: &Path) -> Option<GitHubRepo> {
    match repository::resolve(env.repository.as_deref(), cwd) {
        Ok(Some(repo)) => {
            info!("Found GitHub Repository: {repo}");
            Some(repo)
        }
        Ok(None) => {
            warn!("Couldn't find GitHub repository, will skip GitHub Links");
            None
        }
        Err(e) => {
            warn!("{e}; will skip GitHub Links");
            None
        }
    }
}

/// Fetches the changelog, degrading to `None` with a warning.
fn fetch_changelog(repo: Option<&GitHubRepo>, env: &Environment, timeout: Duration) -> Option<String> {
    let Some(repo) = repo else {
        warn!("No GitHub repository, skipping changelog");
        return None;
    };

    let source = GitHubReleases::new(env.token.clone(), timeout);
    match changelog::build_changelog(&source, &repo.slug()) {
        Ok(Some(text)) => Some(text),
        Ok(None) => {
            warn!("No releases found for {repo}, skipping changelog");
            None
        }
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}

fn write_output(path: &Path, text: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).context(WriteFileSnafu { path })?;
    }
    std::fs::write(path, text).context(WriteFileSnafu { path })
}
