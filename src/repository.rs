// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! GitHub repository detection.
//!
//! The repository is taken from an explicit `owner/name` override when one
//! is configured (as GitHub Actions does with `GITHUB_REPOSITORY`), and
//! otherwise from the remotes of the git checkout in the working directory.
//!
//! Every accepted form is normalized to a [`GitHubRepo`] with the owner and
//! name only; `.git` suffixes and trailing slashes are dropped:
//!
//! ```
//! use fivedesc::repository::GitHubRepo;
//!
//! let ssh = GitHubRepo::from_remote_url("git@github.com:lemon/my-mod.git").unwrap();
//! let https = GitHubRepo::from_remote_url("https://github.com/lemon/my-mod").unwrap();
//!
//! assert_eq!(ssh, https);
//! assert_eq!(ssh.slug(), "lemon/my-mod");
//! assert_eq!(ssh.web_url(), "https://github.com/lemon/my-mod");
//! ```

use regex::Regex;
use snafu::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

static GITHUB_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[:/]([A-Za-z0-9-]+)/([A-Za-z0-9._-]+?)(?:\.git)?/?$")
        .expect("GitHub remote pattern is valid")
});

/// Error type for repository detection failures.
#[derive(Debug, Snafu)]
pub enum RepositoryError {
    /// The working copy exists but could not be opened.
    #[snafu(display("failed to open git repository at {}: {source}", path.display()))]
    Open {
        /// The directory that was opened.
        path: PathBuf,
        /// The underlying git error.
        source: git2::Error,
    },

    /// The remotes of the working copy could not be read.
    #[snafu(display("failed to read git remotes: {source}"))]
    Remotes {
        /// The underlying git error.
        source: git2::Error,
    },
}

/// A repository hosted on GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    owner: String,
    name: String,
}

impl GitHubRepo {
    /// Parses an `owner/name` slug.
    ///
    /// Returns `None` unless the value has exactly two non-empty parts.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        let (owner, name) = slug.trim().split_once('/')?;
        let name = name.strip_suffix(".git").unwrap_or(name);

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }

        Some(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }

    /// Parses a git remote URL pointing at GitHub.
    ///
    /// Accepts SSH (`git@github.com:owner/name.git`), `ssh://` and HTTPS
    /// forms. Returns `None` for remotes hosted elsewhere.
    #[must_use]
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let captures = GITHUB_REMOTE.captures(url.trim())?;

        Some(Self {
            owner: captures[1].to_owned(),
            name: captures[2].to_owned(),
        })
    }

    /// The repository owner (user or organization).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `owner/name` slug used by the GitHub API.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// The repository's web page.
    #[must_use]
    pub fn web_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Resolves the GitHub repository of the project in `dir`.
///
/// A valid `override_slug` wins. Otherwise `dir` is opened as a git working
/// copy and its remotes are checked, `origin` first, for a GitHub URL.
/// Returns `Ok(None)` when `dir` is not a git repository or has no GitHub
/// remote.
///
/// # Errors
///
/// Returns an error if `dir` is a git repository that cannot be read.
pub fn resolve(override_slug: Option<&str>, dir: &Path) -> Result<Option<GitHubRepo>, RepositoryError> {
    if let Some(slug) = override_slug {
        match GitHubRepo::from_slug(slug) {
            Some(repo) => return Ok(Some(repo)),
            None => warn!("Ignoring malformed repository override {slug:?}, expected owner/name"),
        }
    }

    let repo = match git2::Repository::open(dir) {
        Ok(repo) => repo,
        Err(e) if e.code() == git2::ErrorCode::NotFound => {
            debug!("{} is not a git repository", dir.display());
            return Ok(None);
        }
        Err(e) => return Err(e).context(OpenSnafu { path: dir }),
    };

    let remotes = repo.remotes().context(RemotesSnafu)?;
    let mut names: Vec<&str> = remotes.iter().flatten().collect();
    names.sort_by_key(|name| *name != "origin");

    for name in names {
        let remote = repo.find_remote(name).context(RemotesSnafu)?;
        let Some(url) = remote.url() else {
            continue;
        };

        if let Some(github) = GitHubRepo::from_remote_url(url) {
            debug!("Remote {name} points at {github}");
            return Ok(Some(github));
        }
    }

    Ok(None)
}
