// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Changelog generation from GitHub releases.
//!
//! Releases are fetched page by page until GitHub returns an empty page,
//! then rendered in the order the API returns them (newest first):
//!
//! ```text
//! <b>v1.1</b>
//!
//! Fixed the thing.
//!
//! <b>v1.0</b>
//!
//! First release.
//! ```
//!
//! Fetching goes through the [`ReleaseSource`] trait so pagination can be
//! exercised without network access; [`GitHubReleases`] is the real client.

use serde::Deserialize;
use snafu::prelude::*;
use std::time::Duration;
use tracing::info;

/// Number of releases requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Default upper bound for a single API request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const API_ROOT: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// Error type for release fetching failures.
#[derive(Debug, Snafu)]
pub enum ChangelogError {
    /// The request could not be sent or the connection failed.
    #[snafu(display("failed to request releases page {page}: {source}"))]
    Request {
        /// The page being fetched.
        page: u32,
        /// The underlying transport error.
        source: Box<ureq::Error>,
    },

    /// GitHub answered with a non-success status.
    #[snafu(display("unable to fetch releases from GitHub: code {code}"))]
    Status {
        /// The HTTP status code.
        code: u16,
    },

    /// The response body was not a list of releases.
    #[snafu(display("failed to decode releases page {page}: {source}"))]
    Decode {
        /// The page being fetched.
        page: u32,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// A published release.
///
/// Only the fields used in the changelog are kept; GitHub sends `null` for
/// a missing title or description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// The release title.
    #[serde(default)]
    pub name: Option<String>,

    /// The git tag the release points at, used when the title is empty.
    #[serde(default)]
    pub tag_name: Option<String>,

    /// The release notes, as markdown.
    #[serde(default)]
    pub body: Option<String>,
}

/// A paginated list of releases.
pub trait ReleaseSource {
    /// Fetches one page of releases, numbered from 1.
    ///
    /// An empty page marks the end of the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the page could not be fetched or decoded.
    fn fetch_page(&self, slug: &str, page: u32) -> Result<Vec<Release>, ChangelogError>;
}

/// Releases fetched from the GitHub REST API.
pub struct GitHubReleases {
    agent: ureq::Agent,
    token: Option<String>,
}

impl GitHubReleases {
    /// Creates a client, authenticating with `token` when one is given.
    ///
    /// Without a token the API's anonymous rate limit applies.
    #[must_use]
    pub fn new(token: Option<String>, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            token,
        }
    }
}

impl ReleaseSource for GitHubReleases {
    fn fetch_page(&self, slug: &str, page: u32) -> Result<Vec<Release>, ChangelogError> {
        let url = format!("{API_ROOT}/repos/{slug}/releases?per_page={PAGE_SIZE}&page={page}");

        let mut request = self
            .agent
            .get(&url)
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return StatusSnafu { code }.fail(),
            Err(e) => return Err(Box::new(e)).context(RequestSnafu { page }),
        };

        serde_json::from_reader(response.into_reader()).context(DecodeSnafu { page })
    }
}

/// Fetches every release, following pages until an empty one.
///
/// # Errors
///
/// Returns the first page error; releases from earlier pages are discarded.
pub fn collect_releases<S: ReleaseSource + ?Sized>(
    source: &S,
    slug: &str,
) -> Result<Vec<Release>, ChangelogError> {
    let mut releases = Vec::new();

    for page in 1.. {
        info!("Fetching releases page #{page}");
        let batch = source.fetch_page(slug, page)?;

        if batch.is_empty() {
            info!("All of the releases have been fetched!");
            break;
        }
        releases.extend(batch);
    }

    Ok(releases)
}

/// Builds the changelog for the repository `slug`.
///
/// Returns `Ok(None)` if the repository has no releases.
///
/// # Errors
///
/// Returns an error if any page could not be fetched.
pub fn build_changelog<S: ReleaseSource + ?Sized>(
    source: &S,
    slug: &str,
) -> Result<Option<String>, ChangelogError> {
    let releases = collect_releases(source, slug)?;

    if releases.is_empty() {
        return Ok(None);
    }

    Ok(Some(format_changelog(&releases)))
}

/// Renders releases as bold titles followed by their notes.
///
/// Windows line endings in the notes are normalized and surrounding blank
/// lines removed. An untitled release is shown under its tag.
#[must_use]
pub fn format_changelog(releases: &[Release]) -> String {
    releases
        .iter()
        .map(|release| {
            let name = release
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .or(release.tag_name.as_deref())
                .unwrap_or_default();
            let body = release.body.as_deref().unwrap_or_default().replace("\r\n", "\n");
            format!("<b>{name}</b>\n\n{}", body.trim_matches('\n'))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Serves canned pages and records which pages were requested.
    struct FakeSource {
        pages: Vec<Vec<Release>>,
        fail_on: Option<u32>,
        requested: RefCell<Vec<u32>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Vec<Release>>) -> Self {
            Self {
                pages,
                fail_on: None,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl ReleaseSource for FakeSource {
        fn fetch_page(&self, slug: &str, page: u32) -> Result<Vec<Release>, ChangelogError> {
            assert_eq!(slug, "lemon/mymod");
            self.requested.borrow_mut().push(page);

            if self.fail_on == Some(page) {
                return StatusSnafu { code: 403_u16 }.fail();
            }

            Ok(self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn release(name: &str, body: &str) -> Release {
        Release {
            name: Some(name.into()),
            body: Some(body.into()),
            ..Default::default()
        }
    }

    #[test]
    fn stops_at_first_empty_page() {
        let source = FakeSource::new(vec![
            vec![release("v3", "c"), release("v2", "b")],
            vec![release("v1", "a")],
            vec![],
            vec![release("never", "fetched")],
        ]);

        let releases = collect_releases(&source, "lemon/mymod").unwrap();

        assert_eq!(
            releases,
            vec![release("v3", "c"), release("v2", "b"), release("v1", "a")]
        );
        assert_eq!(*source.requested.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn formats_releases_in_encounter_order() {
        let source = FakeSource::new(vec![
            vec![release("v1.1", "Fixed the thing.")],
            vec![release("v1.0", "First release.")],
        ]);

        let changelog = build_changelog(&source, "lemon/mymod").unwrap();

        assert_eq!(
            changelog.as_deref(),
            Some("<b>v1.1</b>\n\nFixed the thing.\n\n<b>v1.0</b>\n\nFirst release.")
        );
    }

    #[test]
    fn no_releases_is_none() {
        let source = FakeSource::new(vec![]);

        assert_eq!(build_changelog(&source, "lemon/mymod").unwrap(), None);
        assert_eq!(*source.requested.borrow(), vec![1]);
    }

    #[test]
    fn failed_first_page_is_an_error() {
        let mut source = FakeSource::new(vec![vec![release("v1", "a")]]);
        source.fail_on = Some(1);

        let err = build_changelog(&source, "lemon/mymod").unwrap_err();
        assert!(matches!(err, ChangelogError::Status { code: 403 }));
    }

    #[test]
    fn failed_later_page_is_an_error() {
        let mut source = FakeSource::new(vec![vec![release("v2", "b")], vec![release("v1", "a")]]);
        source.fail_on = Some(2);

        assert!(build_changelog(&source, "lemon/mymod").is_err());
    }

    #[test]
    fn normalizes_release_bodies() {
        let changelog = format_changelog(&[release("v1", "\r\n\r\n- one\r\n- two\r\n\r\n")]);

        assert_eq!(changelog, "<b>v1</b>\n\n- one\n- two");
    }

    #[test]
    fn tolerates_missing_fields() {
        let releases: Vec<Release> = serde_json::from_str(r#"[{"name": null, "body": null}, {}]"#).unwrap();

        assert_eq!(releases, vec![Release::default(), Release::default()]);
        assert_eq!(format_changelog(&releases), "<b></b>\n\n\n\n<b></b>\n\n");
    }

    #[test]
    fn untitled_release_uses_tag_name() {
        let releases: Vec<Release> = serde_json::from_str(
            r#"[{"name": null, "tag_name": "v2.0", "body": "Two"}, {"name": "", "tag_name": "v1.0", "body": "One"}]"#,
        )
        .unwrap();

        assert_eq!(
            format_changelog(&releases),
            "<b>v2.0</b>\n\nTwo\n\n<b>v1.0</b>\n\nOne"
        );
    }

    #[test]
    fn decodes_github_payload() {
        let json = r#"[{
            "url": "https://api.github.com/repos/lemon/mymod/releases/1",
            "tag_name": "v1.0",
            "name": "Version 1.0",
            "body": "Initial release",
            "draft": false
        }]"#;

        let releases: Vec<Release> = serde_json::from_str(json).unwrap();

        assert_eq!(
            releases,
            vec![Release {
                tag_name: Some("v1.0".into()),
                ..release("Version 1.0", "Initial release")
            }]
        );
    }
}
