// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Footer lines with community, donation and source links.
//!
//! Community and donation links come from link reference definitions in the
//! README, so they can live at the bottom of the file without showing up in
//! the rendered text:
//!
//! ```markdown
//! [discord-url]: https://discord.gg/example
//! [patreon-url]: https://www.patreon.com/example
//! [paypal-url]: https://paypal.me/example
//! ```
//!
//! Source, issue tracker and release links are derived from the GitHub
//! repository, annotated with the license found in the working directory.

use crate::document::LinkDefinition;
use crate::repository::GitHubRepo;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Label of the link definition holding the Discord invite.
pub const DISCORD_LABEL: &str = "discord-url";

/// Label of the link definition holding the Patreon page.
pub const PATREON_LABEL: &str = "patreon-url";

/// Label of the link definition holding the `PayPal` page.
pub const PAYPAL_LABEL: &str = "paypal-url";

/// Name reported for a license file that matches no known license.
pub const UNKNOWN_LICENSE: &str = "Unknown";

/// Known licenses in priority order, with the markers that must all appear.
const KNOWN_LICENSES: &[(&str, &[&str])] = &[
    ("MIT License", &["MIT License"]),
    (
        "Apache License",
        &["Apache License", "Version 2.0", "January 2004"],
    ),
    (
        "GNU GPL v3.0",
        &["GNU GENERAL PUBLIC LICENSE", "Version 3", "29 June 2007"],
    ),
    (
        "GNU GPL v2.0",
        &["GNU GENERAL PUBLIC LICENSE", "Version 2", "June 1991"],
    ),
];

/// Builds the footer text.
///
/// Each line is only emitted when its data is available, so the footer is
/// empty for a README without link definitions outside a GitHub checkout.
#[must_use]
pub fn build_footer(
    links: &BTreeMap<String, LinkDefinition>,
    repository: Option<&GitHubRepo>,
    license: Option<&str>,
) -> String {
    let mut lines = Vec::new();

    if let Some(discord) = links.get(DISCORD_LABEL) {
        lines.push(format!(
            "<b>Join the Conversation</b>: {}",
            anchor(&discord.destination)
        ));
    }

    let support: Vec<String> = [PATREON_LABEL, PAYPAL_LABEL]
        .into_iter()
        .filter_map(|label| links.get(label))
        .map(|def| anchor(&def.destination))
        .collect();
    if !support.is_empty() {
        lines.push(format!("<b>Support my Mods</b>: {}", support.join(" / ")));
    }

    if let Some(repo) = repository {
        let url = repo.web_url();
        let annotation = license.map(|name| format!(" (under {name})")).unwrap_or_default();

        lines.push(format!("<b>Source Code</b>: {}{annotation}", anchor(&url)));
        lines.push(format!(
            "<b>Feature Requests & Bug Reports</b>: {}",
            anchor(&format!("{url}/issues"))
        ));
        lines.push(format!(
            "<b>Full Changelog</b>: {}",
            anchor(&format!("{url}/releases"))
        ));
    }

    lines.join("\n")
}

/// Renders a link whose text is its own destination.
fn anchor(url: &str) -> String {
    format!("<a href=\"{url}\">{url}</a>")
}

/// Detects the license of the project in `dir` from its `LICENSE` file.
///
/// Returns `None` if there is no readable `LICENSE` file, the name of the
/// first known license whose markers all appear in it, or
/// [`UNKNOWN_LICENSE`] otherwise.
#[must_use]
pub fn detect_license(dir: &Path) -> Option<&'static str> {
    let path = dir.join("LICENSE");
    if !path.is_file() {
        return None;
    }

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Unable to read {}: {e}", path.display());
            return None;
        }
    };

    Some(classify_license(&String::from_utf8_lossy(&bytes)))
}

/// Matches license text against [`KNOWN_LICENSES`].
fn classify_license(text: &str) -> &'static str {
    KNOWN_LICENSES
        .iter()
        .find(|(_, markers)| markers.iter().all(|marker| text.contains(marker)))
        .map_or(UNKNOWN_LICENSE, |&(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(entries: &[(&str, &str)]) -> BTreeMap<String, LinkDefinition> {
        entries
            .iter()
            .map(|(label, url)| {
                (
                    (*label).to_owned(),
                    LinkDefinition {
                        destination: (*url).to_owned(),
                        title: None,
                    },
                )
            })
            .collect()
    }

    fn repo() -> GitHubRepo {
        GitHubRepo::from_slug("lemon/mymod").unwrap()
    }

    #[test]
    fn empty_without_links_or_repository() {
        assert_eq!(build_footer(&BTreeMap::new(), None, None), "");
    }

    #[test]
    fn includes_discord_line() {
        let footer = build_footer(&links(&[("discord-url", "https://discord.gg/x")]), None, None);

        assert_eq!(
            footer,
            "<b>Join the Conversation</b>: <a href=\"https://discord.gg/x\">https://discord.gg/x</a>"
        );
    }

    #[test]
    fn omits_support_line_without_donation_links() {
        let footer = build_footer(&links(&[("discord-url", "https://discord.gg/x")]), None, None);

        assert!(!footer.contains("Support my Mods"));
    }

    #[test]
    fn joins_both_donation_links() {
        let footer = build_footer(
            &links(&[
                ("paypal-url", "https://paypal.me/x"),
                ("patreon-url", "https://patreon.com/x"),
            ]),
            None,
            None,
        );

        assert_eq!(
            footer,
            "<b>Support my Mods</b>: <a href=\"https://patreon.com/x\">https://patreon.com/x</a> / <a href=\"https://paypal.me/x\">https://paypal.me/x</a>"
        );
    }

    #[test]
    fn single_donation_link_has_no_separator() {
        let footer = build_footer(&links(&[("paypal-url", "https://paypal.me/x")]), None, None);

        assert_eq!(
            footer,
            "<b>Support my Mods</b>: <a href=\"https://paypal.me/x\">https://paypal.me/x</a>"
        );
    }

    #[test]
    fn ignores_unrelated_link_definitions() {
        assert_eq!(
            build_footer(&links(&[("homepage", "https://example.com")]), None, None),
            ""
        );
    }

    #[test]
    fn includes_repository_lines_with_license() {
        let footer = build_footer(&BTreeMap::new(), Some(&repo()), Some("MIT License"));

        assert_eq!(
            footer,
            "<b>Source Code</b>: <a href=\"https://github.com/lemon/mymod\">https://github.com/lemon/mymod</a> (under MIT License)\n\
             <b>Feature Requests & Bug Reports</b>: <a href=\"https://github.com/lemon/mymod/issues\">https://github.com/lemon/mymod/issues</a>\n\
             <b>Full Changelog</b>: <a href=\"https://github.com/lemon/mymod/releases\">https://github.com/lemon/mymod/releases</a>"
        );
    }

    #[test]
    fn omits_license_annotation_without_license() {
        let footer = build_footer(&BTreeMap::new(), Some(&repo()), None);

        assert!(footer.starts_with(
            "<b>Source Code</b>: <a href=\"https://github.com/lemon/mymod\">https://github.com/lemon/mymod</a>\n"
        ));
        assert!(!footer.contains("under"));
    }

    #[test]
    fn orders_all_lines() {
        let footer = build_footer(
            &links(&[
                ("discord-url", "https://discord.gg/x"),
                ("patreon-url", "https://patreon.com/x"),
            ]),
            Some(&repo()),
            Some(UNKNOWN_LICENSE),
        );
        let lines: Vec<&str> = footer.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("<b>Join the Conversation</b>"));
        assert!(lines[1].starts_with("<b>Support my Mods</b>"));
        assert!(lines[2].ends_with("(under Unknown)"));
        assert!(lines[3].starts_with("<b>Feature Requests & Bug Reports</b>"));
        assert!(lines[4].starts_with("<b>Full Changelog</b>"));
    }

    #[test]
    fn classifies_known_licenses() {
        assert_eq!(classify_license("MIT License\n\nCopyright (c) 2023"), "MIT License");
        assert_eq!(
            classify_license("Apache License\nVersion 2.0, January 2004"),
            "Apache License"
        );
        assert_eq!(
            classify_license("GNU GENERAL PUBLIC LICENSE\nVersion 3, 29 June 2007"),
            "GNU GPL v3.0"
        );
        assert_eq!(
            classify_license("GNU GENERAL PUBLIC LICENSE\nVersion 2, June 1991"),
            "GNU GPL v2.0"
        );
    }

    #[test]
    fn requires_every_marker() {
        assert_eq!(classify_license("Apache License\nVersion 2.0"), UNKNOWN_LICENSE);
        assert_eq!(classify_license("GNU GENERAL PUBLIC LICENSE"), UNKNOWN_LICENSE);
    }

    #[test]
    fn detects_license_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LICENSE"), "MIT License\n\nPermission is hereby granted").unwrap();

        assert_eq!(detect_license(dir.path()), Some("MIT License"));
    }

    #[test]
    fn reports_unknown_license_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LICENSE"), "All rights reserved.").unwrap();

        assert_eq!(detect_license(dir.path()), Some(UNKNOWN_LICENSE));
    }

    #[test]
    fn reports_nothing_without_license_file() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(detect_license(dir.path()), None);
    }
}
