// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Final assembly of the description text.
//!
//! The output is an HTML fragment, not a document: it is pasted into the
//! description field of a mod page as-is.

/// Heading text of the README section holding installation instructions.
pub const INSTALLATION_HEADING: &str = "Installation";

/// Joins the rendered parts into the final description.
///
/// The changelog block is only appended when `changelog` is present and
/// non-empty.
#[must_use]
pub fn assemble(description: &str, installation: &str, footer: &str, changelog: Option<&str>) -> String {
    let mut text = format!(
        "{description}\n\n<b>Installation Instructions</b>\n\n{installation}\n\n{footer}\n"
    );

    if let Some(changelog) = changelog.filter(|c| !c.is_empty()) {
        text.push_str(&format!("\n<b>Changelog</b>\n\n{changelog}\n"));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_without_changelog() {
        assert_eq!(
            assemble("Hello world.", "Run it.", "", None),
            "Hello world.\n\n<b>Installation Instructions</b>\n\nRun it.\n\n\n"
        );
    }

    #[test]
    fn appends_changelog() {
        let text = assemble("Desc", "Install", "Footer", Some("<b>v1</b>\n\nNotes"));

        assert_eq!(
            text,
            "Desc\n\n<b>Installation Instructions</b>\n\nInstall\n\nFooter\n\n<b>Changelog</b>\n\n<b>v1</b>\n\nNotes\n"
        );
    }

    #[test]
    fn skips_empty_changelog() {
        assert_eq!(
            assemble("Desc", "Install", "Footer", Some("")),
            assemble("Desc", "Install", "Footer", None)
        );
    }
}
