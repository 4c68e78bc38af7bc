// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Generate mod-hosting site descriptions from a project README.
//!
//! Mod pages take a description made of a small HTML subset. This crate
//! turns a markdown README into that format, so the README stays the single
//! source of truth for a project's description.
//!
//! # Overview
//!
//! 1. The README is parsed into a closed tree of supported markdown nodes
//! 2. The first section and the `Installation` section are rendered using
//!    only `<b>`, `<a>`, `<ul>` and `<li>`
//! 3. A footer is built from link definitions (Discord, Patreon, `PayPal`)
//!    and the project's GitHub repository and license
//! 4. Optionally, release notes are fetched from GitHub as a changelog
//!
//! # Example
//!
//! ```
//! use fivedesc::{description, document, footer, renderer};
//!
//! let readme = "# My Mod\n\nDoes things.\n\n## Installation\n\nCopy the files.\n\n\
//!               [discord-url]: https://discord.gg/example\n";
//! let doc = document::parse_document(readme).unwrap();
//!
//! let text = description::assemble(
//!     &renderer::extract_section(&doc, None).unwrap(),
//!     &renderer::extract_section(&doc, Some(description::INSTALLATION_HEADING)).unwrap(),
//!     &footer::build_footer(&doc.links, None, None),
//!     None,
//! );
//!
//! assert!(text.starts_with("Does things.\n\n<b>Installation Instructions</b>\n\nCopy the files."));
//! assert!(text.contains("<b>Join the Conversation</b>"));
//! ```
//!
//! # Modules
//!
//! - [`document`]: markdown parsing into block and inline nodes
//! - [`renderer`]: section extraction and restricted-HTML rendering
//! - [`footer`]: footer links and license detection
//! - [`repository`]: GitHub repository detection
//! - [`changelog`]: release notes from the GitHub API
//! - [`description`]: final assembly
//! - [`config`]: settings read from the environment

#![deny(missing_docs)]

pub mod changelog;
pub mod config;
pub mod description;
pub mod document;
pub mod footer;
pub mod renderer;
pub mod repository;
