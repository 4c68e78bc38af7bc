// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Section extraction and restricted-HTML rendering.
//!
//! Mod-hosting description fields accept only a handful of tags, so this
//! module renders a README section using nothing but `<b>`, `<a>`, `<ul>`
//! and `<li>`. Sections are delimited by headings:
//!
//! - Without a target label, the section opened by the first heading is
//!   rendered, up to the next heading.
//! - With a target label, the section under the heading with that exact
//!   text is rendered, up to the next heading at the same or a shallower
//!   level. Deeper headings inside it become `<b>` lines.
//!
//! # Example
//!
//! ```
//! use fivedesc::document::parse_document;
//! use fivedesc::renderer::extract_section;
//!
//! let doc = parse_document("# Mod\n\nA **great** mod.\n\n## Installation\n\nCopy it.\n").unwrap();
//!
//! assert_eq!(extract_section(&doc, None).unwrap(), "A <b>great</b> mod.");
//! assert_eq!(extract_section(&doc, Some("Installation")).unwrap(), "Copy it.");
//! ```

use crate::document::{Block, Document, Inline, ListItem};
use snafu::prelude::*;

/// Error type for content the renderer refuses to handle.
#[derive(Debug, Snafu)]
pub enum RenderError {
    /// A block appeared where the renderer does not accept it.
    #[snafu(display("unexpected {kind} block"))]
    UnexpectedBlock {
        /// The offending block variant.
        kind: &'static str,
    },

    /// An inline node appeared where the renderer does not accept it.
    #[snafu(display("unexpected {kind} inside emphasis or link text"))]
    UnexpectedInline {
        /// The offending inline variant.
        kind: &'static str,
    },
}

/// Renders one heading-delimited section of a document.
///
/// Blocks before the first heading are never rendered. The returned string
/// has leading and trailing newlines removed. If `heading` is given but no
/// heading carries that exact text, the result is empty.
///
/// # Errors
///
/// Returns a [`RenderError`] if the section contains a node shape that has
/// no restricted-HTML rendering, such as a list item holding a nested list.
pub fn extract_section(document: &Document, heading: Option<&str>) -> Result<String, RenderError> {
    let mut out = String::new();
    let mut floor: Option<u8> = None;

    for block in &document.blocks {
        if let Block::Heading { level, children } = block {
            match (heading, floor) {
                (None, None) => floor = Some(*level),
                (None, Some(_)) => break,
                (Some(label), None) => {
                    if raw_text(children).is_ok_and(|text| text == label) {
                        floor = Some(*level);
                    }
                }
                (Some(_), Some(floor)) if *level <= floor => break,
                (Some(_), Some(_)) => {
                    out.push_str(&format!("<b>{}</b>", raw_text(children)?));
                }
            }
            continue;
        }

        if floor.is_some() {
            render_block(&mut out, block)?;
        }
    }

    Ok(out.trim_matches('\n').to_owned())
}

fn render_block(out: &mut String, block: &Block) -> Result<(), RenderError> {
    match block {
        Block::BlankLine => out.push_str("\n\n"),
        Block::Paragraph(children) => render_inlines(out, children)?,
        Block::Quote(children) => {
            if let Some(inlines) = single_paragraph(children)? {
                render_inlines(out, inlines)?;
            }
        }
        Block::List { items, .. } => render_list(out, items)?,
        Block::FencedCode(lines) => out.push_str(lines.join("\n").trim_matches('\n')),
        Block::Heading { .. } => return UnexpectedBlockSnafu { kind: block.kind() }.fail(),
    }
    Ok(())
}

/// Renders a list as `<ul>` with one `<li>` line per entry.
///
/// Each entry may hold at most one paragraph.
fn render_list(out: &mut String, items: &[ListItem]) -> Result<(), RenderError> {
    out.push_str("<ul>");
    for item in items {
        out.push_str("\n<li>");
        if let Some(inlines) = single_paragraph(&item.children)? {
            let mut text = String::new();
            render_inlines(&mut text, inlines)?;
            out.push_str(text.trim_matches('\n'));
        }
        out.push_str("</li>");
    }
    out.push_str("\n</ul>");
    Ok(())
}

/// Returns the inlines of a container that holds one paragraph, or `None`
/// if it is empty.
///
/// A second block has no separator in the output format, so it is rejected
/// along with any non-paragraph child.
fn single_paragraph(children: &[Block]) -> Result<Option<&[Inline]>, RenderError> {
    match children {
        [] => Ok(None),
        [Block::Paragraph(inlines)] => Ok(Some(inlines)),
        [Block::Paragraph(_), extra, ..] | [extra, ..] => {
            UnexpectedBlockSnafu { kind: extra.kind() }.fail()
        }
    }
}

fn render_inlines(out: &mut String, inlines: &[Inline]) -> Result<(), RenderError> {
    for inline in inlines {
        match inline {
            Inline::RawText(text) => out.push_str(text),
            Inline::Link {
                destination,
                children,
            } => push_link(out, destination, children)?,
            Inline::Emphasis(children) | Inline::StrongEmphasis(children) => {
                out.push_str(&format!("<b>{}</b>", raw_text(children)?));
            }
            Inline::CodeSpan(code) => out.push_str(&escape_html(code)),
        }
    }
    Ok(())
}

fn push_link(out: &mut String, destination: &str, children: &[Inline]) -> Result<(), RenderError> {
    out.push_str(&format!(
        "<a href=\"{destination}\">{}</a>",
        raw_text(children)?
    ));
    Ok(())
}

/// Builds the plain text of emphasis, link and heading content.
///
/// Only text and links are allowed; the result is trimmed of surrounding
/// newlines.
fn raw_text(inlines: &[Inline]) -> Result<String, RenderError> {
    let mut text = String::new();
    for inline in inlines {
        match inline {
            Inline::RawText(raw) => text.push_str(raw),
            Inline::Link {
                destination,
                children,
            } => push_link(&mut text, destination, children)?,
            other => return UnexpectedInlineSnafu { kind: other.kind() }.fail(),
        }
    }
    Ok(text.trim_matches('\n').to_owned())
}

/// Escapes text for literal display inside HTML.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
