// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown loading into a closed block/inline tree.
//!
//! The README is parsed with `pulldown-cmark` and its event stream is folded
//! into the small set of node types the description renderer understands.
//! Everything outside that set is rejected while loading, so a README that
//! uses tables, images, raw HTML or similar fails loudly instead of losing
//! content in the generated description.
//!
//! # Example
//!
//! ```
//! use fivedesc::document::{Block, Inline, parse_document};
//!
//! let doc = parse_document("# Title\n\nHello *world*.\n").unwrap();
//!
//! assert_eq!(doc.blocks.len(), 3);
//! assert_eq!(doc.blocks[1], Block::BlankLine);
//! assert_eq!(
//!     doc.blocks[2],
//!     Block::Paragraph(vec![
//!         Inline::RawText("Hello ".into()),
//!         Inline::Emphasis(vec![Inline::RawText("world".into())]),
//!         Inline::RawText(".".into()),
//!     ])
//! );
//! ```

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use snafu::prelude::*;
use std::collections::BTreeMap;
use std::ops::Range;

/// Error type for markdown loading failures.
///
/// The whole README is checked, not just the sections that get rendered.
/// A badge image above the title or an HTML comment anywhere in the file
/// fails the load, so such content has to be removed from the README first.
#[derive(Debug, Snafu)]
pub enum DocumentError {
    /// The markdown uses a construct outside the supported subset.
    #[snafu(display("unsupported markdown construct: {kind}"))]
    Unsupported {
        /// Name of the offending construct (e.g. `Image`, `Table`).
        kind: String,
    },

    /// The parser stopped emitting events inside an open element.
    #[snafu(display("markdown ended inside an unterminated {kind}"))]
    Truncated {
        /// The element that was never closed.
        kind: String,
    },
}

/// A parsed README.
///
/// Created once per run and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Top-level blocks in source order.
    pub blocks: Vec<Block>,

    /// Link reference definitions, keyed by lower-cased label.
    pub links: BTreeMap<String, LinkDefinition>,
}

/// The target of a link reference definition (`[label]: destination "title"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDefinition {
    /// The link destination.
    pub destination: String,

    /// The optional link title.
    pub title: Option<String>,
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// An ATX or setext heading.
    Heading {
        /// Heading level, 1 through 6.
        level: u8,
        /// The heading's inline content.
        children: Vec<Inline>,
    },

    /// A paragraph of inline content.
    Paragraph(Vec<Inline>),

    /// A block quote.
    Quote(Vec<Block>),

    /// A bullet or ordered list.
    List {
        /// Whether the list is numbered.
        ordered: bool,
        /// The list entries in source order.
        items: Vec<ListItem>,
    },

    /// A fenced code block, one entry per source line.
    FencedCode(Vec<String>),

    /// One or more blank lines separating two top-level blocks.
    BlankLine,
}

impl Block {
    /// Returns the variant name, for error reporting.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "Heading",
            Self::Paragraph(_) => "Paragraph",
            Self::Quote(_) => "Quote",
            Self::List { .. } => "List",
            Self::FencedCode(_) => "FencedCode",
            Self::BlankLine => "BlankLine",
        }
    }
}

/// A single list entry.
///
/// Tight list items (no blank lines between entries) have their inline
/// content wrapped in an implicit [`Block::Paragraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    /// The blocks making up the entry.
    pub children: Vec<Block>,
}

/// An inline node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Literal text. Line breaks are folded in as `\n`.
    RawText(String),

    /// An inline or reference link.
    Link {
        /// The resolved link destination.
        destination: String,
        /// The link text.
        children: Vec<Inline>,
    },

    /// `*emphasis*` or `_emphasis_`.
    Emphasis(Vec<Inline>),

    /// `**strong**` or `__strong__`.
    StrongEmphasis(Vec<Inline>),

    /// `` `code` ``.
    CodeSpan(String),
}

impl Inline {
    /// Returns the variant name, for error reporting.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RawText(_) => "RawText",
            Self::Link { .. } => "Link",
            Self::Emphasis(_) => "Emphasis",
            Self::StrongEmphasis(_) => "StrongEmphasis",
            Self::CodeSpan(_) => "CodeSpan",
        }
    }
}

/// Parses markdown source into a [`Document`].
///
/// # Errors
///
/// Returns [`DocumentError::Unsupported`] if the source contains any
/// construct outside the supported subset: indented code blocks, thematic
/// breaks, HTML, images, and anything else that is not a heading,
/// paragraph, quote, list, fenced code block, emphasis, code span or link.
pub fn parse_document(source: &str) -> Result<Document, DocumentError> {
    let parser = Parser::new_ext(source, Options::empty());

    let links = parser
        .reference_definitions()
        .iter()
        .map(|(label, def)| {
            (
                label.to_lowercase(),
                LinkDefinition {
                    destination: String::from(&*def.dest),
                    title: def.title.as_deref().map(str::to_owned),
                },
            )
        })
        .collect();

    let loader = Loader {
        source,
        events: parser.into_offset_iter().collect::<Vec<_>>().into_iter(),
    };

    Ok(Document {
        blocks: loader.document()?,
        links,
    })
}

/// Folds the parser's event stream into [`Block`]s.
struct Loader<'a> {
    source: &'a str,
    events: std::vec::IntoIter<(Event<'a>, Range<usize>)>,
}

impl<'a> Loader<'a> {
    fn document(mut self) -> Result<Vec<Block>, DocumentError> {
        let mut blocks = Vec::new();
        let mut previous_end = None;

        while let Some((event, range)) = self.events.next() {
            let tag = match event {
                Event::Start(tag) => tag,
                other => return Err(unsupported_event(&other)),
            };

            if let Some(end) = previous_end
                && has_blank_line(self.source, end, range.start)
            {
                blocks.push(Block::BlankLine);
            }

            blocks.push(self.block(tag)?);
            previous_end = Some(content_end(self.source, &range));
        }

        Ok(blocks)
    }

    fn next_event(&mut self, end: TagEnd) -> Result<Event<'a>, DocumentError> {
        self.events.next().map(|(event, _)| event).context(TruncatedSnafu {
            kind: format!("{end:?}"),
        })
    }

    fn block(&mut self, tag: Tag<'a>) -> Result<Block, DocumentError> {
        let end = tag.to_end();

        match tag {
            Tag::Heading { level, .. } => Ok(Block::Heading {
                level: level as u8,
                children: self.inlines(end)?,
            }),
            Tag::Paragraph => Ok(Block::Paragraph(self.inlines(end)?)),
            Tag::BlockQuote(_) => Ok(Block::Quote(self.blocks(end)?)),
            Tag::List(start) => Ok(Block::List {
                ordered: start.is_some(),
                items: self.items(end)?,
            }),
            Tag::CodeBlock(CodeBlockKind::Fenced(_)) => Ok(Block::FencedCode(self.code(end)?)),
            Tag::CodeBlock(CodeBlockKind::Indented) => UnsupportedSnafu {
                kind: "indented code block",
            }
            .fail(),
            other => Err(unsupported_tag(&other)),
        }
    }

    fn blocks(&mut self, end: TagEnd) -> Result<Vec<Block>, DocumentError> {
        let mut blocks = Vec::new();
        loop {
            match self.next_event(end)? {
                Event::End(found) if found == end => return Ok(blocks),
                Event::Start(tag) => blocks.push(self.block(tag)?),
                other => return Err(unsupported_event(&other)),
            }
        }
    }

    fn items(&mut self, end: TagEnd) -> Result<Vec<ListItem>, DocumentError> {
        let mut items = Vec::new();
        loop {
            match self.next_event(end)? {
                Event::End(found) if found == end => return Ok(items),
                Event::Start(Tag::Item) => items.push(self.item()?),
                other => return Err(unsupported_event(&other)),
            }
        }
    }

    fn item(&mut self) -> Result<ListItem, DocumentError> {
        let mut children = Vec::new();
        let mut pending = Vec::new();

        loop {
            match self.next_event(TagEnd::Item)? {
                Event::End(TagEnd::Item) => break,
                Event::Start(tag) if !is_inline_tag(&tag) => {
                    if !pending.is_empty() {
                        children.push(Block::Paragraph(std::mem::take(&mut pending)));
                    }
                    children.push(self.block(tag)?);
                }
                event => push_inline(&mut pending, self.inline(event)?),
            }
        }

        if !pending.is_empty() {
            children.push(Block::Paragraph(pending));
        }

        Ok(ListItem { children })
    }

    fn code(&mut self, end: TagEnd) -> Result<Vec<String>, DocumentError> {
        let mut text = String::new();
        loop {
            match self.next_event(end)? {
                Event::End(found) if found == end => {
                    return Ok(text.lines().map(str::to_owned).collect());
                }
                Event::Text(chunk) => text.push_str(&chunk),
                other => return Err(unsupported_event(&other)),
            }
        }
    }

    fn inlines(&mut self, end: TagEnd) -> Result<Vec<Inline>, DocumentError> {
        let mut inlines = Vec::new();
        loop {
            match self.next_event(end)? {
                Event::End(found) if found == end => return Ok(inlines),
                event => push_inline(&mut inlines, self.inline(event)?),
            }
        }
    }

    fn inline(&mut self, event: Event<'a>) -> Result<Inline, DocumentError> {
        match event {
            Event::Text(text) => Ok(Inline::RawText(text.into_string())),
            Event::Code(code) => Ok(Inline::CodeSpan(code.into_string())),
            Event::SoftBreak | Event::HardBreak => Ok(Inline::RawText("\n".to_owned())),
            Event::Start(tag) => {
                let end = tag.to_end();
                match tag {
                    Tag::Emphasis => Ok(Inline::Emphasis(self.inlines(end)?)),
                    Tag::Strong => Ok(Inline::StrongEmphasis(self.inlines(end)?)),
                    Tag::Link { dest_url, .. } => Ok(Inline::Link {
                        destination: dest_url.into_string(),
                        children: self.inlines(end)?,
                    }),
                    other => Err(unsupported_tag(&other)),
                }
            }
            other => Err(unsupported_event(&other)),
        }
    }
}

const fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(tag, Tag::Emphasis | Tag::Strong | Tag::Link { .. })
}

/// Appends an inline node, merging consecutive text runs.
fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    match inline {
        Inline::RawText(text) => {
            if let Some(Inline::RawText(previous)) = inlines.last_mut() {
                previous.push_str(&text);
            } else {
                inlines.push(Inline::RawText(text));
            }
        }
        other => inlines.push(other),
    }
}

/// Returns the offset just past the last non-whitespace byte of a block.
///
/// Block ranges may run over trailing blank lines (list items do), which
/// would otherwise hide the separator from [`has_blank_line`].
fn content_end(source: &str, range: &Range<usize>) -> usize {
    source
        .get(range.clone())
        .map_or(range.end, |block| range.start + block.trim_end().len())
}

/// Checks whether the source between two top-level blocks holds a blank line.
///
/// `previous_end` may fall either before or after the newline that ends the
/// previous block; a partial first line is never counted as blank.
fn has_blank_line(source: &str, previous_end: usize, next_start: usize) -> bool {
    let gap = source.get(previous_end..next_start).unwrap_or_default();
    let at_line_start = source
        .get(..previous_end)
        .is_some_and(|before| before.is_empty() || before.ends_with('\n'));

    let gap = if at_line_start {
        gap
    } else {
        match gap.split_once('\n') {
            Some((_, rest)) => rest,
            None => return false,
        }
    };

    gap.split_inclusive('\n')
        .any(|line| line.ends_with('\n') && line.trim().is_empty())
}

fn unsupported_tag(tag: &Tag<'_>) -> DocumentError {
    UnsupportedSnafu {
        kind: construct_name(&format!("{tag:?}")),
    }
    .build()
}

fn unsupported_event(event: &Event<'_>) -> DocumentError {
    match event {
        Event::Start(tag) => unsupported_tag(tag),
        other => UnsupportedSnafu {
            kind: construct_name(&format!("{other:?}")),
        }
        .build(),
    }
}

/// Extracts the variant name from a `Debug` rendering such as `Image { .. }`.
fn construct_name(debug: &str) -> String {
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or(debug)
        .to_owned()
}
