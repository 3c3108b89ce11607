//! # Link Tokenizer
//!
//! Scans document text for link occurrences using one unified pattern:
//!
//! - **Wiki-links**: `[[Page Title]]`, optionally written `#[[Page Title]]`. The inner text is the
//!   link's title.
//! - **Tags**: `#tag`, terminated by whitespace, `#`, a backtick or a comma.
//!
//! [`find_links`] returns a lazy [`Links`] iterator. Matches never overlap and scanning resumes
//! after each match. Calling [`find_links`] again over the same text restarts the scan.
//!
//! Offsets are byte offsets into the scanned text. [`position_at`] converts them to
//! line/character positions for callers that build editor ranges.

use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};
use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const EMBED_MARKER: char = '!';

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:#?\[\[)(?P<page>[^\]`\r\n]+)(?:\]\])|#(?P<tag>[^\s#`,]+)")
        .expect("link pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    WikiLink,
    Tag,
}

/// A single link token found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOccurrence {
    pub title: String,
    pub kind: LinkKind,
    /// Byte offset of the full token, including brackets or hash.
    pub start: usize,
    pub end: usize,
    /// Byte offsets of the inner title text.
    pub content_start: usize,
    pub content_end: usize,
}

impl LinkOccurrence {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn content_span(&self) -> Range<usize> {
        self.content_start..self.content_end
    }

    /// True when `offset` lies within the full token. The end is inclusive so a cursor sitting
    /// right after `]]` still counts as on the link.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Lazy iterator over the link occurrences of a text.
pub struct Links<'t> {
    captures: CaptureMatches<'static, 't>,
}

impl Iterator for Links<'_> {
    type Item = LinkOccurrence;

    fn next(&mut self) -> Option<LinkOccurrence> {
        let caps = self.captures.next()?;
        let full = caps.get(0)?;
        let (kind, content) = match (caps.name("page"), caps.name("tag")) {
            (Some(page), _) => (LinkKind::WikiLink, page),
            (None, Some(tag)) => (LinkKind::Tag, tag),
            (None, None) => return None,
        };
        Some(LinkOccurrence {
            title: content.as_str().to_string(),
            kind,
            start: full.start(),
            end: full.end(),
            content_start: content.start(),
            content_end: content.end(),
        })
    }
}

pub fn find_links(text: &str) -> Links<'_> {
    Links {
        captures: LINK_PATTERN.captures_iter(text),
    }
}

/// The occurrence under `offset`, if any.
pub fn link_at(text: &str, offset: usize) -> Option<LinkOccurrence> {
    find_links(text)
        .take_while(|occurrence| occurrence.start <= offset)
        .find(|occurrence| occurrence.contains(offset))
}

/// True when a wiki-link occurrence is written as an embed (`![[...]]`).
pub fn is_embed(text: &str, occurrence: &LinkOccurrence) -> bool {
    occurrence.kind == LinkKind::WikiLink
        && text[..occurrence.start].chars().next_back() == Some(EMBED_MARKER)
}

/// A zero-based line/character position. `character` counts chars, not bytes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn from_offsets(text: &str, span: Range<usize>) -> TextRange {
        TextRange {
            start: position_at(text, span.start),
            end: position_at(text, span.end),
        }
    }
}

/// Convert a byte offset into a line/character position. Offsets past the end clamp to the end.
pub fn position_at(text: &str, offset: usize) -> Position {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &text[..offset];
    let line_start = before.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    Position {
        line: before.matches('\n').count(),
        character: before[line_start..].chars().count(),
    }
}

/// The full line containing `offset`, without its line terminator.
pub fn line_at(text: &str, offset: usize) -> &str {
    let offset = offset.min(text.len());
    let line_start = text[..offset].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let line_end = text[offset..]
        .find('\n')
        .map(|idx| offset + idx)
        .unwrap_or(text.len());
    text[line_start..line_end].trim_end_matches('\r')
}
