//! Turns the loosely-marked-up recommendation text returned by the webhook
//! into display blocks the frontend can render without parsing anything.
//!
//! Line rules, checked in order on the trimmed line:
//! - `**Heading**` (starts and ends with `**`) → [`Block::Heading`]
//! - `***item` → [`Block::NestedBullet`]
//! - `**bold** rest` → [`Block::Paragraph`] with an inline bold span
//! - `*item` → [`Block::Bullet`]
//! - anything else → [`Block::Paragraph`]
//!
//! Blank lines, and lines that are only markers (`***`, `****`), are dropped. Inline `**text**` becomes [`Span::Bold`]; there is
//! no escaping and bold does not nest.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading { spans: Vec<Span> },
    Paragraph { spans: Vec<Span> },
    Bullet { spans: Vec<Span> },
    NestedBullet { spans: Vec<Span> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Span {
    Text { text: String },
    Bold { text: String },
}

impl Block {
    pub fn spans(&self) -> &[Span] {
        match self {
            Block::Heading { spans }
            | Block::Paragraph { spans }
            | Block::Bullet { spans }
            | Block::NestedBullet { spans } => spans,
        }
    }
}

impl Span {
    pub fn text(s: impl Into<String>) -> Self {
        Span::Text { text: s.into() }
    }

    pub fn bold(s: impl Into<String>) -> Self {
        Span::Bold { text: s.into() }
    }
}

pub fn format_recommendation(text: &str) -> Vec<Block> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(classify_line)
        .filter(|block| !block.spans().is_empty())
        .collect()
}

fn classify_line(line: &str) -> Block {
    if line.len() >= 4 && line.starts_with("**") && line.ends_with("**") {
        let inner = &line[2..line.len() - 2];
        return Block::Heading {
            spans: split_spans(inner.trim()),
        };
    }

    if let Some(rest) = line.strip_prefix("***") {
        return Block::NestedBullet {
            spans: bullet_spans(rest),
        };
    }

    if line.starts_with("**") {
        return Block::Paragraph {
            spans: split_spans(line),
        };
    }

    if let Some(rest) = line.strip_prefix('*') {
        return Block::Bullet {
            spans: bullet_spans(rest),
        };
    }

    Block::Paragraph {
        spans: split_spans(line),
    }
}

/// Bullet text with stray closing asterisks removed. Only trailing plain text
/// is trimmed so a bullet ending in a bold run keeps it.
fn bullet_spans(rest: &str) -> Vec<Span> {
    let mut spans = split_spans(rest.trim());
    if let Some(Span::Text { text }) = spans.last_mut() {
        let trimmed = text.trim_end_matches('*').trim_end().to_string();
        if trimmed.is_empty() {
            spans.pop();
        } else {
            *text = trimmed;
        }
    }
    spans
}

/// Splits a line into plain and bold spans. A bold run is `**`, one or more
/// non-`*` characters, then `**`; leftmost match wins.
fn split_spans(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = line;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let inner_len = after.find('*').unwrap_or(after.len());

        if inner_len > 0 && after[inner_len..].starts_with("**") {
            plain.push_str(&rest[..start]);
            if !plain.is_empty() {
                spans.push(Span::text(std::mem::take(&mut plain)));
            }
            spans.push(Span::bold(&after[..inner_len]));
            rest = &after[inner_len + 2..];
        } else {
            // No bold run can start here; move past one '*'.
            plain.push_str(&rest[..start + 1]);
            rest = &rest[start + 1..];
        }
    }

    plain.push_str(rest);
    if !plain.is_empty() {
        spans.push(Span::text(plain));
    }
    spans
}
