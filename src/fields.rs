//! Whitespace field tokenizer that keeps byte spans, so single values can be
//! replaced without touching the rest of a line.

use std::ops::Range;

/// Everything after this marker is a comment in both input formats.
pub const COMMENT: char = ';';

/// A whitespace-delimited field and its byte span within the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<'a> {
    pub text: &'a str,
    pub span: Range<usize>,
}

impl Field<'_> {
    pub fn parse(&self) -> Option<f64> {
        self.text.parse().ok()
    }
}

/// Split the content of `line` in front of the first comment marker into
/// whitespace-delimited fields. Tabs and runs of spaces both delimit.
pub fn fields(line: &str) -> Vec<Field<'_>> {
    let body = line.find(COMMENT).map_or(line, |end| &line[..end]);
    let mut out = Vec::new();
    let mut start = None;
    for (idx, ch) in body.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push(Field {
                    text: &body[s..idx],
                    span: s..idx,
                });
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(Field {
            text: &body[s..],
            span: s..body.len(),
        });
    }
    out
}

/// Replace the given spans of `line`. Spans must not overlap.
pub fn splice(line: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(span, _)| span.start);
    let mut out = String::with_capacity(line.len() + 16);
    let mut cursor = 0;
    for (span, text) in edits {
        out.push_str(&line[cursor..span.start]);
        out.push_str(&text);
        cursor = span.end;
    }
    out.push_str(&line[cursor..]);
    out
}

/// Text for `value` replacing the field `old`. The original text is kept when
/// it already encodes exactly this value.
pub fn format_value(old: &Field<'_>, value: f64) -> String {
    match old.parse() {
        Some(current) if current == value => old.text.to_string(),
        _ => value.to_string(),
    }
}

/// Split `content` into lines keeping their terminators, so that joining the
/// pieces reproduces the input byte for byte.
pub fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

/// The line without its `\n` or `\r\n` terminator, and the terminator.
pub fn strip_terminator(line: &str) -> (&str, &str) {
    let body = line
        .strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line);
    (body, &line[body.len()..])
}
