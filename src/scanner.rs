//! Source scanner — classifies raw CVL text into spans.
//!
//! A single forward pass produces non-overlapping spans in increasing byte
//! order, covering the entire input. Comment-like sequences inside string
//! or character literals are literal text, ordinary block comments nest,
//! and unterminated literals or comments extend to end of input so the
//! scan never aborts early.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Whitespace,
    Code,
    StrLit,
    CharLit,
    /// `//` comment (fewer than three slashes)
    LineComment,
    /// `/* ... */` comment, including the degenerate `/**/`
    BlockComment,
    /// `///` documentation line
    DocLine,
    /// `/** ... */` documentation block
    DocBlock,
    /// `////` line or `/*** ... */` block — emitted as a freestanding element
    FreeForm,
}

/// A classified region of source text. `start`/`end` are byte offsets into
/// the input; `line` and `column` are 1-based and refer to the span start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

/// Forward-only scanner over an input buffer.
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Scanner {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self, len: usize) {
        for c in self.src[self.pos..self.pos + len].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += len;
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        let rest = &self.src[self.pos..];
        let c = rest.chars().next()?;

        let (kind, len) = if c.is_whitespace() {
            (SpanKind::Whitespace, whitespace_len(rest))
        } else if rest.starts_with("//") {
            let slashes = rest.bytes().take_while(|&b| b == b'/').count();
            let kind = match slashes {
                2 => SpanKind::LineComment,
                3 => SpanKind::DocLine,
                _ => SpanKind::FreeForm,
            };
            (kind, line_len(rest))
        } else if rest.starts_with("/*") {
            if rest.starts_with("/***") {
                (SpanKind::FreeForm, starred_len(rest))
            } else if rest.starts_with("/**/") {
                (SpanKind::BlockComment, 4)
            } else if rest.starts_with("/**") {
                (SpanKind::DocBlock, starred_len(rest))
            } else {
                (SpanKind::BlockComment, block_comment_len(rest))
            }
        } else if c == '"' {
            (SpanKind::StrLit, literal_len(rest, '"'))
        } else if c == '\'' {
            (SpanKind::CharLit, literal_len(rest, '\''))
        } else {
            (SpanKind::Code, code_len(rest))
        };

        let span = Span {
            kind,
            start: self.pos,
            end: self.pos + len,
            line: self.line,
            column: self.column,
        };
        self.advance(len);
        Some(span)
    }
}

fn whitespace_len(rest: &str) -> usize {
    rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len())
}

/// Length up to (excluding) the next newline.
fn line_len(rest: &str) -> usize {
    rest.find('\n').unwrap_or(rest.len())
}

/// Length of a `/**`-style span, up to and including the first `*/`.
fn starred_len(rest: &str) -> usize {
    match rest[3..].find("*/") {
        Some(i) => 3 + i + 2,
        None => rest.len(),
    }
}

/// Length of an ordinary block comment; `/* */` pairs nest.
fn block_comment_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"/*") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// Length of a quoted literal with backslash escapes.
fn literal_len(rest: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in rest.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return i + c.len_utf8();
        }
    }
    rest.len()
}

/// Length of a run of code characters: stops before whitespace, quotes,
/// or a comment opener.
fn code_len(rest: &str) -> usize {
    let mut iter = rest.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if i == 0 {
            continue;
        }
        if c.is_whitespace() || c == '"' || c == '\'' {
            return i;
        }
        if c == '/' {
            if let Some(&(_, next)) = iter.peek() {
                if next == '/' || next == '*' {
                    return i;
                }
            }
        }
    }
    rest.len()
}
