//! Groups adjacent documentation spans into blocks.
//!
//! Consecutive `///` (or `////`) lines separated by a single line break
//! form one block; a blank line, ordinary comment, or code breaks the run.
//! Starred blocks stand alone. Each block keeps the verbatim source slice,
//! markers included.

use crate::scanner::{Span, SpanKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocBlock {
    /// Verbatim source slice, comment markers included.
    pub raw: String,
    pub start: usize,
    pub end: usize,
    /// Free-form comments yield elements but never associate with a declaration.
    pub free_form: bool,
}

pub fn extract_blocks(src: &str, spans: &[Span]) -> Vec<DocBlock> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < spans.len() {
        let span = &spans[i];
        match span.kind {
            SpanKind::DocBlock => {
                blocks.push(block_from(src, span.start, span.end, false));
                i += 1;
            }
            SpanKind::FreeForm if src[span.start..].starts_with("/*") => {
                blocks.push(block_from(src, span.start, span.end, true));
                i += 1;
            }
            SpanKind::DocLine | SpanKind::FreeForm => {
                let free_form = span.kind == SpanKind::FreeForm;
                let start = span.start;
                let mut end = span.end;
                let mut j = i + 1;
                while continues_run(src, spans, j, span.kind) {
                    end = spans[j + 1].end;
                    j += 2;
                }
                blocks.push(block_from(src, start, end, free_form));
                i = j;
            }
            _ => i += 1,
        }
    }

    blocks
}

/// True when `spans[j]` is a single line break and `spans[j + 1]` continues
/// the same run of doc lines. Blank lines (two or more newlines) break it.
fn continues_run(src: &str, spans: &[Span], j: usize, kind: SpanKind) -> bool {
    let (Some(sep), Some(next)) = (spans.get(j), spans.get(j + 1)) else {
        return false;
    };
    if sep.kind != SpanKind::Whitespace || next.kind != kind {
        return false;
    }
    if kind == SpanKind::FreeForm && src[next.start..].starts_with("/*") {
        return false;
    }
    src[sep.start..sep.end].matches('\n').count() == 1
}

fn block_from(src: &str, start: usize, end: usize, free_form: bool) -> DocBlock {
    DocBlock {
        raw: src[start..end].to_string(),
        start,
        end,
        free_form,
    }
}
