//! Tag micro-grammar inside a documentation block.
//!
//! Line-oriented: `@param NAME TYPE...` and `@returns TYPE...`, where the
//! type expression runs until the next directive or the end of the block.
//! Everything else — untagged prose, unknown `@` sigils, malformed
//! directives — accumulates as free-form description and is never dropped.

use crate::block::DocBlock;
use regex::Regex;
use std::sync::LazyLock;

static RE_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Structured data parsed from one block. Param names are unique; a
/// duplicate `@param` overwrites the earlier type (later occurrence wins)
/// while keeping the original position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedTags {
    pub description: String,
    pub params: Vec<(String, String)>,
    pub returns: Option<String>,
}

/// A directive with a missing or invalid operand. Recovered locally: the
/// offending line is folded back into the description.
struct MalformedTag;

/// Where continuation lines currently accumulate.
#[derive(Clone, Copy)]
enum Collector {
    Description,
    ParamType(usize),
    Returns,
}

pub fn parse_tags(block: &DocBlock) -> ParsedTags {
    let mut tags = ParsedTags::default();
    let mut collector = Collector::Description;

    for line in content_lines(&block.raw) {
        if let Some(rest) = line.strip_prefix('@') {
            let (sigil, operands) = split_word(rest);
            match sigil {
                "param" => match parse_param(operands) {
                    Ok((name, ty)) => {
                        collector = Collector::ParamType(upsert(&mut tags.params, name, ty));
                        continue;
                    }
                    Err(MalformedTag) => collector = Collector::Description,
                },
                "returns" | "return" => {
                    let ty = operands.trim();
                    if ty.is_empty() {
                        // missing operand, keep the line as prose
                        collector = Collector::Description;
                    } else {
                        tags.returns = Some(ty.to_string());
                        collector = Collector::Returns;
                        continue;
                    }
                }
                // unknown sigil: preserved verbatim as free-form text
                _ => collector = Collector::Description,
            }
        }

        match collector {
            Collector::Description => {
                if !line.is_empty() || !tags.description.is_empty() {
                    if !tags.description.is_empty() {
                        tags.description.push('\n');
                    }
                    tags.description.push_str(&line);
                }
            }
            Collector::ParamType(idx) => append_word(&mut tags.params[idx].1, &line),
            Collector::Returns => {
                if let Some(ty) = tags.returns.as_mut() {
                    append_word(ty, &line);
                }
            }
        }
    }

    while tags.description.ends_with('\n') {
        tags.description.pop();
    }
    tags
}

/// Strips comment markers and yields trimmed content lines.
fn content_lines(raw: &str) -> Vec<String> {
    if raw.starts_with("/*") {
        let inner = raw
            .trim_start_matches('/')
            .trim_start_matches('*')
            .trim_end_matches('/')
            .trim_end_matches('*');
        inner
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim().to_string())
            .collect()
    } else {
        raw.lines()
            .map(|l| l.trim().trim_start_matches('/').trim().to_string())
            .collect()
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(|c: char| c.is_ascii_whitespace()) {
        Some((word, rest)) => (word, rest),
        None => (s, ""),
    }
}

fn parse_param(operands: &str) -> Result<(String, String), MalformedTag> {
    let (name, ty) = split_word(operands.trim());
    if !RE_IDENT.is_match(name) {
        return Err(MalformedTag);
    }
    Ok((name.to_string(), ty.trim().to_string()))
}

/// Insert or overwrite a parameter entry, returning its position.
fn upsert(params: &mut Vec<(String, String)>, name: String, ty: String) -> usize {
    if let Some(idx) = params.iter().position(|(n, _)| *n == name) {
        params[idx].1 = ty;
        idx
    } else {
        params.push((name, ty));
        params.len() - 1
    }
}

fn append_word(dest: &mut String, line: &str) {
    if line.is_empty() {
        return;
    }
    if !dest.is_empty() {
        dest.push(' ');
    }
    dest.push_str(line);
}
