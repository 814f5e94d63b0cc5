//! Declaration associator — finds the CVL declaration immediately
//! following a doc block and extracts its name and signature.
//!
//! Whitespace and ordinary comments may sit between a block and its
//! declaration. Anything else (code that is not a declaration keyword,
//! another doc block, end of input) makes the block freestanding.

use crate::scanner::{Span, SpanKind};
use regex::Regex;
use std::sync::LazyLock;

static RE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:persistent\s+)?(rule|invariant|function|definition|ghost|methods|hook)\b")
        .unwrap()
});

static RE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static RE_RETURNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*returns\b").unwrap());

static RE_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// One declared parameter. The type is absent when the source gives only a
/// bare name; a `@param` tag may fill that gap during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Option<String>,
}

/// Signature extracted from a declaration header. All fields may be absent:
/// `methods` blocks and hooks carry neither name nor signature syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub name: Option<String>,
    pub params: Option<Vec<Param>>,
    pub returns: Option<String>,
}

/// Locate and parse the declaration following `block_end`, not looking past
/// `limit` (the start of the next doc block, or end of input).
pub fn associate(src: &str, spans: &[Span], block_end: usize, limit: usize) -> Option<Signature> {
    let mut decl_start = None;
    for span in spans.iter().filter(|s| s.start >= block_end && s.start < limit) {
        match span.kind {
            SpanKind::Whitespace | SpanKind::LineComment | SpanKind::BlockComment => continue,
            SpanKind::Code => {
                decl_start = Some(span.start);
                break;
            }
            _ => break,
        }
    }
    let text = masked(src, spans, decl_start?, limit);
    parse_header(&text)
}

/// Code-only view of `src[from..limit]`: comments and literals are replaced
/// by a space so the header grammar never sees their contents.
fn masked(src: &str, spans: &[Span], from: usize, limit: usize) -> String {
    let mut out = String::new();
    for span in spans.iter().filter(|s| s.start >= from && s.start < limit) {
        match span.kind {
            SpanKind::Code | SpanKind::Whitespace => out.push_str(&src[span.start..span.end]),
            _ => out.push(' '),
        }
    }
    out
}

fn parse_header(text: &str) -> Option<Signature> {
    let caps = RE_HEADER.captures(text)?;
    let keyword = caps.get(1)?.as_str();
    let rest = &text[caps.get(0)?.end()..];

    match keyword {
        "methods" | "hook" => Some(Signature::default()),
        "ghost" => ghost_header(rest),
        "rule" | "invariant" => {
            let (name, rest) = take_name(rest)?;
            let params = take_param_list(rest).map(|(inner, _)| parse_params(inner));
            Some(Signature {
                name: Some(name),
                params,
                returns: None,
            })
        }
        "function" | "definition" => {
            let (name, rest) = take_name(rest)?;
            let (params, rest) = match take_param_list(rest) {
                Some((inner, after)) => (Some(parse_params(inner)), after),
                None => (None, rest),
            };
            let returns = take_returns(rest);
            Some(Signature {
                name: Some(name),
                params,
                returns,
            })
        }
        _ => None,
    }
}

/// `ghost NAME(TYPES) returns TYPE`, `ghost mapping(...) NAME`, or
/// `ghost TYPE NAME`. The type-list form declares no named parameters.
fn ghost_header(rest: &str) -> Option<Signature> {
    let (first, after) = take_name(rest)?;
    let trimmed = after.trim_start();

    if first == "mapping" && trimmed.starts_with('(') {
        let (_, after_map) = take_param_list(after)?;
        let (name, _) = take_name(after_map)?;
        return Some(Signature {
            name: Some(name),
            params: None,
            returns: None,
        });
    }
    if trimmed.starts_with('(') {
        let (_, after_list) = take_param_list(after)?;
        return Some(Signature {
            name: Some(first),
            params: None,
            returns: take_returns(after_list),
        });
    }
    // plain `ghost TYPE NAME`
    let (name, _) = take_name(after)?;
    Some(Signature {
        name: Some(name),
        params: None,
        returns: None,
    })
}

fn take_name(rest: &str) -> Option<(String, &str)> {
    let caps = RE_NAME.captures(rest)?;
    let m = caps.get(1)?;
    Some((m.as_str().to_string(), &rest[m.end()..]))
}

/// Consume a balanced `( ... )` group, returning its inner text and the
/// remainder after the closing paren.
fn take_param_list(rest: &str) -> Option<(&str, &str)> {
    let open = rest.len() - rest.trim_start().len();
    if !rest[open..].starts_with('(') {
        return None;
    }
    let mut depth = 0i32;
    for (i, c) in rest[open..].char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth == 0 {
                    let end = open + i;
                    return Some((&rest[open + 1..end], &rest[end + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_params(inner: &str) -> Vec<Param> {
    split_top_level(inner)
        .into_iter()
        .filter_map(parse_param)
        .collect()
}

/// Split on commas outside any nested parentheses or brackets.
fn split_top_level(inner: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                pieces.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&inner[start..]);
    pieces
}

/// `TYPE NAME` where the name is the last top-level word; a single bare
/// identifier is a name with no declared type.
fn parse_param(piece: &str) -> Option<Param> {
    let piece = piece.trim();
    if piece.is_empty() {
        return None;
    }

    let mut depth = 0i32;
    let mut split_at = None;
    for (i, c) in piece.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => split_at = Some(i),
            _ => {}
        }
    }

    match split_at {
        Some(i) => {
            let name = piece[i..].trim();
            if !RE_IDENT.is_match(name) {
                return None;
            }
            Some(Param {
                name: name.to_string(),
                ty: Some(piece[..i].trim().to_string()),
            })
        }
        None => {
            if !RE_IDENT.is_match(piece) {
                return None;
            }
            Some(Param {
                name: piece.to_string(),
                ty: None,
            })
        }
    }
}

/// An explicit `returns TYPE` clause; the type runs to the body or
/// definition that follows.
fn take_returns(rest: &str) -> Option<String> {
    let m = RE_RETURNS.find(rest)?;
    let after = &rest[m.end()..];
    let mut depth = 0i32;
    let mut end = after.len();
    for (i, c) in after.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '{' | '=' | ';' if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    let ty = after[..end].trim();
    if ty.is_empty() {
        None
    } else {
        Some(ty.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn sig_after(src: &str, block_end: usize) -> Option<Signature> {
        let spans: Vec<_> = Scanner::new(src).collect();
        associate(src, &spans, block_end, src.len())
    }

    fn named_params(sig: &Signature) -> Vec<(String, Option<String>)> {
        sig.params
            .as_ref()
            .map(|ps| {
                ps.iter()
                    .map(|p| (p.name.clone(), p.ty.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn rule_with_params() {
        let sig = sig_after("rule transferOk(uint256 amount, address to) { }", 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("transferOk"));
        assert_eq!(
            named_params(&sig),
            vec![
                ("amount".into(), Some("uint256".into())),
                ("to".into(), Some("address".into())),
            ]
        );
        assert!(sig.returns.is_none());
    }

    #[test]
    fn rule_without_params() {
        let sig = sig_after("rule sanity { assert true; }", 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("sanity"));
        assert!(sig.params.is_none());
    }

    #[test]
    fn function_with_returns() {
        let sig = sig_after("function getBalance(address who) returns uint256 { }", 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("getBalance"));
        assert_eq!(sig.returns.as_deref(), Some("uint256"));
    }

    #[test]
    fn function_without_returns() {
        let sig = sig_after("function helper(env e) { }", 0).unwrap();
        assert!(sig.returns.is_none());
        assert_eq!(named_params(&sig), vec![("e".into(), Some("env".into()))]);
    }

    #[test]
    fn definition_returns_until_equals() {
        let sig = sig_after("definition twice(uint x) returns uint = x * 2;", 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("twice"));
        assert_eq!(sig.returns.as_deref(), Some("uint"));
    }

    #[test]
    fn invariant_decl() {
        let sig = sig_after("invariant solvency(address a) totalSupply() >= balanceOf(a);", 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("solvency"));
        assert_eq!(named_params(&sig), vec![("a".into(), Some("address".into()))]);
    }

    #[test]
    fn methods_block_has_no_signature() {
        let sig = sig_after("methods { function balanceOf(address) external returns uint256; }", 0)
            .unwrap();
        assert_eq!(sig, Signature::default());
    }

    #[test]
    fn hook_has_no_signature() {
        let sig = sig_after("hook Sstore balances[KEY address a] uint256 v { }", 0).unwrap();
        assert_eq!(sig, Signature::default());
    }

    #[test]
    fn ghost_function_form() {
        let sig = sig_after("ghost sumOf(address, address) returns mathint;", 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("sumOf"));
        assert!(sig.params.is_none());
        assert_eq!(sig.returns.as_deref(), Some("mathint"));
    }

    #[test]
    fn ghost_mapping_form() {
        let sig = sig_after("ghost mapping(address => uint256) shadowBalances;", 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("shadowBalances"));
        assert!(sig.params.is_none());
        assert!(sig.returns.is_none());
    }

    #[test]
    fn persistent_ghost() {
        let sig = sig_after("persistent ghost mathint counter;", 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("counter"));
    }

    #[test]
    fn comments_between_doc_and_decl_are_skipped() {
        let src = "// note\n/* note */\nrule foo() { }";
        let sig = sig_after(src, 0).unwrap();
        assert_eq!(sig.name.as_deref(), Some("foo"));
    }

    #[test]
    fn non_declaration_code_is_freestanding() {
        assert!(sig_after("using Vault as vault;", 0).is_none());
        assert!(sig_after("import \"base.spec\";", 0).is_none());
    }

    #[test]
    fn end_of_input_is_freestanding() {
        assert!(sig_after("   \n", 0).is_none());
        assert!(sig_after("", 0).is_none());
    }

    #[test]
    fn mapping_param_type_survives_commas() {
        let sig = sig_after("rule r(mapping(address => uint256) m, uint x) { }", 0).unwrap();
        assert_eq!(
            named_params(&sig),
            vec![
                ("m".into(), Some("mapping(address => uint256)".into())),
                ("x".into(), Some("uint".into())),
            ]
        );
    }

    #[test]
    fn bare_name_param_has_no_type() {
        let sig = sig_after("rule r(amount) { }", 0).unwrap();
        assert_eq!(named_params(&sig), vec![("amount".into(), None)]);
    }

    #[test]
    fn array_type_param() {
        let sig = sig_after("function f(uint256[] values) { }", 0).unwrap();
        assert_eq!(
            named_params(&sig),
            vec![("values".into(), Some("uint256[]".into()))]
        );
    }

    #[test]
    fn keyword_must_be_word_boundary() {
        assert!(sig_after("rulebook x;", 0).is_none());
    }
}
