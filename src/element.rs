//! Final element assembly — reconciles tag-derived and declaration-derived
//! metadata into one immutable record per doc block.

use crate::block::DocBlock;
use crate::decl::{self, Signature};
use crate::scanner::Span;
use crate::tags::{self, ParsedTags};
use serde::{Deserialize, Serialize};

/// One extracted documentation element, in source order. Immutable once
/// built; `raw` is always a verbatim slice of the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvlElement {
    raw: String,
    name: Option<String>,
    returns: Option<String>,
    params: Option<Vec<(String, String)>>,
}

impl CvlElement {
    /// Exact source text of the doc block, markers included. Never empty.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Name of the documented construct, if a named declaration follows.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared or annotated return type.
    pub fn returns(&self) -> Option<&str> {
        self.returns.as_deref()
    }

    /// Ordered `(name, type)` pairs; names are pairwise distinct.
    pub fn params(&self) -> Option<&[(String, String)]> {
        self.params.as_deref()
    }
}

pub fn assemble(src: &str, spans: &[Span], blocks: &[DocBlock]) -> Vec<CvlElement> {
    let mut elements = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        let limit = blocks.get(i + 1).map_or(src.len(), |next| next.start);
        let (name, returns, params) = if block.free_form {
            (None, None, None)
        } else {
            let parsed = tags::parse_tags(block);
            merge(decl::associate(src, spans, block.end, limit), &parsed)
        };
        elements.push(CvlElement {
            raw: block.raw.clone(),
            name,
            returns,
            params,
        });
    }
    elements
}

type Merged = (Option<String>, Option<String>, Option<Vec<(String, String)>>);

/// Reconciliation policy: the declaration's own signature takes precedence;
/// tag-derived values only fill gaps its grammar leaves absent. A block with
/// no declaration is freestanding and carries no structured metadata.
fn merge(sig: Option<Signature>, tags: &ParsedTags) -> Merged {
    let Some(sig) = sig else {
        return (None, None, None);
    };

    let returns = sig.returns.or_else(|| tags.returns.clone());

    let params = match sig.params {
        Some(decl_params) => {
            let mut merged: Vec<(String, String)> = Vec::new();
            for p in decl_params {
                let ty = p
                    .ty
                    .or_else(|| tag_type(tags, &p.name))
                    .unwrap_or_default();
                match merged.iter_mut().find(|(n, _)| *n == p.name) {
                    Some(entry) => entry.1 = ty,
                    None => merged.push((p.name, ty)),
                }
            }
            (!merged.is_empty()).then_some(merged)
        }
        None => (!tags.params.is_empty()).then(|| tags.params.clone()),
    };

    (sig.name, returns, params)
}

fn tag_type(tags: &ParsedTags, name: &str) -> Option<String> {
    tags.params
        .iter()
        .find(|(n, ty)| n == name && !ty.is_empty())
        .map(|(_, ty)| ty.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Param;

    fn sig(name: &str, params: Option<Vec<Param>>, returns: Option<&str>) -> Signature {
        Signature {
            name: Some(name.to_string()),
            params,
            returns: returns.map(String::from),
        }
    }

    fn tags(params: &[(&str, &str)], returns: Option<&str>) -> ParsedTags {
        ParsedTags {
            description: String::new(),
            params: params
                .iter()
                .map(|(n, t)| (n.to_string(), t.to_string()))
                .collect(),
            returns: returns.map(String::from),
        }
    }

    #[test]
    fn declaration_type_beats_stale_tag() {
        let decl = sig(
            "r",
            Some(vec![Param {
                name: "x".into(),
                ty: Some("uint256".into()),
            }]),
            None,
        );
        let (_, _, params) = merge(Some(decl), &tags(&[("x", "uint128")], None));
        assert_eq!(params, Some(vec![("x".into(), "uint256".into())]));
    }

    #[test]
    fn tag_fills_untyped_declaration_param() {
        let decl = sig(
            "r",
            Some(vec![Param {
                name: "x".into(),
                ty: None,
            }]),
            None,
        );
        let (_, _, params) = merge(Some(decl), &tags(&[("x", "bool")], None));
        assert_eq!(params, Some(vec![("x".into(), "bool".into())]));
    }

    #[test]
    fn tags_are_sole_source_without_signature_syntax() {
        let decl = Signature::default();
        let (name, returns, params) =
            merge(Some(decl), &tags(&[("key", "bytes32")], Some("bool")));
        assert!(name.is_none());
        assert_eq!(returns.as_deref(), Some("bool"));
        assert_eq!(params, Some(vec![("key".into(), "bytes32".into())]));
    }

    #[test]
    fn declaration_returns_beats_tag_returns() {
        let decl = sig("f", None, Some("uint256"));
        let (_, returns, _) = merge(Some(decl), &tags(&[], Some("bool")));
        assert_eq!(returns.as_deref(), Some("uint256"));
    }

    #[test]
    fn freestanding_carries_no_metadata() {
        let (name, returns, params) = merge(None, &tags(&[("x", "uint")], Some("bool")));
        assert!(name.is_none() && returns.is_none() && params.is_none());
    }

    #[test]
    fn explicit_empty_param_list_stays_absent() {
        let decl = sig("r", Some(Vec::new()), None);
        let (_, _, params) = merge(Some(decl), &tags(&[("ghost_param", "uint")], None));
        assert!(params.is_none());
    }
}
