//! cvldoc — extract structured documentation from CVL specification files.
//!
//! CVL sources annotate rules, invariants, functions, definitions, ghosts,
//! hooks and methods blocks with `///` and `/** ... */` documentation
//! comments carrying `@param` / `@returns` directives. This crate scans a
//! source buffer, groups documentation comments into blocks, parses the
//! directive micro-grammar, associates each block with the declaration that
//! follows it, and returns one immutable [`CvlElement`] per block in source
//! order.
//!
//! The pipeline is a pure, single-pass transformation: no shared state, no
//! I/O outside [`parse`]'s file read, safe to call from multiple threads.

mod block;
mod decl;
mod element;
mod scanner;
mod tags;

pub use element::CvlElement;

use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input path could not be read.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    /// The file contents are not valid UTF-8 text.
    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Read the file at `path` and extract its documentation elements.
///
/// Equivalent to [`parse_string`] over the file contents: for any path with
/// valid text contents, `parse(p)` and `parse_string(&contents)` yield the
/// same sequence.
pub fn parse(path: impl AsRef<Path>) -> Result<Vec<CvlElement>, Error> {
    let bytes = fs::read(path.as_ref())?;
    let text = String::from_utf8(bytes)?;
    Ok(parse_string(&text))
}

/// Extract documentation elements from CVL source text.
///
/// Deterministic: identical input always yields a structurally identical
/// sequence. Malformed input never aborts the pass; every doc block yields
/// an element with its raw text populated.
pub fn parse_string(text: &str) -> Vec<CvlElement> {
    let spans: Vec<_> = scanner::Scanner::new(text).collect();
    let blocks = block::extract_blocks(text, &spans);
    element::assemble(text, &spans, &blocks)
}
