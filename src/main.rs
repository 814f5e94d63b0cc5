//! cvldoc — extract documentation elements from CVL specification files.
//!
//! Two modes:
//!
//! - **stdin mode**: `cvldoc < Vault.spec`
//! - **file mode**: `cvldoc specs/*.spec -f json`

use anyhow::{Context, Result};
use clap::Parser;
use cvldoc::CvlElement;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "cvldoc",
    about = "Extract structured documentation from CVL specification files"
)]
struct Cli {
    /// Input files (glob patterns supported). If omitted, reads from stdin.
    files: Vec<String>,

    /// Output format: json (default), text
    #[arg(short = 'f', long, default_value = "json")]
    format: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let render = renderer(&cli.format)?;

    if cli.files.is_empty() {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        print!("{}", render(&cvldoc::parse_string(&input))?);
        return Ok(());
    }

    let files = expand_globs(&cli.files)?;
    anyhow::ensure!(!files.is_empty(), "no input files matched");

    let mut failed = 0usize;
    for path in &files {
        match cvldoc::parse(path) {
            Ok(elements) => {
                if files.len() > 1 {
                    println!("// {}", path.display());
                }
                print!("{}", render(&elements)?);
            }
            Err(e) => {
                eprintln!("warning: skipping {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }
    anyhow::ensure!(failed < files.len(), "all input files failed");
    Ok(())
}

type Render = fn(&[CvlElement]) -> Result<String>;

fn renderer(format: &str) -> Result<Render> {
    match format {
        "json" => Ok(render_json),
        "text" => Ok(render_text),
        _ => anyhow::bail!("unknown format: {}. Use json or text", format),
    }
}

fn render_json(elements: &[CvlElement]) -> Result<String> {
    let mut out =
        serde_json::to_string_pretty(elements).context("failed to serialize elements")?;
    out.push('\n');
    Ok(out)
}

/// One element per line: `name(type name, ...) returns type`, with
/// `<freestanding>` for blocks that document nothing.
fn render_text(elements: &[CvlElement]) -> Result<String> {
    let mut out = String::new();
    for element in elements {
        out.push_str(element.name().unwrap_or("<freestanding>"));
        if let Some(params) = element.params() {
            let list = params
                .iter()
                .map(|(name, ty)| {
                    if ty.is_empty() {
                        name.clone()
                    } else {
                        format!("{ty} {name}")
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("({list})"));
        }
        if let Some(returns) = element.returns() {
            out.push_str(&format!(" returns {returns}"));
        }
        out.push('\n');
    }
    Ok(out)
}

/// Expand glob patterns into a sorted, deduplicated list of file paths.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            eprintln!("warning: no files matched: {pattern}");
        }
        files.extend(matches);
    }
    files.sort();
    files.dedup();
    Ok(files)
}
