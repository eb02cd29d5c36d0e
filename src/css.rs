//! Per-run stylesheet usage extraction.
//!
//! Converts the byte-range coverage drained at session teardown into one
//! pruned stylesheet per sheet with nonzero usage. The output deliberately
//! favors not losing declarations over minimality: the structural pass and
//! the textual fallback may duplicate rules, but nothing used is omitted.

use std::{fs, path::Path};

use derive_more::{Display, Error};
use lazy_regex::regex;

use crate::session::CoverageEntry;

/// One pruned stylesheet ready to be written out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrunedStylesheet {
    /// Output file name derived from the stylesheet URL.
    pub file_name: String,

    /// Pruned source.
    pub source: String,
}

/// Structural CSS parsing failure; recovered locally by falling back to
/// the textual extraction, never surfaced to the caller.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum CssParseError {
    /// A `/* ... */` comment never closes.
    #[display("unterminated comment")]
    UnterminatedComment,

    /// A quoted string never closes.
    #[display("unterminated string")]
    UnterminatedString,

    /// Braces do not balance by end of input.
    #[display("unbalanced braces")]
    UnbalancedBraces,
}

/// Converts coverage into pruned stylesheets, dropping entries with no
/// used ranges.
#[must_use]
pub fn extract(entries: &[CoverageEntry]) -> Vec<PrunedStylesheet> {
    entries
        .iter()
        .filter(|entry| !entry.ranges.is_empty())
        .map(|entry| {
            let fallback = fallback_text(entry);
            let source = match structural_prune(&entry.text) {
                Ok(kept) => format!("{kept}{fallback}"),
                Err(e) => {
                    tracing::debug!(
                        url = %entry.url,
                        "structural CSS parse failed ({e}), keeping textual extraction only",
                    );
                    fallback
                }
            };
            PrunedStylesheet { file_name: file_name(&entry.url), source }
        })
        .collect()
}

/// Writes one pruned stylesheet per entry into `dir`.
///
/// A write failure is logged and swallowed; it never fails the run.
pub fn write_pruned(sheets: &[PrunedStylesheet], dir: &Path) {
    for sheet in sheets {
        let path = dir.join(&sheet.file_name);
        if let Err(e) = fs::write(&path, &sheet.source) {
            tracing::warn!("failed to write pruned stylesheet {}: {e}", path.display());
        }
    }
}

/// Derives the output file name from a stylesheet URL.
///
/// Fragment and query are stripped for name derivation, a `.css` suffix is
/// removed, the last path segment is taken, and the original query string
/// (if any) plus a `.css` extension are re-appended.
#[must_use]
pub fn file_name(url: &str) -> String {
    let stem = &url[..url.find('#').unwrap_or(url.len())];
    let stem = &stem[..stem.find('?').unwrap_or(stem.len())];
    let stem = stem.replacen(".css", "", 1);

    let last = stem.split('/').filter(|s| !s.is_empty()).last().unwrap_or_default();
    let query = url.find('?').map_or("", |i| &url[i..]);
    format!("{last}{query}.css")
}

/// Textual extraction of the used ranges.
///
/// Each used slice is emitted verbatim; before the first range and between
/// consecutive ranges, the comment (and, for the head, `@...;` annotation)
/// immediately preceding the range is carried along so that licensing and
/// encoding context survives pruning.
fn fallback_text(entry: &CoverageEntry) -> String {
    let comment_re = regex!(r"(?m)(/\*[\s\S]*?\*/)|(//.*$)");
    let annotation_re = regex!(r"@.*?;");
    let text = &entry.text;

    let pieces: Vec<String> = entry
        .ranges
        .iter()
        .enumerate()
        .map(|(index, range)| {
            let mut code = String::new();
            if index == 0 && range.start > 0 {
                let head = text.get(..range.start).unwrap_or("");
                if let Some(annotation) = annotation_re.find(head) {
                    code.push_str(annotation.as_str());
                    code.push('\n');
                }
                if let Some(comment) = comment_re.find(head) {
                    code.push_str(comment.as_str());
                    code.push('\n');
                }
            }
            if index > 0 {
                let prev = entry.ranges[index - 1];
                let between = text.get(prev.end..range.start).unwrap_or("");
                if let Some(comment) = comment_re.find(between) {
                    code.push_str(comment.as_str());
                    code.push('\n');
                }
            }
            code.push_str(text.get(range.start..range.end).unwrap_or(""));
            code.push('\n');
            code
        })
        .collect();

    pieces.join("\n")
}

/// Structural pruning pass.
///
/// Scans the stylesheet block by block and keeps only what carries
/// non-optional weight regardless of coverage: `@font-face` rules (whole
/// blocks) and stray top-level declarations. Everything else is removed.
fn structural_prune(text: &str) -> Result<String, CssParseError> {
    let bytes = text.as_bytes();
    let mut kept = String::new();
    let mut pos = 0;

    while pos < bytes.len() {
        pos = skip_trivia(text, pos)?;
        if pos >= bytes.len() {
            break;
        }

        let start = pos;
        let (end, delimiter) = scan_until(text, pos, b"{;")?;
        match delimiter {
            Some(b'{') => {
                let block_end = scan_block(text, end)?;
                if text[start..end].trim_start().starts_with("@font-face") {
                    kept.push_str(text[start..block_end].trim_end());
                    kept.push('\n');
                }
                pos = block_end;
            }
            Some(b';') => {
                // Block-less at-rules (@import, @charset) are coverage
                // candidates and dropped; a bare declaration is kept.
                let item = text[start..end].trim();
                if !item.starts_with('@') && item.contains(':') {
                    kept.push_str(item);
                    kept.push_str(";\n");
                }
                pos = end + 1;
            }
            // `scan_until` only yields the requested delimiters; anything
            // else means end of input.
            _ => pos = end,
        }
    }

    Ok(kept)
}

fn skip_trivia(text: &str, mut pos: usize) -> Result<usize, CssParseError> {
    let bytes = text.as_bytes();
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos + 1 < bytes.len() && bytes[pos] == b'/' && bytes[pos + 1] == b'*' {
            match text[pos + 2..].find("*/") {
                Some(close) => pos = pos + 2 + close + 2,
                None => return Err(CssParseError::UnterminatedComment),
            }
        } else {
            return Ok(pos);
        }
    }
}

fn scan_until(
    text: &str,
    mut pos: usize,
    delimiters: &[u8],
) -> Result<(usize, Option<u8>), CssParseError> {
    let bytes = text.as_bytes();
    while pos < bytes.len() {
        let byte = bytes[pos];
        if delimiters.contains(&byte) {
            return Ok((pos, Some(byte)));
        }
        match byte {
            b'"' | b'\'' => pos = scan_string(text, pos)?,
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                match text[pos + 2..].find("*/") {
                    Some(close) => pos = pos + 2 + close + 2,
                    None => return Err(CssParseError::UnterminatedComment),
                }
            }
            _ => pos += 1,
        }
    }
    Ok((pos, None))
}

fn scan_string(text: &str, open: usize) -> Result<usize, CssParseError> {
    let bytes = text.as_bytes();
    let quote = bytes[open];
    let mut pos = open + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            byte if byte == quote => return Ok(pos + 1),
            _ => pos += 1,
        }
    }
    Err(CssParseError::UnterminatedString)
}

fn scan_block(text: &str, open: usize) -> Result<usize, CssParseError> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut pos = open;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => {
                depth += 1;
                pos += 1;
            }
            b'}' => {
                depth -= 1;
                pos += 1;
                if depth == 0 {
                    return Ok(pos);
                }
            }
            b'"' | b'\'' => pos = scan_string(text, pos)?,
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                match text[pos + 2..].find("*/") {
                    Some(close) => pos = pos + 2 + close + 2,
                    None => return Err(CssParseError::UnterminatedComment),
                }
            }
            _ => pos += 1,
        }
    }
    Err(CssParseError::UnbalancedBraces)
}
