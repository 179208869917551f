//! Flat-text catalog cache.
//!
//! Layout: one header line with the timestamp, then 7 lines per part (library, name,
//! description, keywords, order number, pad count, unique pad count). Text fields are
//! backslash-escaped so every record stays exactly 7 lines.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::error::CacheError;
use crate::types::{Catalog, PartMetadata, PartRecord};
use crate::utils::tempfiles::{rename_temp_to_final, temp_path_for};

/// Lines per part record after the header.
pub const RECORD_LINES: usize = 7;

/// Write `catalog` to `path` via a temp file in the same directory and an atomic rename.
/// On failure the previous cache at `path` is left untouched.
pub fn save_cache(catalog: &Catalog, path: &Path) -> Result<()> {
    let temp_path = temp_path_for(path);
    let written = write_records(catalog, &temp_path);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }
    rename_temp_to_final(&temp_path, path)?;
    debug!("wrote {} parts to cache {}", catalog.len(), path.display());
    Ok(())
}

fn write_records(catalog: &Catalog, temp_path: &Path) -> Result<()> {
    let file = File::create(temp_path)
        .with_context(|| format!("create temp cache {}", temp_path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", catalog.timestamp)?;
    for part in &catalog.parts {
        writeln!(out, "{}", escape_line(part.lib_id()))?;
        writeln!(out, "{}", escape_line(part.name()))?;
        writeln!(out, "{}", escape_line(part.description()))?;
        writeln!(out, "{}", escape_line(part.keywords()))?;
        writeln!(out, "{}", part.order_num())?;
        writeln!(out, "{}", part.pad_count())?;
        writeln!(out, "{}", part.unique_pad_count())?;
    }
    let file = out.into_inner().context("flush cache")?;
    file.sync_all().context("sync cache")?;
    Ok(())
}

/// Read the cache strictly: any anomaly is an error and nothing partial is returned.
pub fn read_cache(path: &Path) -> std::result::Result<Catalog, CacheError> {
    let content = std::fs::read_to_string(path)?;
    parse_cache(&content)
}

/// Read the cache, falling back to a stale empty catalog on any problem.
pub fn load_cache(path: &Path) -> Catalog {
    match read_cache(path) {
        Ok(catalog) => catalog,
        Err(CacheError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            debug!("no cache at {}", path.display());
            Catalog::stale()
        }
        Err(e) => {
            warn!("Discarding cache {}: {}", path.display(), e);
            Catalog::stale()
        }
    }
}

/// Parse cache text. The whole result is rejected on a short trailing record, a malformed
/// number, a bad escape, a zero timestamp or an empty part list.
pub fn parse_cache(content: &str) -> std::result::Result<Catalog, CacheError> {
    let lines: Vec<&str> = content.lines().collect();
    let Some((header, body)) = lines.split_first() else {
        return Err(corrupt(1, "missing header"));
    };
    let timestamp: i64 = parse_num(header, 1)?;
    if timestamp == 0 {
        return Err(corrupt(1, "stale timestamp"));
    }
    if body.len() % RECORD_LINES != 0 {
        return Err(corrupt(
            lines.len(),
            format!("{} trailing lines", body.len() % RECORD_LINES),
        ));
    }
    if body.is_empty() {
        return Err(corrupt(1, "empty catalog"));
    }

    let mut parts = Vec::with_capacity(body.len() / RECORD_LINES);
    for (i, rec) in body.chunks_exact(RECORD_LINES).enumerate() {
        // Header is line 1, so record i starts at line 2 + i * 7.
        let line = 2 + i * RECORD_LINES;
        let lib_id = unescape_line(rec[0], line)?;
        let name = unescape_line(rec[1], line + 1)?;
        let record = PartRecord {
            description: unescape_line(rec[2], line + 2)?,
            keywords: unescape_line(rec[3], line + 3)?,
            pad_count: parse_num(rec[5], line + 5)?,
            unique_pad_count: parse_num(rec[6], line + 6)?,
        };
        let order_num: i32 = parse_num(rec[4], line + 4)?;
        parts.push(PartMetadata::new(lib_id, name, record, order_num));
    }
    Ok(Catalog::new(parts, timestamp))
}

fn parse_num<N: std::str::FromStr>(s: &str, line: usize) -> std::result::Result<N, CacheError>
where
    N::Err: std::fmt::Display,
{
    s.trim()
        .parse()
        .map_err(|e| corrupt(line, format!("bad number {:?}: {}", s, e)))
}

fn corrupt(line: usize, reason: impl Into<String>) -> CacheError {
    CacheError::Corrupt {
        line,
        reason: reason.into(),
    }
}

/// Escape backslash and control characters so the value fits on one line.
pub fn escape_line(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_line`]. `line` is only used for error reporting.
pub fn unescape_line(s: &str, line: usize) -> std::result::Result<String, CacheError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                if chars.next() != Some('{') {
                    return Err(corrupt(line, "bad \\u escape"));
                }
                let mut hex = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => hex.push(c),
                        None => return Err(corrupt(line, "unterminated \\u escape")),
                    }
                }
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| corrupt(line, format!("bad \\u{{{}}} escape", hex)))?;
                out.push(decoded);
            }
            other => return Err(corrupt(line, format!("unknown escape {:?}", other))),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_control_chars() {
        assert_eq!(escape_line("a\nb"), "a\\nb");
        assert_eq!(escape_line("tab\there"), "tab\\there");
        assert_eq!(escape_line("back\\slash"), "back\\\\slash");
        assert_eq!(escape_line("bell\u{7}"), "bell\\u{7}");
        assert_eq!(escape_line("plain 0.5mm"), "plain 0.5mm");
    }

    #[test]
    fn test_unescape_inverts_escape() {
        let s = "line1\nline2\r\n\t\\x\u{1b}[0m ünï";
        let escaped = escape_line(s);
        assert!(!escaped.contains('\n'));
        assert_eq!(unescape_line(&escaped, 1).unwrap(), s);
    }

    #[test]
    fn test_unescape_rejects_unknown_escape() {
        assert!(matches!(
            unescape_line("bad\\q", 9),
            Err(CacheError::Corrupt { line: 9, .. })
        ));
        assert!(unescape_line("dangling\\", 1).is_err());
        assert!(unescape_line("\\u{zz}", 1).is_err());
    }

    #[test]
    fn test_unescape_requires_closing_brace() {
        assert_eq!(unescape_line("\\u{41}", 1).unwrap(), "A");
        assert!(matches!(
            unescape_line("\\u{41", 4),
            Err(CacheError::Corrupt { line: 4, .. })
        ));
        assert!(parse_cache("42\nLib\nR1\nx\\u{41\nkw\n0\n2\n2\n").is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_partial_record() {
        let text = "42\nLib\nR1\ndesc\nkw\n0\n2\n2\nLib\nR2\n";
        assert!(matches!(
            parse_cache(text),
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_numbers_and_empty() {
        assert!(parse_cache("").is_err());
        assert!(parse_cache("notanumber\n").is_err());
        assert!(parse_cache("42\n").is_err());
        assert!(parse_cache("0\nLib\nR1\nd\nk\n0\n2\n2\n").is_err());
        assert!(parse_cache("42\nLib\nR1\nd\nk\n0\n-2\n2\n").is_err());
    }

    #[test]
    fn test_parse_valid_record() {
        let catalog = parse_cache("42\nLib\nR1\nfirst\\nsecond\nkw\n3\n4\n2\n").unwrap();
        assert_eq!(catalog.timestamp, 42);
        assert_eq!(catalog.len(), 1);
        let part = &catalog.parts[0];
        assert_eq!(part.lib_id(), "Lib");
        assert_eq!(part.description(), "first\nsecond");
        assert_eq!(part.order_num(), 3);
        assert_eq!(part.pad_count(), 4);
        assert_eq!(part.unique_pad_count(), 2);
    }
}
