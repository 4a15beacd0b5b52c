//! Parser for the logic and intra-site delay text format.
//!
//! The file is a sequence of blocks. A `bel` header opens a block of logic
//! arcs and declares the configuration options of that BEL; a `site` header
//! opens a block of intra-site arcs:
//!
//! ```text
//! # comment
//! bel CARRY8 CYINIT_BOT: GND CIN CARRY_TYPE: SINGLE_CY8 DUAL_CY4
//! AX,BX CO7 98 CYINIT_BOT: GND
//! site SLICEL,SLICEM
//! AQ AFF/Q 0
//! KEYO5 KEY5LUT/O5 12 KEY: A B C
//! ```
//!
//! This module only tokenizes and validates structure. Scope ids and
//! configuration codes are assigned by [`DelayTables`](crate::DelayTables).

use crate::error::DataError;
use std::path::Path;

/// Which kind of arcs a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Bel,
    Site,
}

/// A `NAME:` followed by its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionList {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ArcLine {
    pub line: usize,
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
    pub delay: i16,
    pub options: Vec<OptionList>,
}

#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub kind: BlockKind,
    pub line: usize,
    /// Scope name first, then its equivalents.
    pub names: Vec<String>,
    /// Declared configuration options (`bel` blocks only).
    pub configs: Vec<OptionList>,
    pub arcs: Vec<ArcLine>,
}

/// Replaces every `,` followed by whitespace with a bare `,`.
fn canonicalize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == ',' {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
        }
    }
    out
}

fn split_list(token: &str) -> Vec<String> {
    token
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Groups `NAME: v1 v2 NAME2: v3` into option lists.
///
/// Tokens before the first `NAME:` are returned separately.
fn collect_options<'a>(tokens: &[&'a str]) -> (Vec<&'a str>, Vec<OptionList>) {
    let mut leading = Vec::new();
    let mut options: Vec<OptionList> = Vec::new();
    for &tok in tokens {
        if let Some(name) = tok.strip_suffix(':') {
            options.push(OptionList {
                name: name.to_string(),
                values: Vec::new(),
            });
        } else if let Some(current) = options.last_mut() {
            current.values.push(tok.to_string());
        } else {
            leading.push(tok);
        }
    }
    (leading, options)
}

/// Parses delay text into blocks.
///
/// `path` is used only for error messages.
pub(crate) fn parse_blocks(text: &str, path: &Path) -> Result<Vec<Block>, DataError> {
    let parse_err = |line: usize, message: String| DataError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut blocks: Vec<Block> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = canonicalize(raw.trim());
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let header = match tokens[0] {
            "bel" => Some(BlockKind::Bel),
            "site" => Some(BlockKind::Site),
            _ => None,
        };
        if let Some(kind) = header {
            let Some(names) = tokens.get(1).map(|t| split_list(t)) else {
                return Err(parse_err(line_no, format!("'{}' header without a name", tokens[0])));
            };
            if names.is_empty() {
                return Err(parse_err(line_no, format!("'{}' header without a name", tokens[0])));
            }
            let (_, configs) = collect_options(&tokens[2..]);
            if kind == BlockKind::Site && !configs.is_empty() {
                return Err(parse_err(line_no, "site headers take no configuration".into()));
            }
            blocks.push(Block {
                kind,
                line: line_no,
                names,
                configs,
                arcs: Vec::new(),
            });
            continue;
        }

        let Some(block) = blocks.last_mut() else {
            return Err(parse_err(line_no, "arc before any 'bel' or 'site' header".into()));
        };
        if tokens.len() < 3 {
            return Err(parse_err(
                line_no,
                format!("expected '<src> <dst> <delay>', found '{line}'"),
            ));
        }
        let delay: i16 = tokens[2]
            .parse()
            .map_err(|_| parse_err(line_no, format!("invalid delay '{}'", tokens[2])))?;
        let (leading, options) = collect_options(&tokens[3..]);
        if let Some(stray) = leading.first() {
            return Err(parse_err(line_no, format!("unexpected token '{stray}'")));
        }
        if block.kind == BlockKind::Site && options.len() > 1 {
            return Err(parse_err(line_no, "intra-site arcs take at most one key".into()));
        }
        block.arcs.push(ArcLine {
            line: line_no,
            sources: split_list(tokens[0]),
            sinks: split_list(tokens[1]),
            delay,
            options,
        });
    }
    Ok(blocks)
}
