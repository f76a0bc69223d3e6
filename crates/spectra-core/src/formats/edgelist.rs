//! Whitespace-separated edge list.
//!
//! Each non-empty, non-comment line holds one undirected edge: `u v`.

use crate::{Error, Result};
use std::io::{BufRead, BufReader, Read};

/// Edge-list format handler.
pub struct EdgeList;

impl EdgeList {
    /// Parse edges from a reader.
    ///
    /// Blank lines and lines starting with `#` are skipped. Anything else
    /// must be exactly two non-negative integers.
    pub fn read<R: Read>(reader: R) -> Result<Vec<(usize, usize)>> {
        let buf = BufReader::new(reader);
        let mut edges = Vec::new();

        for (lineno, line) in buf.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 2 {
                return Err(Error::malformed(format!(
                    "line {}: expected `u v`, got {:?}",
                    lineno + 1,
                    line
                )));
            }
            let parse = |tok: &str| {
                tok.parse::<usize>().map_err(|_| {
                    Error::malformed(format!("line {}: invalid node id {:?}", lineno + 1, tok))
                })
            };
            edges.push((parse(parts[0])?, parse(parts[1])?));
        }

        Ok(edges)
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Result<Vec<(usize, usize)>> {
        Self::read(s.as_bytes())
    }
}
