//! Node attribute table (`node,role,community` CSV with header).

use crate::graph::{Community, NodeAttributes, Role};
use crate::{Error, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct Record {
    node: usize,
    role: Role,
    community: Community,
}

/// Attribute-table format handler.
pub struct AttributeTable;

impl AttributeTable {
    /// Read the table and return attributes indexed by node id.
    ///
    /// Rows may appear in any order, but the ids must cover `0..N` exactly
    /// once. Unknown role or community strings are rejected.
    pub fn read<R: Read>(reader: R) -> Result<Vec<NodeAttributes>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = reader
            .deserialize::<Record>()
            .enumerate()
            .map(|(i, result)| {
                result.map_err(|e| Error::malformed(format!("attribute row {}: {}", i + 1, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let n = records.len();
        let mut rows: Vec<Option<NodeAttributes>> = vec![None; n];
        for record in records {
            if record.node >= n {
                return Err(Error::malformed(format!(
                    "node {} out of range for an attribute table with {} rows",
                    record.node, n
                )));
            }
            let slot = &mut rows[record.node];
            if slot.is_some() {
                return Err(Error::malformed(format!(
                    "node {} listed twice in attribute table",
                    record.node
                )));
            }
            *slot = Some(NodeAttributes {
                role: record.role,
                community: record.community,
            });
        }

        rows.into_iter()
            .enumerate()
            .map(|(node, attrs)| {
                attrs.ok_or_else(|| {
                    Error::malformed(format!("node {node} missing from attribute table"))
                })
            })
            .collect()
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Result<Vec<NodeAttributes>> {
        Self::read(s.as_bytes())
    }
}
