//! JSON input/output document shapes for the layout file format.
//! Input is an `Items` size array plus a `Buckets` array of named
//! item-reference lists; output is a flat array of resulting buckets
//! (name, level, size, split links, and item refs). Kept as plain,
//! `serde`-derived structs with no `serde_json::Value` in sight.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use dedupe::Bucket;
use serde::{Deserialize, Serialize};

/// Top-level input document: every item's size, and the initial bucket
/// set referencing them.
#[derive(Debug, Deserialize)]
pub struct InputDoc {
    #[serde(rename = "Items")]
    pub items: Vec<u32>,
    #[serde(rename = "Buckets")]
    pub buckets: Vec<InputBucket>,
}

#[derive(Debug, Deserialize)]
pub struct InputBucket {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Refs")]
    pub refs: Vec<u32>,
}

/// One bucket in the output document, in stable arena-index order.
#[derive(Debug, Serialize)]
pub struct OutputBucket {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Level")]
    pub level: u32,
    #[serde(rename = "SizeBytes")]
    pub size_bytes: u64,
    #[serde(rename = "SplitCount")]
    pub split_count: u32,
    #[serde(rename = "SplitLinks")]
    pub split_links: Vec<u32>,
    #[serde(rename = "Refs")]
    pub refs: Vec<u32>,
}

pub fn load_input(path: &Path) -> anyhow::Result<InputDoc> {
    let file = File::open(path)
        .map_err(|e| dedupe::DedupeError::Io { path: path.display().to_string(), source: e })?;
    let doc = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| dedupe::DedupeError::Input(format!("malformed input JSON: {e}")))?;
    Ok(doc)
}

pub fn save_output(path: &Path, buckets: &[Bucket], table: &refset::RefSetTable) -> anyhow::Result<()> {
    let file = File::create(path)
        .map_err(|e| dedupe::DedupeError::Io { path: path.display().to_string(), source: e })?;
    let out: Vec<OutputBucket> = buckets
        .iter()
        .enumerate()
        .map(|(i, b)| OutputBucket {
            name: b.name.clone(),
            level: b.level,
            size_bytes: b.ref_size,
            split_count: b.split_count,
            split_links: b.split_links.clone(),
            refs: table.items_ascending(i),
        })
        .collect();
    serde_json::to_writer_pretty(BufWriter::new(file), &out)?;
    Ok(())
}
