//! Batch file ingestion for the CLI
//!
//! The analysis core takes an in-memory slice; this module only exists so
//! the command line can load one. Two layouts are accepted: a single JSON
//! array, or JSON Lines with one record object per line.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while reading a batch file
#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON on line {line}: {source}")]
    Line {
        line: usize,
        source: serde_json::Error,
    },

    #[error("invalid JSON array: {0}")]
    Array(#[from] serde_json::Error),
}

/// Read a batch of raw records from a JSON array or JSON Lines file.
pub fn read_records(path: &Path) -> Result<Vec<Value>, InputError> {
    let mut file = File::open(path)?;

    let mut head = [0u8; 1];
    let is_array = loop {
        match file.read(&mut head)? {
            0 => break false,
            _ if head[0].is_ascii_whitespace() => continue,
            _ => break head[0] == b'[',
        }
    };

    let file = File::open(path)?;
    if is_array {
        let records: Vec<Value> = serde_json::from_reader(BufReader::new(file))?;
        Ok(records)
    } else {
        read_json_lines(BufReader::new(file))
    }
}

fn read_json_lines<R: BufRead>(reader: R) -> Result<Vec<Value>, InputError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|source| InputError::Line {
            line: index + 1,
            source,
        })?;
        records.push(value);
    }
    Ok(records)
}
