//! Delimited-text loader.
//!
//! The first non-empty line is a header and is skipped. Every later non-empty
//! line is split on the delimiter; the first line that parses fixes the
//! dimension, and lines with a different field count (or a field that is not a
//! number) are dropped.

use crate::dataset::RecordStore;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Loader configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Field separator.
    pub delimiter: char,
    /// Read only the first N fields of each line.
    pub max_fields: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            max_fields: None,
        }
    }
}

impl LoadOptions {
    /// Set the field separator.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Only read the leading `n` fields, e.g. to skip a trailing label column.
    pub fn with_max_fields(mut self, n: usize) -> Self {
        self.max_fields = Some(n);
        self
    }
}

/// Loaded records plus how many data lines were discarded.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// Records in file order.
    pub store: RecordStore,
    /// Data lines dropped for arity or parse failures.
    pub dropped: usize,
}

/// Load records from a delimited text file.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Loaded> {
    let path = path.as_ref();
    if options.max_fields == Some(0) {
        return Err(Error::InvalidParameter {
            name: "max_fields",
            message: "must be at least 1",
        });
    }
    let file = File::open(path).map_err(|e| Error::io(path, &e))?;
    let loaded = read_records(BufReader::new(file), options).map_err(|e| Error::io(path, &e))?;
    info!(
        path = %path.display(),
        points = loaded.store.len(),
        dimension = loaded.store.dimension(),
        dropped = loaded.dropped,
        "loaded records"
    );
    Ok(loaded)
}

fn parse_line(line: &str, options: &LoadOptions) -> Option<Vec<f64>> {
    // One trailing delimiter (`1,2,`) does not start another field.
    let line = line.trim_end();
    let line = line.strip_suffix(options.delimiter).unwrap_or(line);
    line.split(options.delimiter)
        .take(options.max_fields.unwrap_or(usize::MAX))
        .map(|field| field.trim().parse::<f64>().ok())
        .collect()
}

pub(crate) fn read_records<R: BufRead>(
    mut reader: R,
    options: &LoadOptions,
) -> io::Result<Loaded> {
    let mut flat: Vec<f64> = Vec::new();
    let mut dimension: Option<usize> = None;
    let mut n = 0;
    let mut dropped = 0;
    let mut header_seen = false;
    let mut buf: Vec<u8> = Vec::new();
    let mut lineno = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        lineno += 1;
        // Bytes that are not UTF-8 become U+FFFD and fail to parse as numbers.
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        let Some(coords) = parse_line(&line, options) else {
            debug!(line = lineno, "dropping unparseable record");
            dropped += 1;
            continue;
        };
        let d = *dimension.get_or_insert(coords.len());
        if coords.len() != d {
            debug!(
                line = lineno,
                expected = d,
                found = coords.len(),
                "dropping record with wrong field count"
            );
            dropped += 1;
            continue;
        }
        flat.extend(coords);
        n += 1;
    }

    let store = RecordStore::from_flat(n, dimension.unwrap_or(0), flat)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Loaded { store, dropped })
}
