//! Plain-text clustering report.
//!
//! ```text
//! K-Means Clustering
//! Centroids:
//! Centroid 0: 0 0.5
//! Centroid 1: 10 0.5
//!
//! Points and clusters:
//! Point 0: (0, 0) -> cluster 0
//! ...
//! ```
//!
//! Floats use Rust's shortest round-trip formatting, so values read back
//! from the report equal the in-memory ones.

use crate::cluster::CentroidSet;
use crate::dataset::RecordStore;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write the report for `store` and `centroids` to `out`.
pub fn write_report<W: Write>(
    out: &mut W,
    store: &RecordStore,
    centroids: &CentroidSet,
) -> io::Result<()> {
    writeln!(out, "K-Means Clustering")?;
    writeln!(out, "Centroids:")?;
    for (i, centroid) in centroids.iter().enumerate() {
        let coords: Vec<String> = centroid.iter().map(f64::to_string).collect();
        writeln!(out, "Centroid {i}: {}", coords.join(" "))?;
    }

    writeln!(out)?;
    writeln!(out, "Points and clusters:")?;
    for record in store.iter() {
        let coords: Vec<String> = record.coords.iter().map(f64::to_string).collect();
        let cluster = record
            .cluster
            .map_or_else(|| "unassigned".to_string(), |c| c.to_string());
        writeln!(
            out,
            "Point {}: ({}) -> cluster {cluster}",
            record.index,
            coords.join(", ")
        )?;
    }
    Ok(())
}

/// Write the report to `path`, replacing any existing file.
pub fn save(path: impl AsRef<Path>, store: &RecordStore, centroids: &CentroidSet) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, &e))?;
    let mut out = BufWriter::new(file);
    write_report(&mut out, store, centroids)
        .and_then(|()| out.flush())
        .map_err(|e| Error::io(path, &e))?;
    info!(path = %path.display(), "saved report");
    Ok(())
}
