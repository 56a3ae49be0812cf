//! # lloyd
//!
//! Lloyd's k-means over fixed-dimension numeric records: random seeding from
//! the data, nearest-centroid assignment, mean update, and a per-centroid
//! convergence check, plus the delimited-text loader and report writer that
//! surround it.
//!
//! ```rust
//! use lloyd::{Clustering, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//! let labels = Kmeans::new(2).with_seed(7).fit_predict(&data).unwrap();
//! assert_eq!(labels.len(), 4);
//! assert!(labels.iter().all(|&l| l < 2));
//! ```

pub mod cluster;
pub mod dataset;
/// Error types used across `lloyd`.
pub mod error;
pub mod io;

pub use cluster::{CentroidSet, Clustering, Fit, Kmeans, Lloyd, State};
pub use dataset::{Record, RecordStore};
pub use error::{Error, Result};
pub use io::{load, save, LoadOptions, Loaded};
