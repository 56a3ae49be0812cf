//! Clustering: centroid sets and the Lloyd k-means driver.
//!
//! The classic algorithm: assign each record to the nearest centroid, then
//! move each centroid to the mean of its records. Repeat until the centroids
//! stop moving or the iteration cap is hit.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use lloyd::cluster::{CentroidSet, Kmeans, Lloyd, State};
//! use lloyd::RecordStore;
//!
//! let store = RecordStore::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 0.0],
//!     vec![10.0, 1.0],
//! ])
//! .unwrap();
//! let seeds = CentroidSet::from_rows(&[vec![0.0, 0.0], vec![10.0, 0.0]]).unwrap();
//!
//! let mut lloyd = Lloyd::with_centroids(Kmeans::new(2), store, seeds).unwrap();
//! assert_eq!(lloyd.run(), State::Converged { iterations: 2 });
//! assert_eq!(lloyd.centroids().to_rows(), vec![vec![0.0, 0.5], vec![10.0, 0.5]]);
//! ```

mod centroids;
mod kmeans;
mod traits;

pub use centroids::CentroidSet;
pub use kmeans::{Fit, Kmeans, Lloyd, State, DEFAULT_MAX_ITER, DEFAULT_TOL};
pub use traits::Clustering;
