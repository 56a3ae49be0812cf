//! Centroid set: exactly `k` reference vectors of the store's dimension.

use super::kmeans::squared_distance;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1};

/// Fixed-size set of centroids, one row per cluster index.
///
/// `k` is fixed at construction; the update step only rewrites coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidSet {
    points: Array2<f64>,
}

impl CentroidSet {
    /// Build a centroid set from explicit rows, e.g. to seed a run by hand.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::InvalidClusterCount {
                requested: 0,
                n_items: 0,
            });
        };
        let d = first.len();
        let mut points = Array2::zeros((rows.len(), d));
        for (i, row) in rows.iter().enumerate() {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            points.row_mut(i).assign(&ArrayView1::from(row.as_slice()));
        }
        Ok(Self { points })
    }

    pub(crate) fn from_array(points: Array2<f64>) -> Self {
        Self { points }
    }

    /// Number of centroids.
    pub fn k(&self) -> usize {
        self.points.nrows()
    }

    /// Coordinates per centroid.
    pub fn dimension(&self) -> usize {
        self.points.ncols()
    }

    /// Centroid `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.k()`.
    pub fn get(&self, i: usize) -> ArrayView1<'_, f64> {
        self.points.row(i)
    }

    pub(crate) fn get_mut(&mut self, i: usize) -> ArrayViewMut1<'_, f64> {
        self.points.row_mut(i)
    }

    /// All centroids, one row per cluster index.
    pub fn points(&self) -> ArrayView2<'_, f64> {
        self.points.view()
    }

    /// Centroids in cluster-index order.
    pub fn iter(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> + '_ {
        self.points.rows().into_iter()
    }

    /// Squared displacement of centroid `i` relative to `previous`.
    pub fn shift(&self, previous: &CentroidSet, i: usize) -> f64 {
        squared_distance(self.get(i), previous.get(i))
    }

    /// Copy out as plain rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter().map(|c| c.to_vec()).collect()
    }
}
