//! Record store: the ordered, fixed-dimension input vectors of one run.
//!
//! Coordinates live in a single row-major [`Array2`] (one row per record) and
//! the cluster labels sit beside it. A label is `None` until the first
//! assignment step, after which it always lies in `[0, k)`.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// One record: its position in load order, its coordinates and its label.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// Index in original load order.
    pub index: usize,
    /// Coordinates, `dimension` values.
    pub coords: ArrayView1<'a, f64>,
    /// Current cluster label (`None` = unassigned).
    pub cluster: Option<usize>,
}

/// Ordered collection of records sharing one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore {
    coords: Array2<f64>,
    labels: Vec<Option<usize>>,
}

impl RecordStore {
    /// Build a store from rows. Every row must have the first row's length.
    ///
    /// The loader drops ragged lines before they get here; programmatic
    /// callers get a [`Error::DimensionMismatch`] instead.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let d = rows.first().map_or(0, Vec::len);
        let mut flat: Vec<f64> = Vec::with_capacity(rows.len() * d);
        for row in rows {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        Self::from_flat(rows.len(), d, flat)
    }

    /// Build a store from `n * d` row-major values.
    pub(crate) fn from_flat(n: usize, d: usize, flat: Vec<f64>) -> Result<Self> {
        if n > 0 && d == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "records must have at least one coordinate",
            });
        }
        let found = flat.len();
        let coords = Array2::from_shape_vec((n, d), flat).map_err(|_| Error::DimensionMismatch {
            expected: n * d,
            found,
        })?;
        Ok(Self {
            coords,
            labels: vec![None; n],
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.coords.nrows()
    }

    /// True when no record was loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinates per record (0 for an empty store).
    pub fn dimension(&self) -> usize {
        self.coords.ncols()
    }

    /// All coordinates, one row per record.
    pub fn coords(&self) -> ArrayView2<'_, f64> {
        self.coords.view()
    }

    /// Coordinates of record `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.coords.row(i)
    }

    /// Record `i`, if it exists.
    pub fn get(&self, i: usize) -> Option<Record<'_>> {
        (i < self.len()).then(|| Record {
            index: i,
            coords: self.coords.row(i),
            cluster: self.labels[i],
        })
    }

    /// Current labels in load order.
    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    /// Records in load order.
    pub fn iter(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.coords
            .rows()
            .into_iter()
            .zip(self.labels.iter())
            .enumerate()
            .map(|(index, (coords, &cluster))| Record {
                index,
                coords,
                cluster,
            })
    }

    /// Split borrow: read-only coordinates alongside mutable labels.
    pub(crate) fn parts_mut(&mut self) -> (ArrayView2<'_, f64>, &mut [Option<usize>]) {
        (self.coords.view(), &mut self.labels)
    }
}
