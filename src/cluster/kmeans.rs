//! K-means clustering (Lloyd's algorithm).
//!
//! Partitions records into k clusters by minimizing **within-cluster sum of
//! squares** (WCSS):
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids by sampling records uniformly, with replacement
//! 2. **Assign**: each record → nearest centroid (lowest index wins ties)
//! 3. **Update**: each centroid → mean of its assigned records
//! 4. Stop once no centroid moved more than `tol` (squared), or after `max_iter`
//!
//! Everything runs on squared Euclidean distance. Nearest-centroid selection
//! only needs the ordering, and the tolerance is stated in squared units.
//!
//! # Empty Clusters
//!
//! A centroid that attracts no records keeps its previous coordinates. It is
//! not reseeded or dropped, so `k` never changes during a run.
//!
//! # Convergence
//!
//! The tolerance is checked per centroid: the run has converged when *every*
//! centroid's squared displacement since the previous iteration is `<= tol`.
//! It is not a threshold on the summed displacement.

use super::centroids::CentroidSet;
use super::traits::Clustering;
use crate::dataset::RecordStore;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;
use tracing::{debug, info, warn};

/// Default iteration cap.
pub const DEFAULT_MAX_ITER: usize = 100;

/// Default per-centroid squared-displacement tolerance.
pub const DEFAULT_TOL: f64 = 1e-4;

/// K-means configuration.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance (squared displacement, per centroid).
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Iteration cap.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Convergence tolerance.
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Random seed, if fixed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if !(self.tol.is_finite() && self.tol >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Seed from the store, iterate to a terminal state and hand back the result.
    ///
    /// Uses a [`StdRng`] when a seed is set, the thread-local generator otherwise.
    pub fn fit(&self, store: RecordStore) -> Result<Fit> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        let mut lloyd = Lloyd::new(self.clone(), store, &mut rng)?;
        lloyd.run();
        Ok(lloyd.into_fit())
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        let store = RecordStore::from_rows(data)?;
        Ok(self.fit(store)?.labels())
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Driver state. `Converged` and `MaxIterationsReached` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Centroids seeded, no iteration run yet.
    Initialized,
    /// At least one iteration done, not yet terminal.
    Iterating {
        /// Iterations completed.
        iteration: usize,
    },
    /// Every centroid moved at most `tol` in the last iteration.
    Converged {
        /// Iterations completed.
        iterations: usize,
    },
    /// Hit the iteration cap without converging. Not an error.
    MaxIterationsReached {
        /// Iterations completed.
        iterations: usize,
    },
}

impl State {
    /// True for `Converged` and `MaxIterationsReached`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            State::Converged { .. } | State::MaxIterationsReached { .. }
        )
    }

    /// Iterations completed so far.
    pub fn iterations(&self) -> usize {
        match *self {
            State::Initialized => 0,
            State::Iterating { iteration } => iteration,
            State::Converged { iterations } | State::MaxIterationsReached { iterations } => {
                iterations
            }
        }
    }
}

/// Lloyd driver: owns the record store and centroid set for one run.
#[derive(Debug, Clone)]
pub struct Lloyd {
    config: Kmeans,
    store: RecordStore,
    centroids: CentroidSet,
    state: State,
}

impl Lloyd {
    /// Seed centroids by sampling the store and enter [`State::Initialized`].
    pub fn new<R: Rng>(config: Kmeans, store: RecordStore, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let centroids = init_centroids(&store, config.k, rng)?;
        info!(
            k = config.k,
            points = store.len(),
            dimension = store.dimension(),
            "seeded centroids"
        );
        Ok(Self {
            config,
            store,
            centroids,
            state: State::Initialized,
        })
    }

    /// Start from explicit centroids instead of random sampling.
    pub fn with_centroids(
        config: Kmeans,
        store: RecordStore,
        centroids: CentroidSet,
    ) -> Result<Self> {
        config.validate()?;
        check_cluster_count(&store, config.k)?;
        if centroids.k() != config.k {
            return Err(Error::InvalidParameter {
                name: "centroids",
                message: "centroid count must equal k",
            });
        }
        if centroids.dimension() != store.dimension() {
            return Err(Error::DimensionMismatch {
                expected: store.dimension(),
                found: centroids.dimension(),
            });
        }
        Ok(Self {
            config,
            store,
            centroids,
            state: State::Initialized,
        })
    }

    /// Run one assign/update/check iteration. No-op once terminal.
    pub fn step(&mut self) -> State {
        if self.state.is_terminal() {
            return self.state;
        }
        let iteration = self.state.iterations() + 1;
        let previous = self.centroids.clone();

        assign(&mut self.store, &self.centroids);
        update(&self.store, &mut self.centroids);

        let max_shift = (0..self.centroids.k())
            .map(|i| self.centroids.shift(&previous, i))
            .fold(0.0_f64, f64::max);
        debug!(iteration, max_shift, "lloyd iteration");

        self.state = if has_converged(&self.centroids, &previous, self.config.tol) {
            State::Converged {
                iterations: iteration,
            }
        } else if iteration >= self.config.max_iter {
            State::MaxIterationsReached {
                iterations: iteration,
            }
        } else {
            State::Iterating { iteration }
        };
        self.state
    }

    /// Iterate until `Converged` or `MaxIterationsReached`.
    pub fn run(&mut self) -> State {
        while !self.state.is_terminal() {
            self.step();
        }
        match self.state {
            State::Converged { iterations } => info!(iterations, "converged"),
            state => warn!(
                iterations = state.iterations(),
                "iteration cap reached before convergence"
            ),
        }
        self.state
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Records and their current labels.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Current centroids.
    pub fn centroids(&self) -> &CentroidSet {
        &self.centroids
    }

    /// Run configuration.
    pub fn config(&self) -> &Kmeans {
        &self.config
    }

    /// Within-cluster sum of squared distances for the current labeling.
    pub fn inertia(&self) -> f64 {
        inertia(&self.store, &self.centroids)
    }

    /// Consume the driver.
    pub fn into_fit(self) -> Fit {
        let inertia = self.inertia();
        Fit {
            store: self.store,
            centroids: self.centroids,
            state: self.state,
            inertia,
        }
    }
}

/// Final result of a run.
#[derive(Debug, Clone)]
pub struct Fit {
    /// Records with their final labels.
    pub store: RecordStore,
    /// Final centroids.
    pub centroids: CentroidSet,
    /// Terminal state.
    pub state: State,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
}

impl Fit {
    /// Final labels in load order.
    ///
    /// Every record is labeled once an iteration has run, so this has one
    /// entry per record.
    pub fn labels(&self) -> Vec<usize> {
        self.store.labels().iter().flatten().copied().collect()
    }
}

/// Compute squared Euclidean distance.
pub(crate) fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn check_cluster_count(store: &RecordStore, k: usize) -> Result<()> {
    if store.is_empty() {
        return Err(Error::EmptyInput);
    }
    if k == 0 || k > store.len() {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: store.len(),
        });
    }
    Ok(())
}

/// Pick `k` records uniformly with replacement; duplicates are allowed.
pub(crate) fn init_centroids<R: Rng>(
    store: &RecordStore,
    k: usize,
    rng: &mut R,
) -> Result<CentroidSet> {
    check_cluster_count(store, k)?;
    let n = store.len();
    let mut centroids = Array2::zeros((k, store.dimension()));
    for mut row in centroids.rows_mut() {
        let idx = rng.random_range(0..n);
        row.assign(&store.row(idx));
    }
    Ok(CentroidSet::from_array(centroids))
}

/// Index of the nearest centroid; the first one wins on ties.
fn nearest(point: ArrayView1<'_, f64>, centroids: &CentroidSet) -> usize {
    let mut best_cluster = 0;
    let mut best_dist = squared_distance(point, centroids.get(0));
    for k in 1..centroids.k() {
        let dist = squared_distance(point, centroids.get(k));
        if dist < best_dist {
            best_dist = dist;
            best_cluster = k;
        }
    }
    best_cluster
}

/// Relabel every record with its nearest centroid.
pub(crate) fn assign(store: &mut RecordStore, centroids: &CentroidSet) {
    let (coords, labels) = store.parts_mut();
    for (point, label) in coords.rows().into_iter().zip(labels.iter_mut()) {
        *label = Some(nearest(point, centroids));
    }
}

/// Move each non-empty cluster's centroid to the mean of its records.
pub(crate) fn update(store: &RecordStore, centroids: &mut CentroidSet) {
    let k = centroids.k();
    let mut sums = Array2::<f64>::zeros((k, centroids.dimension()));
    let mut counts = vec![0usize; k];

    for record in store.iter() {
        let Some(c) = record.cluster else {
            continue;
        };
        let mut acc = sums.row_mut(c);
        acc += &record.coords;
        counts[c] += 1;
    }

    for (i, (sum, &count)) in sums.rows().into_iter().zip(counts.iter()).enumerate() {
        if count == 0 {
            continue;
        }
        centroids.get_mut(i).assign(&(&sum / count as f64));
    }
}

/// True when every centroid's squared shift from `previous` is `<= tol`.
pub(crate) fn has_converged(current: &CentroidSet, previous: &CentroidSet, tol: f64) -> bool {
    (0..current.k()).all(|i| current.shift(previous, i) <= tol)
}

fn inertia(store: &RecordStore, centroids: &CentroidSet) -> f64 {
    store
        .iter()
        .filter_map(|r| r.cluster.map(|c| squared_distance(r.coords, centroids.get(c))))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn four_points() -> RecordStore {
        RecordStore::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 0.0],
            vec![10.0, 1.0],
        ])
        .unwrap()
    }

    fn labels_of(store: &RecordStore) -> Vec<Option<usize>> {
        store.labels().to_vec()
    }

    #[test]
    fn test_squared_distance() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 6.0, 3.0];
        assert_eq!(
            squared_distance(ArrayView1::from(&a), ArrayView1::from(&b)),
            25.0
        );
    }

    #[test]
    fn test_seeded_two_cluster_scenario() {
        let centroids = CentroidSet::from_rows(&[vec![0.0, 0.0], vec![10.0, 0.0]]).unwrap();
        let mut lloyd = Lloyd::with_centroids(Kmeans::new(2), four_points(), centroids).unwrap();

        assert_eq!(lloyd.step(), State::Iterating { iteration: 1 });
        assert_eq!(
            labels_of(lloyd.store()),
            vec![Some(0), Some(0), Some(1), Some(1)]
        );
        assert_eq!(
            lloyd.centroids().to_rows(),
            vec![vec![0.0, 0.5], vec![10.0, 0.5]]
        );

        assert_eq!(lloyd.step(), State::Converged { iterations: 2 });
        assert_eq!(
            labels_of(lloyd.store()),
            vec![Some(0), Some(0), Some(1), Some(1)]
        );
        assert!((lloyd.inertia() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_after_terminal_is_noop() {
        let centroids = CentroidSet::from_rows(&[vec![0.0, 0.5], vec![10.0, 0.5]]).unwrap();
        let mut lloyd = Lloyd::with_centroids(Kmeans::new(2), four_points(), centroids).unwrap();
        assert_eq!(lloyd.run(), State::Converged { iterations: 1 });
        assert_eq!(lloyd.step(), State::Converged { iterations: 1 });
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let store = RecordStore::from_rows(&[vec![5.0], vec![0.0]]).unwrap();
        let centroids = CentroidSet::from_rows(&[vec![0.0], vec![10.0]]).unwrap();
        let mut lloyd = Lloyd::with_centroids(Kmeans::new(2), store, centroids).unwrap();
        lloyd.step();
        assert_eq!(lloyd.store().labels()[0], Some(0));
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let store = RecordStore::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let centroids =
            CentroidSet::from_rows(&[vec![0.0, 0.0], vec![100.0, 100.0]]).unwrap();
        let mut lloyd = Lloyd::with_centroids(Kmeans::new(2), store, centroids).unwrap();
        lloyd.step();

        assert_eq!(lloyd.centroids().get(1).to_vec(), vec![100.0, 100.0]);
        let c0 = lloyd.centroids().get(0);
        assert!((c0[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((c0[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(lloyd.centroids().k(), 2);
    }

    #[test]
    fn test_k_equals_n_singletons() {
        let rows = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let store = RecordStore::from_rows(&rows).unwrap();
        let centroids = CentroidSet::from_rows(&rows).unwrap();
        let mut lloyd = Lloyd::with_centroids(Kmeans::new(3), store, centroids).unwrap();

        assert_eq!(lloyd.step(), State::Converged { iterations: 1 });
        assert_eq!(labels_of(lloyd.store()), vec![Some(0), Some(1), Some(2)]);
        assert_eq!(lloyd.centroids().to_rows(), rows);
        assert_eq!(lloyd.inertia(), 0.0);
    }

    #[test]
    fn test_converged_is_idempotent() {
        let store = four_points();
        let centroids = CentroidSet::from_rows(&[vec![0.0, 0.0], vec![10.0, 1.0]]).unwrap();
        let mut lloyd = Lloyd::with_centroids(Kmeans::new(2), store, centroids).unwrap();
        assert!(matches!(lloyd.run(), State::Converged { .. }));

        let labels = labels_of(&lloyd.store);
        let previous = lloyd.centroids.clone();
        assign(&mut lloyd.store, &lloyd.centroids);
        update(&lloyd.store, &mut lloyd.centroids);

        assert_eq!(labels_of(&lloyd.store), labels);
        assert!(has_converged(&lloyd.centroids, &previous, DEFAULT_TOL));
    }

    #[test]
    fn test_max_iterations_reached() {
        let centroids = CentroidSet::from_rows(&[vec![0.0, 0.0], vec![10.0, 0.0]]).unwrap();
        let config = Kmeans::new(2).with_max_iter(1);
        let mut lloyd = Lloyd::with_centroids(config, four_points(), centroids).unwrap();

        assert_eq!(lloyd.run(), State::MaxIterationsReached { iterations: 1 });
        assert!(lloyd.state().is_terminal());
        assert_eq!(
            lloyd.centroids().to_rows(),
            vec![vec![0.0, 0.5], vec![10.0, 0.5]]
        );
        assert!(lloyd.store().labels().iter().all(Option::is_some));
    }

    #[test]
    fn test_tolerance_is_per_centroid() {
        let previous = CentroidSet::from_rows(&[vec![0.0], vec![0.0]]).unwrap();
        // Each moved 0.8e-4 (squared), sum 1.6e-4 exceeds tol but each does not.
        let shift = (0.8e-4_f64).sqrt();
        let current = CentroidSet::from_rows(&[vec![shift], vec![-shift]]).unwrap();
        assert!(has_converged(&current, &previous, DEFAULT_TOL));

        let moved = CentroidSet::from_rows(&[vec![0.0], vec![0.011]]).unwrap();
        assert!(!has_converged(&moved, &previous, DEFAULT_TOL));
    }

    #[test]
    fn test_init_samples_records() {
        let store = four_points();
        let mut rng = StdRng::seed_from_u64(7);
        let centroids = init_centroids(&store, 3, &mut rng).unwrap();

        assert_eq!(centroids.k(), 3);
        for c in centroids.iter() {
            assert!(store.iter().any(|r| r.coords == c));
        }
        assert!(store.labels().iter().all(Option::is_none));
    }

    #[test]
    fn test_init_rejects_bad_k() {
        let store = four_points();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            init_centroids(&store, 5, &mut rng),
            Err(Error::InvalidClusterCount {
                requested: 5,
                n_items: 4
            })
        );
        assert!(init_centroids(&store, 0, &mut rng).is_err());

        let empty = RecordStore::from_rows(&[]).unwrap();
        assert_eq!(
            init_centroids(&empty, 1, &mut rng),
            Err(Error::EmptyInput)
        );
    }

    #[test]
    fn test_k_above_distinct_points_still_fatal() {
        // Two distinct points repeated: k=3 is allowed (n=4), k=5 is not.
        let data = vec![vec![1.0], vec![1.0], vec![2.0], vec![2.0]];
        assert!(Kmeans::new(3).with_seed(1).fit_predict(&data).is_ok());
        assert!(Kmeans::new(5).with_seed(1).fit_predict(&data).is_err());
    }

    #[test]
    fn test_with_centroids_validation() {
        let one = CentroidSet::from_rows(&[vec![0.0, 0.0]]).unwrap();
        assert!(Lloyd::with_centroids(Kmeans::new(2), four_points(), one).is_err());

        let wrong_dim = CentroidSet::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        assert_eq!(
            Lloyd::with_centroids(Kmeans::new(2), four_points(), wrong_dim).unwrap_err(),
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_invalid_parameters() {
        let data = vec![vec![0.0], vec![1.0]];
        assert!(Kmeans::new(1).with_max_iter(0).fit_predict(&data).is_err());
        assert!(Kmeans::new(1).with_tol(-1.0).fit_predict(&data).is_err());
        assert!(Kmeans::new(1).with_tol(f64::NAN).fit_predict(&data).is_err());
    }

    #[test]
    fn test_kmeans_basic() {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ];

        // Random seeding may pick both centroids from one group; any such seed
        // still has to give a valid, fully labeled result.
        let fit = Kmeans::new(2)
            .with_seed(42)
            .fit(RecordStore::from_rows(&data).unwrap())
            .unwrap();
        assert!(fit.state.is_terminal());
        assert_eq!(fit.labels().len(), 4);
        assert_eq!(fit.labels()[0], fit.labels()[1]);
        assert_eq!(fit.labels()[2], fit.labels()[3]);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let data: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 7) as f64, (i / 7) as f64 * 0.5])
            .collect();

        let labels1 = Kmeans::new(4).with_seed(42).fit_predict(&data).unwrap();
        let labels2 = Kmeans::new(4).with_seed(42).fit_predict(&data).unwrap();

        assert_eq!(labels1, labels2, "same seed should give same result");
    }

    #[test]
    fn test_n_clusters() {
        assert_eq!(Kmeans::new(3).n_clusters(), 3);
    }

    fn rows_strategy() -> impl Strategy<Value = (Vec<Vec<f64>>, usize)> {
        (1usize..4).prop_flat_map(|d| {
            (
                proptest::collection::vec(proptest::collection::vec(-100.0f64..100.0, d), 1..40),
                1usize..6,
            )
                .prop_map(|(rows, k)| {
                    let k = k.min(rows.len());
                    (rows, k)
                })
        })
    }

    proptest! {
        #[test]
        fn labels_always_in_range((rows, k) in rows_strategy(), seed in any::<u64>()) {
            let labels = Kmeans::new(k).with_seed(seed).fit_predict(&rows).unwrap();
            prop_assert_eq!(labels.len(), rows.len());
            prop_assert!(labels.iter().all(|&l| l < k));
        }

        #[test]
        fn nonempty_centroids_are_member_means((rows, k) in rows_strategy(), seed in any::<u64>()) {
            let mut store = RecordStore::from_rows(&rows).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut centroids = init_centroids(&store, k, &mut rng).unwrap();
            assign(&mut store, &centroids);
            update(&store, &mut centroids);

            for c in 0..k {
                let members: Vec<_> = store.iter().filter(|r| r.cluster == Some(c)).collect();
                if members.is_empty() {
                    continue;
                }
                for j in 0..store.dimension() {
                    let mean = members.iter().map(|r| r.coords[j]).sum::<f64>() / members.len() as f64;
                    prop_assert!((centroids.get(c)[j] - mean).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn assignment_is_deterministic((rows, k) in rows_strategy(), seed in any::<u64>()) {
            let store = RecordStore::from_rows(&rows).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let centroids = init_centroids(&store, k, &mut rng).unwrap();

            let mut a = store.clone();
            let mut b = store;
            assign(&mut a, &centroids);
            assign(&mut b, &centroids);
            prop_assert_eq!(a.labels(), b.labels());
        }
    }
}
