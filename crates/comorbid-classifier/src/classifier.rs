//! Visit-by-group classification.
//!
//! The [`Classifier`] owns a worker pool and fills a [`ClassificationMatrix`]
//! from a built [`GroupIndex`] and [`ReferenceSets`]. Both inputs are only
//! borrowed immutably for the whole call, so they cannot change while workers
//! read them.
//!
//! The control loop walks rows (or blocks of rows) sequentially and polls
//! cancellation between dispatches. Each dispatch hands workers disjoint
//! `&mut` slices of the matrix:
//!
//! - [`ParallelStrategy::Columns`]: one row at a time, its cells split across
//!   workers, one cell per group.
//! - [`ParallelStrategy::Rows`]: `row_block` rows at a time, one row per task.
//!
//! Both produce the same matrix for any thread count.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, warn};

use comorbid_types::Code;

use crate::cancel::Cancellation;
use crate::group_index::GroupIndex;
use crate::matrix::ClassificationMatrix;
use crate::reference_sets::ReferenceSets;
use crate::types::{ClassifierConfig, ComorbidResult, ParallelStrategy};

/// Whether a classification ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassifyStatus {
    /// Every row was computed.
    Complete,
    /// Cancellation was observed. Rows before `rows_completed` are final;
    /// the rest are still all false.
    Cancelled {
        /// Number of leading rows that were fully computed.
        rows_completed: usize,
    },
}

impl ClassifyStatus {
    /// Returns true if every row was computed.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Matrix produced by [`Classifier::classify`] and how far it got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyOutcome {
    /// The (possibly partial) membership matrix.
    pub matrix: ClassificationMatrix,
    /// Completion status.
    pub status: ClassifyStatus,
}

/// Computes visit-by-group membership on a dedicated worker pool.
///
/// A classifier holds no state between calls and can be reused.
///
/// # Example
///
/// ```
/// use comorbid_classifier::{Classifier, ClassifierConfig, GroupIndex, NeverCancel, ReferenceSets};
///
/// let index = GroupIndex::build([("v1", "X"), ("v1", "Y"), ("v2", "Z")]);
/// let groups = ReferenceSets::build([("G1", vec!["X"]), ("G2", vec!["Z", "Q"])]).unwrap();
///
/// let classifier = Classifier::new(ClassifierConfig::default()).unwrap();
/// let outcome = classifier.classify(&index, &groups, &NeverCancel);
///
/// assert!(outcome.status.is_complete());
/// assert_eq!(outcome.matrix.column(0), vec![true, false]);
/// assert_eq!(outcome.matrix.column(1), vec![false, true]);
/// ```
#[derive(Debug)]
pub struct Classifier {
    config: ClassifierConfig,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl Classifier {
    /// Creates a classifier and its worker pool.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or the pool cannot be built.
    pub fn new(config: ClassifierConfig) -> ComorbidResult<Self> {
        config.validate()?;

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_threads())
            .thread_name(|i| format!("comorbid-worker-{i}"))
            .build()?;

        Ok(Self {
            config,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Returns the number of worker threads.
    pub fn threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            self.pool.current_num_threads()
        }
        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }

    /// Classifies every visit in `index` against every group in `groups`.
    ///
    /// `cancel` is polled before each row (or row block). Once it reports
    /// true, the rows finished so far are returned with
    /// [`ClassifyStatus::Cancelled`].
    pub fn classify<C>(
        &self,
        index: &GroupIndex,
        groups: &ReferenceSets,
        cancel: &C,
    ) -> ClassifyOutcome
    where
        C: Cancellation + ?Sized,
    {
        let rows = index.len();
        let cols = groups.len();

        info!(
            visits = rows,
            groups = cols,
            threads = self.threads(),
            strategy = ?self.config.strategy,
            "starting classification"
        );

        let mut matrix = ClassificationMatrix::allocate(rows, cols);

        let rows_completed = if cols == 0 {
            rows
        } else {
            let matrix = &mut matrix;
            self.install(|| match self.config.strategy {
                ParallelStrategy::Columns => scan_rows(index, groups, cancel, matrix),
                ParallelStrategy::Rows => {
                    scan_row_blocks(index, groups, cancel, matrix, self.config.row_block)
                }
            })
        };

        let status = if rows_completed == rows {
            info!(
                visits = rows,
                matches = matrix.count_true(),
                "classification complete"
            );
            ClassifyStatus::Complete
        } else {
            warn!(
                rows_completed,
                visits = rows,
                "classification cancelled, returning partial result"
            );
            ClassifyStatus::Cancelled { rows_completed }
        };

        ClassifyOutcome { matrix, status }
    }

    /// Runs `op` inside the worker pool so nested parallel iterators use it.
    #[cfg(feature = "parallel")]
    fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    #[cfg(not(feature = "parallel"))]
    fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        op()
    }
}

/// Walks rows in order, checking each row's groups in parallel.
///
/// Returns the number of rows completed.
fn scan_rows<C>(
    index: &GroupIndex,
    groups: &ReferenceSets,
    cancel: &C,
    matrix: &mut ClassificationMatrix,
) -> usize
where
    C: Cancellation + ?Sized,
{
    for row in 0..index.len() {
        if cancel.is_cancelled() {
            return row;
        }
        fill_row_parallel(index.codes(row), groups, matrix.row_mut(row));
    }
    index.len()
}

/// Walks blocks of `block` rows in order, checking rows of a block in parallel.
///
/// Returns the number of rows completed.
fn scan_row_blocks<C>(
    index: &GroupIndex,
    groups: &ReferenceSets,
    cancel: &C,
    matrix: &mut ClassificationMatrix,
    block: usize,
) -> usize
where
    C: Cancellation + ?Sized,
{
    let rows = index.len();
    let cols = groups.len();
    let mut start = 0;

    while start < rows {
        if cancel.is_cancelled() {
            return start;
        }
        let end = (start + block).min(rows);
        fill_block(index, groups, start, matrix.rows_mut(start..end), cols);
        start = end;
    }
    rows
}

#[cfg(feature = "parallel")]
fn fill_row_parallel(codes: &[Code], groups: &ReferenceSets, cells: &mut [bool]) {
    cells
        .par_iter_mut()
        .zip(groups.as_slice().par_iter())
        .for_each(|(cell, group)| {
            if group.matches_any(codes) {
                *cell = true;
            }
        });
}

#[cfg(not(feature = "parallel"))]
fn fill_row_parallel(codes: &[Code], groups: &ReferenceSets, cells: &mut [bool]) {
    fill_row(codes, groups, cells);
}

#[cfg(feature = "parallel")]
fn fill_block(
    index: &GroupIndex,
    groups: &ReferenceSets,
    first_row: usize,
    cells: &mut [bool],
    cols: usize,
) {
    cells
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(offset, row_cells)| {
            fill_row(index.codes(first_row + offset), groups, row_cells);
        });
}

#[cfg(not(feature = "parallel"))]
fn fill_block(
    index: &GroupIndex,
    groups: &ReferenceSets,
    first_row: usize,
    cells: &mut [bool],
    cols: usize,
) {
    for (offset, row_cells) in cells.chunks_mut(cols).enumerate() {
        fill_row(index.codes(first_row + offset), groups, row_cells);
    }
}

/// Checks one visit's codes against every group, sequentially.
fn fill_row(codes: &[Code], groups: &ReferenceSets, cells: &mut [bool]) {
    for (cell, group) in cells.iter_mut().zip(groups) {
        if group.matches_any(codes) {
            *cell = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::{CancellationToken, NeverCancel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn make_classifier(threads: usize, strategy: ParallelStrategy) -> Classifier {
        let config = ClassifierConfig {
            row_block: 3,
            ..ClassifierConfig::default()
                .with_threads(threads)
                .with_strategy(strategy)
        };
        Classifier::new(config).unwrap()
    }

    fn scenario_a() -> (GroupIndex, ReferenceSets) {
        let index = GroupIndex::build([("v1", "X"), ("v1", "Y"), ("v2", "Z")]);
        let groups = ReferenceSets::build([("G1", vec!["X"]), ("G2", vec!["Z", "Q"])]).unwrap();
        (index, groups)
    }

    /// Deterministic synthetic input: `visits` visits with a spread of codes
    /// and `group_count` groups of varying size.
    fn make_synthetic(visits: usize, group_count: usize) -> (GroupIndex, ReferenceSets) {
        let mut observations = Vec::new();
        for i in 0..visits * 5 {
            // Interleave visits so that rows are non-contiguous in the input.
            let visit = (i * 7) % visits;
            let code = (i * 31 + visit * 13) % 500;
            observations.push((format!("visit-{visit}"), format!("C{code:03}")));
        }
        let index = GroupIndex::build(observations);

        let definitions: Vec<(String, Vec<String>)> = (0..group_count)
            .map(|g| {
                let codes = (0..500)
                    .filter(|c| c % (g + 7) == g % 5)
                    .map(|c| format!("C{c:03}"))
                    .collect();
                (format!("group-{g}"), codes)
            })
            .collect();
        let groups = ReferenceSets::build(definitions).unwrap();

        (index, groups)
    }

    /// Straightforward per-cell reference computation.
    fn expected_matrix(index: &GroupIndex, groups: &ReferenceSets) -> ClassificationMatrix {
        let mut matrix = ClassificationMatrix::allocate(index.len(), groups.len());
        for (row, (_, codes)) in index.iter().enumerate() {
            for (col, group) in groups.iter().enumerate() {
                if codes.iter().any(|code| group.contains(code)) {
                    matrix.set(row, col);
                }
            }
        }
        matrix
    }

    #[test]
    fn test_scenario_a() {
        init_tracing();
        let (index, groups) = scenario_a();
        let outcome = make_classifier(2, ParallelStrategy::Columns).classify(
            &index,
            &groups,
            &NeverCancel,
        );

        assert_eq!(outcome.status, ClassifyStatus::Complete);
        assert_eq!(outcome.matrix.rows(), 2);
        assert_eq!(outcome.matrix.cols(), 2);
        assert_eq!(outcome.matrix.column(0), vec![true, false]);
        assert_eq!(outcome.matrix.column(1), vec![false, true]);
    }

    #[test]
    fn test_scenario_b_non_contiguous_visit() {
        let index = GroupIndex::build([("v1", "A"), ("v2", "B"), ("v1", "C")]);
        let groups =
            ReferenceSets::build([("HasA", vec!["A"]), ("HasC", vec!["C"]), ("HasB", vec!["B"])])
                .unwrap();

        let outcome = make_classifier(2, ParallelStrategy::Columns).classify(
            &index,
            &groups,
            &NeverCancel,
        );

        assert_eq!(index.visit_ids(), ["v1", "v2"]);
        assert_eq!(outcome.matrix.row(0), [true, true, false]);
        assert_eq!(outcome.matrix.row(1), [false, false, true]);
    }

    #[test]
    fn test_no_groups() {
        let (index, _) = scenario_a();
        let groups = ReferenceSets::default();

        let outcome = make_classifier(2, ParallelStrategy::Rows).classify(
            &index,
            &groups,
            &NeverCancel,
        );

        assert!(outcome.status.is_complete());
        assert_eq!(outcome.matrix.rows(), 2);
        assert_eq!(outcome.matrix.cols(), 0);
    }

    #[test]
    fn test_no_observations() {
        let (_, groups) = scenario_a();
        let index = GroupIndex::default();

        for strategy in [ParallelStrategy::Columns, ParallelStrategy::Rows] {
            let outcome = make_classifier(2, strategy).classify(&index, &groups, &NeverCancel);
            assert!(outcome.status.is_complete());
            assert_eq!(outcome.matrix.rows(), 0);
            assert_eq!(outcome.matrix.cols(), 2);
        }
    }

    #[test]
    fn test_empty_group_column_all_false() {
        let index = GroupIndex::build([("v1", "X"), ("v2", "Y")]);
        let groups = ReferenceSets::build([
            comorbid_types::GroupDefinition::new("Empty", Vec::<String>::new()),
            comorbid_types::GroupDefinition::new("HasY", ["Y"]),
        ])
        .unwrap();

        let outcome = make_classifier(2, ParallelStrategy::Columns).classify(
            &index,
            &groups,
            &NeverCancel,
        );

        assert_eq!(outcome.matrix.column(0), vec![false, false]);
        assert_eq!(outcome.matrix.column(1), vec![false, true]);
    }

    #[test]
    fn test_matches_reference_computation() {
        let (index, groups) = make_synthetic(120, 17);
        let expected = expected_matrix(&index, &groups);
        assert!(expected.count_true() > 0);

        for strategy in [ParallelStrategy::Columns, ParallelStrategy::Rows] {
            let outcome = make_classifier(4, strategy).classify(&index, &groups, &NeverCancel);
            assert_eq!(outcome.matrix, expected, "strategy {strategy:?}");
        }
    }

    #[test]
    fn test_deterministic_across_thread_counts() {
        let (index, groups) = make_synthetic(300, 30);

        let baseline = make_classifier(1, ParallelStrategy::Columns)
            .classify(&index, &groups, &NeverCancel)
            .matrix;

        for threads in [1, 2, 8] {
            for strategy in [ParallelStrategy::Columns, ParallelStrategy::Rows] {
                let matrix = make_classifier(threads, strategy)
                    .classify(&index, &groups, &NeverCancel)
                    .matrix;
                assert_eq!(matrix, baseline, "threads {threads}, strategy {strategy:?}");
            }
        }
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let (index, groups) = make_synthetic(50, 8);
        let classifier = make_classifier(2, ParallelStrategy::Columns);

        let first = classifier.classify(&index, &groups, &NeverCancel);
        let second = classifier.classify(&index, &groups, &NeverCancel);
        assert_eq!(first, second);
    }

    #[test]
    fn test_scenario_e_cancel_after_first_row() {
        init_tracing();
        let index = GroupIndex::build([("v1", "X"), ("v2", "X"), ("v3", "Z")]);
        let groups = ReferenceSets::build([("G1", vec!["X"]), ("G2", vec!["Z"])]).unwrap();

        // First poll (before row 0) lets work proceed, second poll cancels.
        let polls = AtomicUsize::new(0);
        let cancel = || polls.fetch_add(1, Ordering::SeqCst) >= 1;

        let outcome =
            make_classifier(2, ParallelStrategy::Columns).classify(&index, &groups, &cancel);

        assert_eq!(outcome.status, ClassifyStatus::Cancelled { rows_completed: 1 });
        assert!(!outcome.status.is_complete());
        assert_eq!(outcome.matrix.rows(), 3);
        assert_eq!(outcome.matrix.row(0), [true, false]);
        assert_eq!(outcome.matrix.row(1), [false, false]);
        assert_eq!(outcome.matrix.row(2), [false, false]);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancel_between_row_blocks() {
        let (index, groups) = make_synthetic(10, 4);
        let expected = expected_matrix(&index, &groups);

        let polls = AtomicUsize::new(0);
        let cancel = || polls.fetch_add(1, Ordering::SeqCst) >= 2;

        // row_block is 3: two blocks finish before the third poll cancels.
        let outcome =
            make_classifier(2, ParallelStrategy::Rows).classify(&index, &groups, &cancel);

        assert_eq!(outcome.status, ClassifyStatus::Cancelled { rows_completed: 6 });
        for row in 0..6 {
            assert_eq!(outcome.matrix.row(row), expected.row(row));
        }
        for row in 6..10 {
            assert!(outcome.matrix.row(row).iter().all(|&cell| !cell));
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let (index, groups) = scenario_a();
        let token = CancellationToken::new();
        token.cancel();

        let outcome =
            make_classifier(2, ParallelStrategy::Columns).classify(&index, &groups, &token);

        assert_eq!(outcome.status, ClassifyStatus::Cancelled { rows_completed: 0 });
        assert_eq!(outcome.matrix.count_true(), 0);
    }

    #[test]
    fn test_cancel_after_last_row_is_complete() {
        let (index, groups) = scenario_a();
        let polls = AtomicUsize::new(0);
        // Only fires after both rows have been polled.
        let cancel = || polls.fetch_add(1, Ordering::SeqCst) >= 2;

        let outcome =
            make_classifier(2, ParallelStrategy::Columns).classify(&index, &groups, &cancel);
        assert!(outcome.status.is_complete());
    }

    #[test]
    fn test_threads_reported() {
        let classifier = make_classifier(3, ParallelStrategy::Columns);
        #[cfg(feature = "parallel")]
        assert_eq!(classifier.threads(), 3);
        #[cfg(not(feature = "parallel"))]
        assert_eq!(classifier.threads(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClassifierConfig {
            row_block: 0,
            ..Default::default()
        };
        assert!(Classifier::new(config).is_err());
    }
}
