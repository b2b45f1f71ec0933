//! Multi-threaded back-end of the analysis

#[cfg(feature = "faster-threading")]
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{resacc::AnalysisResults, scheduling::EVENT_BATCH_SIZE};

use log::debug;
use std::sync::Mutex;

/// Analyze events in multi-threaded mode
///
/// Each batch of events is analyzed by a separate rayon task, and the
/// per-batch results are merged once every task is done.
///
pub fn run_analysis_impl<E: Sync>(
    events: &[E],
    analyze_events: impl Send + Sync + Fn(&[E]) -> AnalysisResults,
) -> AnalysisResults {
    // An empty input still produces one (empty) batch of results
    let batches = if events.is_empty() {
        vec![events]
    } else {
        events.chunks(EVENT_BATCH_SIZE).collect::<Vec<_>>()
    };
    debug!("Analyzing {} batches of events", batches.len());

    // The results of parallel tasks will be aggregated...
    let accumulator = {
        // ...in a way that is optimized for numerical reproduciblity
        #[cfg(not(feature = "faster-threading"))]
        {
            ReproducibleAccumulator::new(batches.len())
        }

        // ...in a way that is optimized for computational performance
        #[cfg(feature = "faster-threading")]
        {
            FastAccumulator::new(batches.len())
        }
    };

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        for (batch_id, &batch) in batches.iter().enumerate() {
            let accumulator_ref = &accumulator;
            let analyze_events_ref = &analyze_events;
            scope.spawn(move |_| {
                let result = analyze_events_ref(batch);
                accumulator_ref.set_task_result(batch_id, result);
            });
        }
    });

    // Extract the results from the accumulator
    accumulator.get_merged_result()
}

/// Reproducibility-optimized results accumulation mechanism
#[cfg(not(feature = "faster-threading"))]
struct ReproducibleAccumulator {
    /// Storage for the intermediary results of parallel tasks
    results: Box<[Mutex<Option<AnalysisResults>>]>,
}
//
#[cfg(not(feature = "faster-threading"))]
impl ReproducibleAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            results: (0..num_tasks)
                .map(|_| Mutex::new(None))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Record the results of the n-th analysis task
    fn set_task_result(&self, task_id: usize, result: AnalysisResults) {
        let mut lock = self.results[task_id]
            .lock()
            .expect("Mutex data should be valid");
        assert!(lock.is_none(), "Tasks should not report results twice");
        *lock = Some(result);
    }

    /// Merge the results in batch order
    fn get_merged_result(self) -> AnalysisResults {
        let mut results_iter = self.results.into_vec().into_iter().map(|entry| {
            entry
                .into_inner()
                .expect("Mutex data should be valid")
                .expect("Result should be ready")
        });
        let first_result = results_iter
            .next()
            .expect("There should be at least one task");
        results_iter.fold(first_result, |mut r1, r2| {
            r1.merge(r2);
            r1
        })
    }
}

/// Speed-optimized results accumulation mechanism
#[cfg(feature = "faster-threading")]
struct FastAccumulator {
    /// Storage location in which results will be merged out of order
    merged_result: Mutex<Option<AnalysisResults>>,

    /// Truth that each task has reported its results
    task_finished: Box<[AtomicBool]>,
}
//
#[cfg(feature = "faster-threading")]
impl FastAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            merged_result: Mutex::new(None),
            task_finished: (0..num_tasks)
                .map(|_| AtomicBool::new(false))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Merge the results of the n-th analysis task in completion order
    #[allow(unknown_lints, clippy::significant_drop_in_scrutinee)]
    fn set_task_result(&self, task_id: usize, result: AnalysisResults) {
        match *self
            .merged_result
            .lock()
            .expect("Mutex data should be valid")
        {
            ref mut storage @ None => *storage = Some(result),
            Some(ref mut accumulator) => accumulator.merge(result),
        }

        let was_finished = self.task_finished[task_id].swap(true, Ordering::Relaxed);
        assert!(!was_finished, "Tasks should not set their result twice");
    }

    /// Collect the merged results once every task is done
    fn get_merged_result(self) -> AnalysisResults {
        for ready in self.task_finished.into_vec().into_iter() {
            assert!(
                ready.load(Ordering::Relaxed),
                "All tasks should have completed their work"
            );
        }
        self.merged_result
            .into_inner()
            .expect("Mutex data should be valid")
            .expect("Result should be ready")
    }
}
