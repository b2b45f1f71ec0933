//! Sequential back-end of the analysis

use crate::{resacc::AnalysisResults, scheduling::EVENT_BATCH_SIZE};

/// Analyze events in sequential mode
///
/// We use batched logic even in sequential mode, in order to achieve
/// reproducibility with respect to multi-threaded runs.
///
pub fn run_analysis_impl<E>(
    events: &[E],
    analyze_events: impl Fn(&[E]) -> AnalysisResults,
) -> AnalysisResults {
    // Initialize the accumulator with the first batch of events
    let mut batches = events.chunks(EVENT_BATCH_SIZE);
    let mut accumulator = analyze_events(batches.next().unwrap_or(&[]));

    // Analyze and integrate the other batches (if any)
    for batch in batches {
        accumulator.merge(analyze_events(batch));
    }
    accumulator
}
