//! This module takes care of scheduling the analysis work, encapsulating use
//! of multiple threads and anything else that will come in the future

#[cfg(feature = "multi-threading")]
mod multi_threading;
#[cfg(not(feature = "multi-threading"))]
mod sequential;

use crate::resacc::AnalysisResults;

/// Size of the analyzed event batches
///
/// Events are grouped in batches of a certain size in order to reduce
/// accumulation error and achieve perfect reproducibility between sequential
/// and parallel runs of the analysis.
///
const EVENT_BATCH_SIZE: usize = 10_000;

/// Run the analysis in the manner that was configured at build time.
///
/// Takes as parameters the events to be analyzed and an analysis kernel that
/// processes a batch of events into a fresh results accumulator.
///
/// Returns the merged results of all batches. An empty event list still goes
/// through the kernel once, so that every counter and histogram is reported.
///
pub fn run_analysis<E: Sync>(
    events: &[E],
    analyze_events: impl Send + Sync + Fn(&[E]) -> AnalysisResults,
) -> AnalysisResults {
    // ...in sequential mode
    #[cfg(not(feature = "multi-threading"))]
    {
        sequential::run_analysis_impl(events, analyze_events)
    }

    // ...in multi-threaded mode
    #[cfg(feature = "multi-threading")]
    {
        multi_threading::run_analysis_impl(events, analyze_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::ttbar::{MassWindow, TopPair},
        cutflow::EventSelector,
        event::{fixtures::random_event, Event},
        numeric::Float,
        reconstruct::SearchMode,
    };
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn selector() -> EventSelector<TopPair> {
        EventSelector::new(
            |hists| TopPair::book(hists, SearchMode::Exhaustive, MassWindow::Corrected),
            false,
        )
        .unwrap()
    }

    fn analyze(selector: &EventSelector<TopPair>, events: &[Event]) -> AnalysisResults {
        let mut results = selector.new_results();
        for event in events {
            let _ = selector.select(event, &mut results);
        }
        results
    }

    #[test]
    fn batching_matches_single_pass() {
        let selector = selector();
        let mut rng = Xoshiro256Plus::seed_from_u64(0xda7a);
        let events = (0..2 * EVENT_BATCH_SIZE + 123)
            .map(|_| random_event(&mut rng))
            .collect::<Vec<_>>();

        let batched = run_analysis(&events, |batch| analyze(&selector, batch));
        let single = analyze(&selector, &events);

        // Batches change the summation order of weights
        let tolerance = Float::EPSILON.sqrt();

        assert_eq!(batched.processed_events(), events.len() as u64);
        assert_eq!(batched.accepted_events, single.accepted_events);
        for ((stage1, count1), (stage2, count2)) in batched.cut_flow.iter().zip(single.cut_flow.iter()) {
            assert_eq!(stage1, stage2);
            assert_eq!(count1.raw, count2.raw);
            assert_relative_eq!(count1.weighted, count2.weighted, max_relative = tolerance);
        }
        for (hist1, hist2) in batched.histograms.iter().zip(single.histograms.iter()) {
            assert_eq!(hist1.entries, hist2.entries);
            assert_relative_eq!(hist1.integral(), hist2.integral(), max_relative = tolerance);
        }
    }

    #[test]
    fn empty_input() {
        let selector = selector();
        let results = run_analysis(&[] as &[Event], |batch| analyze(&selector, batch));
        assert_eq!(results.processed_events(), 0);
        assert_eq!(results.cut_flow.iter().count(), 6);
        assert!(results.histograms.iter().all(|hist| hist.entries == 0));
    }
}
