//! This module allows integrating analysis results across processed events

use crate::{cutflow::CutFlowCounter, histogram::HistogramSet};

/// This struct accumulates everything an analysis produces: the cut-flow
/// counters and the histograms. One is created per batch of events, and
/// batches are combined using merge().
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisResults {
    /// Weighted number of events which reached each selection stage
    pub cut_flow: CutFlowCounter,

    /// Histograms booked by the analysis
    pub histograms: HistogramSet,

    /// Number of events which passed the full selection
    pub accepted_events: usize,
}
//
impl AnalysisResults {
    /// Prepare for results integration
    pub fn new(cut_flow: CutFlowCounter, histograms: HistogramSet) -> Self {
        Self {
            cut_flow,
            histograms,
            accepted_events: 0,
        }
    }

    /// Number of events which were fed to the analysis
    pub fn processed_events(&self) -> u64 {
        self.cut_flow.first().map_or(0, |(_, count)| count.raw)
    }

    /// Integrate analysis results from another AnalysisResults
    ///
    /// Every quantity is a plain sum, so merging is associative and
    /// commutative up to floating-point rounding.
    ///
    #[allow(clippy::needless_pass_by_value)]
    pub fn merge(&mut self, other: Self) {
        self.cut_flow.merge(&other.cut_flow);
        self.histograms.merge(&other.histograms);
        self.accepted_events += other.accepted_events;
    }
}
