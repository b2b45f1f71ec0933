//! Ordered, weighted event selection
//!
//! An analysis is a sequence of named gates followed by analysis-specific
//! cuts. Gates run in order, the first failing one stops the selection of an
//! event, and every passed gate adds the event weight to its counter.

use crate::{
    analysis::Analysis,
    event::{EventInfo, EventStore, Jet, Lepton, MissingEt, PhysicsObject},
    helpers::{is_b_tagged, is_good_jet, is_good_lepton, select_and_sort, standard_event_cuts},
    histogram::HistogramSet,
    numeric::Float,
    resacc::AnalysisResults,
};

use indexmap::IndexMap;
use log::trace;
use std::fmt;
use thiserror::Error;

/// Minimal missing transverse momentum, as neutrinos are expected (GeV)
pub const MIN_MISSING_ET: Float = 30.;

/// Weighted and raw number of events which reached a selection stage
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageCount {
    /// Sum of event weights
    pub weighted: Float,

    /// Number of events
    pub raw: u64,
}

/// Per-stage event counters, in selection order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CutFlowCounter {
    stages: IndexMap<&'static str, StageCount>,
}
//
impl CutFlowCounter {
    /// Set up counters for a known sequence of stages
    ///
    /// Registering stages upfront keeps their order stable, even when some
    /// batch of events never reaches the last stages.
    ///
    pub fn new(stages: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            stages: stages
                .into_iter()
                .map(|stage| (stage, StageCount::default()))
                .collect(),
        }
    }

    /// Record that an event reached some stage
    pub fn count_event(&mut self, stage: &'static str, weight: Float) {
        let count = self.stages.entry(stage).or_default();
        count.weighted += weight;
        count.raw += 1;
    }

    /// Counts of some stage (zero if no event ever reached it)
    pub fn get(&self, stage: &str) -> StageCount {
        self.stages.get(stage).copied().unwrap_or_default()
    }

    /// First stage of the selection and its counts
    pub fn first(&self) -> Option<(&'static str, &StageCount)> {
        self.stages.first().map(|(&stage, count)| (stage, count))
    }

    /// Iterate over stages in selection order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &StageCount)> {
        self.stages.iter().map(|(&stage, count)| (stage, count))
    }

    /// Add the counts of another counter
    pub fn merge(&mut self, other: &Self) {
        for (&stage, count) in &other.stages {
            let dst = self.stages.entry(stage).or_default();
            dst.weighted += count.weighted;
            dst.raw += count.raw;
        }
    }
}

/// Requirement on a number of selected objects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplicity {
    /// Exactly this many objects
    Exactly(usize),

    /// This many objects or more
    AtLeast(usize),
}
//
impl Multiplicity {
    /// Truth that an object count fulfills the requirement
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}
//
impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {}", n),
            Self::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Reason why an event did not pass the selection
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Rejection {
    /// Failed trigger, good-run list or vertex requirement, or missing info
    #[error("event failed the standard data-quality cuts")]
    EventQuality,

    /// Too little missing transverse momentum
    #[error("missing transverse momentum of {0} GeV is too low")]
    MissingEt(Float),

    /// Wrong number of good leptons
    #[error("found {found} good leptons instead of exactly one")]
    LeptonCount {
        /// Number of good leptons in the event
        found: usize,
    },

    /// Wrong number of good jets
    #[error("found {found} good jets instead of {expected}")]
    JetCount {
        /// Number of good jets in the event
        found: usize,
        /// Requirement of the analysis
        expected: Multiplicity,
    },

    /// Wrong number of b-tagged jets
    #[error("found {found} b-tagged jets instead of {expected}")]
    BTagCount {
        /// Number of b-tagged good jets in the event
        found: usize,
        /// Requirement of the analysis
        expected: Multiplicity,
    },

    /// Failed an analysis-specific kinematic cut
    #[error("{observable} = {value} failed its cut")]
    Kinematic {
        /// Observable which was cut on
        observable: &'static str,
        /// Value of the observable for this event
        value: Float,
    },
}
//
impl Rejection {
    /// Turn the outcome of a kinematic cut into a selection result
    pub fn check(passed: bool, observable: &'static str, value: Float) -> Result<(), Self> {
        if passed {
            Ok(())
        } else {
            Err(Self::Kinematic { observable, value })
        }
    }
}

/// Objects and quantities derived from an event as it goes through the gates
pub struct Selection<'ev> {
    /// Event-level metadata
    pub info: &'ev EventInfo,

    /// Missing transverse momentum
    pub et_miss: &'ev MissingEt,

    /// All leptons of the event
    leptons: &'ev [Lepton],

    /// All jets of the event
    jets: &'ev [Jet],

    /// Event weight, computed once and used for every fill
    pub weight: Float,

    /// Good leptons by decreasing pt (filled by the lepton gate)
    pub good_leptons: Vec<&'ev Lepton>,

    /// Good jets by decreasing pt (filled by the jet gate)
    pub good_jets: Vec<&'ev Jet>,

    /// Number of b-tagged good jets (filled by the b-tagging gate)
    pub num_btags: usize,
}
//
impl<'ev> Selection<'ev> {
    /// Start the selection of an event
    pub fn new(event: &'ev impl EventStore, is_data: bool) -> Self {
        let info = event.event_info();
        Self {
            info,
            et_miss: event.et_miss(),
            leptons: event.leptons(),
            jets: event.jets(),
            weight: info.weight(is_data),
            good_leptons: Vec::new(),
            good_jets: Vec::new(),
            num_btags: 0,
        }
    }

    /// The one good lepton which the lepton gate lets through
    pub fn leading_lepton(&self) -> Result<&'ev Lepton, Rejection> {
        self.good_leptons
            .first()
            .copied()
            .ok_or(Rejection::LeptonCount { found: 0 })
    }
}

/// Named selection stage shared by all single-lepton analyses
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gate {
    /// Every event passes, this only counts processed events
    All,

    /// Standard data-quality cuts
    EventCuts,

    /// Missing transverse momentum above a threshold (GeV)
    MissingEt(Float),

    /// Exactly one good lepton
    OneLepton,

    /// Good jet multiplicity
    Jets(Multiplicity),

    /// b-tagged good jet multiplicity
    BTags(Multiplicity),
}
//
impl Gate {
    /// Name of the cut-flow stage associated with this gate
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::EventCuts => "EventCuts",
            Self::MissingEt(_) => "MET",
            Self::OneLepton => "1 Lepton",
            Self::Jets(_) => "Jets",
            Self::BTags(_) => "btags",
        }
    }

    /// Check an event, recording the objects that later stages need
    pub fn apply(&self, selection: &mut Selection<'_>) -> Result<(), Rejection> {
        match *self {
            Self::All => Ok(()),

            Self::EventCuts => {
                if standard_event_cuts(selection.info) {
                    Ok(())
                } else {
                    Err(Rejection::EventQuality)
                }
            }

            Self::MissingEt(min_et) => {
                let et = selection.et_miss.et;
                if et > min_et {
                    Ok(())
                } else {
                    Err(Rejection::MissingEt(et))
                }
            }

            Self::OneLepton => {
                selection.good_leptons =
                    select_and_sort(selection.leptons, |l| is_good_lepton(l), |l| l.pt());
                let found = selection.good_leptons.len();
                if found == 1 {
                    Ok(())
                } else {
                    Err(Rejection::LeptonCount { found })
                }
            }

            Self::Jets(expected) => {
                selection.good_jets =
                    select_and_sort(selection.jets, |j| is_good_jet(j), |j| j.pt());
                let found = selection.good_jets.len();
                if expected.accepts(found) {
                    Ok(())
                } else {
                    Err(Rejection::JetCount { found, expected })
                }
            }

            Self::BTags(expected) => {
                let found = selection
                    .good_jets
                    .iter()
                    .filter(|jet| is_b_tagged(jet))
                    .count();
                selection.num_btags = found;
                if expected.accepts(found) {
                    Ok(())
                } else {
                    Err(Rejection::BTagCount { found, expected })
                }
            }
        }
    }
}

/// Gates of the single-lepton + missing-ET family of analyses
pub fn standard_gates(jets: Multiplicity, btags: Multiplicity) -> Vec<Gate> {
    vec![
        Gate::All,
        Gate::EventCuts,
        Gate::MissingEt(MIN_MISSING_ET),
        Gate::OneLepton,
        Gate::Jets(jets),
        Gate::BTags(btags),
    ]
}

/// Runs the full selection of one analysis on individual events
pub struct EventSelector<A: Analysis> {
    /// Analysis-specific cuts and histograms
    analysis: A,

    /// Gates, in the order where they are applied
    gates: Vec<Gate>,

    /// Empty results with all counters and histograms booked
    template: AnalysisResults,

    /// Truth that real data is analyzed (which disables event weights)
    is_data: bool,
}
//
impl<A: Analysis> EventSelector<A> {
    /// Set up an analysis, letting it book its histograms
    pub fn new(
        book: impl FnOnce(&mut HistogramSet) -> crate::Result<A>,
        is_data: bool,
    ) -> crate::Result<Self> {
        let mut histograms = HistogramSet::new();
        let analysis = book(&mut histograms)?;
        let gates = standard_gates(analysis.jet_requirement(), analysis.btag_requirement());
        let cut_flow = CutFlowCounter::new(gates.iter().map(Gate::name));
        Ok(Self {
            analysis,
            gates,
            template: AnalysisResults::new(cut_flow, histograms),
            is_data,
        })
    }

    /// Gates applied before the analysis-specific cuts
    pub fn gates(&self) -> &[Gate] {
        &self.gates[..]
    }

    /// Fresh results accumulator, with every counter and histogram booked
    pub fn new_results(&self) -> AnalysisResults {
        self.template.clone()
    }

    /// Run the selection on one event, recording its contribution to the
    /// results. Returns why the event was rejected, if it was.
    pub fn select(
        &self,
        event: &impl EventStore,
        results: &mut AnalysisResults,
    ) -> Result<(), Rejection> {
        let mut selection = Selection::new(event, self.is_data);
        for gate in &self.gates {
            if let Err(rejection) = gate.apply(&mut selection) {
                trace!("Event rejected at stage {:?}: {}", gate.name(), rejection);
                return Err(rejection);
            }
            results.cut_flow.count_event(gate.name(), selection.weight);
        }
        if let Err(rejection) = self.analysis.analyze(&selection, &mut results.histograms) {
            trace!("Event rejected by the analysis cuts: {}", rejection);
            return Err(rejection);
        }
        results.accepted_events += 1;
        Ok(())
    }
}
