//! Semi-leptonic top quark pair selection
//!
//! One top decays into a lepton, a neutrino and a b-jet, the other one into
//! three jets which are identified by combinatorial reconstruction.

use super::{Analysis, ObjectHistograms};
use crate::{
    config::UnknownVariant,
    cutflow::{Multiplicity, Rejection, Selection},
    helpers::w_transverse_mass,
    histogram::{HistId, HistogramSet},
    numeric::Float,
    reconstruct::{reconstruct, SearchMode},
    Result,
};

use std::str::FromStr;

/// Acceptance test on the mass of the hadronic W candidate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MassWindow {
    /// Reproduce the reference analysis results
    ///
    /// The reference analysis shifts the mass by 10 GeV in the wrong
    /// direction on both sides of the [70, 90] GeV window, so only a mass of
    /// exactly 80 GeV gets through.
    ///
    #[default]
    Reference,

    /// Accept masses within 10 GeV of 80 GeV
    Corrected,
}
//
impl MassWindow {
    /// Truth that a W candidate mass passes the window
    pub fn accepts(self, mass: Float) -> bool {
        match self {
            Self::Reference => !(mass - 10. < 70. || mass + 10. > 90.),
            Self::Corrected => mass > 70. && mass < 90.,
        }
    }
}
//
impl FromStr for MassWindow {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reference" => Ok(Self::Reference),
            "corrected" => Ok(Self::Corrected),
            _ => Err(UnknownVariant::new("W mass window", s)),
        }
    }
}

/// Top pair selection and its histograms
pub struct TopPair {
    objects: ObjectHistograms,
    search: SearchMode,
    window: MassWindow,
    top_mass_before: HistId,
    w_mass_before: HistId,
    w_mass: HistId,
}
//
impl TopPair {
    /// Book the histograms of the top pair analysis
    pub fn book(
        histograms: &mut HistogramSet,
        search: SearchMode,
        window: MassWindow,
    ) -> Result<Self> {
        Ok(Self {
            objects: ObjectHistograms::book(histograms)?,
            search,
            window,
            top_mass_before: histograms.add_standard("TopMassRecbefore")?,
            w_mass_before: histograms.add_standard("WtMassRecbefore")?,
            w_mass: histograms.add_standard("WtMassRec")?,
        })
    }
}
//
impl Analysis for TopPair {
    fn jet_requirement(&self) -> Multiplicity {
        Multiplicity::AtLeast(4)
    }

    fn btag_requirement(&self) -> Multiplicity {
        Multiplicity::AtLeast(2)
    }

    fn analyze(
        &self,
        selection: &Selection<'_>,
        histograms: &mut HistogramSet,
    ) -> std::result::Result<(), Rejection> {
        let lepton = selection.leading_lepton()?;
        let weight = selection.weight;

        let w_mt = w_transverse_mass(lepton, selection.et_miss);
        Rejection::check(w_mt > 30., "WtMass", w_mt)?;

        let candidates = reconstruct(&selection.good_jets, self.search).ok_or(
            Rejection::JetCount {
                found: selection.good_jets.len(),
                expected: self.jet_requirement(),
            },
        )?;
        let top_mass = candidates.top_mass();
        let w_mass = candidates.w_mass();
        histograms.fill(self.top_mass_before, top_mass, weight);
        histograms.fill(self.w_mass_before, w_mass, weight);

        Rejection::check(self.window.accepts(w_mass), "WtMassRec", w_mass)?;
        histograms.fill(self.w_mass, w_mass, weight);

        self.objects.fill(selection, lepton, w_mt, histograms);
        Ok(())
    }
}
