//! t-channel single top quark selection
//!
//! One lepton, missing-ET, exactly one b-tagged jet and one light jet which
//! is expected to be emitted in the forward direction.

use super::{Analysis, ObjectHistograms};
use crate::{
    cutflow::{Multiplicity, Rejection, Selection},
    event::{Jet, PhysicsObject},
    helpers::{is_b_tagged, single_top_mass, w_transverse_mass},
    histogram::{HistId, HistogramSet},
    Result,
};

use prefix_num_ops::real::*;

/// Single top selection and its histograms
pub struct SingleTop {
    objects: ObjectHistograms,
    mass_before: HistId,
    n_jets_before: HistId,
    light_eta_before: HistId,
    delta_eta_before: HistId,
    ht_before: HistId,
    mass: HistId,
    light_eta: HistId,
    delta_eta: HistId,
    ht: HistId,
}
//
impl SingleTop {
    /// Book the histograms of the single top analysis
    pub fn book(histograms: &mut HistogramSet) -> Result<Self> {
        Ok(Self {
            objects: ObjectHistograms::book(histograms)?,
            mass_before: histograms.add_standard("SingleTopMassbefore")?,
            n_jets_before: histograms.add_standard("n_jetsbefore")?,
            light_eta_before: histograms.add_standard("jet_letabefore")?,
            delta_eta_before: histograms.add_standard("delta_etabefore")?,
            ht_before: histograms.add_standard("htbefore")?,
            mass: histograms.add_standard("SingleTopMass")?,
            light_eta: histograms.add_standard("jet_leta")?,
            delta_eta: histograms.add_standard("delta_eta")?,
            ht: histograms.add_standard("ht")?,
        })
    }
}
//
impl Analysis for SingleTop {
    fn jet_requirement(&self) -> Multiplicity {
        Multiplicity::Exactly(2)
    }

    fn btag_requirement(&self) -> Multiplicity {
        Multiplicity::Exactly(1)
    }

    fn analyze(
        &self,
        selection: &Selection<'_>,
        histograms: &mut HistogramSet,
    ) -> std::result::Result<(), Rejection> {
        let lepton = selection.leading_lepton()?;
        let et_miss = selection.et_miss;
        let weight = selection.weight;

        let w_mt = w_transverse_mass(lepton, et_miss);
        Rejection::check(w_mt > 50., "WtMass", w_mt)?;

        let (b_jets, light_jets): (Vec<&Jet>, Vec<&Jet>) = selection
            .good_jets
            .iter()
            .copied()
            .partition(|jet| is_b_tagged(jet));
        let (&[b_jet], &[light_jet]) = (&b_jets[..], &light_jets[..]) else {
            return Err(Rejection::BTagCount {
                found: b_jets.len(),
                expected: self.btag_requirement(),
            });
        };

        let top_mass = single_top_mass(lepton, et_miss, b_jet);
        let light_eta = light_jet.eta();
        let delta_eta = abs(b_jet.eta() - light_eta);
        let ht = lepton.pt() + light_jet.pt() + b_jet.pt() + et_miss.et;

        histograms.fill(self.mass_before, top_mass, weight);
        histograms.fill(self.n_jets_before, selection.good_jets.len() as _, weight);
        histograms.fill(self.light_eta_before, light_eta, weight);
        histograms.fill(self.delta_eta_before, delta_eta, weight);
        histograms.fill(self.ht_before, ht, weight);

        Rejection::check(top_mass > 150. && top_mass < 220., "SingleTopMass", top_mass)?;
        histograms.fill(self.mass, top_mass, weight);

        // The light jet of t-channel production goes forward
        Rejection::check(abs(light_eta) > 1.5, "jet_leta", light_eta)?;
        histograms.fill(self.light_eta, light_eta, weight);

        Rejection::check(delta_eta > 1.5, "delta_eta", delta_eta)?;
        histograms.fill(self.delta_eta, delta_eta, weight);

        Rejection::check(ht > 195., "ht", ht)?;
        histograms.fill(self.ht, ht, weight);

        self.objects.fill(selection, lepton, w_mt, histograms);
        Ok(())
    }
}
