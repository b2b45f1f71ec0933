//! Analysis-specific selection and histogramming
//!
//! Every analysis shares the gates of the cut-flow module and then applies
//! its own kinematic cuts, filling histograms before and after each of them.

pub mod single_top;
pub mod ttbar;

use crate::{
    cutflow::{Multiplicity, Rejection, Selection},
    event::{Lepton, PhysicsObject},
    histogram::{HistId, HistogramSet},
    numeric::Float,
    Result,
};

/// Analysis-specific part of an event selection
pub trait Analysis: Sync {
    /// Number of good jets which the Jets gate requires
    fn jet_requirement(&self) -> Multiplicity;

    /// Number of b-tagged good jets which the btags gate requires
    fn btag_requirement(&self) -> Multiplicity;

    /// Apply the analysis cuts to an event which passed every gate, filling
    /// histograms along the way
    fn analyze(
        &self,
        selection: &Selection<'_>,
        histograms: &mut HistogramSet,
    ) -> std::result::Result<(), Rejection>;
}

/// Histograms of the event, lepton and jet properties of accepted events
pub struct ObjectHistograms {
    vxp_z: HistId,
    pvxp_n: HistId,
    wt_mass: HistId,
    etmiss: HistId,
    lep_n: HistId,
    lep_pt: HistId,
    lep_eta: HistId,
    lep_e: HistId,
    lep_phi: HistId,
    lep_charge: HistId,
    lep_type: HistId,
    lep_z0: HistId,
    lep_d0: HistId,
    lep_ptconerel30: HistId,
    lep_etconerel20: HistId,
    n_jets: HistId,
    jet_m: HistId,
    jet_pt: HistId,
    jet_jvt: HistId,
    jet_eta: HistId,
    jet_mv2c10: HistId,
    jet_phi: HistId,
}
//
impl ObjectHistograms {
    /// Book the object histograms
    pub fn book(histograms: &mut HistogramSet) -> Result<Self> {
        let mut book = |name| histograms.add_standard(name);
        Ok(Self {
            vxp_z: book("vxp_z")?,
            pvxp_n: book("pvxp_n")?,
            wt_mass: book("WtMass")?,
            etmiss: book("etmiss")?,
            lep_n: book("lep_n")?,
            lep_pt: book("lep_pt")?,
            lep_eta: book("lep_eta")?,
            lep_e: book("lep_E")?,
            lep_phi: book("lep_phi")?,
            lep_charge: book("lep_charge")?,
            lep_type: book("lep_type")?,
            lep_z0: book("lep_z0")?,
            lep_d0: book("lep_d0")?,
            lep_ptconerel30: book("lep_ptconerel30")?,
            lep_etconerel20: book("lep_etconerel20")?,
            n_jets: book("n_jets")?,
            jet_m: book("jet_m")?,
            jet_pt: book("jet_pt")?,
            jet_jvt: book("jet_jvt")?,
            jet_eta: book("jet_eta")?,
            jet_mv2c10: book("jet_MV2c10")?,
            jet_phi: book("jet_phi")?,
        })
    }

    /// Record an accepted event
    ///
    /// Event and lepton histograms get one entry, jet histograms get one
    /// entry per good jet.
    ///
    pub fn fill(
        &self,
        selection: &Selection<'_>,
        lepton: &Lepton,
        w_transverse_mass: Float,
        histograms: &mut HistogramSet,
    ) {
        let weight = selection.weight;
        let mut fill = |id, value| histograms.fill(id, value, weight);

        fill(self.vxp_z, selection.info.primary_vertex_z);
        fill(self.pvxp_n, selection.info.num_vertices as Float);
        fill(self.wt_mass, w_transverse_mass);
        fill(self.etmiss, selection.et_miss.et);

        fill(self.lep_n, selection.good_leptons.len() as Float);
        fill(self.lep_pt, lepton.pt());
        fill(self.lep_eta, lepton.eta());
        fill(self.lep_e, lepton.e());
        fill(self.lep_phi, lepton.phi());
        fill(self.lep_charge, lepton.charge as Float);
        fill(self.lep_type, lepton.pdg_id as Float);
        fill(self.lep_z0, lepton.z0);
        fill(self.lep_d0, lepton.d0);
        fill(self.lep_ptconerel30, lepton.ptconerel30);
        fill(self.lep_etconerel20, lepton.etconerel20);

        fill(self.n_jets, selection.good_jets.len() as Float);
        for jet in &selection.good_jets {
            fill(self.jet_m, jet.m());
            fill(self.jet_pt, jet.pt());
            fill(self.jet_jvt, jet.jvt);
            fill(self.jet_eta, jet.eta());
            fill(self.jet_mv2c10, jet.mv2c10);
            fill(self.jet_phi, jet.phi());
        }
    }
}

/// Histograms which get one entry per good jet of an accepted event
#[cfg(test)]
pub const PER_JET_HISTOGRAMS: [&str; 6] =
    ["jet_m", "jet_pt", "jet_jvt", "jet_eta", "jet_MV2c10", "jet_phi"];
