//! This module defines the properties and storage of reconstructed events

use crate::{
    momentum::{Kinematics, Momentum, E},
    numeric::Float,
};

/// Event-level metadata
///
/// The data-quality flags are optional because not every event source
/// provides them. Events where one of them is missing fail the standard
/// event cuts.
///
#[derive(Clone, Debug, PartialEq)]
pub struct EventInfo {
    /// Monte-Carlo scale factor (product of all object scale factors)
    pub scale_factor: Float,

    /// Generator-level event weight
    pub event_weight: Float,

    /// Z position of the primary vertex (mm)
    pub primary_vertex_z: Float,

    /// Number of reconstructed vertices
    pub num_vertices: u32,

    /// Truth that a single-electron trigger fired
    pub triggered_by_electron: Option<bool>,

    /// Truth that a single-muon trigger fired
    pub triggered_by_muon: Option<bool>,

    /// Truth that the event belongs to the good-run list
    pub pass_grl: Option<bool>,

    /// Truth that the event has a good primary vertex
    pub has_good_vertex: Option<bool>,
}
//
impl EventInfo {
    /// Weight of this event, which every counter and histogram fill must use
    pub fn weight(&self, is_data: bool) -> Float {
        if is_data {
            1.
        } else {
            self.scale_factor * self.event_weight
        }
    }
}

/// Missing transverse momentum
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MissingEt {
    /// Magnitude (GeV)
    pub et: Float,

    /// Azimuthal angle
    pub phi: Float,
}
//
impl MissingEt {
    /// Massless, purely transverse 4-momentum matching this missing-ET
    pub fn momentum(&self) -> Momentum {
        crate::momentum::from_pt_eta_phi_e(self.et, 0., self.phi, self.et)
    }
}

/// Anything that is carried around as a reconstructed 4-momentum
pub trait PhysicsObject {
    /// Full Lorentz vector, for combination arithmetic
    fn p4(&self) -> &Momentum;

    /// Transverse momentum (GeV)
    fn pt(&self) -> Float {
        self.p4().pt()
    }

    /// Pseudorapidity
    fn eta(&self) -> Float {
        self.p4().eta()
    }

    /// Azimuthal angle
    fn phi(&self) -> Float {
        self.p4().phi()
    }

    /// Energy (GeV)
    fn e(&self) -> Float {
        self.p4()[E]
    }

    /// Invariant mass (GeV)
    fn m(&self) -> Float {
        self.p4().mass()
    }
}

/// Reconstructed electron or muon
#[derive(Clone, Debug, PartialEq)]
pub struct Lepton {
    /// 4-momentum
    pub p4: Momentum,

    /// Electric charge (±1)
    pub charge: i32,

    /// Particle type code (11 for electrons, 13 for muons)
    pub pdg_id: i32,

    /// Truth that the lepton passes the tight identification criteria
    pub tight_id: bool,

    /// Track isolation in a cone of ΔR = 0.3, relative to pt
    pub ptconerel30: Float,

    /// Calorimeter isolation in a cone of ΔR = 0.2, relative to pt
    pub etconerel20: Float,

    /// Longitudinal impact parameter (mm)
    pub z0: Float,

    /// Transverse impact parameter (mm)
    pub d0: Float,
}
//
impl PhysicsObject for Lepton {
    fn p4(&self) -> &Momentum {
        &self.p4
    }
}

/// Reconstructed hadronic jet
#[derive(Clone, Debug, PartialEq)]
pub struct Jet {
    /// 4-momentum
    pub p4: Momentum,

    /// Output of the MV2c10 b-tagging algorithm
    pub mv2c10: Float,

    /// Jet-vertex-tagger score
    pub jvt: Float,
}
//
impl PhysicsObject for Jet {
    fn p4(&self) -> &Momentum {
        &self.p4
    }
}

/// Capabilities that any event data backend must provide to the selection
pub trait EventStore {
    /// Event-level metadata
    fn event_info(&self) -> &EventInfo;

    /// Missing transverse momentum
    fn et_miss(&self) -> &MissingEt;

    /// All reconstructed leptons, in backend order
    fn leptons(&self) -> &[Lepton];

    /// All reconstructed jets, in backend order
    fn jets(&self) -> &[Jet];
}

/// In-memory storage for one reconstructed event
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event-level metadata
    pub info: EventInfo,

    /// Missing transverse momentum
    pub et_miss: MissingEt,

    /// Reconstructed leptons
    pub leptons: Vec<Lepton>,

    /// Reconstructed jets
    pub jets: Vec<Jet>,
}
//
impl EventStore for Event {
    fn event_info(&self) -> &EventInfo {
        &self.info
    }

    fn et_miss(&self) -> &MissingEt {
        &self.et_miss
    }

    fn leptons(&self) -> &[Lepton] {
        &self.leptons[..]
    }

    fn jets(&self) -> &[Jet] {
        &self.jets[..]
    }
}

/// Event building blocks shared by the unit tests
#[cfg(test)]
pub mod fixtures {
    use super::*;
    use crate::{momentum::from_pt_eta_phi_m, numeric::reals::consts::PI};
    use rand::Rng;

    /// Mass given to test jets (GeV)
    pub const JET_MASS: Float = 5.;

    /// Simulated event info which passes the standard event cuts
    pub fn good_info(scale_factor: Float, event_weight: Float) -> EventInfo {
        EventInfo {
            scale_factor,
            event_weight,
            primary_vertex_z: 12.5,
            num_vertices: 17,
            triggered_by_electron: Some(true),
            triggered_by_muon: Some(false),
            pass_grl: Some(true),
            has_good_vertex: Some(true),
        }
    }

    /// Isolated, tightly identified massless electron
    pub fn electron(pt: Float, eta: Float, phi: Float) -> Lepton {
        Lepton {
            p4: from_pt_eta_phi_m(pt, eta, phi, 0.),
            charge: -1,
            pdg_id: 11,
            tight_id: true,
            ptconerel30: 0.02,
            etconerel20: 0.03,
            z0: 0.1,
            d0: 0.01,
        }
    }

    /// Jet with a good JVT score and the given b-tagging discriminant
    pub fn jet(pt: Float, eta: Float, phi: Float, mv2c10: Float) -> Jet {
        Jet {
            p4: from_pt_eta_phi_m(pt, eta, phi, JET_MASS),
            mv2c10,
            jvt: 0.9,
        }
    }

    /// Assemble an event
    pub fn event(info: EventInfo, et_miss: MissingEt, leptons: Vec<Lepton>, jets: Vec<Jet>) -> Event {
        Event {
            info,
            et_miss,
            leptons,
            jets,
        }
    }

    /// Optional flag which is usually set
    fn random_flag(rng: &mut impl Rng) -> Option<bool> {
        match rng.gen_range(0..20) {
            0 => None,
            1 => Some(false),
            _ => Some(true),
        }
    }

    /// Simulated event whose objects straddle every selection threshold
    pub fn random_event(rng: &mut impl Rng) -> Event {
        let info = EventInfo {
            scale_factor: rng.gen_range(0.5..1.5),
            event_weight: rng.gen_range(0.5..1.5),
            primary_vertex_z: rng.gen_range(-150.0..150.0),
            num_vertices: rng.gen_range(1..30),
            triggered_by_electron: random_flag(rng),
            triggered_by_muon: random_flag(rng),
            pass_grl: random_flag(rng),
            has_good_vertex: random_flag(rng),
        };
        let et_miss = MissingEt {
            et: rng.gen_range(0.0..120.0),
            phi: rng.gen_range(-PI..PI),
        };
        let num_leptons = rng.gen_range(0..=2);
        let leptons = (0..num_leptons)
            .map(|_| Lepton {
                p4: from_pt_eta_phi_m(
                    rng.gen_range(15.0..90.0),
                    rng.gen_range(-2.7..2.7),
                    rng.gen_range(-PI..PI),
                    0.,
                ),
                charge: if rng.gen_bool(0.5) { 1 } else { -1 },
                pdg_id: if rng.gen_bool(0.5) { 11 } else { 13 },
                tight_id: rng.gen_bool(0.9),
                ptconerel30: rng.gen_range(0.0..0.2),
                etconerel20: rng.gen_range(-0.05..0.2),
                z0: rng.gen_range(-0.5..0.5),
                d0: rng.gen_range(-0.05..0.05),
            })
            .collect();
        let num_jets = rng.gen_range(0..=6);
        let jets = (0..num_jets)
            .map(|_| Jet {
                p4: from_pt_eta_phi_m(
                    rng.gen_range(15.0..150.0),
                    rng.gen_range(-3.0..3.0),
                    rng.gen_range(-PI..PI),
                    rng.gen_range(2.0..20.0),
                ),
                mv2c10: rng.gen_range(-1.0..1.0),
                jvt: rng.gen_range(0.0..1.0),
            })
            .collect();
        event(info, et_miss, leptons, jets)
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures::*, *};
    use approx::assert_relative_eq;

    #[test]
    fn simulation_weight() {
        let info = good_info(0.9, 2.);
        assert_relative_eq!(info.weight(false), 1.8, max_relative = 1e-6);
        assert_eq!(info.weight(true), 1.);
    }

    #[test]
    fn object_accessors() {
        let lepton = electron(40., 0.5, -1.);
        assert_relative_eq!(lepton.pt(), 40., max_relative = 1e-6);
        assert_relative_eq!(lepton.eta(), 0.5, max_relative = 1e-6);
        assert_relative_eq!(lepton.phi(), -1., max_relative = 1e-6);
        assert_relative_eq!(lepton.e(), 40. * (0.5 as Float).cosh(), max_relative = 1e-6);

        let jet = jet(60., 0., 0., 0.5);
        assert_relative_eq!(jet.m(), JET_MASS, max_relative = 1e-5);
    }

    #[test]
    fn missing_et_momentum() {
        let met = MissingEt { et: 30., phi: 0.5 };
        let p = met.momentum();
        assert_relative_eq!(p.pt(), 30., max_relative = 1e-6);
        assert_relative_eq!(p.phi(), 0.5, max_relative = 1e-6);
        assert_eq!(p[crate::momentum::Z], 0.);
    }
}
