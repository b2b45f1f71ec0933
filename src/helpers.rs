//! Kinematic helpers shared by all analyses
//!
//! Object acceptance cuts, event quality cuts and the reconstruction of
//! leptonic W and top quark observables.

use crate::{
    event::{EventInfo, Jet, Lepton, MissingEt, PhysicsObject},
    momentum::{Kinematics, Momentum, X, Y, Z, E},
    numeric::{Complex, Float},
};
use prefix_num_ops::real::*;

/// MV2c10 discriminant threshold of the 80% b-tagging efficiency working point
pub const BTAG_WORKING_POINT: Float = 0.7892;

/// W boson mass used as a constraint on the neutrino momentum (GeV)
pub const W_MASS: Float = 80.4;

/// Standard data-quality cuts which every analyzed event must pass
///
/// Missing metadata is handled by rejecting the event.
///
pub fn standard_event_cuts(info: &EventInfo) -> bool {
    let (Some(electron), Some(muon), Some(grl), Some(vertex)) = (
        info.triggered_by_electron,
        info.triggered_by_muon,
        info.pass_grl,
        info.has_good_vertex,
    ) else {
        return false;
    };
    (electron || muon) && grl && vertex
}

/// Keep the objects which pass a predicate, sorted by decreasing key
///
/// The sort is stable, so objects with equal keys keep their input order.
///
pub fn select_and_sort<T>(
    objects: impl IntoIterator<Item = T>,
    predicate: impl Fn(&T) -> bool,
    key: impl Fn(&T) -> Float,
) -> Vec<T> {
    let mut selected = objects
        .into_iter()
        .filter(|object| predicate(object))
        .collect::<Vec<_>>();
    selected.sort_by(|a, b| key(b).total_cmp(&key(a)));
    selected
}

/// Lepton identification, isolation and acceptance cuts
pub fn is_good_lepton(lepton: &Lepton) -> bool {
    match lepton.pdg_id.abs() {
        11 => is_good_electron(lepton),
        13 => is_good_muon(lepton),
        _ => false,
    }
}

/// Cuts specific to electrons
fn is_good_electron(lepton: &Lepton) -> bool {
    // Electrons in the barrel/end-cap transition region are badly measured
    let abs_eta = abs(lepton.eta());
    is_isolated_tight_lepton(lepton) && abs_eta < 2.47 && !(1.37..=1.52).contains(&abs_eta)
}

/// Cuts specific to muons
fn is_good_muon(lepton: &Lepton) -> bool {
    is_isolated_tight_lepton(lepton) && abs(lepton.eta()) < 2.5
}

/// Cuts shared by electrons and muons
fn is_isolated_tight_lepton(lepton: &Lepton) -> bool {
    lepton.tight_id
        && lepton.pt() > 25.
        && lepton.etconerel20 < 0.15
        && lepton.ptconerel30 < 0.15
}

/// Jet acceptance and pile-up suppression cuts
pub fn is_good_jet(jet: &Jet) -> bool {
    if jet.pt() < 25. {
        return false;
    }
    let abs_eta = abs(jet.eta());
    if abs_eta > 2.5 {
        return false;
    }
    // Soft central jets must be compatible with the primary vertex
    if jet.pt() < 60. && abs_eta < 2.4 && jet.jvt < 0.59 {
        return false;
    }
    true
}

/// Truth that a jet passes the b-tagging working point
pub fn is_b_tagged(jet: &Jet) -> bool {
    jet.mv2c10 > BTAG_WORKING_POINT
}

/// Transverse mass of the leptonically decaying W boson
pub fn w_transverse_mass(lepton: &Lepton, et_miss: &MissingEt) -> Float {
    let dphi = lepton.p4().delta_phi(&et_miss.momentum());
    sqrt(2. * lepton.pt() * et_miss.et * (1. - cos(dphi)))
}

/// Reconstruct the neutrino 4-momentum from the missing-ET and the W mass
///
/// The W mass constraint yields a quadratic equation for the longitudinal
/// momentum of the neutrino. Its roots are computed in the complex plane and
/// the real part of the root with the smallest absolute real part is kept.
/// When the discriminant is negative, both roots share their real part, so
/// this falls back to the position of the parabola's extremum.
///
pub fn neutrino_momentum(lepton: &Momentum, et_miss: &MissingEt) -> Momentum {
    let nu_x = et_miss.et * cos(et_miss.phi);
    let nu_y = et_miss.et * sin(et_miss.phi);

    // a·pz² + b·pz + c = 0
    let mu = W_MASS.powi(2) / 2. + lepton[X] * nu_x + lepton[Y] * nu_y;
    let a = lepton[E].powi(2) - lepton[Z].powi(2);
    let b = -2. * mu * lepton[Z];
    let c = lepton[E].powi(2) * et_miss.et.powi(2) - mu.powi(2);

    let nu_z = if a == 0. {
        // Only reachable for a massless lepton along the beam axis
        if b == 0. {
            0.
        } else {
            -c / b
        }
    } else {
        let sqrt_disc = Complex::new(b.powi(2) - 4. * a * c, 0.).sqrt();
        let minus_b = Complex::new(-b, 0.);
        let roots = [
            (minus_b + sqrt_disc) / (2. * a),
            (minus_b - sqrt_disc) / (2. * a),
        ];
        if abs(roots[0].re) <= abs(roots[1].re) {
            roots[0].re
        } else {
            roots[1].re
        }
    };

    let nu_e = sqrt(nu_x.powi(2) + nu_y.powi(2) + nu_z.powi(2));
    Momentum::new(nu_x, nu_y, nu_z, nu_e)
}

/// Invariant mass of the lepton + neutrino + b-jet system
pub fn single_top_mass(lepton: &Lepton, et_miss: &MissingEt, b_jet: &Jet) -> Float {
    let neutrino = neutrino_momentum(lepton.p4(), et_miss);
    (lepton.p4() + neutrino + b_jet.p4()).mass()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::fixtures::*,
        numeric::reals::consts::{FRAC_PI_2, PI},
    };
    use approx::assert_relative_eq;

    #[test]
    fn event_cuts_fail_closed() {
        let mut info = good_info(1., 1.);
        assert!(standard_event_cuts(&info));

        info.triggered_by_electron = Some(false);
        assert!(!standard_event_cuts(&info));
        info.triggered_by_muon = Some(true);
        assert!(standard_event_cuts(&info));

        info.pass_grl = None;
        assert!(!standard_event_cuts(&info));
        info.pass_grl = Some(true);
        info.has_good_vertex = Some(false);
        assert!(!standard_event_cuts(&info));
    }

    #[test]
    fn select_and_sort_orders_by_decreasing_key() {
        let jets = [
            jet(30., 0., 0., 0.),
            jet(80., 0., 0., 0.),
            jet(10., 0., 0., 0.),
            jet(55., 0., 0., 0.),
        ];
        let sorted = select_and_sort(jets.iter(), |j| j.pt() > 20., |j| j.pt());
        let pts = sorted.iter().map(|j| j.pt()).collect::<Vec<_>>();
        assert_eq!(pts.len(), 3);
        assert!(pts.windows(2).all(|w| w[0] >= w[1]));
        assert_relative_eq!(pts[0], 80., max_relative = 1e-6);

        // Input is untouched, and sorting again changes nothing
        assert_relative_eq!(jets[0].pt(), 30., max_relative = 1e-6);
        let again = select_and_sort(sorted.iter().copied(), |j| j.pt() > 20., |j| j.pt());
        assert_eq!(again, sorted);

        let none = select_and_sort(jets.iter(), |_| false, |j| j.pt());
        assert!(none.is_empty());
    }

    #[test]
    fn select_and_sort_is_stable() {
        let values = [(1, 5.), (2, 7.), (3, 5.), (4, 7.)];
        let sorted = select_and_sort(values.iter(), |_| true, |v| v.1);
        let ids = sorted.iter().map(|v| v.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn lepton_quality() {
        assert!(is_good_lepton(&electron(30., 0.5, 0.)));
        assert!(!is_good_lepton(&electron(20., 0.5, 0.)));
        assert!(!is_good_lepton(&electron(30., 1.45, 0.)));
        assert!(!is_good_lepton(&electron(30., 2.48, 0.)));

        let mut muon = electron(30., 2.48, 0.);
        muon.pdg_id = 13;
        assert!(is_good_lepton(&muon));
        muon.ptconerel30 = 0.2;
        assert!(!is_good_lepton(&muon));

        let mut tau = electron(30., 0., 0.);
        tau.pdg_id = 15;
        assert!(!is_good_lepton(&tau));

        let mut loose = electron(30., 0., 0.);
        loose.tight_id = false;
        assert!(!is_good_lepton(&loose));
    }

    #[test]
    fn jet_quality() {
        assert!(is_good_jet(&jet(30., 1., 0., 0.)));
        assert!(!is_good_jet(&jet(24., 1., 0., 0.)));
        assert!(!is_good_jet(&jet(30., 2.6, 0., 0.)));

        let mut pileup = jet(40., 1., 0., 0.);
        pileup.jvt = 0.2;
        assert!(!is_good_jet(&pileup));
        let mut hard = jet(70., 1., 0., 0.);
        hard.jvt = 0.2;
        assert!(is_good_jet(&hard));
        let mut forward = jet(40., 2.45, 0., 0.);
        forward.jvt = 0.2;
        assert!(is_good_jet(&forward));
    }

    #[test]
    fn w_transverse_mass_values() {
        let met = MissingEt {
            et: 30.,
            phi: FRAC_PI_2,
        };
        let mt = w_transverse_mass(&electron(40., 0.3, 0.), &met);
        assert_relative_eq!(mt, (2400. as Float).sqrt(), max_relative = 1e-6);
        assert_relative_eq!(mt, 49.0, max_relative = 1e-3);

        // Symmetric in the sign of the azimuthal separation
        let mirrored = w_transverse_mass(&electron(40., 0.3, PI), &met);
        assert_relative_eq!(mirrored, mt, max_relative = 1e-6);

        // Collinear lepton and missing-ET
        let collinear = w_transverse_mass(&electron(40., 0.3, FRAC_PI_2), &met);
        assert!(collinear >= 0.);
        assert!(collinear < 1e-3);
    }

    #[test]
    fn neutrino_with_real_roots() {
        let lepton = electron(40., 0.5, 0.);
        let met = MissingEt { et: 30., phi: 1. };
        let nu = neutrino_momentum(lepton.p4(), &met);
        // Roots are 154.58 and -53.48 GeV, the smallest one is kept
        assert_relative_eq!(nu[Z], -53.478113907526755, max_relative = 1e-5);
        assert_relative_eq!(nu[E], 61.318094124869916, max_relative = 1e-5);
        assert_relative_eq!(nu.pt(), 30., max_relative = 1e-6);

        // Then the W mass constraint is satisfied exactly
        assert_relative_eq!((lepton.p4() + nu).mass(), W_MASS, max_relative = 1e-4);
    }

    #[test]
    fn neutrino_with_negative_discriminant() {
        // Transverse mass above the W mass makes the discriminant negative
        let lepton = electron(50., 0., 0.);
        let met = MissingEt { et: 60., phi: PI };
        assert!(w_transverse_mass(&lepton, &met) > W_MASS);
        let nu = neutrino_momentum(lepton.p4(), &met);
        assert!(nu[Z].abs() < 1e-6);
        assert_relative_eq!(nu[E], 60., max_relative = 1e-6);

        // Away from the transverse plane, pz sits at the parabola's extremum
        let lepton = electron(50., 1.2, 0.);
        assert!(w_transverse_mass(&lepton, &met) > W_MASS);
        let nu = neutrino_momentum(lepton.p4(), &met);
        let mu = W_MASS.powi(2) / 2. - 50. * 60.;
        let a = lepton.p4()[E].powi(2) - lepton.p4()[Z].powi(2);
        let b = -2. * mu * lepton.p4()[Z];
        assert_relative_eq!(nu[Z], -b / (2. * a), max_relative = 1e-4);
        assert_relative_eq!(nu[Z], 7.006315827281149, max_relative = 1e-4);
        assert_relative_eq!(nu[E], 60.40768545037635, max_relative = 1e-5);
    }

    #[test]
    fn single_top_mass_values() {
        let b_jet = Jet {
            p4: crate::momentum::from_pt_eta_phi_m(80., -1., FRAC_PI_2, 10.),
            mv2c10: 0.95,
            jvt: 0.9,
        };
        let mtop = single_top_mass(
            &electron(50., 0., 0.),
            &MissingEt { et: 60., phi: PI },
            &b_jet,
        );
        assert_relative_eq!(mtop, 198.36123847680724, max_relative = 1e-5);

        let mtop = single_top_mass(
            &electron(40., 0.5, 0.),
            &MissingEt { et: 30., phi: 1. },
            &b_jet,
        );
        assert_relative_eq!(mtop, 150.8309817316018, max_relative = 1e-5);
    }
}
